//! Slider statuses, rail phases and the two tasks that drive them.

/// What a slider is doing.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum SliderStatus {
    #[default]
    Idle,
    /// Travelling to intercept a tracked pick.
    Picking,
    /// Travelling to intercept a tracked drop slot.
    Placing,
    /// Vertical engage dwell after an interception.
    ZMovement,
    /// Found nothing feasible; sits this pass out.
    Skipped,
    /// Parked beside its sibling; forces the rail to repeat its phase.
    SkipNWait,
    /// Loaded and waiting for the sibling to catch up.
    Waiting,
}

impl SliderStatus {
    /// Statuses that keep the rail from changing phase.
    #[inline]
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Picking | Self::Placing | Self::ZMovement)
    }

    /// Statuses that make the engine try the sibling first.
    #[inline]
    pub fn is_sidelined(self) -> bool {
        matches!(self, Self::Skipped | Self::Waiting)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle      => "IDLE",
            Self::Picking   => "PICKING",
            Self::Placing   => "PLACING",
            Self::ZMovement => "Z_MVMT",
            Self::Skipped   => "SKIPPED",
            Self::SkipNWait => "SKIP_N_WAIT",
            Self::Waiting   => "WAITING",
        }
    }
}

/// Phase of a rail in its pick-and-place cycle.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum RailPhase {
    #[default]
    CanPick,
    Picking,
    CanPlace,
    Placing,
}

impl RailPhase {
    /// `true` for the two phases in which the engine may assign work.
    #[inline]
    pub fn is_ready(self) -> bool {
        matches!(self, Self::CanPick | Self::CanPlace)
    }

    /// The task this phase belongs to.
    pub fn task(self) -> Task {
        match self {
            Self::CanPick | Self::Picking => Task::Pick,
            Self::CanPlace | Self::Placing => Task::Place,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CanPick  => "CAN_PICK",
            Self::Picking  => "PICKING",
            Self::CanPlace => "CAN_PLACE",
            Self::Placing  => "PLACING",
        }
    }
}

/// The two halves of a pick-and-place cycle.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Task {
    Pick,
    Place,
}

impl Task {
    #[inline]
    pub fn ready_phase(self) -> RailPhase {
        match self {
            Task::Pick => RailPhase::CanPick,
            Task::Place => RailPhase::CanPlace,
        }
    }

    #[inline]
    pub fn busy_phase(self) -> RailPhase {
        match self {
            Task::Pick => RailPhase::Picking,
            Task::Place => RailPhase::Placing,
        }
    }

    /// Status of a slider that has committed to this task.
    #[inline]
    pub fn engaged_status(self) -> SliderStatus {
        match self {
            Task::Pick => SliderStatus::Picking,
            Task::Place => SliderStatus::Placing,
        }
    }

    #[inline]
    pub fn opposite(self) -> Task {
        match self {
            Task::Pick => Task::Place,
            Task::Place => Task::Pick,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Task::Pick => "pick",
            Task::Place => "place",
        }
    }
}
