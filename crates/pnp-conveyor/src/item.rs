//! Picks, drop slots, and the references sliders hold to them.

use pnp_core::{DropId, LaneId, PackageId, PickId, RowId, Vec2};

// ── Statuses ──────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum PickStatus {
    /// On the belt, nobody is after it.
    #[default]
    Free,
    /// Tracked by exactly one slider.
    Assigned,
    /// Rejected this pass for collision; may be offered again.
    Skipped,
    /// Defective product; never picked, never counted as missed.
    Bad,
    /// Picked and off the belt.
    Gone,
}

impl PickStatus {
    /// FREE and SKIPPED are the only statuses offered to the assignment engine.
    #[inline]
    pub fn is_candidate(self) -> bool {
        matches!(self, PickStatus::Free | PickStatus::Skipped)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PickStatus::Free     => "free",
            PickStatus::Assigned => "assigned",
            PickStatus::Skipped  => "skipped",
            PickStatus::Bad      => "bad",
            PickStatus::Gone     => "gone",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum DropStatus {
    /// Empty slot waiting for an item.
    #[default]
    Normal,
    /// Slot holding an upside-down cup; never offered.
    Flipped,
    Assigned,
    Skipped,
    /// Filled.  Stays on the belt until its package retires.
    Done,
}

impl DropStatus {
    #[inline]
    pub fn is_candidate(self) -> bool {
        matches!(self, DropStatus::Normal | DropStatus::Skipped)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DropStatus::Normal   => "normal",
            DropStatus::Flipped  => "flipped",
            DropStatus::Assigned => "assigned",
            DropStatus::Skipped  => "skipped",
            DropStatus::Done     => "done",
        }
    }
}

// ── Items ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Pick {
    pub id:       PickId,
    pub position: Vec2,
    pub status:   PickStatus,
    pub row:      RowId,
    pub lane:     LaneId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Drop {
    pub id:       DropId,
    pub position: Vec2,
    pub status:   DropStatus,
    pub package:  PackageId,
    pub row:      RowId,
    pub lane:     LaneId,
}

// ── TargetRef ─────────────────────────────────────────────────────────────────

/// What a slider is after: one pick or one drop slot on a given lane.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TargetRef {
    Pick { lane: LaneId, id: PickId },
    Drop { lane: LaneId, id: DropId },
}

impl std::fmt::Display for TargetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetRef::Pick { lane, id } => write!(f, "{id}@in{}", lane.0),
            TargetRef::Drop { lane, id } => write!(f, "{id}@out{}", lane.0),
        }
    }
}

// ── LaneItem ──────────────────────────────────────────────────────────────────

/// The view of an item the assignment engine needs, shared by picks and drops.
pub trait LaneItem {
    fn target(&self) -> TargetRef;
    fn position(&self) -> Vec2;
    fn row(&self) -> RowId;
    fn is_candidate(&self) -> bool;
}

impl LaneItem for Pick {
    #[inline]
    fn target(&self) -> TargetRef {
        TargetRef::Pick { lane: self.lane, id: self.id }
    }
    #[inline]
    fn position(&self) -> Vec2 {
        self.position
    }
    #[inline]
    fn row(&self) -> RowId {
        self.row
    }
    #[inline]
    fn is_candidate(&self) -> bool {
        self.status.is_candidate()
    }
}

impl LaneItem for Drop {
    #[inline]
    fn target(&self) -> TargetRef {
        TargetRef::Drop { lane: self.lane, id: self.id }
    }
    #[inline]
    fn position(&self) -> Vec2 {
        self.position
    }
    #[inline]
    fn row(&self) -> RowId {
        self.row
    }
    #[inline]
    fn is_candidate(&self) -> bool {
        self.status.is_candidate()
    }
}
