use pnp_conveyor::TargetRef;
use pnp_core::{PnpError, RailId, SliderId, Vec3};
use thiserror::Error;

use crate::{RailPhase, SliderStatus};

/// Everything known about a slider caught in a status its rail cannot drive.
#[derive(Clone, Debug, PartialEq)]
pub struct InvariantViolation {
    pub slider:   SliderId,
    pub rail:     RailId,
    pub status:   SliderStatus,
    pub phase:    RailPhase,
    pub tracked:  Option<TargetRef>,
    pub position: Vec3,
    pub min:      Vec3,
    pub max:      Vec3,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} on {} is {} while the rail is {} (tracking {}, at {}, envelope {} .. {})",
            self.slider,
            self.rail,
            self.status.as_str(),
            self.phase.as_str(),
            self.tracked.map_or_else(|| "nothing".to_owned(), |t| t.to_string()),
            self.position,
            self.min,
            self.max,
        )
    }
}

#[derive(Debug, Error)]
pub enum MachineError {
    #[error("machine invariant violated: {0}")]
    InvariantViolation(Box<InvariantViolation>),

    #[error(transparent)]
    Config(#[from] PnpError),
}

pub type MachineResult<T> = Result<T, MachineError>;
