use pnp_core::{LaneId, PnpError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConveyorError {
    #[error(transparent)]
    Config(#[from] PnpError),

    #[error("no in-feed lane {0}")]
    UnknownInLane(LaneId),

    #[error("no out-feed lane {0}")]
    UnknownOutLane(LaneId),
}

pub type ConveyorResult<T> = Result<T, ConveyorError>;
