use pnp_conveyor::ConveyorError;
use pnp_core::PnpError;
use pnp_machine::MachineError;
use pnp_motion::MotionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Params(#[from] PnpError),

    #[error("run configuration error: {0}")]
    Config(String),

    #[error("oracle error: {0}")]
    Motion(#[from] MotionError),

    #[error("conveyor error: {0}")]
    Conveyor(#[from] ConveyorError),

    #[error(transparent)]
    Machine(#[from] MachineError),
}

pub type SimResult<T> = Result<T, SimError>;
