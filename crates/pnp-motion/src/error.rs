use thiserror::Error;

#[derive(Debug, Error)]
pub enum MotionError {
    #[error("axis {axis} {quantity} limit must be positive and finite, got {value}")]
    InvalidLimit {
        axis:     usize,
        quantity: &'static str,
        value:    f64,
    },
}

pub type MotionResult<T> = Result<T, MotionError>;
