//! `pnp-motion`: slider kinematics behind a pluggable trajectory oracle.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                     |
//! |--------------|--------------------------------------------------------------|
//! | [`limits`]   | `KinematicLimits`: per-axis velocity/accel/optional jerk     |
//! | [`state`]    | `KinematicState`: position, velocity, acceleration           |
//! | [`oracle`]   | `TrajectoryOracle`/`Trajectory` traits, `TrapezoidalOracle`  |
//! | [`profile`]  | `TrapezoidPlan`: per-axis time-optimal velocity profiles     |
//! | [`error`]    | `MotionError`, `MotionResult<T>`                             |
//!
//! # Oracle model
//!
//! The simulator never integrates dynamics itself.  Every tick each slider
//! asks the oracle for a fresh minimum-time plan from its current state to its
//! current target and adopts the plan's state one tick later.  The assignment
//! engine uses the same plans to predict where a slider will be when it meets
//! a moving item.  Swap the oracle at compile time (the simulation is generic
//! over `O: TrajectoryOracle`) to plug in a different motion solver.

pub mod error;
pub mod limits;
pub mod oracle;
pub mod profile;
pub mod state;


pub use error::{MotionError, MotionResult};
pub use limits::KinematicLimits;
pub use oracle::{TrajectoryOracle, Trajectory, TrapezoidalOracle};
pub use profile::TrapezoidPlan;
pub use state::KinematicState;
