//! `pnp-machine`: the sliders, rails and beams of the line.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                      |
//! |--------------|---------------------------------------------------------------|
//! | [`status`]   | `SliderStatus`, `RailPhase`, `Task`                           |
//! | [`slider`]   | `Slider`: kinematic state, envelope, tracked target           |
//! | [`rail`]     | `Rail` (two sliders on one beam side), `Beam`                 |
//! | [`machine`]  | `Machine` arena: construction, state cycles, parking, bounce  |
//! | [`error`]    | `MachineError`, `MachineResult<T>`, `InvariantViolation`      |
//!
//! # Layout
//!
//! ```text
//!            beam i (x = firstBeamPos + i·spacing)
//!                        │
//!   rail 2i (side −1)    │    rail 2i+1 (side +1)
//!   sliders 4i, 4i+1     │    sliders 4i+2, 4i+3
//!   arm reaches −x       │    arm reaches +x
//! ```
//!
//! Beams, rails and sliders live in flat `Vec`s indexed by their typed ids.
//! A rail names its two sliders by id; a slider knows its rail and its index
//! (0 or 1) within it.  Slider 0 always sits at the lower beam-axis position.
//!
//! # Rail cycle
//!
//! ```text
//! CAN_PICK ──assign──► PICKING ──both done──► CAN_PLACE ──assign──► PLACING
//!    ▲                    │                                            │
//!    │                    └── SKIP_N_WAIT: repeat CAN_PICK             │
//!    └─────────────────────────── both done ───────────────────────────┘
//! ```

pub mod error;
pub mod machine;
pub mod rail;
pub mod slider;
pub mod status;

#[cfg(test)]
mod tests;

pub use error::{InvariantViolation, MachineError, MachineResult};
pub use machine::{CycleFlags, Machine};
pub use rail::{Beam, Rail};
pub use slider::Slider;
pub use status::{RailPhase, SliderStatus, Task};
