//! `pnp-core`: foundational types for the `pnp_sim` pick-and-place simulator.
//!
//! This crate is a dependency of every other `pnp-*` crate.  It has no
//! `pnp-*` dependencies and only a handful of external ones (`rand`,
//! `thiserror`, `serde`, `serde_json`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`ids`]     | `PickId`, `DropId`, `PackageId`, `RowId`, `SliderId`, …    |
//! | [`geom`]    | `Vec2`, `Vec3` in the machine frame (mm)                   |
//! | [`time`]    | `Tick`, `SimClock`, `RunConfig`                            |
//! | [`rng`]     | `LaneRng` (per-lane), `SimRng` (run-level)                 |
//! | [`params`]  | `MachineParams` JSON loader, defaults, validation          |
//! | [`policy`]  | `SchedulingPolicy`, `RowPattern` names                     |
//! | [`stats`]   | `RunStats` counters collected during one run               |
//! | [`error`]   | `PnpError`, `PnpResult`                                    |
//!
//! # Machine frame
//!
//! x is the conveyor flow axis, y the beam axis, z the vertical engage axis.
//! All lengths are millimetres, all durations seconds.

pub mod error;
pub mod geom;
pub mod ids;
pub mod params;
pub mod policy;
pub mod rng;
pub mod stats;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{PnpError, PnpResult};
pub use geom::{Vec2, Vec3};
pub use ids::{BeamId, DropId, LaneId, PackageId, PickId, RailId, RowId, SliderId};
pub use params::{BeamParams, ConveyorParams, MachineParams, SliderParams, TargetParams};
pub use policy::{RowPattern, SchedulingPolicy};
pub use rng::{LaneRng, SimRng};
pub use stats::RunStats;
pub use time::{RunConfig, SimClock, Tick};
