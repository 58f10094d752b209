//! `pnp-conveyor`: the moving item supply and demand of the line.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                     |
//! |-------------|--------------------------------------------------------------|
//! | [`item`]    | `Pick`, `Drop`, their statuses, `TargetRef`, `LaneItem`      |
//! | [`lane`]    | `LaneGeometry`, `InFeedLane`, `OutFeedLane`                  |
//! | [`pattern`] | Precomputed row and package layouts                          |
//! | [`set`]     | `ConveyorLaneSet`: all lanes, stagger offset, bookkeeping    |
//! | [`error`]   | `ConveyorError`, `ConveyorResult<T>`                         |
//!
//! # Item lifecycle
//!
//! ```text
//! generate ──► FREE ──► ASSIGNED ──► (picked) removed, counted
//!               │  ▲
//!               ▼  │ retry
//!             SKIPPED
//!
//! any status ──► leaves the lane ──► retired (row-wide / package-wide)
//! ```
//!
//! Drops follow the same shape with NORMAL in place of FREE and DONE in
//! place of removal: filled slots stay on the belt until their package
//! leaves, so the package can be scored as filled or unfilled exactly once.

pub mod error;
pub mod item;
pub mod lane;
pub mod pattern;
pub mod set;


pub use error::{ConveyorError, ConveyorResult};
pub use item::{Drop, DropStatus, LaneItem, Pick, PickStatus, TargetRef};
pub use lane::{InFeedLane, LaneGeometry, OutFeedLane};
pub use set::ConveyorLaneSet;
