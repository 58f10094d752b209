//! `pnp-assign`: who intercepts what, and where.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                    |
//! |---------------|-------------------------------------------------------------|
//! | [`candidate`] | `Candidate`, `Side`                                         |
//! | [`strategy`]  | `Strategy`: ordering function + lead-swap flag per policy   |
//! | [`engine`]    | `AssignmentEngine<O>`: pick and drop passes                 |
//!
//! # One rail, one pass
//!
//! ```text
//! find_candidates ──► Strategy::order ──► primary: find_feasible_target
//!                                              │ found          │ none
//!                                              ▼                ▼
//!                                  commit, rail → busy      bounce / skip
//!                                              │
//!                              secondary: find_feasible_target
//!                                  │ collides?  yes → SKIPPED, retry
//!                                  │            no  → commit
//!                                  └ nothing left  → park
//! ```
//!
//! Searching never mutates; the engine commits only once a target survives
//! the collision check, so a rejected candidate is never tracked.

pub mod candidate;
pub mod engine;
pub mod strategy;


pub use candidate::{Candidate, Side};
pub use engine::{AssignmentEngine, EngineConfig};
pub use strategy::Strategy;
