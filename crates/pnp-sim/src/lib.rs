//! `pnp-sim`: tick loop orchestrator for the pnp_sim pick-and-place line.
//!
//! # Tick loop
//!
//! ```text
//! for tick in 0..config.total_ticks (or until the stop signal):
//!   ① Lanes      : move, generate, retire; missed items counted here.
//!   ② Pick pass  : every CAN_PICK rail: candidates → order → commit.
//!     Drop pass  : every CAN_PLACE rail, same shape.
//!   ③ Kinematics : one oracle step per slider
//!                   (parallel with the `parallel` feature).
//!   ④ Cycles     : slider state table, then rail phase advance.
//!   ⑤ Statistics : peaks, tick count; observer hooks and snapshots.
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | Runs the kinematic step on Rayon's thread pool.         |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use pnp_core::MachineParams;
//! use pnp_sim::{NoopObserver, SimBuilder};
//!
//! let params = MachineParams::load_json("line.json")?;
//! let mut sim = SimBuilder::from_params(params)?.build()?;
//! let outcome = sim.run(&mut NoopObserver)?;
//! println!("fill rate {:.3}", sim.ctx.stats.fill_rate());
//! ```

pub mod builder;
pub mod context;
pub mod error;
pub mod observer;
pub mod signal;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use context::SimulationContext;
pub use error::{SimError, SimResult};
pub use observer::{ItemRecord, NoopObserver, SimObserver, SliderRecord, Snapshot};
pub use signal::{RunOutcome, StopSignal};
pub use sim::Sim;
