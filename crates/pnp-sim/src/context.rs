//! Everything one run owns besides the world itself.

use pnp_core::{MachineParams, RunConfig, RunStats, SimClock};
use pnp_machine::CycleFlags;

/// Parameters, run switches, clock and counters of the current run.
///
/// Owned by [`Sim`][crate::Sim]; [`reset`][Self::reset] starts a new run of
/// the same line with a different seed.
#[derive(Clone, Debug)]
pub struct SimulationContext {
    pub params: MachineParams,
    pub config: RunConfig,
    pub clock:  SimClock,
    pub stats:  RunStats,
}

impl SimulationContext {
    pub fn new(params: MachineParams, config: RunConfig) -> Self {
        let stats = fresh_stats(&params, &config);
        Self { clock: config.make_clock(), params, config, stats }
    }

    /// Rewind the clock and clear the counters for a run seeded with `seed`.
    pub fn reset(&mut self, seed: u64) {
        self.config.seed = seed;
        self.clock = self.config.make_clock();
        self.stats = fresh_stats(&self.params, &self.config);
    }

    pub fn flags(&self) -> CycleFlags {
        CycleFlags {
            pre_move:       self.config.pre_move,
            state_bouncing: self.config.state_bouncing,
        }
    }
}

fn fresh_stats(params: &MachineParams, config: &RunConfig) -> RunStats {
    RunStats::new(config.seed, config.pre_move, config.state_bouncing, params.slider_count())
}
