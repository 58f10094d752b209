//! The `Sim` struct and its tick loop.

use pnp_assign::AssignmentEngine;
use pnp_conveyor::ConveyorLaneSet;
use pnp_core::Tick;
use pnp_machine::Machine;
use pnp_motion::TrajectoryOracle;
use tracing::info;

use crate::builder::build_world;
use crate::{RunOutcome, SimObserver, SimResult, SimulationContext, Snapshot, StopSignal};

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// `Sim<O>` holds the whole line and drives the five-step tick:
///
/// 1. **Lanes**: move every item, generate due rows and groups, retire what
///    left the belt.
/// 2. **Pick pass**, then **drop pass**: every ready rail, in rail id order,
///    asks the assignment engine for targets.
/// 3. **Kinematics** (optionally parallel with the `parallel` feature): one
///    oracle step per slider toward its target.
/// 4. **State cycles**: sliders, then rails, in id order.
/// 5. **Statistics**: peak speed and acceleration, tick count.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<O: TrajectoryOracle> {
    /// Parameters, run switches, clock and counters.
    pub ctx: SimulationContext,

    /// In-feed and out-feed lanes with their items.
    pub lanes: ConveyorLaneSet,

    /// Beams, rails and sliders.
    pub machine: Machine,

    /// Candidate search and commitment; owns the oracle.
    pub engine: AssignmentEngine<O>,

    pub(crate) stop: StopSignal,
}

impl<O: TrajectoryOracle> Sim<O> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current tick to the configured end, or until the stop
    /// signal is raised.
    ///
    /// The stop signal is checked between ticks.  `on_run_end` is called in
    /// both cases; a fatal state-machine violation aborts the run with an
    /// error instead.
    pub fn run<Obs: SimObserver>(&mut self, observer: &mut Obs) -> SimResult<RunOutcome> {
        info!(
            seed = self.ctx.config.seed,
            ticks = self.ctx.config.total_ticks,
            sliders = self.machine.sliders().len(),
            "run started"
        );
        let outcome = loop {
            let now = self.ctx.clock.current_tick;
            if now >= self.ctx.config.end_tick() {
                break RunOutcome::Completed;
            }
            if self.stop.is_stopped() {
                break RunOutcome::Interrupted;
            }
            self.step(now, observer)?;
        };

        let end = self.ctx.clock.current_tick;
        let stats = &self.ctx.stats;
        observer.on_run_end(end, stats);
        info!(
            ?outcome,
            tick = %end,
            placed = stats.placed(),
            missed_picks = stats.missed_picks,
            missed_drops = stats.missed_drops,
            fill_rate = stats.fill_rate(),
            "run finished"
        );
        Ok(outcome)
    }

    /// Run exactly `n` ticks from the current position (ignores the end tick
    /// and the stop signal).
    ///
    /// Useful for tests and incremental stepping.
    pub fn run_ticks<Obs: SimObserver>(&mut self, n: u64, observer: &mut Obs) -> SimResult<()> {
        for _ in 0..n {
            let now = self.ctx.clock.current_tick;
            self.step(now, observer)?;
        }
        Ok(())
    }

    /// Start a new run of the same line seeded with `seed`: fresh lanes,
    /// sliders back at their start positions, counters cleared, clock at zero.
    pub fn reset(&mut self, seed: u64) -> SimResult<()> {
        let (lanes, machine) = build_world(&self.ctx.params, seed, self.engine.oracle())?;
        self.lanes = lanes;
        self.machine = machine;
        self.ctx.reset(seed);
        self.stop.clear();
        info!(seed, "simulation reset");
        Ok(())
    }

    /// A handle on this run's stop flag.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.ctx.clock.current_tick, &self.lanes, &self.machine)
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn step<Obs: SimObserver>(&mut self, now: Tick, observer: &mut Obs) -> SimResult<()> {
        observer.on_tick_start(now);
        self.process_tick(now)?;
        observer.on_tick_end(now, &self.ctx.stats);

        let interval = self.ctx.config.snapshot_interval_ticks;
        if interval > 0 && now.0 % interval == 0 {
            observer.on_snapshot(&Snapshot::capture(now, &self.lanes, &self.machine));
        }
        self.ctx.clock.advance();
        Ok(())
    }

    fn process_tick(&mut self, now: Tick) -> SimResult<()> {
        let flags = self.ctx.flags();
        let dt = self.ctx.config.tick_secs;

        // ── 1: lanes ──────────────────────────────────────────────────────
        self.lanes.advance(now, &mut self.ctx.stats);

        // ── 2: assignment, picks before drops ─────────────────────────────
        self.engine.pick_pass(&mut self.machine, &mut self.lanes)?;
        self.engine.drop_pass(&mut self.machine, &mut self.lanes)?;

        // ── 3: kinematics ─────────────────────────────────────────────────
        self.step_sliders(dt);

        // ── 4: state cycles ───────────────────────────────────────────────
        self.machine
            .advance_states(now, &mut self.lanes, &mut self.ctx.stats, flags)?;

        // ── 5: statistics ─────────────────────────────────────────────────
        self.machine.record_peaks(&mut self.ctx.stats);
        self.ctx.stats.total_time_steps += 1;
        Ok(())
    }

    /// One oracle step for every slider.  Each update reads only the
    /// slider's own state and target, so order does not matter.
    fn step_sliders(&mut self, dt: f64) {
        let oracle = self.engine.oracle();

        #[cfg(not(feature = "parallel"))]
        {
            self.machine.step_kinematics(oracle, dt);
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            self.machine
                .sliders_mut()
                .par_iter_mut()
                .for_each(|slider| slider.step(oracle, dt));
        }
    }
}
