//! Fluent builder for constructing a [`Sim`].

use pnp_assign::{AssignmentEngine, EngineConfig};
use pnp_conveyor::ConveyorLaneSet;
use pnp_core::{MachineParams, RunConfig, Vec3};
use pnp_machine::Machine;
use pnp_motion::{KinematicLimits, TrajectoryOracle, TrapezoidalOracle};

use crate::{Sim, SimError, SimResult, SimulationContext, StopSignal};

/// Fluent builder for [`Sim<O>`].
///
/// # Required inputs
///
/// - [`MachineParams`]: the line layout, feeds and slider limits
/// - `O: TrajectoryOracle`: the motion planner
///   ([`SimBuilder::from_params`] builds the trapezoidal one from the params)
///
/// # Optional inputs (have defaults)
///
/// | Method              | Default                      |
/// |---------------------|------------------------------|
/// | `.run_config(c)`    | `params.run_config()`        |
/// | `.stop_signal(s)`   | a fresh, unraised signal     |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::from_params(MachineParams::default())?
///     .run_config(config)
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<O: TrajectoryOracle> {
    params: MachineParams,
    oracle: O,
    config: Option<RunConfig>,
    stop:   Option<StopSignal>,
}

impl SimBuilder<TrapezoidalOracle> {
    /// Builder using a [`TrapezoidalOracle`] with the params' slider limits.
    pub fn from_params(params: MachineParams) -> SimResult<Self> {
        let limits = KinematicLimits::from_params(&params.slider)?;
        Ok(Self::new(params, TrapezoidalOracle::new(limits)))
    }
}

impl<O: TrajectoryOracle> SimBuilder<O> {
    pub fn new(params: MachineParams, oracle: O) -> Self {
        Self { params, oracle, config: None, stop: None }
    }

    /// Override the run driver settings taken from the params.
    ///
    /// The tick size must match `params.time_step`; lanes and dwell timers
    /// are laid out in ticks of that size.
    pub fn run_config(mut self, config: RunConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Share a stop flag with the caller.
    pub fn stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Validate the params, lay out lanes and machine, and return a
    /// ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim<O>> {
        self.params.validate()?;
        let config = self.config.unwrap_or_else(|| self.params.run_config());
        if (config.tick_secs - self.params.time_step).abs() > 1e-12 {
            return Err(SimError::Config(format!(
                "tick of {} s does not match the parameter time step of {} s",
                config.tick_secs, self.params.time_step,
            )));
        }

        let (lanes, machine) = build_world(&self.params, config.seed, &self.oracle)?;
        let engine_config = EngineConfig {
            tick_secs:      config.tick_secs,
            state_bouncing: config.state_bouncing,
            starve_limit:   self.params.bounce_after_starved_passes,
        };
        let engine = AssignmentEngine::new(self.oracle, &machine, engine_config);

        Ok(Sim {
            ctx: SimulationContext::new(self.params, config),
            lanes,
            machine,
            engine,
            stop: self.stop.unwrap_or_default(),
        })
    }
}

/// Fresh lanes and machine for one run, with the lanes' lookahead set to the
/// distance they travel while a slider crosses between the feeds.
pub(crate) fn build_world<O: TrajectoryOracle>(
    params: &MachineParams,
    seed:   u64,
    oracle: &O,
) -> SimResult<(ConveyorLaneSet, Machine)> {
    let mut lanes = ConveyorLaneSet::from_params(params, seed)?;
    let machine = Machine::from_params(params)?;

    if let Some(s) = machine.sliders().first() {
        let across = s.position() + Vec3::new(0.0, lanes.feed_separation().abs(), 0.0);
        lanes.set_lookahead(oracle.travel_time(&s.state, across));
    }
    Ok((lanes, machine))
}
