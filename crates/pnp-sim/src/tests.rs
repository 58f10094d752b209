//! Integration tests for pnp-sim.

use std::collections::HashSet;

use pnp_conveyor::{DropStatus, PickStatus, TargetRef};
use pnp_core::{LaneId, MachineParams, RailId, RunConfig, RunStats, Tick, Vec2};
use pnp_machine::{RailPhase, SliderStatus};
use pnp_motion::TrapezoidalOracle;

use crate::{NoopObserver, RunOutcome, Sim, SimBuilder, SimError, SimObserver, Snapshot, StopSignal};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Reference line with both feeds stopped, so hand-placed items stay put.
fn still_params() -> MachineParams {
    let mut p = MachineParams::default();
    p.conveyor.speed = [0.0, 0.0];
    p
}

fn sim_with(params: MachineParams, secs: f64, seed: u64) -> Sim<TrapezoidalOracle> {
    let mut config = params.run_config();
    config.total_ticks = pnp_core::time::ticks_for_secs(secs, config.tick_secs);
    config.seed = seed;
    SimBuilder::from_params(params).unwrap().run_config(config).build().unwrap()
}

/// Observer that remembers what it was told.
#[derive(Default)]
struct Recorder {
    started:   u64,
    ended:     u64,
    snapshots: Vec<Tick>,
    run_ends:  Vec<(Tick, RunStats)>,
    /// Raise this signal at the end of the given tick.
    stop_at:   Option<(Tick, StopSignal)>,
}

impl SimObserver for Recorder {
    fn on_tick_start(&mut self, _tick: Tick) {
        self.started += 1;
    }

    fn on_tick_end(&mut self, tick: Tick, _stats: &RunStats) {
        self.ended += 1;
        if let Some((at, signal)) = &self.stop_at {
            if *at == tick {
                signal.stop();
            }
        }
    }

    fn on_snapshot(&mut self, snapshot: &Snapshot) {
        self.snapshots.push(snapshot.tick);
    }

    fn on_run_end(&mut self, final_tick: Tick, stats: &RunStats) {
        self.run_ends.push((final_tick, stats.clone()));
    }
}

// ── SimBuilder validation ─────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn builds_the_reference_line() {
        let sim = SimBuilder::from_params(MachineParams::default()).unwrap().build().unwrap();
        assert_eq!(sim.machine.sliders().len(), 24);
        assert_eq!(sim.ctx.clock.current_tick, Tick(0));
        assert_eq!(sim.ctx.stats.workload.len(), 24);
        assert_eq!(sim.ctx.config.total_ticks, 6000);
    }

    #[test]
    fn lookahead_covers_the_crossing() {
        let sim = SimBuilder::from_params(MachineParams::default()).unwrap().build().unwrap();
        let lane = sim.lanes.in_lane(LaneId(0)).unwrap();
        assert!(lane.geometry.extra_range > 0.0);
        // a crossing of a few hundred mm takes well under a second
        assert!(lane.geometry.extra_range < lane.geometry.speed);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let mut p = MachineParams::default();
        p.beam.scheduling[2] = "EDD".to_owned();
        assert!(SimBuilder::from_params(p).unwrap().build().is_err());
    }

    #[test]
    fn tick_mismatch_is_rejected() {
        let p = MachineParams::default();
        let config = RunConfig::new(1.0, 0.02, 0);
        let result = SimBuilder::from_params(p).unwrap().run_config(config).build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod scenario_tests {
    use super::*;

    #[test]
    fn single_stationary_pick_is_picked_and_dwells() {
        let mut sim = sim_with(still_params(), 5.0, 1);
        let id = sim
            .lanes
            .in_lane_mut(LaneId(0))
            .unwrap()
            .insert_pick(Vec2::new(450.0, 150.0), PickStatus::Free);

        sim.run_ticks(1, &mut NoopObserver).unwrap();
        let lane = sim.lanes.in_lane(LaneId(0)).unwrap();
        assert_eq!(lane.pick(id).unwrap().status, PickStatus::Assigned);
        // rail 0 picks with slider 1 first
        let s1 = sim.machine.rail_slider(RailId(0), 1).id;
        assert_eq!(sim.machine.slider(s1).status, SliderStatus::Picking);

        let mut dwell = 0;
        for _ in 0..200 {
            sim.run_ticks(1, &mut NoopObserver).unwrap();
            if sim.machine.slider(s1).status == SliderStatus::ZMovement {
                dwell += 1;
            }
        }
        assert_eq!(dwell, 16);
        assert!(sim.lanes.in_lane(LaneId(0)).unwrap().pick(id).is_none());
        assert_eq!(sim.ctx.stats.total_picks, 1);
        assert_eq!(sim.ctx.stats.missed_picks, 0);
        assert!(sim.machine.slider(s1).tracked.is_none());
    }

    #[test]
    fn starved_rail_bounces_to_waiting_drop() {
        let mut p = still_params();
        p.state_bouncing = true;
        p.bounce_after_starved_passes = Some(3);
        let mut sim = sim_with(p, 5.0, 1);
        let slot = sim
            .lanes
            .out_lane_mut(LaneId(0))
            .unwrap()
            .insert_drop(Vec2::new(450.0, 600.0), DropStatus::Normal);

        sim.run_ticks(2, &mut NoopObserver).unwrap();
        assert_eq!(sim.machine.rail(RailId(0)).phase, RailPhase::CanPick);
        assert!(sim.machine.rail(RailId(0)).bouncing.is_none());

        sim.run_ticks(1, &mut NoopObserver).unwrap();
        let rail = sim.machine.rail(RailId(0));
        assert_eq!(rail.phase, RailPhase::Placing);
        assert!(rail.bouncing.is_none());
        assert_eq!(
            sim.machine.rail_slider(RailId(0), 0).tracked,
            Some(TargetRef::Drop { lane: LaneId(0), id: slot })
        );
    }

    #[test]
    fn reference_line_keeps_tracking_exclusive_and_separated() {
        let mut sim = sim_with(MachineParams::default(), 10.0, 3);
        let clearance = sim.machine.clearance();
        let margin = sim.machine.error_margin();
        let mut paired_ticks = 0;
        for _ in 0..sim.ctx.config.total_ticks {
            sim.run_ticks(1, &mut NoopObserver).unwrap();

            let tracked: Vec<_> = sim.machine.sliders().iter().filter_map(|s| s.tracked).collect();
            let unique: HashSet<_> = tracked.iter().copied().collect();
            assert_eq!(tracked.len(), unique.len(), "double tracking at {}", sim.ctx.clock);

            for r in 0..sim.machine.rails().len() {
                let rail = RailId(r as u16);
                let ys: Vec<f64> = (0..2)
                    .filter_map(|i| sim.machine.rail_slider(rail, i).tracked)
                    .filter_map(|t| sim.lanes.position_of(t))
                    .map(|p| p.y)
                    .collect();
                if let [a, b] = ys[..] {
                    assert!((a - b).abs() >= clearance - 1e-9, "rail {rail} too close at {}", sim.ctx.clock);
                }

                // both carriages on their way to an item: targets and bodies stay apart
                let (s0, s1) = (sim.machine.rail_slider(rail, 0), sim.machine.rail_slider(rail, 1));
                let acting = |s: SliderStatus| matches!(s, SliderStatus::Picking | SliderStatus::Placing);
                if acting(s0.status) && acting(s1.status) {
                    paired_ticks += 1;
                    let target_gap = (s1.target.y - s0.target.y).abs();
                    assert!(target_gap >= clearance - 1e-9, "rail {rail} targets {target_gap} apart at {}", sim.ctx.clock);
                    let gap = (s1.position().y - s0.position().y).abs();
                    assert!(gap >= clearance - margin, "rail {rail} carriages {gap} apart at {}", sim.ctx.clock);
                }
            }
        }
        assert!(paired_ticks > 0);
        assert!(sim.ctx.stats.total_picks > 0);
        assert_eq!(sim.ctx.stats.total_time_steps, 1000);
    }

    #[test]
    fn retired_items_each_count_once() {
        // 1 mm per tick on both feeds, so items near the downstream end leave
        // well before anything generated upstream
        let mut p = MachineParams::default();
        p.conveyor.speed = [100.0, 100.0];
        let mut sim = sim_with(p, 5.0, 1);

        let lane = sim.lanes.in_lane_mut(LaneId(0)).unwrap();
        let end = lane.geometry.end;
        lane.insert_pick(Vec2::new(end.x + 5.5, end.y + 50.0), PickStatus::Free);
        lane.insert_pick(Vec2::new(end.x + 5.5, end.y + 150.0), PickStatus::Skipped);
        lane.insert_pick(Vec2::new(end.x + 5.5, end.y + 250.0), PickStatus::Bad);
        let lane = sim.lanes.out_lane_mut(LaneId(0)).unwrap();
        let end = lane.geometry.end;
        lane.insert_drop(Vec2::new(end.x + 5.5, end.y + 50.0), DropStatus::Normal);
        lane.insert_drop(Vec2::new(end.x + 5.5, end.y + 150.0), DropStatus::Done);
        lane.insert_drop(Vec2::new(end.x + 5.5, end.y + 250.0), DropStatus::Assigned);

        sim.run_ticks(30, &mut NoopObserver).unwrap();
        let stats = &sim.ctx.stats;

        // good picks: one missed count each, the bad one nothing
        assert_eq!(stats.total_picks, 2);
        assert_eq!(stats.missed_picks, 2);
        assert_eq!(stats.time_missed_picks.len(), 2);
        // every slot is its own package: unfilled ones count once each way
        assert_eq!(stats.total_drops, 3);
        assert_eq!(stats.total_packages, 3);
        assert_eq!(stats.missed_drops, 2);
        assert_eq!(stats.unfilled_packages, 2);
        assert_eq!(stats.time_missed_drops.len(), 2);
        assert!(stats.time_missed_drops.iter().all(|&t| t < stats.time_missed_picks[0]));
    }

    #[test]
    fn same_seed_same_run() {
        let mut a = sim_with(MachineParams::default(), 5.0, 7);
        let mut b = sim_with(MachineParams::default(), 5.0, 7);
        a.run_ticks(500, &mut NoopObserver).unwrap();
        b.run_ticks(500, &mut NoopObserver).unwrap();
        assert_eq!(a.ctx.stats, b.ctx.stats);
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn reset_matches_a_fresh_build() {
        let mut sim = sim_with(MachineParams::default(), 5.0, 7);
        sim.run_ticks(200, &mut NoopObserver).unwrap();
        sim.reset(9).unwrap();
        assert_eq!(sim.ctx.clock.current_tick, Tick(0));
        assert_eq!(sim.ctx.stats.seed, 9);
        assert_eq!(sim.ctx.stats.total_time_steps, 0);

        let mut fresh = sim_with(MachineParams::default(), 5.0, 9);
        assert_eq!(sim.snapshot(), fresh.snapshot());
        sim.run_ticks(150, &mut NoopObserver).unwrap();
        fresh.run_ticks(150, &mut NoopObserver).unwrap();
        assert_eq!(sim.ctx.stats, fresh.ctx.stats);
    }
}

// ── Run loop, observer and interrupts ─────────────────────────────────────────

#[cfg(test)]
mod run_tests {
    use super::*;

    #[test]
    fn completed_run_reports_every_tick_and_snapshot() {
        let mut sim = sim_with(MachineParams::default(), 0.5, 3);
        sim.ctx.config.snapshot_interval_ticks = 10;
        let mut rec = Recorder::default();
        let outcome = sim.run(&mut rec).unwrap();

        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!((rec.started, rec.ended), (50, 50));
        assert_eq!(rec.snapshots, [Tick(0), Tick(10), Tick(20), Tick(30), Tick(40)]);
        assert_eq!(rec.run_ends.len(), 1);
        assert_eq!(rec.run_ends[0].0, Tick(50));
        assert_eq!(rec.run_ends[0].1.total_time_steps, 50);
    }

    #[test]
    fn stop_before_start_runs_nothing() {
        let mut sim = sim_with(MachineParams::default(), 1.0, 3);
        sim.stop_signal().stop();
        let mut rec = Recorder::default();
        assert_eq!(sim.run(&mut rec).unwrap(), RunOutcome::Interrupted);
        assert_eq!(rec.started, 0);
        assert_eq!(rec.run_ends.len(), 1);
        assert_eq!(rec.run_ends[0].0, Tick(0));
    }

    #[test]
    fn interrupt_keeps_statistics_so_far() {
        let signal = StopSignal::new();
        let p = MachineParams::default();
        let mut sim = SimBuilder::from_params(p).unwrap().stop_signal(signal.clone()).build().unwrap();
        let mut rec = Recorder { stop_at: Some((Tick(4), signal)), ..Recorder::default() };

        assert_eq!(sim.run(&mut rec).unwrap(), RunOutcome::Interrupted);
        assert_eq!(sim.ctx.clock.current_tick, Tick(5));
        assert_eq!(sim.ctx.stats.total_time_steps, 5);
        assert_eq!(rec.run_ends[0].1, sim.ctx.stats);
    }

    #[test]
    fn stop_from_a_handler_thread_ends_the_run_with_its_statistics() {
        /// Raises a cloned handle from another thread, as a Ctrl-C handler does.
        struct HandlerAt {
            at:     Tick,
            signal: StopSignal,
            ends:   Vec<(Tick, RunStats)>,
        }

        impl SimObserver for HandlerAt {
            fn on_tick_end(&mut self, tick: Tick, _stats: &RunStats) {
                if tick == self.at {
                    let handle = self.signal.clone();
                    std::thread::spawn(move || handle.stop()).join().unwrap();
                }
            }

            fn on_run_end(&mut self, final_tick: Tick, stats: &RunStats) {
                self.ends.push((final_tick, stats.clone()));
            }
        }

        let mut sim = sim_with(MachineParams::default(), 2.0, 5);
        let mut obs = HandlerAt { at: Tick(20), signal: sim.stop_signal(), ends: Vec::new() };
        assert_eq!(sim.run(&mut obs).unwrap(), RunOutcome::Interrupted);
        assert_eq!(obs.ends.len(), 1);
        assert_eq!(obs.ends[0].0, Tick(21));
        assert_eq!(obs.ends[0].1.total_time_steps, 21);
        assert!(sim.stop_signal().is_stopped());

        // a handle that outlives the reset still reaches the next run
        let handle = sim.stop_signal();
        sim.reset(6).unwrap();
        handle.stop();
        assert_eq!(sim.run(&mut NoopObserver).unwrap(), RunOutcome::Interrupted);
        assert_eq!(sim.ctx.stats.total_time_steps, 0);
    }

    #[test]
    fn reset_rearms_the_stop_signal() {
        let mut sim = sim_with(MachineParams::default(), 0.1, 3);
        sim.stop_signal().stop();
        assert_eq!(sim.run(&mut NoopObserver).unwrap(), RunOutcome::Interrupted);
        sim.reset(4).unwrap();
        assert_eq!(sim.run(&mut NoopObserver).unwrap(), RunOutcome::Completed);
        assert_eq!(sim.ctx.stats.total_time_steps, 10);
    }

    #[test]
    fn snapshot_lists_every_rail_and_slider() {
        let sim = sim_with(still_params(), 1.0, 3);
        let snap = sim.snapshot();
        assert_eq!(snap.rails.len(), 12);
        assert_eq!(snap.sliders.len(), 24);
        assert!(snap.rails.iter().all(|&p| p == RailPhase::CanPick));
    }
}
