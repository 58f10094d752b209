//! Unit tests for pnp-machine.

#[cfg(test)]
mod helpers {
    use pnp_conveyor::ConveyorLaneSet;
    use pnp_core::{MachineParams, RunStats};

    use crate::Machine;

    /// Reference line with both feeds stopped.
    pub fn params() -> MachineParams {
        let mut p = MachineParams::default();
        p.conveyor.speed = [0.0, 0.0];
        p
    }

    pub fn world() -> (Machine, ConveyorLaneSet, RunStats) {
        let p = params();
        let machine = Machine::from_params(&p).unwrap();
        let lanes = ConveyorLaneSet::from_params(&p, 1).unwrap();
        let stats = RunStats::new(1, false, false, p.slider_count());
        (machine, lanes, stats)
    }
}

#[cfg(test)]
mod layout {
    use super::helpers::world;
    use crate::{RailPhase, SliderStatus};
    use pnp_core::{BeamId, LaneId, RailId, SliderId, Vec3};

    #[test]
    fn arena_sizes_and_ids() {
        let (m, _, _) = world();
        assert_eq!(m.beams().len(), 6);
        assert_eq!(m.rails().len(), 12);
        assert_eq!(m.sliders().len(), 24);
        let rail = m.rail(RailId(3));
        assert_eq!(rail.beam, BeamId(1));
        assert_eq!(rail.sliders, [SliderId(6), SliderId(7)]);
        assert_eq!(rail.side, 1.0);
        assert_eq!(m.slider(SliderId(7)).index, 1);
        assert!(m.rails().iter().all(|r| r.phase == RailPhase::CanPick && r.bouncing.is_none()));
        assert!(m.sliders().iter().all(|s| s.status == SliderStatus::Idle && s.tracked.is_none()));
    }

    #[test]
    fn envelopes_follow_beam_and_reach() {
        let (m, _, _) = world();
        // beam 1 at x = 1020; half width 50 + reach offset 40, reach 100
        let left = m.rail_slider(RailId(2), 0);
        let right = m.rail_slider(RailId(3), 1);
        assert_eq!((left.min.x, left.max.x), (830.0, 930.0));
        assert_eq!((right.min.x, right.max.x), (1110.0, 1210.0));
        assert_eq!(left.min.y, 0.0);
        assert!((left.max.y - (1020.5 + 387.0)).abs() < 1e-9);
        assert_eq!(left.max.z, 100.0);
    }

    #[test]
    fn sliders_start_at_rest_beside_the_beam() {
        let (m, _, _) = world();
        let s0 = m.rail_slider(RailId(2), 0);
        let s1 = m.rail_slider(RailId(2), 1);
        assert_eq!(s0.position(), Vec3::new(860.0, 100.0, 0.0));
        assert_eq!(s1.position(), Vec3::new(860.0, 350.0, 0.0));
        assert_eq!(s0.target, s0.position());
        assert!(s0.state.is_settled(0.0));
    }

    #[test]
    fn beams_serve_their_lanes() {
        let (m, _, _) = world();
        assert_eq!(m.beam(BeamId(0)).in_lane, LaneId(0));
        assert_eq!(m.beam(BeamId(5)).in_lane, LaneId(1));
        assert!(m.beams().iter().all(|b| b.out_lane == LaneId(0)));
        assert_eq!(m.beam_of(RailId(11)).id, BeamId(5));
    }
}

#[cfg(test)]
mod moves {
    use super::helpers::world;
    use crate::{RailPhase, SliderStatus, Task};
    use pnp_conveyor::TargetRef;
    use pnp_core::{LaneId, PickId, RailId, Vec2};

    #[test]
    fn park_above_and_below_sibling() {
        let (mut m, _, _) = world();
        let rail = RailId(0);
        m.park(rail, 1);
        let s1 = m.rail_slider(rail, 1);
        assert_eq!(s1.status, SliderStatus::SkipNWait);
        assert_eq!(s1.target.y, 100.0 + 130.0);
        assert_eq!(s1.target.x, s1.position().x);

        m.rail_slider_mut(rail, 1).target.y = 600.0;
        m.park(rail, 0);
        assert_eq!(m.rail_slider(rail, 0).target.y, 600.0 - 130.0);
    }

    #[test]
    fn park_keeps_sidelined_status_and_clears_tracking() {
        let (mut m, _, _) = world();
        let rail = RailId(4);
        let s = m.rail_slider_mut(rail, 0);
        s.status = SliderStatus::Waiting;
        s.tracked = Some(TargetRef::Pick { lane: LaneId(0), id: PickId(3) });
        m.park(rail, 0);
        assert_eq!(m.rail_slider(rail, 0).status, SliderStatus::Waiting);
        assert!(m.rail_slider(rail, 0).tracked.is_none());
    }

    #[test]
    fn bounce_swaps_waiting() {
        let (mut m, _, _) = world();
        let rail = RailId(1);
        m.rail_slider_mut(rail, 0).status = SliderStatus::Waiting;
        m.bounce(rail, RailPhase::CanPlace);
        assert_eq!(m.rail(rail).phase, RailPhase::CanPlace);
        assert_eq!(m.rail_slider(rail, 0).status, SliderStatus::Idle);
        assert_eq!(m.rail_slider(rail, 1).status, SliderStatus::Waiting);

        m.bounce(rail, RailPhase::CanPick);
        assert_eq!(m.rail_slider(rail, 0).status, SliderStatus::Waiting);
        assert_eq!(m.rail_slider(rail, 1).status, SliderStatus::Idle);
    }

    #[test]
    fn bounce_without_waiting_only_flips_phase() {
        let (mut m, _, _) = world();
        m.bounce(RailId(1), RailPhase::CanPlace);
        assert_eq!(m.rail_slider(RailId(1), 0).status, SliderStatus::Idle);
        assert_eq!(m.rail_slider(RailId(1), 1).status, SliderStatus::Idle);
    }

    #[test]
    fn commit_clamps_into_reach() {
        let (mut m, _, _) = world();
        let target = TargetRef::Pick { lane: LaneId(0), id: PickId(1) };
        let s = m.rail_slider_mut(RailId(0), 0);
        s.commit(target, Vec2::new(9999.0, 250.0), Task::Pick);
        assert_eq!(s.target.x, s.max.x);
        assert_eq!(s.target.y, 250.0);
        assert_eq!(s.status, SliderStatus::Picking);
        assert_eq!(m.tracker_of(target), Some(m.rail(RailId(0)).sliders[0]));
    }

    #[test]
    fn pre_move_straddles_next_lane() {
        let (mut m, _, _) = world();
        m.pre_move(RailId(0), Task::Pick);
        let (s0, s1) = (m.rail_slider(RailId(0), 0), m.rail_slider(RailId(0), 1));
        // in-feed flows toward −x: upstream end of the envelope is max.x
        assert_eq!(s0.target.x, s0.max.x);
        assert!((s0.target.y - (293.5 - 70.0)).abs() < 1e-9);
        assert!((s1.target.y - (293.5 + 70.0)).abs() < 1e-9);

        m.pre_move(RailId(0), Task::Place);
        assert!((m.rail_slider(RailId(0), 1).target.y - (657.0 + 70.0)).abs() < 1e-9);
    }
}

#[cfg(test)]
mod cycle {
    use super::helpers::world;
    use crate::{CycleFlags, MachineError, RailPhase, SliderStatus, Task};
    use pnp_conveyor::{DropStatus, PickStatus, TargetRef};
    use pnp_core::{LaneId, PickId, RailId, Tick};

    const FLAGS: CycleFlags = CycleFlags { pre_move: false, state_bouncing: false };

    #[test]
    fn pick_dwell_then_rail_moves_on() {
        let (mut m, mut lanes, mut stats) = world();
        let rail = RailId(0);
        let here = m.rail_slider(rail, 0).position().xy();
        let pick = lanes.in_lane_mut(LaneId(0)).unwrap().insert_pick(here, PickStatus::Free);
        let target = TargetRef::Pick { lane: LaneId(0), id: pick };
        assert!(lanes.mark_assigned(target));
        m.rail_slider_mut(rail, 0).commit(target, here, Task::Pick);
        m.rail_mut(rail).phase = RailPhase::Picking;

        m.advance_states(Tick(0), &mut lanes, &mut stats, FLAGS).unwrap();
        assert_eq!(m.rail_slider(rail, 0).status, SliderStatus::ZMovement);
        assert!(lanes.position_of(target).is_none());
        assert_eq!(stats.total_picks, 1);
        assert_eq!(m.tracker_of(target), None);

        // 0.15 s at 0.01 s per tick
        for t in 1..=15 {
            m.advance_states(Tick(t), &mut lanes, &mut stats, FLAGS).unwrap();
            assert_eq!(m.rail_slider(rail, 0).status, SliderStatus::ZMovement, "tick {t}");
            assert_eq!(m.rail(rail).phase, RailPhase::Picking);
        }
        m.advance_states(Tick(16), &mut lanes, &mut stats, FLAGS).unwrap();
        assert_eq!(m.rail_slider(rail, 0).status, SliderStatus::Idle);
        assert_eq!(m.rail(rail).phase, RailPhase::CanPlace);
        assert_eq!(stats.workload[0], 16);
    }

    #[test]
    fn placing_marks_slot_done_and_counts() {
        let (mut m, mut lanes, mut stats) = world();
        let rail = RailId(2);
        let here = m.rail_slider(rail, 1).position().xy();
        let slot = lanes.out_lane_mut(LaneId(0)).unwrap().insert_drop(here, DropStatus::Assigned);
        let target = TargetRef::Drop { lane: LaneId(0), id: slot };
        m.rail_slider_mut(rail, 1).commit(target, here, Task::Place);
        m.rail_mut(rail).phase = RailPhase::Placing;

        m.advance_states(Tick(0), &mut lanes, &mut stats, FLAGS).unwrap();
        let id = m.rail(rail).sliders[1];
        assert_eq!(m.slider(id).status, SliderStatus::ZMovement);
        assert_eq!(stats.pick_per_slider[id.index()], 1);
        let done = lanes.out_lane(LaneId(0)).unwrap().drop_slot(slot).unwrap();
        assert_eq!(done.status, DropStatus::Done);
    }

    #[test]
    fn engaged_slider_waits_for_its_item() {
        let (mut m, mut lanes, mut stats) = world();
        let rail = RailId(0);
        let here = m.rail_slider(rail, 0).position().xy();
        let mut away = here;
        away.x += 20.0;
        let pick = lanes.in_lane_mut(LaneId(0)).unwrap().insert_pick(away, PickStatus::Assigned);
        m.rail_slider_mut(rail, 0).commit(TargetRef::Pick { lane: LaneId(0), id: pick }, here, Task::Pick);
        m.rail_mut(rail).phase = RailPhase::Picking;

        m.advance_states(Tick(0), &mut lanes, &mut stats, FLAGS).unwrap();
        assert_eq!(m.rail_slider(rail, 0).status, SliderStatus::Picking);
        assert_eq!(stats.workload[0], 1);
        assert_eq!(stats.total_picks, 0);
    }

    #[test]
    fn cross_phase_is_a_violation() {
        let (mut m, mut lanes, mut stats) = world();
        let rail = RailId(0);
        let here = m.rail_slider(rail, 0).position().xy();
        let pick = lanes.in_lane_mut(LaneId(0)).unwrap().insert_pick(here, PickStatus::Assigned);
        m.rail_slider_mut(rail, 0).commit(TargetRef::Pick { lane: LaneId(0), id: pick }, here, Task::Pick);
        m.rail_mut(rail).phase = RailPhase::Placing;

        let err = m.advance_states(Tick(0), &mut lanes, &mut stats, FLAGS).unwrap_err();
        match err {
            MachineError::InvariantViolation(v) => {
                assert_eq!(v.rail, rail);
                assert_eq!(v.status, SliderStatus::Picking);
                assert_eq!(v.phase, RailPhase::Placing);
                assert!(v.to_string().contains("SliderId(0)"));
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn vanished_target_releases_slider() {
        let (mut m, mut lanes, mut stats) = world();
        let rail = RailId(0);
        let here = m.rail_slider(rail, 0).position().xy();
        m.rail_slider_mut(rail, 0).commit(
            TargetRef::Pick { lane: LaneId(0), id: PickId(12345) },
            here,
            Task::Pick,
        );
        m.rail_mut(rail).phase = RailPhase::Picking;

        m.advance_states(Tick(0), &mut lanes, &mut stats, FLAGS).unwrap();
        assert_eq!(m.rail_slider(rail, 0).status, SliderStatus::Idle);
        assert!(m.rail_slider(rail, 0).tracked.is_none());
        assert_eq!(m.rail(rail).phase, RailPhase::CanPlace);
    }

    #[test]
    fn skip_n_wait_repeats_and_repairs() {
        let (mut m, mut lanes, mut stats) = world();
        let rail = RailId(0);
        m.rail_slider_mut(rail, 1).status = SliderStatus::SkipNWait;
        m.rail_mut(rail).phase = RailPhase::Picking;
        let flags = CycleFlags { pre_move: false, state_bouncing: true };

        m.advance_states(Tick(0), &mut lanes, &mut stats, flags).unwrap();
        let r = m.rail(rail);
        assert_eq!(r.phase, RailPhase::CanPick);
        assert_eq!(r.bouncing, Some(RailPhase::CanPick));
        assert_eq!(m.rail_slider(rail, 0).status, SliderStatus::Waiting);
        assert_eq!(m.rail_slider(rail, 1).status, SliderStatus::Idle);
    }

    #[test]
    fn skip_n_wait_without_bouncing_leaves_flag_clear() {
        let (mut m, mut lanes, mut stats) = world();
        let rail = RailId(5);
        m.rail_slider_mut(rail, 0).status = SliderStatus::SkipNWait;
        m.rail_mut(rail).phase = RailPhase::Placing;

        m.advance_states(Tick(0), &mut lanes, &mut stats, FLAGS).unwrap();
        assert_eq!(m.rail(rail).phase, RailPhase::CanPlace);
        assert_eq!(m.rail(rail).bouncing, None);
        assert_eq!(m.rail_slider(rail, 0).status, SliderStatus::Idle);
        assert_eq!(m.rail_slider(rail, 1).status, SliderStatus::Waiting);
    }

    #[test]
    fn skipped_holds_through_picking_only() {
        let (mut m, mut lanes, mut stats) = world();
        let rail = RailId(0);
        m.rail_slider_mut(rail, 0).status = SliderStatus::Skipped;
        m.rail_slider_mut(rail, 1).status = SliderStatus::ZMovement;
        m.rail_mut(rail).phase = RailPhase::Picking;
        m.advance_states(Tick(0), &mut lanes, &mut stats, FLAGS).unwrap();
        assert_eq!(m.rail_slider(rail, 0).status, SliderStatus::Skipped);

        m.rail_mut(rail).phase = RailPhase::Placing;
        m.advance_states(Tick(1), &mut lanes, &mut stats, FLAGS).unwrap();
        assert_eq!(m.rail_slider(rail, 0).status, SliderStatus::Idle);
    }

    #[test]
    fn ready_rails_leave_sliders_alone() {
        let (mut m, mut lanes, mut stats) = world();
        m.rail_slider_mut(RailId(0), 0).status = SliderStatus::Waiting;
        m.advance_states(Tick(0), &mut lanes, &mut stats, FLAGS).unwrap();
        assert_eq!(m.rail_slider(RailId(0), 0).status, SliderStatus::Waiting);
        assert_eq!(m.rail(RailId(0)).phase, RailPhase::CanPick);
    }

    #[test]
    fn pre_move_on_phase_change() {
        let (mut m, mut lanes, mut stats) = world();
        let rail = RailId(1);
        m.rail_mut(rail).phase = RailPhase::Placing;
        let flags = CycleFlags { pre_move: true, state_bouncing: false };
        m.advance_states(Tick(0), &mut lanes, &mut stats, flags).unwrap();
        assert_eq!(m.rail(rail).phase, RailPhase::CanPick);
        let s0 = m.rail_slider(rail, 0);
        assert!((s0.target.y - 223.5).abs() < 1e-9);
        assert_eq!(s0.target.x, s0.max.x);
    }
}

#[cfg(test)]
mod kinematics {
    use super::helpers::{params, world};
    use pnp_core::{RailId, SliderId};
    use pnp_motion::{KinematicLimits, TrapezoidalOracle};

    #[test]
    fn sliders_move_toward_targets_and_peaks_record() {
        let (mut m, _, mut stats) = world();
        let oracle = TrapezoidalOracle::new(KinematicLimits::from_params(&params().slider).unwrap());
        m.rail_slider_mut(RailId(0), 0).target.y = 300.0;
        for _ in 0..10 {
            m.step_kinematics(&oracle, 0.01);
            m.record_peaks(&mut stats);
        }
        let s = m.slider(SliderId(0));
        assert!(s.position().y > 100.0 && s.position().y < 300.0);
        assert!(stats.peak_speed[0] > 0.0);
        assert!(stats.peak_accel[0] > 0.0);
        // untouched sliders stay put
        assert_eq!(stats.peak_speed[1], 0.0);
        assert_eq!(m.slider(SliderId(1)).position().y, 350.0);
    }
}
