//! Unit tests for pnp-core primitives.

#[cfg(test)]
mod ids {
    use crate::{PickId, RailId, SliderId};

    #[test]
    fn index_roundtrip() {
        let id = PickId(42);
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(PickId::INVALID.0, u32::MAX);
        assert_eq!(SliderId::INVALID.0, u16::MAX);
        assert!(RailId::INVALID > RailId(11));
    }

    #[test]
    fn display() {
        assert_eq!(SliderId(7).to_string(), "SliderId(7)");
    }
}

#[cfg(test)]
mod geom {
    use crate::{Vec2, Vec3};

    #[test]
    fn within_is_strict_on_both_axes() {
        let a = Vec2::new(10.0, 10.0);
        assert!(a.within(Vec2::new(11.0, 9.0), 1.5));
        assert!(!a.within(Vec2::new(11.5, 10.0), 1.5));
        assert!(!a.within(Vec2::new(10.0, 12.0), 1.5));
    }

    #[test]
    fn vector_ops() {
        let mut p = Vec2::new(1.0, 2.0);
        p += Vec2::new(0.5, -1.0) * 2.0;
        assert_eq!(p, Vec2::new(2.0, 0.0));
        assert_eq!(p.with_z(3.0).xy(), p);
        assert_eq!(Vec3::new(-4.0, 2.0, 3.0).max_abs(), 4.0);
    }
}

#[cfg(test)]
mod time {
    use crate::time::ticks_for_secs;
    use crate::{RunConfig, SimClock, Tick};

    #[test]
    fn since_saturates() {
        assert_eq!(Tick(15).since(Tick(10)), 5);
        assert_eq!(Tick(3).since(Tick(5)), 0);
        assert_eq!(Tick(7).to_string(), "T7");
    }

    #[test]
    fn clock_elapsed() {
        let mut clock = SimClock::new(0.01);
        clock.advance();
        clock.advance();
        assert!((clock.elapsed_secs() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn exact_multiples_do_not_round_up() {
        assert_eq!(ticks_for_secs(0.15, 0.01), 15);
        assert_eq!(ticks_for_secs(60.0, 0.01), 6000);
        assert_eq!(ticks_for_secs(0.151, 0.01), 16);
        assert_eq!(ticks_for_secs(0.0, 0.01), 0);
    }

    #[test]
    fn run_config_end_tick() {
        let cfg = RunConfig::new(1.0, 0.01, 7);
        assert_eq!(cfg.end_tick(), Tick(100));
        assert_eq!(cfg.seed, 7);
        assert!(!cfg.pre_move);
    }
}

#[cfg(test)]
mod rng {
    use crate::{LaneId, LaneRng, SimRng};

    #[test]
    fn lane_streams_are_deterministic() {
        let mut a = LaneRng::in_feed(42, LaneId(0));
        let mut b = LaneRng::in_feed(42, LaneId(0));
        for _ in 0..20 {
            assert_eq!(a.gaussian(1.0), b.gaussian(1.0));
        }
    }

    #[test]
    fn lanes_draw_independent_streams() {
        let mut a = LaneRng::in_feed(42, LaneId(0));
        let mut b = LaneRng::in_feed(42, LaneId(1));
        let xs: Vec<f64> = (0..5).map(|_| a.gaussian(1.0)).collect();
        let ys: Vec<f64> = (0..5).map(|_| b.gaussian(1.0)).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn gaussian_moments() {
        let mut rng = LaneRng::in_feed(1, LaneId(3));
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| rng.gaussian(2.0)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.1, "mean {mean}");
        assert!((var.sqrt() - 2.0).abs() < 0.1, "std {}", var.sqrt());
    }

    #[test]
    fn zero_std_dev_is_exact() {
        let mut rng = LaneRng::in_feed(1, LaneId(0));
        assert_eq!(rng.gaussian(0.0), 0.0);
    }

    #[test]
    fn run_seeds_fit_32_bits() {
        let mut rng = SimRng::new(9);
        for _ in 0..100 {
            assert!(rng.next_run_seed() <= u32::MAX as u64);
        }
    }
}

#[cfg(test)]
mod policy {
    use crate::{PnpError, RowPattern, SchedulingPolicy};

    #[test]
    fn parses_known_names() {
        assert_eq!("FIFO".parse::<SchedulingPolicy>().unwrap(), SchedulingPolicy::Fifo);
        assert_eq!("LPT".parse::<SchedulingPolicy>().unwrap(), SchedulingPolicy::Lpt);
        assert_eq!("staggered".parse::<RowPattern>().unwrap(), RowPattern::Staggered);
    }

    #[test]
    fn every_listed_policy_is_selectable_by_name() {
        for policy in SchedulingPolicy::ALL {
            assert_eq!(policy.as_str().parse::<SchedulingPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn split_conveyor_is_not_implemented() {
        let err = "splitConveyor".parse::<SchedulingPolicy>().unwrap_err();
        assert!(matches!(err, PnpError::PolicyNotImplemented(_)));
    }

    #[test]
    fn unknown_names_are_distinct_errors() {
        assert!(matches!(
            "EDF".parse::<SchedulingPolicy>().unwrap_err(),
            PnpError::UnknownPolicy(_)
        ));
        assert!(matches!(
            "zigzag".parse::<RowPattern>().unwrap_err(),
            PnpError::UnknownPattern(_)
        ));
    }
}

#[cfg(test)]
mod stats {
    use crate::{RunStats, Tick};

    #[test]
    fn fill_rate() {
        let mut s = RunStats::new(0, false, false, 4);
        assert_eq!(s.fill_rate(), 1.0);
        s.total_packages = 4;
        s.unfilled_packages = 1;
        assert!((s.fill_rate() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn missed_records_timestamps() {
        let mut s = RunStats::new(0, false, false, 2);
        s.record_missed_pick(Tick(5));
        s.record_missed_drop(Tick(6));
        assert_eq!(s.missed_picks, 1);
        assert_eq!(s.time_missed_picks, vec![Tick(5)]);
        assert_eq!(s.time_missed_drops, vec![Tick(6)]);
        assert_eq!(s.workload.len(), 2);
    }
}

#[cfg(test)]
mod params {
    use crate::{MachineParams, PnpError, SchedulingPolicy};

    #[test]
    fn reference_line_is_valid() {
        let p = MachineParams::default();
        p.validate().unwrap();
        assert_eq!(p.rail_count(), 12);
        assert_eq!(p.slider_count(), 24);
        assert!((p.conveyor.in_end_pos[0][1] - 293.5).abs() < 1e-9);
        assert!((p.conveyor.in_end_pos[1][1] - 1020.5).abs() < 1e-9);
        assert!((p.conveyor.out_end_pos[0][1] - 657.0).abs() < 1e-9);
    }

    #[test]
    fn balanced_out_speed_matches_flow() {
        let p = MachineParams::default();
        let c = &p.conveyor;
        // 12 items × 0.8 good / 60 mm  ==  4 slots × 3 rows / 180 mm
        let expected = c.speed[0] * 12.0 * 0.8 * 180.0 / (60.0 * 4.0 * 3.0);
        assert!((c.speed[1] - expected).abs() < 1e-9);
    }

    #[test]
    fn json_roundtrip_with_unknown_keys() {
        let p = MachineParams::default();
        let mut v = serde_json::to_value(&p).unwrap();
        v["unit"] = serde_json::json!({ "speed": "mm/s" });
        v["conveyor"]["isSingleColor"] = serde_json::json!(true);
        let back = MachineParams::from_reader(v.to_string().as_bytes()).unwrap();
        assert_eq!(back.beam, p.beam);
        assert_eq!(back.slider, p.slider);
        assert_eq!(back.conveyor.in_items_per_row, p.conveyor.in_items_per_row);
        assert!((back.conveyor.speed[1] - p.conveyor.speed[1]).abs() < 1e-9);
        back.validate().unwrap();
    }

    #[test]
    fn missing_parameter_is_parse_error() {
        let err = MachineParams::from_reader(r#"{ "timeStep": 0.01 }"#.as_bytes()).unwrap_err();
        assert!(matches!(err, PnpError::Parse(_)));
    }

    #[test]
    fn out_policies_default_to_reversed_list() {
        let mut p = MachineParams::default();
        p.beam.scheduling = vec!["FIFO", "LIFO", "SPT", "LPT", "FIFO", "SPT"]
            .into_iter()
            .map(String::from)
            .collect();
        let pol = p.beam_policies().unwrap();
        assert_eq!(pol[0], (SchedulingPolicy::Fifo, SchedulingPolicy::Spt));
        assert_eq!(pol[1], (SchedulingPolicy::Lifo, SchedulingPolicy::Fifo));
        assert_eq!(pol[3], (SchedulingPolicy::Lpt, SchedulingPolicy::Spt));
    }

    #[test]
    fn unimplemented_policy_rejected() {
        let mut p = MachineParams::default();
        p.beam.scheduling[2] = "splitConveyor".into();
        assert!(matches!(p.validate(), Err(PnpError::PolicyNotImplemented(_))));
    }

    #[test]
    fn unknown_pattern_rejected() {
        let mut p = MachineParams::default();
        p.conveyor.in_pattern = "hexagonal".into();
        assert!(matches!(p.validate(), Err(PnpError::UnknownPattern(_))));
    }

    #[test]
    fn inconsistent_lane_tables_rejected() {
        let mut p = MachineParams::default();
        p.conveyor.in_width.pop();
        assert!(matches!(p.validate(), Err(PnpError::Config(_))));

        let mut p = MachineParams::default();
        p.beam.workspace_side[0] = 5;
        assert!(matches!(p.validate(), Err(PnpError::Config(_))));

        let mut p = MachineParams::default();
        p.conveyor.in_direction = [0.0, 1.0];
        assert!(matches!(p.validate(), Err(PnpError::Config(_))));
    }

    #[test]
    fn world_limits_swap_plane_axes() {
        let p = MachineParams::default();
        assert_eq!(p.slider.world_velocity(), [5000.0, 2500.0, 5000.0]);
        assert_eq!(p.slider.world_jerk(), Some([4.0e5, 2.5e5, 4.0e5]));
    }
}
