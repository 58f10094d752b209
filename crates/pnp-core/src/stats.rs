//! Counters accumulated over one simulation run.
//!
//! `RunStats` is owned by the simulation context and lent mutably to the
//! lane set (retirement, completion) and the machine (workload, per-slider
//! placements).  A fresh value is created for every run; nothing survives a
//! reset.

use serde::{Deserialize, Serialize};

use crate::Tick;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub seed:           u64,
    pub pre_move:       bool,
    pub state_bouncing: bool,

    /// Picks that left the in-feed lanes without being picked.
    pub missed_picks: u64,
    /// Drop slots that left the out-feed lanes without being filled.
    pub missed_drops: u64,
    /// Packages retired with at least one slot not filled.
    pub unfilled_packages: u64,

    /// Good picks removed from the in-feed lanes, picked or retired.
    pub total_picks:    u64,
    /// Drop slots retired from the out-feed lanes.
    pub total_drops:    u64,
    /// Packages retired from the out-feed lanes.
    pub total_packages: u64,

    pub time_missed_picks: Vec<Tick>,
    pub time_missed_drops: Vec<Tick>,

    /// Ticks each slider spent travelling or in its vertical dwell.
    pub workload:        Vec<u64>,
    /// Completed pick-and-place cycles per slider.
    pub pick_per_slider: Vec<u64>,
    /// Peak speed (mm/s) observed per slider.
    pub peak_speed:      Vec<f64>,
    /// Peak acceleration (mm/s²) observed per slider.
    pub peak_accel:      Vec<f64>,

    /// Tick at which the in-feed has travelled one full lane length.
    pub start_recording_in:  Option<Tick>,
    /// Tick at which the out-feed has travelled one full lane length.
    pub start_recording_out: Option<Tick>,

    pub total_time_steps: u64,
}

impl RunStats {
    pub fn new(seed: u64, pre_move: bool, state_bouncing: bool, slider_count: usize) -> Self {
        Self {
            seed,
            pre_move,
            state_bouncing,
            workload:        vec![0; slider_count],
            pick_per_slider: vec![0; slider_count],
            peak_speed:      vec![0.0; slider_count],
            peak_accel:      vec![0.0; slider_count],
            ..Self::default()
        }
    }

    pub fn record_missed_pick(&mut self, now: Tick) {
        self.missed_picks += 1;
        self.time_missed_picks.push(now);
    }

    pub fn record_missed_drop(&mut self, now: Tick) {
        self.missed_drops += 1;
        self.time_missed_drops.push(now);
    }

    /// Fraction of retired packages that left completely filled.
    /// `1.0` before any package has retired.
    pub fn fill_rate(&self) -> f64 {
        if self.total_packages == 0 {
            return 1.0;
        }
        1.0 - self.unfilled_packages as f64 / self.total_packages as f64
    }

    /// Completed pick-and-place cycles across all sliders.
    pub fn placed(&self) -> u64 {
        self.pick_per_slider.iter().sum()
    }
}
