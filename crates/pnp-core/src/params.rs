//! Machine parameters: JSON layout, reference defaults, and validation.
//!
//! The on-disk layout is the camelCase JSON document used by the line's
//! tooling (`timeStep`, `duration`, `seed`, `conveyor`, `slider`, `beam`,
//! `target`).  Unknown keys (units tables, display-only offsets) are ignored.
//!
//! # Axis conventions
//!
//! Lanes must flow along x (`inDirection`/`outDirection` = `[±1, 0]`) and
//! beams must run along +y (`beam.direction` = `[0, 1]`).  Slider limits are
//! written `[beamAxis, armAxis, vertical]`; [`SliderParams::world_velocity`]
//! and friends return them in world `[x, y, z]` order.
//!
//! Validation is a separate step ([`MachineParams::validate`]) so a document
//! can be loaded, edited by a batch driver, and validated once per run.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{PnpError, PnpResult, RowPattern, RunConfig, SchedulingPolicy};

// ── Defaults ──────────────────────────────────────────────────────────────────

fn default_pattern() -> String {
    RowPattern::Aligned.as_str().to_owned()
}

fn default_jitter() -> f64 {
    0.5_f64.sqrt()
}

fn default_direction() -> [f64; 2] {
    [-1.0, 0.0]
}

fn default_beam_direction() -> [f64; 2] {
    [0.0, 1.0]
}

fn default_x_offset() -> f64 {
    100.0
}

fn default_sliders_per_rail() -> usize {
    2
}

fn default_z_move_time() -> f64 {
    0.15
}

fn default_rail_offset() -> f64 {
    160.0
}

fn default_initial_spacing() -> f64 {
    250.0
}

// ── MachineParams ─────────────────────────────────────────────────────────────

/// Complete description of one line and its run-level switches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineParams {
    /// Seconds per tick.
    pub time_step: f64,
    /// Simulated seconds per run.
    pub duration:  f64,
    #[serde(default)]
    pub seed:      u64,

    #[serde(default)]
    pub pre_move:       bool,
    #[serde(default)]
    pub state_bouncing: bool,
    /// Set a rail's bouncing flag after this many consecutive empty passes.
    #[serde(default)]
    pub bounce_after_starved_passes: Option<u32>,

    pub conveyor: ConveyorParams,
    pub slider:   SliderParams,
    pub beam:     BeamParams,
    pub target:   TargetParams,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConveyorParams {
    /// `[in, out]` belt speeds, mm/s.
    pub speed:  [f64; 2],
    pub length: f64,

    pub nb_in_conveyor:  usize,
    pub nb_out_conveyor: usize,
    #[serde(default = "default_direction")]
    pub in_direction:    [f64; 2],
    #[serde(default = "default_direction")]
    pub out_direction:   [f64; 2],

    pub in_items_per_row: Vec<usize>,
    pub in_width:         Vec<f64>,
    /// Downstream end of each in-feed lane: `[x_end, y_center]`.
    pub in_end_pos:       Vec<[f64; 2]>,
    pub in_row_spacing:   f64,
    #[serde(default = "default_pattern")]
    pub in_pattern:       String,
    #[serde(default = "default_jitter")]
    pub jitter_std_dev:   f64,
    pub bad_product_ratio: f64,
    pub error_margin:      f64,
    /// Beam-axis offset of the first slider's parking position.
    #[serde(default = "default_x_offset")]
    pub x_offset:          f64,

    pub out_items_per_row: Vec<usize>,
    pub out_width:         Vec<f64>,
    pub out_end_pos:       Vec<[f64; 2]>,

    pub n_packages_row:          usize,
    pub packages_row_splitting:  bool,
    #[serde(default)]
    pub packages_row_split_spacing: f64,
    pub packages_row_spacing:    f64,
    #[serde(default)]
    pub packages_extra_spacing:  f64,
    #[serde(default)]
    pub drop_side_offset:        f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliderParams {
    /// `[beamAxis, armAxis, vertical]` max speed, mm/s.
    pub speed: [f64; 3],
    /// `[beamAxis, armAxis, vertical]` max acceleration, mm/s².
    pub accel: [f64; 3],
    /// `[beamAxis, armAxis, vertical]` max jerk, mm/s³.  Absent = unlimited.
    #[serde(default, rename = "max_jerk")]
    pub max_jerk: Option<[f64; 3]>,

    pub width:        f64,
    pub reach:        f64,
    pub reach_offset: f64,
    pub depth:        f64,
    pub safety_margin: f64,
    #[serde(default = "default_sliders_per_rail")]
    pub sliders_per_rail: usize,

    /// Vertical engage/release dwell, seconds.
    #[serde(default = "default_z_move_time")]
    pub z_move_time:     f64,
    /// Arm-axis distance from the beam centre to a slider's start position.
    #[serde(default = "default_rail_offset")]
    pub rail_offset:     f64,
    /// Beam-axis spacing between the two sliders' start positions.
    #[serde(default = "default_initial_spacing")]
    pub initial_spacing: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeamParams {
    pub spacing:     f64,
    pub width:       f64,
    pub length:      f64,
    pub nb_of_beams: usize,
    /// In-feed lane served by each beam.
    pub workspace_side: Vec<usize>,
    /// Out-feed lane served by each beam.  Absent = lane 0 for every beam.
    #[serde(default)]
    pub out_workspace_side: Option<Vec<usize>>,
    /// In-feed policy per beam.
    pub scheduling:     Vec<String>,
    /// Out-feed policy per beam.  Absent = `scheduling` read back to front.
    #[serde(default)]
    pub out_scheduling: Option<Vec<String>>,
    #[serde(default = "default_beam_direction")]
    pub direction:      [f64; 2],
    pub first_beam_pos: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetParams {
    pub width: f64,
}

// ── Reference line ────────────────────────────────────────────────────────────

impl Default for MachineParams {
    /// Two in-feed lanes of six items per row, one out-feed lane of three-row
    /// split packages, six beams at 420 mm pitch, FIFO everywhere.  The
    /// out-feed speed is balanced against the in-feed flow.
    fn default() -> Self {
        let x_offset = default_x_offset();
        let conveyor_offset = 25.0;
        let in_speed = 4250.0 / 60.0;

        let in_end_pos = (0..2)
            .map(|i| {
                let i = i as f64;
                [0.0, 387.0 / 2.0 + i * 677.0 + conveyor_offset * i * 2.0 + x_offset]
            })
            .collect();

        let mut params = MachineParams {
            time_step: 0.01,
            duration:  60.0,
            seed:      0,
            pre_move:       false,
            state_bouncing: false,
            bounce_after_starved_passes: None,
            conveyor: ConveyorParams {
                speed:  [in_speed, 0.0],
                length: 3000.0,
                nb_in_conveyor:  2,
                nb_out_conveyor: 1,
                in_direction:  default_direction(),
                out_direction: default_direction(),
                in_items_per_row: vec![6, 6],
                in_width:         vec![387.0, 387.0],
                in_end_pos,
                in_row_spacing:   60.0,
                in_pattern:       default_pattern(),
                jitter_std_dev:   default_jitter(),
                bad_product_ratio: 0.2,
                error_margin:      1.5,
                x_offset,
                out_items_per_row: vec![4],
                out_width:         vec![290.0],
                out_end_pos:       vec![[0.0, 387.0 + 290.0 / 2.0 + x_offset + conveyor_offset]],
                n_packages_row:    3,
                packages_row_splitting:     true,
                packages_row_split_spacing: 40.0,
                packages_row_spacing:       60.0,
                packages_extra_spacing:     0.0,
                drop_side_offset:           50.0,
            },
            slider: SliderParams {
                speed: [2500.0, 5000.0, 5000.0],
                accel: [20.0e3, 40.0e3, 40.0e3],
                max_jerk: Some([2.5e5, 4.0e5, 4.0e5]),
                width:         120.0,
                reach:         100.0,
                reach_offset:  40.0,
                depth:         100.0,
                safety_margin: 10.0,
                sliders_per_rail: 2,
                z_move_time:      default_z_move_time(),
                rail_offset:      default_rail_offset(),
                initial_spacing:  default_initial_spacing(),
            },
            beam: BeamParams {
                spacing:     420.0,
                width:       100.0,
                length:      1300.0,
                nb_of_beams: 6,
                workspace_side:     vec![0, 0, 0, 1, 1, 1],
                out_workspace_side: None,
                scheduling:         vec!["FIFO".to_owned(); 6],
                out_scheduling:     None,
                direction:          default_beam_direction(),
                first_beam_pos:     600.0,
            },
            target: TargetParams { width: 50.0 },
        };
        params.conveyor.speed[1] = params.conveyor.balanced_out_speed(in_speed);
        params
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl MachineParams {
    /// Load from a JSON file.  The result is not validated.
    pub fn load_json(path: impl AsRef<Path>) -> PnpResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Load from any JSON reader (for testing and embedded data).
    pub fn from_reader<R: Read>(reader: R) -> PnpResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Driver configuration for one run of these parameters.
    pub fn run_config(&self) -> RunConfig {
        let mut cfg = RunConfig::new(self.duration, self.time_step, self.seed);
        cfg.pre_move = self.pre_move;
        cfg.state_bouncing = self.state_bouncing;
        cfg
    }

    pub fn rail_count(&self) -> usize {
        self.beam.nb_of_beams * 2
    }

    pub fn slider_count(&self) -> usize {
        self.rail_count() * self.slider.sliders_per_rail
    }

    /// Parsed `(in, out)` policy pair per beam.
    ///
    /// The out-feed policy of beam `i` defaults to `scheduling[n - 1 - i]`.
    pub fn beam_policies(&self) -> PnpResult<Vec<(SchedulingPolicy, SchedulingPolicy)>> {
        let n = self.beam.nb_of_beams;
        let ins = &self.beam.scheduling;
        let outs = self.beam.out_scheduling.as_ref();
        (0..n)
            .map(|i| {
                let pin = ins
                    .get(i)
                    .ok_or_else(|| PnpError::Config(format!("beam {i} has no scheduling policy")))?
                    .parse::<SchedulingPolicy>()?;
                let out_name = match outs {
                    Some(list) => list.get(i),
                    None => ins.get(n - 1 - i),
                };
                let pout = out_name
                    .ok_or_else(|| PnpError::Config(format!("beam {i} has no out-feed policy")))?
                    .parse::<SchedulingPolicy>()?;
                Ok((pin, pout))
            })
            .collect()
    }

    /// Out-feed lane served by beam `i`.
    pub fn out_lane_of_beam(&self, i: usize) -> usize {
        self.beam
            .out_workspace_side
            .as_ref()
            .and_then(|v| v.get(i).copied())
            .unwrap_or(0)
    }

    // ── Validation ────────────────────────────────────────────────────────

    /// Reject missing, inconsistent or unsupported parameters.
    ///
    /// Every check here is fatal for the run; the loop itself assumes a
    /// validated document.
    pub fn validate(&self) -> PnpResult<()> {
        positive("timeStep", self.time_step)?;
        positive("duration", self.duration)?;

        let c = &self.conveyor;
        positive("conveyor.length", c.length)?;
        positive("conveyor.inRowSpacing", c.in_row_spacing)?;
        positive("conveyor.packagesRowSpacing", c.packages_row_spacing)?;
        positive("conveyor.errorMargin", c.error_margin)?;
        non_negative("conveyor.speed[in]", c.speed[0])?;
        non_negative("conveyor.speed[out]", c.speed[1])?;
        non_negative("conveyor.packagesExtraSpacing", c.packages_extra_spacing)?;
        non_negative("conveyor.jitterStdDev", c.jitter_std_dev)?;
        if !(0.0..=1.0).contains(&c.bad_product_ratio) {
            return Err(PnpError::Config(format!(
                "conveyor.badProductRatio must lie in [0, 1], got {}",
                c.bad_product_ratio
            )));
        }
        flow_direction("conveyor.inDirection", c.in_direction)?;
        flow_direction("conveyor.outDirection", c.out_direction)?;
        if c.nb_in_conveyor == 0 || c.nb_out_conveyor == 0 {
            return Err(PnpError::Config(
                "at least one in-feed and one out-feed lane are required".into(),
            ));
        }
        lane_table("inItemsPerRow", c.in_items_per_row.len(), c.nb_in_conveyor)?;
        lane_table("inWidth", c.in_width.len(), c.nb_in_conveyor)?;
        lane_table("inEndPos", c.in_end_pos.len(), c.nb_in_conveyor)?;
        lane_table("outItemsPerRow", c.out_items_per_row.len(), c.nb_out_conveyor)?;
        lane_table("outWidth", c.out_width.len(), c.nb_out_conveyor)?;
        lane_table("outEndPos", c.out_end_pos.len(), c.nb_out_conveyor)?;
        if c.in_items_per_row.iter().chain(&c.out_items_per_row).any(|&n| n == 0) {
            return Err(PnpError::Config("items per row must be at least 1".into()));
        }
        if c.n_packages_row == 0 {
            return Err(PnpError::Config("conveyor.nPackagesRow must be at least 1".into()));
        }
        for (i, w) in c.in_width.iter().enumerate() {
            if *w < self.target.width {
                return Err(PnpError::Config(format!(
                    "in-feed lane {i} is narrower ({w} mm) than an item ({} mm)",
                    self.target.width
                )));
            }
        }
        for (i, w) in c.out_width.iter().enumerate() {
            let split = if c.packages_row_splitting { c.packages_row_split_spacing } else { 0.0 };
            if *w - c.drop_side_offset - split < 0.0 {
                return Err(PnpError::Config(format!(
                    "out-feed lane {i} ({w} mm) cannot hold its side offset and split spacing"
                )));
            }
        }
        c.in_pattern.parse::<RowPattern>()?;

        let s = &self.slider;
        for k in 0..3 {
            positive("slider.speed", s.speed[k])?;
            positive("slider.accel", s.accel[k])?;
            if let Some(j) = s.max_jerk {
                positive("slider.max_jerk", j[k])?;
            }
        }
        positive("slider.width", s.width)?;
        positive("slider.reach", s.reach)?;
        non_negative("slider.reachOffset", s.reach_offset)?;
        non_negative("slider.depth", s.depth)?;
        non_negative("slider.safetyMargin", s.safety_margin)?;
        non_negative("slider.zMoveTime", s.z_move_time)?;
        if s.sliders_per_rail != 2 {
            return Err(PnpError::Config(format!(
                "slider.slidersPerRail must be 2, got {}",
                s.sliders_per_rail
            )));
        }

        let b = &self.beam;
        if b.nb_of_beams == 0 {
            return Err(PnpError::Config("beam.nbOfBeams must be at least 1".into()));
        }
        if b.direction != [0.0, 1.0] {
            return Err(PnpError::Config(format!(
                "beam.direction must be [0, 1], got {:?}",
                b.direction
            )));
        }
        lane_table("beam.workspaceSide", b.workspace_side.len(), b.nb_of_beams)?;
        lane_table("beam.scheduling", b.scheduling.len(), b.nb_of_beams)?;
        if let Some(out) = &b.out_scheduling {
            lane_table("beam.outScheduling", out.len(), b.nb_of_beams)?;
        }
        if let Some(out) = &b.out_workspace_side {
            lane_table("beam.outWorkspaceSide", out.len(), b.nb_of_beams)?;
        }
        for i in 0..b.nb_of_beams {
            if b.workspace_side[i] >= c.nb_in_conveyor {
                return Err(PnpError::Config(format!(
                    "beam {i} serves in-feed lane {} of {}",
                    b.workspace_side[i], c.nb_in_conveyor
                )));
            }
            if self.out_lane_of_beam(i) >= c.nb_out_conveyor {
                return Err(PnpError::Config(format!(
                    "beam {i} serves out-feed lane {} of {}",
                    self.out_lane_of_beam(i),
                    c.nb_out_conveyor
                )));
            }
        }
        self.beam_policies()?;

        positive("target.width", self.target.width)?;
        if self.bounce_after_starved_passes == Some(0) {
            return Err(PnpError::Config("bounceAfterStarvedPasses must be at least 1".into()));
        }
        Ok(())
    }
}

impl ConveyorParams {
    /// `+1.0` when the in-feed flows toward +x, `-1.0` otherwise.
    pub fn in_flow_sign(&self) -> f64 {
        self.in_direction[0].signum()
    }

    pub fn out_flow_sign(&self) -> f64 {
        self.out_direction[0].signum()
    }

    /// Out-feed speed that makes good-item supply equal drop-slot demand.
    ///
    ///   v_out = v_in · Σin · (1 − bad) · (nRow·rowSpacing + extra)
    ///           ───────────────────────────────────────────────────
    ///                    inRowSpacing · Σout · nRow
    pub fn balanced_out_speed(&self, in_speed: f64) -> f64 {
        let in_items: usize = self.in_items_per_row.iter().sum();
        let out_items: usize = self.out_items_per_row.iter().sum();
        let n_row = self.n_packages_row as f64;
        let supply = in_speed
            * in_items as f64
            * (1.0 - self.bad_product_ratio)
            * (n_row * self.packages_row_spacing + self.packages_extra_spacing);
        let demand = self.in_row_spacing * out_items as f64 * n_row;
        if demand <= 0.0 { 0.0 } else { supply / demand }
    }
}

impl SliderParams {
    /// Max speed in world `[x, y, z]` order.
    pub fn world_velocity(&self) -> [f64; 3] {
        to_world(self.speed)
    }

    /// Max acceleration in world `[x, y, z]` order.
    pub fn world_acceleration(&self) -> [f64; 3] {
        to_world(self.accel)
    }

    /// Max jerk in world `[x, y, z]` order, if limited.
    pub fn world_jerk(&self) -> Option<[f64; 3]> {
        self.max_jerk.map(to_world)
    }
}

/// `[beamAxis, armAxis, vertical]` → world `[x, y, z]`.
#[inline]
fn to_world(v: [f64; 3]) -> [f64; 3] {
    [v[1], v[0], v[2]]
}

// ── Validation helpers ────────────────────────────────────────────────────────

fn positive(name: &str, v: f64) -> PnpResult<()> {
    if v > 0.0 && v.is_finite() {
        Ok(())
    } else {
        Err(PnpError::Config(format!("{name} must be positive, got {v}")))
    }
}

fn non_negative(name: &str, v: f64) -> PnpResult<()> {
    if v >= 0.0 && v.is_finite() {
        Ok(())
    } else {
        Err(PnpError::Config(format!("{name} must be non-negative, got {v}")))
    }
}

fn lane_table(name: &str, len: usize, expected: usize) -> PnpResult<()> {
    if len == expected {
        Ok(())
    } else {
        Err(PnpError::Config(format!("{name} has {len} entries, expected {expected}")))
    }
}

fn flow_direction(name: &str, d: [f64; 2]) -> PnpResult<()> {
    if d[1] == 0.0 && d[0].abs() == 1.0 {
        Ok(())
    } else {
        Err(PnpError::Config(format!("{name} must be [1, 0] or [-1, 0], got {d:?}")))
    }
}
