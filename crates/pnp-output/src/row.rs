//! Plain data row types written by output backends.

use pnp_core::RunStats;
use pnp_sim::Snapshot;

/// What a snapshot row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Pick,
    Drop,
    Slider,
    Rail,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Pick   => "pick",
            EntityKind::Drop   => "drop",
            EntityKind::Slider => "slider",
            EntityKind::Rail   => "rail",
        }
    }
}

/// One entity of one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRow {
    pub tick:     u64,
    pub kind:     EntityKind,
    pub id:       u32,
    /// Lane of a pick or drop slot.
    pub lane:     Option<u16>,
    /// Absent for rails.
    pub position: Option<[f64; 3]>,
    pub status:   &'static str,
}

impl SnapshotRow {
    /// Flatten a snapshot: picks, drops, sliders, then rails, each in id order.
    pub fn from_snapshot(snapshot: &Snapshot) -> Vec<SnapshotRow> {
        let tick = snapshot.tick.0;
        let items = |kind, records: &[pnp_sim::ItemRecord]| {
            records
                .iter()
                .map(move |r| SnapshotRow {
                    tick,
                    kind,
                    id:       r.id,
                    lane:     Some(r.lane.0),
                    position: Some([r.position.x, r.position.y, 0.0]),
                    status:   r.status,
                })
                .collect::<Vec<_>>()
        };

        let mut rows = items(EntityKind::Pick, &snapshot.picks);
        rows.extend(items(EntityKind::Drop, &snapshot.drops));
        rows.extend(snapshot.sliders.iter().map(|s| SnapshotRow {
            tick,
            kind:     EntityKind::Slider,
            id:       s.id.0 as u32,
            lane:     None,
            position: Some(s.position.to_array()),
            status:   s.status.as_str(),
        }));
        rows.extend(snapshot.rails.iter().enumerate().map(|(i, phase)| SnapshotRow {
            tick,
            kind:     EntityKind::Rail,
            id:       i as u32,
            lane:     None,
            position: None,
            status:   phase.as_str(),
        }));
        rows
    }
}

/// Headline counters of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStatsRow {
    pub seed:              u64,
    pub pre_move:          bool,
    pub state_bouncing:    bool,
    pub time_steps:        u64,
    pub total_picks:       u64,
    pub missed_picks:      u64,
    pub total_drops:       u64,
    pub missed_drops:      u64,
    pub total_packages:    u64,
    pub unfilled_packages: u64,
    pub placed:            u64,
    pub fill_rate:         f64,
}

impl From<&RunStats> for RunStatsRow {
    fn from(s: &RunStats) -> Self {
        Self {
            seed:              s.seed,
            pre_move:          s.pre_move,
            state_bouncing:    s.state_bouncing,
            time_steps:        s.total_time_steps,
            total_picks:       s.total_picks,
            missed_picks:      s.missed_picks,
            total_drops:       s.total_drops,
            missed_drops:      s.missed_drops,
            total_packages:    s.total_packages,
            unfilled_packages: s.unfilled_packages,
            placed:            s.placed(),
            fill_rate:         s.fill_rate(),
        }
    }
}

/// A run abandoned on an error, kept so a batch can carry on past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRow {
    /// Position of the run within its batch.
    pub run:   u32,
    pub seed:  u64,
    /// Tick the run stopped at.
    pub tick:  u64,
    pub error: String,
}
