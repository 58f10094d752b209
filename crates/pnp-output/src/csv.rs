//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `snapshots.csv`: one row per pick, drop slot, slider and rail per snapshot
//! - `run_stats.csv`: one row per finished run
//! - `errors.csv`: one row per run abandoned on an error

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{ErrorRow, OutputResult, RunStatsRow, SnapshotRow};

pub const SNAPSHOT_HEADER: [&str; 8] = ["tick", "kind", "id", "lane", "x", "y", "z", "status"];

pub const RUN_STATS_HEADER: [&str; 12] = [
    "seed",
    "pre_move",
    "state_bouncing",
    "time_steps",
    "total_picks",
    "missed_picks",
    "total_drops",
    "missed_drops",
    "total_packages",
    "unfilled_packages",
    "placed",
    "fill_rate",
];

pub const ERROR_HEADER: [&str; 4] = ["run", "seed", "tick", "error"];

/// Writes simulation output to three CSV files.
pub struct CsvWriter {
    snapshots: Writer<File>,
    runs:      Writer<File>,
    errors:    Writer<File>,
}

impl CsvWriter {
    /// Open (or create) the CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut snapshots = Writer::from_path(dir.join("snapshots.csv"))?;
        snapshots.write_record(SNAPSHOT_HEADER)?;

        let mut runs = Writer::from_path(dir.join("run_stats.csv"))?;
        runs.write_record(RUN_STATS_HEADER)?;

        let mut errors = Writer::from_path(dir.join("errors.csv"))?;
        errors.write_record(ERROR_HEADER)?;

        Ok(Self { snapshots, runs, errors })
    }
}

impl OutputWriter for CsvWriter {
    fn write_snapshot(&mut self, rows: &[SnapshotRow]) -> OutputResult<()> {
        for row in rows {
            let [x, y, z] = match row.position {
                Some(p) => p.map(|v| format!("{v:.3}")),
                None => Default::default(),
            };
            self.snapshots.write_record(&[
                row.tick.to_string(),
                row.kind.as_str().to_owned(),
                row.id.to_string(),
                row.lane.map(|l| l.to_string()).unwrap_or_default(),
                x,
                y,
                z,
                row.status.to_owned(),
            ])?;
        }
        Ok(())
    }

    fn write_run_stats(&mut self, row: &RunStatsRow) -> OutputResult<()> {
        self.runs.write_record(&[
            row.seed.to_string(),
            (row.pre_move as u8).to_string(),
            (row.state_bouncing as u8).to_string(),
            row.time_steps.to_string(),
            row.total_picks.to_string(),
            row.missed_picks.to_string(),
            row.total_drops.to_string(),
            row.missed_drops.to_string(),
            row.total_packages.to_string(),
            row.unfilled_packages.to_string(),
            row.placed.to_string(),
            format!("{:.6}", row.fill_rate),
        ])?;
        Ok(())
    }

    fn write_error(&mut self, row: &ErrorRow) -> OutputResult<()> {
        self.errors.write_record(&[
            row.run.to_string(),
            row.seed.to_string(),
            row.tick.to_string(),
            row.error.clone(),
        ])?;
        Ok(())
    }

    /// Flush every file.  The writer stays usable, so one `CsvWriter` can
    /// collect a whole batch of runs.
    fn finish(&mut self) -> OutputResult<()> {
        self.snapshots.flush()?;
        self.runs.flush()?;
        self.errors.flush()?;
        Ok(())
    }
}
