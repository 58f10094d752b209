//! The `OutputWriter` trait implemented by backend writers.

use crate::{ErrorRow, OutputResult, RunStatsRow, SnapshotRow};

/// Sink for snapshots, end-of-run statistics and abandoned runs.
///
/// Errors are returned to the caller; [`SimOutputObserver`][crate::SimOutputObserver]
/// keeps the first one for [`take_error`][crate::SimOutputObserver::take_error].
pub trait OutputWriter {
    /// Write every row of one snapshot.
    fn write_snapshot(&mut self, rows: &[SnapshotRow]) -> OutputResult<()>;

    /// Write the counters of one finished run.
    fn write_run_stats(&mut self, row: &RunStatsRow) -> OutputResult<()>;

    /// Record a run that ended in an error instead of statistics.
    fn write_error(&mut self, row: &ErrorRow) -> OutputResult<()>;

    /// Flush buffered rows.  Called at the end of every run, so a writer
    /// must accept more rows afterwards.
    fn finish(&mut self) -> OutputResult<()>;
}
