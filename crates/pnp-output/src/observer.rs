//! `SimOutputObserver<W>`: bridges `SimObserver` to an `OutputWriter`.

use pnp_core::{RunStats, Tick};
use pnp_sim::{SimObserver, Snapshot};
use tracing::warn;

use crate::row::{ErrorRow, RunStatsRow, SnapshotRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// Persists every snapshot and one statistics row per run through `W`.
///
/// Observer hooks cannot fail, so the first write error is held back and
/// later writes keep going; read it with [`take_error`][Self::take_error]
/// once the batch is over.
pub struct SimOutputObserver<W: OutputWriter> {
    writer:     W,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    /// The first write failure since construction or the previous call.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Persist a run that ended in an error.  The simulator reports no run
    /// end in that case, so the caller hands the row over directly.
    pub fn record_error(&mut self, row: &ErrorRow) {
        let result = self.writer.write_error(row).and_then(|()| self.writer.finish());
        self.keep_first(result);
    }

    fn keep_first(&mut self, result: OutputResult<()>) {
        let Err(e) = result else { return };
        warn!(error = %e, "output write failed");
        self.last_error.get_or_insert(e);
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_snapshot(&mut self, snapshot: &Snapshot) {
        let rows = SnapshotRow::from_snapshot(snapshot);
        let result = self.writer.write_snapshot(&rows);
        self.keep_first(result);
    }

    fn on_run_end(&mut self, _final_tick: Tick, stats: &RunStats) {
        let result = self
            .writer
            .write_run_stats(&RunStatsRow::from(stats))
            .and_then(|()| self.writer.finish());
        self.keep_first(result);
    }
}
