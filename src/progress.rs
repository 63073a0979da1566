//! Throttled progress reporting for object transfers.
//!
//! The transport calls [`ProgressReporter::report`] for every incremental
//! update. Output is limited to one line per decile crossed, followed by a
//! single `done.` line once all objects arrived, so a session prints at most
//! eleven lines however often it is called.

use std::io::{self, Stdout, Write};
use std::path::Path;

/// Step by which the reported decile advances after each progress line.
const DECILE_STEP: u32 = 10;

/// Point-in-time read of the transport's transfer counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransferSnapshot {
    pub received_objects: u64,
    pub total_objects: u64,
    pub received_bytes: u64,
}

impl TransferSnapshot {
    pub fn new(received_objects: u64, total_objects: u64, received_bytes: u64) -> Self {
        Self {
            received_objects,
            total_objects,
            received_bytes,
        }
    }

    /// Integer percentage of objects received, `None` while the total is unknown.
    pub fn percent(&self) -> Option<u32> {
        if self.total_objects == 0 {
            return None;
        }
        let pct = u128::from(self.received_objects) * 100 / u128::from(self.total_objects);
        Some(u32::try_from(pct).unwrap_or(u32::MAX))
    }

    pub fn received_kib(&self) -> u64 {
        self.received_bytes / 1024
    }

    pub fn is_complete(&self) -> bool {
        self.received_objects >= self.total_objects
    }
}

/// Progress bookkeeping kept in the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressState {
    last_reported_decile: u32,
    done_reported: bool,
}

impl ProgressState {
    pub fn last_reported_decile(&self) -> u32 {
        self.last_reported_decile
    }

    pub fn done_reported(&self) -> bool {
        self.done_reported
    }
}

/// Writes progress lines to a sink, stdout by default.
pub struct ProgressReporter<W = Stdout> {
    out: W,
}

impl ProgressReporter<Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for ProgressReporter<Stdout> {
    fn default() -> Self {
        Self::stdout()
    }
}

impl<W: Write> ProgressReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Banner printed before a clone with progress enabled.
    pub fn announce_clone(&mut self, path: &Path) {
        let line = format!("cloning into '{}'...\n", path.display());
        self.emit(&line);
    }

    /// Handle one transfer update.
    pub fn report(&mut self, state: &mut ProgressState, snapshot: &TransferSnapshot) {
        let Some(percent) = snapshot.percent() else {
            return;
        };

        if !snapshot.is_complete() {
            if percent > state.last_reported_decile {
                let line = format!(
                    "Receiving objects: {:>3}% ({}/{}), {:>4} kb\r",
                    percent,
                    snapshot.received_objects,
                    snapshot.total_objects,
                    snapshot.received_kib()
                );
                self.emit(&line);
                state.last_reported_decile += DECILE_STEP;
            }
        } else if !state.done_reported {
            let line = format!(
                "Receiving objects: 100% ({}/{}), {:>4} kb, done.\n",
                snapshot.received_objects,
                snapshot.total_objects,
                snapshot.received_kib()
            );
            self.emit(&line);
            state.done_reported = true;
        }
    }

    fn emit(&mut self, line: &str) {
        if let Err(e) = self
            .out
            .write_all(line.as_bytes())
            .and_then(|()| self.out.flush())
        {
            tracing::warn!("failed to write progress line: {}", e);
        }
    }
}
