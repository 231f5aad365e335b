//! Progress reporting for batch ingestion (spec.md §5): at most ~100
//! synchronous callback invocations per batch, never for a zero-length
//! batch.

use std::sync::Arc;

/// Which phase of a batch ingest a [`ProgressEvent`] was emitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Parsing,
    Clustering,
    Finalizing,
}

/// One progress notification. `percent_complete` is in `[0.0, 100.0]`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ProgressEvent {
    pub processed_lines: usize,
    pub total_lines: usize,
    pub phase: Phase,
    pub percent_complete: f64,
}

/// The callback type accepted by [`crate::engine::CreateEngineOptions`].
/// Must not re-enter the engine and must return promptly — it runs
/// synchronously on the ingesting thread (spec.md §5).
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Emit at most ~100 progress events across `total` lines: one
/// `Parsing`/0% before the loop, periodic `Clustering` events during it,
/// and one `Finalizing`/100% after. Emits nothing when `total == 0`.
pub struct ProgressReporter<'a> {
    callback: Option<&'a ProgressCallback>,
    total: usize,
    interval: usize,
}

impl<'a> ProgressReporter<'a> {
    #[must_use]
    pub fn new(callback: Option<&'a ProgressCallback>, total: usize) -> Self {
        let interval = (total / 100).max(1);
        Self {
            callback,
            total,
            interval,
        }
    }

    pub fn start(&self) {
        if self.total == 0 {
            return;
        }
        self.emit(0, Phase::Parsing);
    }

    /// Call after processing the line at 0-based index `index`.
    pub fn tick(&self, index: usize) {
        if self.total == 0 {
            return;
        }
        let processed = index + 1;
        if processed % self.interval == 0 && processed != self.total {
            self.emit(processed, Phase::Clustering);
        }
    }

    pub fn finish(&self) {
        if self.total == 0 {
            return;
        }
        self.emit(self.total, Phase::Finalizing);
    }

    fn emit(&self, processed_lines: usize, phase: Phase) {
        let Some(callback) = self.callback else {
            return;
        };
        #[allow(clippy::cast_precision_loss)]
        let percent_complete = if self.total == 0 {
            0.0
        } else {
            (processed_lines as f64 / self.total as f64) * 100.0
        };
        callback(ProgressEvent {
            processed_lines,
            total_lines: self.total,
            phase,
            percent_complete,
        });
    }
}
