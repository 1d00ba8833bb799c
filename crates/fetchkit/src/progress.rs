//! Progress tracking and rendering shared by the fetcher and the extractors.
//!
//! Throughput is the total processed so far divided by the total elapsed time,
//! so the figure stabilizes slowly rather than tracking recent bursts.

use std::io::Write;
use std::time::{Duration, Instant};

/// Number of cells in the rendered bar.
pub const BAR_WIDTH: usize = 50;

/// Running progress of a single fetch or extraction.
#[derive(Debug, Clone)]
pub struct ProgressState {
    processed: u64,
    total: Option<u64>,
    started: Instant,
}

impl ProgressState {
    /// Starts tracking against `total` bytes, or an unknown total.
    pub fn new(total: Option<u64>) -> Self {
        Self {
            processed: 0,
            total,
            started: Instant::now(),
        }
    }

    /// Records `bytes` more of completed work.
    pub fn advance(&mut self, bytes: u64) {
        self.processed = self.processed.saturating_add(bytes);
    }

    /// Removes `bytes` from the denominator, e.g. for skipped entries.
    pub fn shrink_total(&mut self, bytes: u64) {
        if let Some(total) = self.total.as_mut() {
            *total = total.saturating_sub(bytes);
        }
    }

    /// Replaces the denominator.
    pub fn set_total(&mut self, total: Option<u64>) {
        self.total = total;
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Captures the current state for rendering.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            processed: self.processed,
            total: self.total,
            elapsed: self.started.elapsed(),
        }
    }
}

/// A point-in-time view of a [`ProgressState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// Bytes processed so far
    pub processed: u64,
    /// Denominator, `None` while unknown
    pub total: Option<u64>,
    /// Wall time since the operation started
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Percentage complete in `[0, 100]`.
    ///
    /// A zero total is complete; an unknown total reads as 0 until it is known.
    pub fn percentage(&self) -> f64 {
        match self.total {
            None => 0.0,
            Some(0) => 100.0,
            Some(total) if self.processed >= total => 100.0,
            Some(total) => self.processed as f64 / total as f64 * 100.0,
        }
    }

    /// Average throughput since the start, 0 when no time has elapsed.
    pub fn bytes_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        }
    }

    /// Throughput as `"x.xx KB/s"`, or `"x.xx MB/s"` above 1024 KB/s.
    pub fn rate_string(&self) -> String {
        let kb_per_second = self.bytes_per_second() / 1024.0;
        if kb_per_second > 1024.0 {
            format!("{:.2} MB/s", kb_per_second / 1024.0)
        } else {
            format!("{:.2} KB/s", kb_per_second)
        }
    }

    /// Number of filled bar cells.
    pub fn filled_cells(&self) -> usize {
        ((self.percentage() / 100.0) * BAR_WIDTH as f64) as usize
    }

    /// Renders the line without the leading carriage return.
    pub fn render_line(&self) -> String {
        let done = self.filled_cells().min(BAR_WIDTH);
        format!(
            "[{}{}] {:.2}% ({})",
            "█".repeat(done),
            ".".repeat(BAR_WIDTH - done),
            self.percentage(),
            self.rate_string()
        )
    }
}

/// Receives progress updates from a fetch or extraction.
///
/// Rendering is a side effect only: implementations must not fail.
pub trait ProgressSink {
    /// Called after every chunk or entry.
    fn update(&mut self, snapshot: &ProgressSnapshot);

    /// Called once when the operation completes.
    fn finish(&mut self) {}
}

impl<F> ProgressSink for F
where
    F: FnMut(&ProgressSnapshot),
{
    fn update(&mut self, snapshot: &ProgressSnapshot) {
        self(snapshot)
    }
}

/// Discards all updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _snapshot: &ProgressSnapshot) {}
}

/// Writes a carriage-return-overwritten progress line to a writer.
///
/// Write errors are ignored so redirected or closed outputs never abort the
/// operation being reported.
#[derive(Debug)]
pub struct ConsoleProgress<W: Write> {
    out: W,
}

impl ConsoleProgress<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleProgress<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ProgressSink for ConsoleProgress<W> {
    fn update(&mut self, snapshot: &ProgressSnapshot) {
        let _ = write!(self.out, "\r{}     ", snapshot.render_line());
        let _ = self.out.flush();
    }

    fn finish(&mut self) {
        let _ = writeln!(self.out);
        let _ = self.out.flush();
    }
}
