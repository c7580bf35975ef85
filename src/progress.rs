//! Progress reporting and cooperative cancellation
//!
//! The engine talks to its caller through exactly two narrow channels: a
//! [`ProgressSink`] receiving `(percent, message)` reports and a
//! [`CancellationToken`] polled at every iteration boundary.

use log::{info, warn};
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

/// Lowest percent the engine reports; 0 means "not started" to the caller
pub const MIN_PERCENT: u8 = 1;
/// Highest percent the engine reports; 100 means "finished" to the caller
pub const MAX_PERCENT: u8 = 99;

/// One progress update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressReport {
    /// Percent complete, always within [`MIN_PERCENT`, `MAX_PERCENT`]
    pub percent: u8,
    /// Human-readable status
    pub message: String,
}

impl ProgressReport {
    /// Build a report from a raw percentage, clamping it into [1, 99]
    pub fn new(percent: f64, message: impl Into<String>) -> Self {
        let percent = if percent.is_nan() {
            MIN_PERCENT
        } else {
            percent.clamp(f64::from(MIN_PERCENT), f64::from(MAX_PERCENT)) as u8
        };
        ProgressReport {
            percent,
            message: message.into(),
        }
    }
}

/// Settable flag shared between the caller and the worker
///
/// Once set it stays set for the rest of the operation.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create an unset token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Set `token` once `signal` resolves, watching from a background thread
///
/// The binary passes `tokio::signal::ctrl_c()`.
pub fn cancel_on<F>(token: CancellationToken, signal: F) -> io::Result<JoinHandle<()>>
where
    F: Future<Output = io::Result<()>> + Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    thread::Builder::new().name("cancel-watch".to_string()).spawn(move || {
        match runtime.block_on(signal) {
            Ok(()) => {
                warn!("Cancellation requested");
                token.cancel();
            }
            Err(e) => warn!("Cancellation signal unavailable: {}", e),
        }
    })
}

/// Consumer of engine progress, and source of cancellation requests
pub trait ProgressSink {
    /// Deliver a report; must not block the engine
    fn report(&self, report: ProgressReport);

    /// Polled by the engine at each iteration boundary
    fn is_cancelled(&self) -> bool;
}

/// Sink that drops reports and never cancels
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _report: ProgressReport) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Sink forwarding reports over a channel to another thread
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: Sender<ProgressReport>,
    token: CancellationToken,
}

impl ChannelProgress {
    /// Create a sink sending to `tx` and observing `token`
    pub fn new(tx: Sender<ProgressReport>, token: CancellationToken) -> Self {
        ChannelProgress { tx, token }
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, report: ProgressReport) {
        // A dropped receiver only means nobody is watching.
        let _ = self.tx.send(report);
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Sink writing each report to the log
#[derive(Debug, Clone, Default)]
pub struct LogProgress {
    token: CancellationToken,
}

impl LogProgress {
    /// Create a logging sink observing `token`
    pub fn new(token: CancellationToken) -> Self {
        LogProgress { token }
    }
}

impl ProgressSink for LogProgress {
    fn report(&self, report: ProgressReport) {
        info!("[{:>2}%] {}", report.percent, report.message);
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Result of an engine call that may be cancelled
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Outcome<T> {
    /// The call ran to completion
    Completed(T),
    /// Cancellation was observed; any partial output was discarded
    Cancelled,
}

impl<T> Outcome<T> {
    /// Whether the call was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    /// The completed value, if any
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }

    /// Map the completed value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Completed(value) => Outcome::Completed(f(value)),
            Outcome::Cancelled => Outcome::Cancelled,
        }
    }
}

/// Per-phase reporter: one status message, non-decreasing percentages
pub(crate) struct Phase<'a> {
    sink: &'a dyn ProgressSink,
    message: String,
    last: u8,
}

impl<'a> Phase<'a> {
    pub(crate) fn new(sink: &'a dyn ProgressSink, message: impl Into<String>) -> Self {
        Phase {
            sink,
            message: message.into(),
            last: MIN_PERCENT,
        }
    }

    /// Report a percentage and return whether work should continue
    pub(crate) fn update(&mut self, percent: f64) -> bool {
        let mut report = ProgressReport::new(percent, self.message.as_str());
        report.percent = report.percent.max(self.last);
        self.last = report.percent;
        self.sink.report(report);
        !self.sink.is_cancelled()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.sink.is_cancelled()
    }
}
