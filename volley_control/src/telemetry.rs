//! Telemetry sinks for shooter snapshots.
//!
//! - [`Dashboard`] - bounded in-memory history, readable from other threads
//! - [`JsonLogSink`] - emits every Nth snapshot as a JSON `tracing` event
//! - [`Fanout`] - forwards to several sinks
//!
//! Every sink is non-blocking. A failed publish is reported to the shooter,
//! which logs and counts it; control is unaffected.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

use volley_common::consts::TELEMETRY_HISTORY_LEN;
use volley_common::shooter::telemetry::{PublishError, ShooterSnapshot, TelemetrySink};

type History = heapless::Deque<ShooterSnapshot, TELEMETRY_HISTORY_LEN>;

/// Shared snapshot history. Clones share the same buffer.
///
/// The control side only ever `try_lock`s, so a reader holding the lock
/// costs the controller one dropped snapshot, never a stall.
#[derive(Clone, Default)]
pub struct Dashboard {
    history: Arc<Mutex<History>>,
}

impl Dashboard {
    /// Empty dashboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent snapshot.
    pub fn latest(&self) -> Option<ShooterSnapshot> {
        self.history.lock().back().copied()
    }

    /// Retained snapshots, oldest first.
    pub fn history(&self) -> Vec<ShooterSnapshot> {
        self.history.lock().iter().copied().collect()
    }

    /// Number of retained snapshots.
    pub fn len(&self) -> usize {
        self.history.lock().len()
    }

    /// No snapshot published yet.
    pub fn is_empty(&self) -> bool {
        self.history.lock().is_empty()
    }
}

impl TelemetrySink for Dashboard {
    fn publish(&mut self, snapshot: &ShooterSnapshot) -> Result<(), PublishError> {
        let mut history = self
            .history
            .try_lock()
            .ok_or_else(|| PublishError("dashboard busy".into()))?;
        if history.is_full() {
            history.pop_front();
        }
        history
            .push_back(*snapshot)
            .map_err(|_| PublishError("dashboard history full".into()))
    }
}

/// Logs every `every`-th snapshot as JSON under the `volley::telemetry` target.
pub struct JsonLogSink {
    every: u64,
}

impl JsonLogSink {
    /// Log one snapshot out of `every` (0 is treated as 1).
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl TelemetrySink for JsonLogSink {
    fn publish(&mut self, snapshot: &ShooterSnapshot) -> Result<(), PublishError> {
        if snapshot.tick % self.every != 0 {
            return Ok(());
        }
        let json = serde_json::to_string(snapshot).map_err(|e| PublishError(e.to_string()))?;
        info!(target: "volley::telemetry", "{json}");
        Ok(())
    }
}

/// Publishes to every inner sink; reports the first failure after trying all.
#[derive(Default)]
pub struct Fanout {
    sinks: Vec<Box<dyn TelemetrySink>>,
}

impl Fanout {
    /// No sinks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink.
    pub fn with(mut self, sink: Box<dyn TelemetrySink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl TelemetrySink for Fanout {
    fn publish(&mut self, snapshot: &ShooterSnapshot) -> Result<(), PublishError> {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(err) = sink.publish(snapshot) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
