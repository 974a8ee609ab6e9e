//! Per-query counters.
//!
//! The responder loop emits one [`QueryEvent`] per decoded query and keeps
//! no aggregation state of its own; everything stateful lives behind the
//! [`QuerySink`] interface. The bundled [`StatsRecorder`] aggregates a
//! global total plus per-domain and per-type counts and persists them as a
//! JSON document.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("stats storage IO error: {0}")]
    Io(String),

    #[error("stats serialization error: {0}")]
    Serialize(String),
}

pub type Result<T> = std::result::Result<T, StatsError>;

/// One completed query, handed to the sink and forgotten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryEvent {
    /// Fully-qualified, dot-terminated domain name.
    pub domain: String,
    /// Record-type label, or the decimal code for unknown types.
    pub type_label: String,
}

/// Write-only side channel informed of every completed query.
///
/// Fire-and-forget: implementations must never propagate failure into the
/// response path.
pub trait QuerySink: Send + Sync {
    fn record_query(&self, domain: &str, type_label: &str);
}

/// Sink that forwards events over an unbounded channel so the reply path
/// never blocks on aggregation or persistence.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<QueryEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<QueryEvent>) -> Self {
        Self { tx }
    }
}

impl QuerySink for ChannelSink {
    fn record_query(&self, domain: &str, type_label: &str) {
        let event = QueryEvent {
            domain: domain.to_string(),
            type_label: type_label.to_string(),
        };
        if self.tx.send(event).is_err() {
            warn!("Query counter channel closed, event discarded");
        }
    }
}

/// Persisted shape of the aggregated counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsDocument {
    pub total_queries: u64,
    pub domains: HashMap<String, u64>,
    pub types: HashMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Aggregates query counters and persists them to a JSON file.
///
/// Counts survive restarts: existing aggregates are loaded at startup. A
/// corrupt stats file is logged and replaced rather than refusing to serve.
pub struct StatsRecorder {
    path: PathBuf,
    total: AtomicU64,
    domains: DashMap<String, u64>,
    types: DashMap<String, u64>,
}

impl StatsRecorder {
    /// Open the recorder, loading any previously persisted aggregates.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        let document = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<StatsDocument>(&raw) {
                Ok(document) => document,
                Err(e) => {
                    warn!(
                        "Stats file {} is unreadable ({}), starting from zero",
                        path.display(),
                        e
                    );
                    StatsDocument::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StatsDocument::default(),
            Err(e) => return Err(StatsError::Io(e.to_string())),
        };

        let recorder = Self {
            path,
            total: AtomicU64::new(document.total_queries),
            domains: document.domains.into_iter().collect(),
            types: document.types.into_iter().collect(),
        };
        Ok(recorder)
    }

    pub fn record(&self, event: &QueryEvent) {
        self.total.fetch_add(1, Ordering::Relaxed);
        *self.domains.entry(event.domain.clone()).or_insert(0) += 1;
        *self.types.entry(event.type_label.clone()).or_insert(0) += 1;
    }

    pub fn total_queries(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn domain_count(&self, domain: &str) -> u64 {
        self.domains.get(domain).map(|count| *count).unwrap_or(0)
    }

    pub fn type_count(&self, type_label: &str) -> u64 {
        self.types.get(type_label).map(|count| *count).unwrap_or(0)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn document(&self) -> StatsDocument {
        StatsDocument {
            total_queries: self.total.load(Ordering::Relaxed),
            domains: self
                .domains
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
            types: self
                .types
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
            updated_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Persist the current aggregates.
    pub fn flush(&self) -> Result<()> {
        let document = self.document();
        let raw = serde_json::to_string_pretty(&document)
            .map_err(|e| StatsError::Serialize(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| StatsError::Io(e.to_string()))?;
        debug!(
            "Flushed query counters ({} total) to {}",
            document.total_queries,
            self.path.display()
        );
        Ok(())
    }
}

impl QuerySink for StatsRecorder {
    fn record_query(&self, domain: &str, type_label: &str) {
        self.record(&QueryEvent {
            domain: domain.to_string(),
            type_label: type_label.to_string(),
        });
    }
}

/// Drive a [`StatsRecorder`] from a query-event channel.
///
/// Aggregates every received event and flushes on the configured interval.
/// On shutdown the channel is drained and a final flush is attempted, so no
/// event received before the signal is lost.
pub async fn run_stats_recorder(
    recorder: Arc<StatsRecorder>,
    mut events: mpsc::UnboundedReceiver<QueryEvent>,
    flush_interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(flush_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately; skip it so the first flush
    // happens one interval after startup.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("Stats recorder received shutdown signal");
                break;
            }
            event = events.recv() => {
                match event {
                    Some(event) => recorder.record(&event),
                    None => break,
                }
            }
            _ = ticker.tick() => {
                if let Err(e) = recorder.flush() {
                    warn!("Failed to flush query counters: {}", e);
                }
            }
        }
    }

    // Drain whatever was queued before the shutdown signal.
    while let Ok(event) = events.try_recv() {
        recorder.record(&event);
    }
    if let Err(e) = recorder.flush() {
        warn!("Failed to flush query counters on shutdown: {}", e);
    }
}
