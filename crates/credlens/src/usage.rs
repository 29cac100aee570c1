//! Best-effort analytics log of completed recommendations.

use crate::domain::SpendProfile;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// One completed calculation, as recorded for analytics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEvent {
    pub recorded_at: DateTime<Utc>,
    pub session_id: String,
    pub income: Decimal,
    pub spend: SpendProfile,
    pub card_name: String,
    pub net_savings: Decimal,
}

/// Port for the analytics sink. Callers treat every error as non-fatal.
pub trait UsageLogger: Send + Sync {
    fn record(&self, event: UsageEvent) -> Result<(), UsageLogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum UsageLogError {
    #[error("usage log io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("usage log encoding failure: {0}")]
    Csv(#[from] csv::Error),
    #[error("usage log unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Serialize)]
struct UsageRow<'a> {
    timestamp: String,
    session_id: &'a str,
    income: Decimal,
    online: Decimal,
    travel: Decimal,
    dining: Decimal,
    utilities: Decimal,
    upi: Decimal,
    offline: Decimal,
    top_card: &'a str,
    net_savings: Decimal,
}

impl<'a> From<&'a UsageEvent> for UsageRow<'a> {
    fn from(event: &'a UsageEvent) -> Self {
        Self {
            timestamp: event.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            session_id: &event.session_id,
            income: event.income,
            online: event.spend.online,
            travel: event.spend.travel,
            dining: event.spend.dining,
            utilities: event.spend.utilities,
            upi: event.spend.upi,
            offline: event.spend.offline,
            top_card: &event.card_name,
            net_savings: event.net_savings,
        }
    }
}

/// Appends one CSV row per event, writing the header when the file is new.
#[derive(Debug)]
pub struct CsvUsageLogger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvUsageLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UsageLogger for CsvUsageLogger {
    fn record(&self, event: UsageEvent) -> Result<(), UsageLogError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer.serialize(UsageRow::from(&event))?;
        writer.flush()?;
        Ok(())
    }
}

/// Emits each event as a structured `info!` record instead of persisting it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingUsageLogger;

impl UsageLogger for TracingUsageLogger {
    fn record(&self, event: UsageEvent) -> Result<(), UsageLogError> {
        info!(
            target: "credlens::usage",
            session = %event.session_id,
            income = %event.income,
            monthly_spend = %event.spend.total(),
            top_card = %event.card_name,
            net_savings = %event.net_savings,
            "usage event"
        );
        Ok(())
    }
}

/// Keeps every event in memory for inspection.
#[derive(Debug, Default, Clone)]
pub struct MemoryUsageLogger {
    events: Arc<Mutex<Vec<UsageEvent>>>,
}

impl MemoryUsageLogger {
    pub fn events(&self) -> Vec<UsageEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl UsageLogger for MemoryUsageLogger {
    fn record(&self, event: UsageEvent) -> Result<(), UsageLogError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        Ok(())
    }
}

/// Forwards at most one event per session within `window`; extra events are dropped.
#[derive(Debug)]
pub struct DebouncedUsageLogger<L> {
    inner: L,
    window: Duration,
    last_seen: Mutex<HashMap<String, Instant>>,
}

impl<L> DebouncedUsageLogger<L> {
    pub fn new(inner: L, window: Duration) -> Self {
        Self {
            inner,
            window,
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Sessions currently inside their debounce window.
    pub fn tracked_sessions(&self) -> usize {
        self.last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn admit(&self, session_id: &str) -> bool {
        let mut last_seen = self
            .last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        // Expired sessions carry no state, so the map only holds live windows.
        last_seen.retain(|_, seen| now.duration_since(*seen) < self.window);
        if last_seen.contains_key(session_id) {
            return false;
        }
        if !self.window.is_zero() {
            last_seen.insert(session_id.to_string(), now);
        }
        true
    }
}

impl<L: UsageLogger> UsageLogger for DebouncedUsageLogger<L> {
    fn record(&self, event: UsageEvent) -> Result<(), UsageLogError> {
        if !self.admit(&event.session_id) {
            debug!(session = %event.session_id, "usage event debounced");
            return Ok(());
        }
        self.inner.record(event)
    }
}
