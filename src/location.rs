use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A single geographic position sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above (positive) or below (negative) sea level.
    pub altitude: Option<f64>,
    /// When the fix itself was taken.
    pub timestamp: DateTime<Utc>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_altitude(mut self, altitude: Option<f64>) -> Self {
        self.altitude = altitude;
        self
    }

    /// Finite and inside the WGS84 coordinate ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
            && self.altitude.is_none_or(f64::is_finite)
    }
}

/// A decoded position as shown next to a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

impl From<&LocationFix> for GeoPoint {
    fn from(fix: &LocationFix) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude: fix.altitude,
        }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// The platform location subsystem.
///
/// Implementations report the last known fix, or `None` when the device has no
/// position yet. An `Err` means the subsystem itself failed.
#[async_trait::async_trait]
pub trait LocationSource: Send + Sync {
    async fn last_known_fix(&self) -> Result<Option<LocationFix>>;
}

/// A source that always reports the same fix (or none).
#[derive(Debug, Clone, Default)]
pub struct StaticLocation {
    fix: Option<LocationFix>,
}

impl StaticLocation {
    pub fn new(fix: Option<LocationFix>) -> Self {
        Self { fix }
    }
}

#[async_trait::async_trait]
impl LocationSource for StaticLocation {
    async fn last_known_fix(&self) -> Result<Option<LocationFix>> {
        Ok(self.fix.clone())
    }
}

/// How a location request ended.
#[derive(Debug, Clone, PartialEq)]
pub enum FixOutcome {
    Fix(LocationFix),
    /// No position available (including timeouts). A normal outcome.
    NoFix,
    Error(String),
    /// A newer request replaced this one before it resolved.
    Superseded,
    /// [`LocationProvider::cancel`] was called before it resolved.
    Cancelled,
}

/// Sender half shared by a request's task and the provider. Whoever takes it
/// first decides the outcome.
type Reply = Arc<Mutex<Option<oneshot::Sender<FixOutcome>>>>;

fn resolve(reply: &Reply, outcome: FixOutcome) {
    let sender = reply.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(tx) = sender {
        let _ = tx.send(outcome);
    }
}

/// Handle to one outstanding location request.
#[derive(Debug)]
pub struct FixRequest {
    id: u64,
    rx: oneshot::Receiver<FixOutcome>,
}

impl FixRequest {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn outcome(self) -> FixOutcome {
        // The sender only vanishes unresolved when the runtime drops the task.
        self.rx.await.unwrap_or(FixOutcome::Cancelled)
    }
}

struct Outstanding {
    id: u64,
    task: JoinHandle<()>,
    reply: Reply,
}

/// Single-shot, latest-wins wrapper around a [`LocationSource`].
///
/// At most one request is outstanding: issuing a new one aborts the previous
/// task, whose [`FixRequest`] then resolves to [`FixOutcome::Superseded`].
pub struct LocationProvider {
    source: Arc<dyn LocationSource>,
    next_id: AtomicU64,
    outstanding: Mutex<Option<Outstanding>>,
}

impl LocationProvider {
    pub fn new(source: Arc<dyn LocationSource>) -> Self {
        Self {
            source,
            next_id: AtomicU64::new(0),
            outstanding: Mutex::new(None),
        }
    }

    /// Start a new request. Must be called from within a tokio runtime.
    pub fn request_fix(&self, timeout: Duration) -> FixRequest {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = oneshot::channel();
        let reply: Reply = Arc::new(Mutex::new(Some(tx)));
        let source = Arc::clone(&self.source);

        let task_reply = Arc::clone(&reply);
        let task = tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, source.last_known_fix()).await {
                Ok(Ok(Some(fix))) => FixOutcome::Fix(fix),
                Ok(Ok(None)) => FixOutcome::NoFix,
                Ok(Err(e)) => FixOutcome::Error(format!("{e:#}")),
                Err(_) => {
                    log::debug!("Location request {id} timed out after {timeout:?}");
                    FixOutcome::NoFix
                }
            };
            resolve(&task_reply, outcome);
        });

        let mut slot = self
            .outstanding
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(Outstanding { id, task, reply }) {
            if !previous.task.is_finished() {
                log::debug!("Location request {id} supersedes request {}", previous.id);
            }
            previous.task.abort();
            resolve(&previous.reply, FixOutcome::Superseded);
        }

        FixRequest { id, rx }
    }

    /// Abort the outstanding request, if any. Its handle resolves to
    /// [`FixOutcome::Cancelled`] unless it already had an outcome.
    pub fn cancel(&self) {
        let mut slot = self
            .outstanding
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(outstanding) = slot.take() {
            outstanding.task.abort();
            resolve(&outstanding.reply, FixOutcome::Cancelled);
        }
    }
}

impl Drop for LocationProvider {
    fn drop(&mut self) {
        self.cancel();
    }
}
