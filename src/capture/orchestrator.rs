use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use super::state::{CaptureState, FailureReason, PermissionKind};
use super::{CaptureDevice, CaptureOutcome, CaptureRequest, Clock, PermissionGate, SystemClock};
use crate::catalog::ImageRecord;
use crate::config::LocationConfig;
use crate::exif::{MetadataTagSet, MetadataWriter};
use crate::location::{FixOutcome, LocationFix, LocationProvider, LocationSource};
use crate::store::ImageStore;

/// Completion messages from the concurrent halves of a capture.
#[derive(Debug)]
enum CaptureEvent {
    Location(FixOutcome),
    Capture(CaptureOutcome),
}

/// Drives one capture at a time from permission checks to a published record.
///
/// The location request runs alongside the camera; whichever fix has arrived
/// when the camera reports success is the one stamped into the image. A fix
/// arriving later is dropped.
///
/// ```rust,no_run
/// use photo_stamp::capture::{CaptureOrchestrator, CaptureRequest, ImportDevice, StaticPermissions};
/// use photo_stamp::exif::MetadataWriter;
/// use photo_stamp::location::{LocationFix, StaticLocation};
/// use photo_stamp::store::LibraryStore;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let store = Arc::new(LibraryStore::open("library")?);
/// let fix = LocationFix::new(40.4168, -3.7038);
/// let orchestrator = CaptureOrchestrator::new(
///     Arc::new(StaticPermissions::all_granted()),
///     Arc::new(StaticLocation::new(Some(fix))),
///     Arc::new(ImportDevice::new("shot.jpg").with_resolver(store.clone())),
///     MetadataWriter::new().with_resolver(store.clone()),
///     store.clone(),
/// );
///
/// let name = CaptureRequest::default_display_name();
/// let locator = store.allocate(&name)?;
/// let record = orchestrator.capture(CaptureRequest::new(locator, name)).await?;
/// println!("Published #{} at {:?}", record.id, record.geo_location);
/// # Ok(())
/// # }
/// ```
pub struct CaptureOrchestrator {
    permissions: Arc<dyn PermissionGate>,
    location: LocationProvider,
    device: Arc<dyn CaptureDevice>,
    writer: MetadataWriter,
    store: Arc<dyn ImageStore>,
    clock: Arc<dyn Clock>,
    config: LocationConfig,
    state: watch::Sender<CaptureState>,
    in_flight: AtomicBool,
}

impl CaptureOrchestrator {
    pub fn new(
        permissions: Arc<dyn PermissionGate>,
        location: Arc<dyn LocationSource>,
        device: Arc<dyn CaptureDevice>,
        writer: MetadataWriter,
        store: Arc<dyn ImageStore>,
    ) -> Self {
        let (state, _) = watch::channel(CaptureState::Idle);
        Self {
            permissions,
            location: LocationProvider::new(location),
            device,
            writer,
            store,
            clock: Arc::new(SystemClock),
            config: LocationConfig::default(),
            state,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_location_config(mut self, config: LocationConfig) -> Self {
        self.config = config;
        self
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> CaptureState {
        self.state.borrow().clone()
    }

    /// Run a full capture.
    ///
    /// Returns [`FailureReason::Busy`] right away, without touching the running
    /// capture's state, if another capture is in flight.
    pub async fn capture(&self, request: CaptureRequest) -> Result<ImageRecord, FailureReason> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            log::warn!(
                "Rejecting capture of {}: another capture is in progress",
                request.display_name
            );
            return Err(FailureReason::Busy);
        };

        let abandoned = {
            let current = self.state.borrow();
            *current != CaptureState::Idle && !current.is_terminal()
        };
        if abandoned {
            log::warn!("Previous capture was abandoned in {}", self.state());
            self.state.send_replace(CaptureState::Idle);
        }

        let result = self.run(&request).await;
        match &result {
            Ok(record) => {
                log::info!("Captured {} as #{}", record.display_name, record.id);
                self.advance(CaptureState::Done(record.clone()));
            }
            Err(reason) => {
                log::warn!("Capture of {} failed: {reason}", request.display_name);
                self.advance(CaptureState::Failed(reason.clone()));
            }
        }
        result
    }

    async fn run(&self, request: &CaptureRequest) -> Result<ImageRecord, FailureReason> {
        self.advance(CaptureState::AwaitingCameraPermission);
        if !self.permissions.is_granted(PermissionKind::Camera) {
            return Err(FailureReason::PermissionDenied(PermissionKind::Camera));
        }

        self.advance(CaptureState::AwaitingLocationPermission);
        let (tx, mut rx) = mpsc::channel(4);
        // Dropping the set aborts whatever is still running when we return.
        let mut tasks = JoinSet::new();

        if self.permissions.is_granted(PermissionKind::Location) {
            self.advance(CaptureState::LocationRequested);
            let fix_request = self.location.request_fix(self.config.timeout());
            let tx = tx.clone();
            tasks.spawn(async move {
                let _ = tx.send(CaptureEvent::Location(fix_request.outcome().await)).await;
            });
        } else if self.config.require_permission {
            return Err(FailureReason::PermissionDenied(PermissionKind::Location));
        } else {
            log::warn!("Location permission denied, capturing without GPS");
        }

        self.advance(CaptureState::AwaitingCapture);
        let device = Arc::clone(&self.device);
        let target = request.locator.clone();
        let mime_type = request.mime_type.clone();
        tasks.spawn(async move {
            let outcome = device.capture(&target, &mime_type).await;
            let _ = tx.send(CaptureEvent::Capture(outcome)).await;
        });

        let mut fix = None;
        let outcome = loop {
            match rx.recv().await {
                Some(CaptureEvent::Location(outcome)) => record_fix(&mut fix, outcome),
                Some(CaptureEvent::Capture(outcome)) => break outcome,
                // The camera task died without reporting.
                None => break CaptureOutcome::Cancelled,
            }
        };
        // Count a fix that landed in the same instant as the camera result.
        while let Ok(CaptureEvent::Location(outcome)) = rx.try_recv() {
            record_fix(&mut fix, outcome);
        }
        self.location.cancel();

        if outcome == CaptureOutcome::Cancelled {
            return Err(FailureReason::Cancelled);
        }

        self.advance(CaptureState::Annotating);
        let tags = MetadataTagSet::for_capture(self.clock.now(), fix.as_ref());
        let writer = self.writer.clone();
        let locator = request.locator.clone();
        let to_write = tags.clone();
        tokio::task::spawn_blocking(move || writer.annotate(&locator, &to_write))
            .await
            .map_err(|e| FailureReason::AnnotationError(e.to_string()))?
            .map_err(|e| FailureReason::AnnotationError(e.to_string()))?;

        self.advance(CaptureState::Publishing);
        let store = Arc::clone(&self.store);
        let publish = request.clone();
        let stored = tokio::task::spawn_blocking(move || {
            store.insert(&publish.display_name, &publish.mime_type, &publish.locator)
        })
        .await
        .map_err(|e| FailureReason::PublishError(e.to_string()))?
        .map_err(|e| FailureReason::PublishError(format!("{e:#}")))?;

        Ok(ImageRecord::from_tags(stored, &tags))
    }

    /// Apply a transition if the table allows it.
    fn advance(&self, next: CaptureState) {
        self.state.send_if_modified(|current| {
            if !current.can_advance_to(&next) {
                log::error!("Illegal capture transition {current} -> {next}");
                return false;
            }
            log::info!("Capture state {current} -> {next}");
            *current = next;
            true
        });
    }
}

fn record_fix(fix: &mut Option<LocationFix>, outcome: FixOutcome) {
    match outcome {
        FixOutcome::Fix(f) => {
            log::debug!("Location fix {}, {}", f.latitude, f.longitude);
            *fix = Some(f);
        }
        FixOutcome::NoFix => log::info!("No location fix available, capturing without GPS"),
        FixOutcome::Error(e) => log::warn!("Location request failed: {e}"),
        FixOutcome::Superseded => log::debug!("Location request superseded"),
        FixOutcome::Cancelled => log::debug!("Location request cancelled"),
    }
}

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
