//! The capture workflow and the platform collaborators it drives.
//!
//! A [`CaptureOrchestrator`] checks permissions through a [`PermissionGate`],
//! asks the [`LocationSource`](crate::location::LocationSource) for a fix while
//! a [`CaptureDevice`] fills the target container, stamps the result with a
//! [`MetadataWriter`](crate::exif::MetadataWriter) and publishes it to an
//! [`ImageStore`](crate::store::ImageStore).

mod device;
mod orchestrator;
mod state;

pub use device::ImportDevice;
pub use orchestrator::CaptureOrchestrator;
pub use state::{CaptureState, FailureReason, PermissionKind};

use chrono::{Local, NaiveDateTime};

use crate::container::ContainerLocator;

pub const JPEG_MIME_TYPE: &str = "image/jpeg";

/// One capture attempt: where the camera writes and how the result is published.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    pub locator: ContainerLocator,
    pub display_name: String,
    pub mime_type: String,
}

impl CaptureRequest {
    /// A JPEG capture into `locator`.
    pub fn new(locator: ContainerLocator, display_name: impl Into<String>) -> Self {
        Self {
            locator,
            display_name: display_name.into(),
            mime_type: JPEG_MIME_TYPE.to_string(),
        }
    }

    /// `IMG_<unix millis>.jpg`, the name given to fresh captures.
    pub fn default_display_name() -> String {
        format!("IMG_{}.jpg", chrono::Utc::now().timestamp_millis())
    }
}

/// Answers whether a runtime permission is currently held.
pub trait PermissionGate: Send + Sync {
    fn is_granted(&self, kind: PermissionKind) -> bool;
}

/// Fixed permission answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticPermissions {
    pub camera: bool,
    pub location: bool,
}

impl StaticPermissions {
    pub fn all_granted() -> Self {
        Self {
            camera: true,
            location: true,
        }
    }
}

impl PermissionGate for StaticPermissions {
    fn is_granted(&self, kind: PermissionKind) -> bool {
        match kind {
            PermissionKind::Camera => self.camera,
            PermissionKind::Location => self.location,
        }
    }
}

/// How the external camera finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The target container holds the complete image.
    Success,
    /// The user backed out, or the camera produced nothing.
    Cancelled,
}

/// The external camera. It writes a complete image into `target` before
/// reporting [`CaptureOutcome::Success`].
#[async_trait::async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn capture(&self, target: &ContainerLocator, mime_type: &str) -> CaptureOutcome;
}

/// Source of the wall-clock time stamped into `DateTime*` tags.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
