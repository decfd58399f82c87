use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::catalog::ImageRecord;

/// A runtime permission the capture flow is gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionKind {
    Camera,
    Location,
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Camera => f.write_str("camera"),
            Self::Location => f.write_str("location"),
        }
    }
}

/// Why a capture attempt ended without publishing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FailureReason {
    #[error("{0} permission denied")]
    PermissionDenied(PermissionKind),

    #[error("Capture cancelled")]
    Cancelled,

    /// The container could not be annotated. Its captured bytes are intact and unpublished.
    #[error("Annotation failed: {0}")]
    AnnotationError(String),

    /// The store rejected the record. The annotated container is kept.
    #[error("Publish failed: {0}")]
    PublishError(String),

    /// Another capture is already running on this orchestrator.
    #[error("A capture is already in progress")]
    Busy,
}

/// Position of a capture attempt in its lifecycle.
///
/// ```text
/// Idle → AwaitingCameraPermission → AwaitingLocationPermission → LocationRequested
///      → AwaitingCapture → Annotating → Publishing → Done
/// ```
///
/// Any non-terminal state may end in `Failed`. Terminal states return to `Idle`
/// when the next capture starts.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    AwaitingCameraPermission,
    AwaitingLocationPermission,
    /// A location request is in flight. Capture starts without waiting for it.
    LocationRequested,
    AwaitingCapture,
    Annotating,
    Publishing,
    Done(ImageRecord),
    Failed(FailureReason),
}

impl CaptureState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Failed(_))
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(&self, next: &CaptureState) -> bool {
        use CaptureState::*;

        if let Failed(_) = next {
            return !self.is_terminal() && *self != Idle;
        }
        matches!(
            (self, next),
            (Idle | Done(_) | Failed(_), AwaitingCameraPermission)
                | (AwaitingCameraPermission, AwaitingLocationPermission)
                | (AwaitingLocationPermission, LocationRequested)
                // Location permission denied but not required: capture without GPS.
                | (AwaitingLocationPermission, AwaitingCapture)
                | (LocationRequested, AwaitingCapture)
                | (AwaitingCapture, Annotating)
                | (Annotating, Publishing)
                | (Publishing, Done(_))
        )
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::AwaitingCameraPermission => "AwaitingCameraPermission",
            Self::AwaitingLocationPermission => "AwaitingLocationPermission",
            Self::LocationRequested => "LocationRequested",
            Self::AwaitingCapture => "AwaitingCapture",
            Self::Annotating => "Annotating",
            Self::Publishing => "Publishing",
            Self::Done(_) => "Done",
            Self::Failed(_) => "Failed",
        }
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done(record) => write!(f, "Done({})", record.display_name),
            Self::Failed(reason) => write!(f, "Failed({reason})"),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerLocator;
    use chrono::Utc;

    fn record() -> ImageRecord {
        ImageRecord {
            id: 1,
            locator: ContainerLocator::path("/a.jpg"),
            display_name: "IMG_1.jpg".into(),
            inserted_at: Utc::now(),
            date_time: None,
            geo_location: None,
        }
    }

    #[test]
    fn happy_path_is_legal() {
        let path = [
            CaptureState::Idle,
            CaptureState::AwaitingCameraPermission,
            CaptureState::AwaitingLocationPermission,
            CaptureState::LocationRequested,
            CaptureState::AwaitingCapture,
            CaptureState::Annotating,
            CaptureState::Publishing,
            CaptureState::Done(record()),
            CaptureState::AwaitingCameraPermission,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(&pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn skipping_steps_is_illegal() {
        assert!(!CaptureState::Idle.can_advance_to(&CaptureState::Annotating));
        assert!(!CaptureState::AwaitingCapture.can_advance_to(&CaptureState::Publishing));
        assert!(!CaptureState::Annotating.can_advance_to(&CaptureState::Done(record())));
        assert!(!CaptureState::Publishing.can_advance_to(&CaptureState::Idle));
    }

    #[test]
    fn failure_only_from_active_states() {
        let failed = CaptureState::Failed(FailureReason::Cancelled);
        assert!(CaptureState::AwaitingCapture.can_advance_to(&failed));
        assert!(CaptureState::AwaitingCameraPermission.can_advance_to(&failed));
        assert!(!CaptureState::Idle.can_advance_to(&failed));
        assert!(!CaptureState::Done(record()).can_advance_to(&failed));
        assert!(!failed.can_advance_to(&failed));
        assert!(failed.can_advance_to(&CaptureState::AwaitingCameraPermission));
    }

    #[test]
    fn display_names() {
        assert_eq!(CaptureState::LocationRequested.to_string(), "LocationRequested");
        assert_eq!(
            CaptureState::Failed(FailureReason::PermissionDenied(PermissionKind::Camera))
                .to_string(),
            "Failed(camera permission denied)"
        );
    }
}
