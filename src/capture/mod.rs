//! Capture readiness tracking, coordination, and output dispatch.

pub mod coordinator;
pub mod dispatch;
pub mod readiness;
pub mod types;

pub use coordinator::{Action, CaptureCoordinator, CaptureEvent, Phase, ALERT_RENDER_GRACE_MS};
pub use dispatch::{dispatch_output, OutputDetails};
pub use readiness::ReadinessTracker;
pub use types::{CaptureError, CaptureOutcome, CaptureResult, RenderTrigger};
