//! Accumulates the engine's asynchronous readiness signals.

use crate::engine::Viewport;

/// Tracks the three independent readiness signals for one capture session.
///
/// Setters are idempotent and may arrive in any order or repeatedly. Flags
/// are monotonic: once set they never revert within a session. The viewport
/// recorded by `mark_geometry_known` is updated on every call, since the
/// engine may resize the view several times before the page settles.
#[derive(Debug, Clone, Default)]
pub struct ReadinessTracker {
    layout_complete: bool,
    document_complete: bool,
    geometry_known: bool,
    viewport: Option<Viewport>,
}

impl ReadinessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The engine finished its initial layout pass
    pub fn mark_layout_complete(&mut self) {
        self.layout_complete = true;
    }

    /// The document finished loading. `ok` is accepted but ignored for
    /// readiness: a failed load is treated the same as a successful one.
    pub fn mark_document_complete(&mut self, _ok: bool) {
        self.document_complete = true;
    }

    /// The viewport settled on the given size
    pub fn mark_geometry_known(&mut self, viewport: Viewport) {
        self.geometry_known = true;
        self.viewport = Some(viewport);
    }

    pub fn layout_complete(&self) -> bool {
        self.layout_complete
    }

    pub fn document_complete(&self) -> bool {
        self.document_complete
    }

    pub fn geometry_known(&self) -> bool {
        self.geometry_known
    }

    /// The last viewport size reported by the engine, if any
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Whether capture preconditions are satisfied.
    ///
    /// Only document-complete and geometry-known gate readiness. The layout
    /// signal is tracked for diagnostics but never wired up by newer
    /// engines, so requiring it would stall every capture.
    pub fn is_ready(&self) -> bool {
        self.document_complete && self.geometry_known
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initially_not_ready() {
        let tracker = ReadinessTracker::new();
        assert!(!tracker.is_ready());
        assert!(tracker.viewport().is_none());
    }

    #[test]
    fn test_ready_in_any_order() {
        let mut a = ReadinessTracker::new();
        a.mark_document_complete(true);
        assert!(!a.is_ready());
        a.mark_geometry_known(Viewport::new(800, 600));
        assert!(a.is_ready());

        let mut b = ReadinessTracker::new();
        b.mark_geometry_known(Viewport::new(800, 600));
        assert!(!b.is_ready());
        b.mark_document_complete(true);
        assert!(b.is_ready());
    }

    #[test]
    fn test_layout_does_not_gate_readiness() {
        let mut tracker = ReadinessTracker::new();
        tracker.mark_document_complete(true);
        tracker.mark_geometry_known(Viewport::new(800, 600));
        assert!(tracker.is_ready());
        assert!(!tracker.layout_complete());

        tracker.mark_layout_complete();
        assert!(tracker.layout_complete());
        assert!(tracker.is_ready());
    }

    #[test]
    fn test_load_failure_counts_as_complete() {
        let mut tracker = ReadinessTracker::new();
        tracker.mark_document_complete(false);
        assert!(tracker.document_complete());
    }

    #[test]
    fn test_setters_idempotent_and_viewport_updates() {
        let mut tracker = ReadinessTracker::new();
        tracker.mark_geometry_known(Viewport::new(800, 600));
        tracker.mark_geometry_known(Viewport::new(1024, 900));
        tracker.mark_document_complete(true);
        tracker.mark_document_complete(true);
        assert!(tracker.is_ready());
        assert_eq!(tracker.viewport(), Some(Viewport::new(1024, 900)));
    }
}
