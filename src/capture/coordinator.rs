//! The capture coordinator state machine.
//!
//! The coordinator arbitrates between three competing triggers — ordinary
//! readiness, an expected-alert match, and the global timeout — and
//! guarantees the render action fires at most once per session. It is a pure
//! state machine: every external stimulus (engine signal or timer expiry) is
//! a `CaptureEvent` fed to `handle_event`, which returns the `Action` the
//! driver must perform. No timers or I/O live here, which is what makes the
//! trigger arbitration exhaustively testable.

use super::readiness::ReadinessTracker;
use super::types::RenderTrigger;
use crate::engine::Viewport;
use crate::request::CaptureRequest;

/// Grace period between an alert match and the render, in milliseconds.
/// Gives the alerting script a beat to return before the page is painted.
pub const ALERT_RENDER_GRACE_MS: u64 = 10;

/// Coordinator lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for readiness signals (or the expected alert)
    Loading,
    /// Readiness reached; the post-readiness delay is running
    ReadyPendingDelay,
    /// The render action has been handed to the dispatcher
    Rendering,
    /// The global timeout forced the render before readiness
    TimedOut,
    /// The session is over
    Done,
}

/// External stimuli consumed by the coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// Engine finished its initial layout pass
    LayoutComplete,
    /// Engine finished loading the document
    DocumentComplete { ok: bool },
    /// Engine reported a settled viewport size
    GeometryKnown { viewport: Viewport },
    /// A page script raised an alert with the given message
    AlertRaised(String),
    /// The post-readiness delay timer expired
    DelayElapsed,
    /// The global timeout timer expired
    TimeoutExpired,
}

/// What the driver must do after an event is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing; keep waiting
    None,
    /// Arm a one-shot timer that delivers `DelayElapsed` after this many
    /// milliseconds
    StartDelay(u64),
    /// Invoke the Output Dispatcher exactly once, then call `complete`
    Render(RenderTrigger),
}

/// Decides the single correct instant to snapshot the page.
#[derive(Debug)]
pub struct CaptureCoordinator {
    phase: Phase,
    /// Exactly-once guard: stale timers and repeated signals become no-ops
    /// once this is set. The model is single-threaded, so ordering
    /// discipline is all the guard needs.
    render_triggered: bool,
    tracker: ReadinessTracker,
    delay_ms: u64,
    expected_alert: Option<String>,
    alert_matched: bool,
    pending_trigger: RenderTrigger,
}

impl CaptureCoordinator {
    pub fn new(delay_ms: u64, expected_alert: Option<String>) -> Self {
        Self {
            phase: Phase::Loading,
            render_triggered: false,
            tracker: ReadinessTracker::new(),
            delay_ms,
            expected_alert,
            alert_matched: false,
            pending_trigger: RenderTrigger::Readiness,
        }
    }

    pub fn for_request(request: &CaptureRequest) -> Self {
        Self::new(request.delay_ms, request.expected_alert.clone())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn render_triggered(&self) -> bool {
        self.render_triggered
    }

    pub fn tracker(&self) -> &ReadinessTracker {
        &self.tracker
    }

    /// The last viewport size the engine reported, if any
    pub fn viewport(&self) -> Option<Viewport> {
        self.tracker.viewport()
    }

    /// The single transition function. Feed it every engine signal and timer
    /// expiry; perform the returned action.
    pub fn handle_event(&mut self, event: CaptureEvent) -> Action {
        match event {
            CaptureEvent::LayoutComplete => {
                self.tracker.mark_layout_complete();
                self.evaluate_readiness()
            }
            CaptureEvent::DocumentComplete { ok } => {
                self.tracker.mark_document_complete(ok);
                self.evaluate_readiness()
            }
            CaptureEvent::GeometryKnown { viewport } => {
                self.tracker.mark_geometry_known(viewport);
                self.evaluate_readiness()
            }
            CaptureEvent::AlertRaised(message) => self.evaluate_alert(&message),
            CaptureEvent::DelayElapsed => {
                if self.phase == Phase::ReadyPendingDelay {
                    self.begin_render(self.pending_trigger, Phase::Rendering)
                } else {
                    Action::None
                }
            }
            CaptureEvent::TimeoutExpired => {
                if self.render_triggered || self.phase == Phase::Done {
                    Action::None
                } else {
                    self.begin_render(RenderTrigger::Timeout, Phase::TimedOut)
                }
            }
        }
    }

    /// The render (or render failure) finished; the session is over
    pub fn complete(&mut self) {
        self.phase = Phase::Done;
    }

    /// Readiness path: only fires from `Loading`, only once document and
    /// geometry are both in, and never while an expected alert is configured
    /// — the alert then owns the trigger entirely.
    fn evaluate_readiness(&mut self) -> Action {
        if self.phase != Phase::Loading {
            return Action::None;
        }
        if self.expected_alert.is_some() {
            return Action::None;
        }
        if !self.tracker.is_ready() {
            return Action::None;
        }
        self.schedule_render(RenderTrigger::Readiness, self.delay_ms)
    }

    /// Alert path: a verbatim match schedules the render unconditionally,
    /// bypassing the readiness flags. Non-matching alerts are ignored.
    fn evaluate_alert(&mut self, message: &str) -> Action {
        if self.alert_matched || self.render_triggered {
            return Action::None;
        }
        match &self.expected_alert {
            Some(expected) if expected == message => {
                self.alert_matched = true;
                self.schedule_render(RenderTrigger::AlertMatch, ALERT_RENDER_GRACE_MS)
            }
            _ => Action::None,
        }
    }

    fn schedule_render(&mut self, trigger: RenderTrigger, delay_ms: u64) -> Action {
        self.phase = Phase::ReadyPendingDelay;
        self.pending_trigger = trigger;
        if delay_ms == 0 {
            self.begin_render(trigger, Phase::Rendering)
        } else {
            Action::StartDelay(delay_ms)
        }
    }

    fn begin_render(&mut self, trigger: RenderTrigger, phase: Phase) -> Action {
        if self.render_triggered {
            return Action::None;
        }
        self.render_triggered = true;
        self.phase = phase;
        Action::Render(trigger)
    }
}
