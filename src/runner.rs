//! Drives one capture session end to end.
//!
//! The runner owns the two timers (post-readiness delay and global timeout)
//! and the engine's event stream, feeds everything into the
//! `CaptureCoordinator` as `CaptureEvent`s, and performs the actions it
//! returns. Everything runs on one task; suspension points are exactly the
//! timer expiries and engine callbacks.

use std::time::Duration;
use tokio::time::Instant;

use crate::capture::coordinator::{Action, CaptureCoordinator, CaptureEvent};
use crate::capture::dispatch::dispatch_output;
use crate::capture::types::{CaptureError, CaptureOutcome, CaptureResult};
use crate::engine::{EngineError, EngineEvent, PageEngine, Viewport};
use crate::request::CaptureRequest;
#[cfg(feature = "script")]
use crate::script::ScriptSession;

/// Load the page and capture it once, per the coordinator's trigger policy.
///
/// Returns the terminal outcome, or the first configuration, engine, or
/// encoder error. A timeout-forced capture is a success. If the engine stops
/// reporting before readiness and no timer is pending, this fails rather
/// than waiting forever.
pub async fn run_capture<E: PageEngine + ?Sized>(
    engine: &mut E,
    request: &CaptureRequest,
) -> CaptureResult<CaptureOutcome> {
    let started = std::time::Instant::now();

    engine.configure(&request.settings)?;
    engine.load(request)?;
    let mut events = engine.take_events()?;
    log::info!("loading {} (engine: {})", request.url, engine.name());

    #[cfg(feature = "script")]
    let mut script = ScriptSession::from_request(request);

    let mut coordinator = CaptureCoordinator::for_request(request);
    let mut timeout_at = (request.max_wait_ms > 0)
        .then(|| Instant::now() + Duration::from_millis(request.max_wait_ms));
    let mut delay_at: Option<Instant> = None;
    let mut events_open = true;

    let trigger = loop {
        if !events_open && delay_at.is_none() && timeout_at.is_none() {
            return Err(CaptureError::Engine(EngineError::Load(
                "engine stopped reporting before the page became ready".to_string(),
            )));
        }

        let event = tokio::select! {
            _ = sleep_until_opt(delay_at), if delay_at.is_some() => {
                delay_at = None;
                CaptureEvent::DelayElapsed
            }
            _ = sleep_until_opt(timeout_at), if timeout_at.is_some() => {
                timeout_at = None;
                log::info!("maximum wait exceeded, forcing capture");
                CaptureEvent::TimeoutExpired
            }
            next = events.recv(), if events_open => match next {
                Some(engine_event) => match engine_event {
                    EngineEvent::LayoutComplete => {
                        log::info!("engine completed initial layout");
                        CaptureEvent::LayoutComplete
                    }
                    EngineEvent::DocumentComplete { ok } => {
                        log::info!("engine finished loading document (ok: {})", ok);
                        CaptureEvent::DocumentComplete { ok }
                    }
                    EngineEvent::GeometryChanged { viewport } => {
                        log::info!("viewport geometry changed ({})", viewport);
                        CaptureEvent::GeometryKnown { viewport }
                    }
                    EngineEvent::AlertRaised(message) => {
                        if request.debug_print_alerts {
                            log::debug!("[alert] {}", message);
                        }
                        CaptureEvent::AlertRaised(message)
                    }
                    EngineEvent::ContextCleared => {
                        #[cfg(feature = "script")]
                        if let Some(session) = script.as_mut() {
                            session.on_context_cleared(engine).await?;
                        }
                        continue;
                    }
                },
                None => {
                    events_open = false;
                    continue;
                }
            }
        };

        match coordinator.handle_event(event) {
            Action::None => {}
            Action::StartDelay(ms) => {
                log::debug!("readiness reached, delaying render {}ms", ms);
                delay_at = Some(Instant::now() + Duration::from_millis(ms));
            }
            Action::Render(trigger) => break trigger,
        }
    };

    let minimum = Viewport::new(request.min_width, request.min_height);
    let viewport = coordinator
        .viewport()
        .map(|v| v.expanded_to(minimum))
        .unwrap_or(minimum);
    log::info!(
        "rendering {} output at {} -> {}",
        request.format.identifier(),
        viewport,
        request.output.display()
    );

    let dispatched = dispatch_output(engine, request, viewport).await;
    coordinator.complete();
    let details = dispatched?;

    Ok(CaptureOutcome {
        output: request.output.clone(),
        format: request.format,
        trigger,
        width: details.width,
        height: details.height,
        elapsed_ms: started.elapsed().as_millis() as u64,
        completed_at: chrono::Utc::now(),
    })
}

/// Sleep until the given deadline, or forever when there is none.
/// Guarded select branches still evaluate their future expression, so the
/// `None` case must produce a valid (never-ready) future.
async fn sleep_until_opt(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::RenderTrigger;
    use crate::engine::{MockEngine, MockEngineConfig, ScriptedEvent};

    fn png_request(dir: &tempfile::TempDir, max_wait_ms: u64, delay_ms: u64) -> CaptureRequest {
        CaptureRequest::builder("http://example.org/", dir.path().join("out.png"))
            .max_wait_ms(max_wait_ms)
            .delay_ms(delay_ms)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_readiness_capture_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let request = png_request(&dir, 0, 0);
        let mut engine = MockEngine::ready_at(Viewport::new(800, 600));

        let outcome = run_capture(&mut engine, &request).await.unwrap();
        assert_eq!(outcome.trigger, RenderTrigger::Readiness);
        assert_eq!(outcome.width, Some(800));
        assert_eq!(outcome.height, Some(600));
        assert!(request.output.exists());
    }

    #[tokio::test]
    async fn test_delay_lower_bounds_render() {
        let dir = tempfile::tempdir().unwrap();
        let request = png_request(&dir, 0, 150);
        let mut engine = MockEngine::ready_at(Viewport::new(800, 600));

        let outcome = run_capture(&mut engine, &request).await.unwrap();
        assert_eq!(outcome.trigger, RenderTrigger::Readiness);
        assert!(outcome.elapsed_ms >= 150, "elapsed {}ms", outcome.elapsed_ms);
    }

    #[tokio::test]
    async fn test_timeout_forces_capture_of_silent_page() {
        let dir = tempfile::tempdir().unwrap();
        let request = png_request(&dir, 200, 0);
        let mut engine = MockEngine::silent_page();

        let outcome = run_capture(&mut engine, &request).await.unwrap();
        assert_eq!(outcome.trigger, RenderTrigger::Timeout);
        assert!(outcome.elapsed_ms >= 200);
        assert!(request.output.exists());
    }

    #[tokio::test]
    async fn test_unbounded_wait_with_dead_engine_fails() {
        let dir = tempfile::tempdir().unwrap();
        let request = png_request(&dir, 0, 0);
        let mut engine = MockEngine::silent_page();

        let err = run_capture(&mut engine, &request).await.unwrap_err();
        assert!(matches!(err, CaptureError::Engine(_)));
        assert!(!request.output.exists());
    }

    #[tokio::test]
    async fn test_render_failure_still_terminates() {
        let dir = tempfile::tempdir().unwrap();
        let request = png_request(&dir, 0, 0);
        let mut engine = MockEngine::new(MockEngineConfig {
            events: vec![
                ScriptedEvent::immediate(EngineEvent::GeometryChanged {
                    viewport: Viewport::new(800, 600),
                }),
                ScriptedEvent::immediate(EngineEvent::DocumentComplete { ok: true }),
            ],
            fail_render: Some("surface is 0x0".to_string()),
            ..Default::default()
        });

        let err = run_capture(&mut engine, &request).await.unwrap_err();
        assert!(matches!(err, CaptureError::Engine(EngineError::Render(_))));
    }

    #[tokio::test]
    async fn test_viewport_never_below_configured_minimum() {
        let dir = tempfile::tempdir().unwrap();
        let request = png_request(&dir, 0, 0);
        // Engine settles on a viewport smaller than the minimum
        let mut engine = MockEngine::ready_at(Viewport::new(100, 900));

        let outcome = run_capture(&mut engine, &request).await.unwrap();
        assert_eq!(outcome.width, Some(800));
        assert_eq!(outcome.height, Some(900));
    }
}
