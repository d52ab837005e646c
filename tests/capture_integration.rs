//! Integration tests for the end-to-end capture pipeline

use std::fs;

use pagecapt::capture::{CaptureError, RenderTrigger};
use pagecapt::engine::{EngineEvent, MockEngine, MockEngineConfig, ScriptedEvent, Viewport};
use pagecapt::request::CaptureRequest;
use pagecapt::runner::run_capture;

fn write_page(dir: &tempfile::TempDir, name: &str, html: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, html).expect("failed to write test page");
    format!("file://{}", path.display())
}

#[tokio::test]
async fn test_local_page_to_png() {
    let dir = tempfile::tempdir().unwrap();
    let url = write_page(&dir, "empty.html", "<html><body></body></html>");
    let output = dir.path().join("page.png");

    let request = CaptureRequest::builder(&url, &output)
        .max_wait_ms(5_000)
        .build()
        .unwrap();
    let mut engine = MockEngine::for_request(&request);

    let outcome = run_capture(&mut engine, &request).await.unwrap();
    assert_eq!(outcome.trigger, RenderTrigger::Readiness);
    assert_eq!(outcome.width, Some(800));
    assert_eq!(outcome.height, Some(600));

    let bytes = fs::read(&output).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn test_missing_local_page_still_captures() {
    // A failed load completes the document; the capture proceeds anyway
    let dir = tempfile::tempdir().unwrap();
    let url = format!("file://{}", dir.path().join("no-such.html").display());
    let output = dir.path().join("page.png");

    let request = CaptureRequest::builder(&url, &output)
        .max_wait_ms(5_000)
        .build()
        .unwrap();
    let mut engine = MockEngine::for_request(&request);

    let outcome = run_capture(&mut engine, &request).await.unwrap();
    assert_eq!(outcome.trigger, RenderTrigger::Readiness);
    assert!(output.exists());
}

#[tokio::test]
async fn test_pdf_goes_through_print_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let url = write_page(&dir, "doc.html", "<html><body><h1>Title</h1></body></html>");
    let output = dir.path().join("doc.pdf");

    let request = CaptureRequest::builder(&url, &output)
        .max_wait_ms(5_000)
        .build()
        .unwrap();
    let mut engine = MockEngine::for_request(&request);

    let outcome = run_capture(&mut engine, &request).await.unwrap();
    // Paginated output has no pixel dimensions
    assert_eq!(outcome.width, None);
    assert_eq!(outcome.height, None);

    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn test_itext_extracts_page_text() {
    let dir = tempfile::tempdir().unwrap();
    let url = write_page(&dir, "text.html", "<html><body><p>Hello, world</p></body></html>");
    let output = dir.path().join("page.txt");

    let request = CaptureRequest::builder(&url, &output)
        .format_identifier("itext")
        .max_wait_ms(5_000)
        .build()
        .unwrap();
    let mut engine = MockEngine::for_request(&request);

    run_capture(&mut engine, &request).await.unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), "Hello, world");
}

#[tokio::test]
async fn test_html_serializes_page_markup() {
    let dir = tempfile::tempdir().unwrap();
    let source = "<html><body><p>Hello</p></body></html>";
    let url = write_page(&dir, "page.html", source);
    let output = dir.path().join("copy.html");

    let request = CaptureRequest::builder(&url, &output)
        .max_wait_ms(5_000)
        .build()
        .unwrap();
    let mut engine = MockEngine::for_request(&request);

    run_capture(&mut engine, &request).await.unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), source);
}

#[tokio::test]
async fn test_silent_page_falls_back_to_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("page.png");

    let request = CaptureRequest::builder("http://example.org/", &output)
        .max_wait_ms(500)
        .build()
        .unwrap();
    let mut engine = MockEngine::silent_page();

    let started = std::time::Instant::now();
    let outcome = run_capture(&mut engine, &request).await.unwrap();
    assert_eq!(outcome.trigger, RenderTrigger::Timeout);
    assert!(started.elapsed().as_millis() >= 500);
    assert!(output.exists());
}

#[tokio::test]
async fn test_expected_alert_preempts_readiness() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("page.png");

    let request = CaptureRequest::builder("http://example.org/", &output)
        .expected_alert("ready-now")
        .delay_ms(60_000) // must be bypassed by the alert path
        .max_wait_ms(10_000)
        .build()
        .unwrap();
    let mut engine = MockEngine::new(MockEngineConfig {
        events: vec![
            ScriptedEvent::immediate(EngineEvent::GeometryChanged {
                viewport: Viewport::new(1024, 768),
            }),
            ScriptedEvent::immediate(EngineEvent::DocumentComplete { ok: true }),
            ScriptedEvent::after(50, EngineEvent::AlertRaised("wrong".to_string())),
            ScriptedEvent::after(50, EngineEvent::AlertRaised("ready-now".to_string())),
        ],
        ..Default::default()
    });

    let outcome = run_capture(&mut engine, &request).await.unwrap();
    assert_eq!(outcome.trigger, RenderTrigger::AlertMatch);
    assert_eq!(outcome.width, Some(1024));
    assert!(output.exists());
}

#[test]
fn test_unknown_format_fails_before_any_engine_work() {
    let err = CaptureRequest::builder("http://example.org/", "page.png")
        .format_identifier("bogus")
        .build()
        .unwrap_err();
    assert!(matches!(err, CaptureError::Config(_)));
    assert!(err.to_string().contains("bogus"));
}

#[test]
fn test_mng_output_rejected_up_front() {
    let err = CaptureRequest::builder("http://example.org/", "page.mng")
        .build()
        .unwrap_err();
    assert!(matches!(err, CaptureError::Config(_)));
}
