mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{progress_elapsed, FakeBackend, TestSink};
use docchat_engine::scrape_with_progress;

const TICK: Duration = Duration::from_millis(500);

#[tokio::test(start_paused = true)]
async fn ticker_reports_elapsed_until_the_scrape_settles() {
    let backend = FakeBackend::scrape_after(Duration::from_millis(1600));
    let sink = TestSink::new();

    let (result, elapsed) =
        scrape_with_progress(&backend, 7, "https://example.com", TICK, &sink).await;

    assert!(result.unwrap().status.as_deref() == Some("success"));
    assert_eq!(elapsed, Duration::from_millis(1600));
    assert_eq!(
        progress_elapsed(&sink.take()),
        vec![
            Duration::from_millis(500),
            Duration::from_millis(1000),
            Duration::from_millis(1500),
        ]
    );

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(sink.len(), 0, "no ticks after the result");
}

#[tokio::test(start_paused = true)]
async fn fast_scrape_emits_no_ticks() {
    let backend = FakeBackend::scrape_after(Duration::from_millis(100));
    let sink = TestSink::new();

    let (result, _) = scrape_with_progress(&backend, 1, "https://example.com", TICK, &sink).await;

    assert!(result.is_ok());
    assert!(sink.take().is_empty());
}

#[tokio::test(start_paused = true)]
async fn dropping_the_scrape_stops_the_ticker() {
    let backend = Arc::new(FakeBackend::scrape_never());
    let sink = TestSink::new();

    let task = {
        let backend = backend.clone();
        let sink = sink.clone();
        tokio::spawn(async move {
            scrape_with_progress(backend.as_ref(), 3, "https://example.com", TICK, &sink).await
        })
    };

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(sink.len(), 2);

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(sink.len(), 2);
}
