use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::{ApiError, ChatBackend, EngineEvent, OpId, ProgressSink, ScrapeResponse};

/// Runs `backend.scrape(url)` while emitting `ScrapeProgress` every `tick`.
///
/// The ticker lives in this future, so it stops when the scrape settles or
/// when the future is dropped. No progress event follows the result.
pub async fn scrape_with_progress(
    backend: &dyn ChatBackend,
    op: OpId,
    url: &str,
    tick: Duration,
    sink: &dyn ProgressSink,
) -> (Result<ScrapeResponse, ApiError>, Duration) {
    let started = Instant::now();
    let tick = tick.max(Duration::from_millis(1));
    let mut ticker = interval_at(started + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let request = backend.scrape(url);
    tokio::pin!(request);
    let result = loop {
        tokio::select! {
            biased;
            result = &mut request => break result,
            _ = ticker.tick() => {
                sink.emit(EngineEvent::ScrapeProgress {
                    op,
                    elapsed: started.elapsed(),
                });
            }
        }
    };
    (result, started.elapsed())
}
