mod common;

use std::sync::Arc;
use std::time::Duration;

use common::FakeBackend;
use docchat_engine::{AskOutcome, EngineCommand, EngineEvent, EngineHandle};

fn collect_until<F>(engine: &EngineHandle, mut done: F) -> Vec<EngineEvent>
where
    F: FnMut(&EngineEvent) -> bool,
{
    let mut events = Vec::new();
    while let Some(event) = engine.recv_timeout(Duration::from_secs(5)) {
        let finished = done(&event);
        events.push(event);
        if finished {
            break;
        }
    }
    events
}

#[test]
fn ask_round_trip_reports_completion() {
    let engine = EngineHandle::with_backend(
        Arc::new(FakeBackend::scrape_never()),
        Duration::from_millis(500),
    )
    .unwrap();

    engine.send(EngineCommand::Ask {
        op: 11,
        question: "hello".to_string(),
    });

    let events = collect_until(&engine, |event| {
        matches!(event, EngineEvent::AskCompleted { .. })
    });
    match events.last() {
        Some(EngineEvent::AskCompleted {
            op: 11,
            result: Ok(AskOutcome::Answer { answer, conversation_id }),
            ..
        }) => {
            assert_eq!(answer, "echo: hello");
            assert_eq!(conversation_id.as_deref(), Some("conv-1"));
        }
        other => panic!("unexpected events: {other:?}"),
    }
}

#[test]
fn streamed_chunks_arrive_before_completion() {
    let engine = EngineHandle::with_backend(
        Arc::new(FakeBackend::scrape_never()),
        Duration::from_millis(500),
    )
    .unwrap();

    engine.send(EngineCommand::Ask {
        op: 2,
        question: "stream:partial".to_string(),
    });

    let events = collect_until(&engine, |event| {
        matches!(event, EngineEvent::AskCompleted { .. })
    });
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0],
        EngineEvent::AnswerChunk {
            op: 2,
            text: "partial".to_string()
        }
    );
    assert!(matches!(
        events[1],
        EngineEvent::AskCompleted {
            op: 2,
            result: Ok(AskOutcome::Streamed),
            ..
        }
    ));
}

#[test]
fn scrape_progress_precedes_completion_and_then_stops() {
    let engine = EngineHandle::with_backend(
        Arc::new(FakeBackend::scrape_after(Duration::from_millis(120))),
        Duration::from_millis(20),
    )
    .unwrap();

    engine.send(EngineCommand::Scrape {
        op: 5,
        url: "https://example.com".to_string(),
    });

    let events = collect_until(&engine, |event| {
        matches!(event, EngineEvent::ScrapeCompleted { .. })
    });
    assert!(matches!(
        events.last(),
        Some(EngineEvent::ScrapeCompleted { op: 5, result: Ok(_), .. })
    ));
    assert!(events
        .iter()
        .any(|event| matches!(event, EngineEvent::ScrapeProgress { op: 5, .. })));

    assert!(engine.recv_timeout(Duration::from_millis(150)).is_none());
}

#[test]
fn delete_echoes_the_requested_name() {
    let engine = EngineHandle::with_backend(
        Arc::new(FakeBackend::scrape_never()),
        Duration::from_millis(500),
    )
    .unwrap();

    engine.send(EngineCommand::DeleteFile {
        op: 9,
        name: "report.pdf".to_string(),
    });

    let events = collect_until(&engine, |_| true);
    match events.as_slice() {
        [EngineEvent::FileDeleted { op: 9, name, result: Ok(_) }] => {
            assert_eq!(name, "report.pdf");
        }
        other => panic!("unexpected events: {other:?}"),
    }
}
