use std::path::PathBuf;
use std::time::Duration;

use docchat_core::{update, AppState, Effect, FileStatus, MessageId, Msg, UploadSource};

fn source(name: &str) -> UploadSource {
    UploadSource {
        path: PathBuf::from(format!("/tmp/{name}")),
        name: name.to_string(),
        size_bytes: 2048,
        mime_type: "application/pdf".to_string(),
    }
}

fn start_upload(state: AppState, name: &str) -> (AppState, MessageId) {
    let (state, effects) = update(state, Msg::UploadRequested(source(name)));
    let message_id = match effects.as_slice() {
        [Effect::Upload { message_id, source }] => {
            assert_eq!(source.name, name);
            *message_id
        }
        other => panic!("expected one upload effect, got {other:?}"),
    };
    (state, message_id)
}

fn progress(state: AppState, message_id: MessageId, sent: u64, total: u64) -> AppState {
    update(
        state,
        Msg::UploadProgress {
            message_id,
            sent,
            total,
            elapsed: Duration::from_millis(700),
        },
    )
    .0
}

#[test]
fn upload_inserts_progress_message_and_registry_entry() {
    let (state, message_id) = start_upload(AppState::new(), "report.pdf");

    assert_eq!(state.messages().len(), 1);
    let message = &state.messages()[0];
    assert_eq!(message.id, message_id);
    assert_eq!(message.content, "📤 Starting upload: report.pdf (0%)");
    assert_eq!(message.progress, Some(0));

    let item = &state.files().items()[0];
    assert_eq!(item.status, FileStatus::Uploading);
    assert_eq!(item.size, "2 KB");
    assert_eq!(state.files().selected_id(), Some(item.id));
    assert!(state.view().is_uploading);
}

#[test]
fn progress_events_rewrite_the_single_tracked_message() {
    let (mut state, message_id) = start_upload(AppState::new(), "report.pdf");

    for percent in [25u64, 50, 100] {
        state = progress(state, message_id, percent, 100);
        assert_eq!(state.messages().len(), 1);
        let message = &state.messages()[0];
        assert_eq!(message.progress, Some(percent as u8));
        assert_eq!(
            message.content,
            format!("📤 Uploading: report.pdf ({percent}%) [0.7s]")
        );
        assert_eq!(state.view().upload_progress, Some(percent as u8));
    }
}

#[test]
fn successful_upload_completes_message_and_refreshes_listing() {
    let (state, message_id) = start_upload(AppState::new(), "report.pdf");
    let (state, effects) = update(
        state,
        Msg::UploadFinished {
            message_id,
            result: Ok(()),
            elapsed: Duration::from_millis(2300),
        },
    );

    assert!(matches!(effects.as_slice(), [Effect::ListFiles { .. }]));
    let message = &state.messages()[0];
    assert_eq!(message.content, "✅ Uploaded: report.pdf (2.3s)");
    assert_eq!(message.progress, Some(100));
    assert_eq!(state.files().items()[0].status, FileStatus::Success);
    assert_eq!(state.current_file(), Some("report.pdf"));
    assert!(!state.view().is_uploading);
}

#[test]
fn failed_upload_marks_error_everywhere() {
    let (state, message_id) = start_upload(AppState::new(), "big.pdf");
    let (state, effects) = update(
        state,
        Msg::UploadFinished {
            message_id,
            result: Err("File too large".into()),
            elapsed: Duration::from_secs(1),
        },
    );

    assert!(effects.is_empty());
    let message = &state.messages()[0];
    assert_eq!(message.content, "❌ Upload failed: big.pdf (1.0s)\nFile too large");
    assert_eq!(message.progress, Some(0));
    assert_eq!(
        state.files().items()[0].status,
        FileStatus::Error("File too large".into())
    );
    assert_eq!(state.error(), Some("File too large"));
    assert!(state.view().has_upload_error);
    assert_eq!(state.current_file(), None);
}

#[test]
fn late_progress_after_settlement_is_ignored() {
    let (state, message_id) = start_upload(AppState::new(), "report.pdf");
    let (state, _) = update(
        state,
        Msg::UploadFinished {
            message_id,
            result: Ok(()),
            elapsed: Duration::from_secs(1),
        },
    );
    let before = state.messages().to_vec();
    let state = progress(state, message_id, 10, 100);

    assert_eq!(state.messages(), before.as_slice());
}

#[test]
fn concurrent_uploads_get_distinct_messages_and_settle_independently() {
    let (state, first) = start_upload(AppState::new(), "a.pdf");
    let (state, second) = start_upload(state, "b.pdf");
    assert_ne!(first, second);
    assert_eq!(state.messages().len(), 2);

    let (state, _) = update(
        state,
        Msg::UploadFinished {
            message_id: second,
            result: Err("boom".into()),
            elapsed: Duration::from_secs(1),
        },
    );
    let state = progress(state, first, 50, 100);
    let (state, _) = update(
        state,
        Msg::UploadFinished {
            message_id: first,
            result: Ok(()),
            elapsed: Duration::from_secs(2),
        },
    );

    let statuses: Vec<_> = state
        .files()
        .items()
        .iter()
        .map(|item| (item.name.as_str(), item.status.clone()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("a.pdf", FileStatus::Success),
            ("b.pdf", FileStatus::Error("boom".into())),
        ]
    );
    assert_eq!(state.messages()[0].progress, Some(100));
    assert_eq!(state.messages()[1].progress, Some(0));
}
