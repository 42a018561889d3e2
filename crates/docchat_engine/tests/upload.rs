mod common;

use std::io::Write;

use common::TestSink;
use docchat_engine::{
    ApiSettings, ChatBackend, EngineEvent, FailureKind, ReqwestBackend, UploadFile,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer, chunk: usize) -> ReqwestBackend {
    docchat_logging::initialize_for_tests();
    ReqwestBackend::new(ApiSettings {
        base_url: server.uri(),
        upload_chunk_size: chunk,
        ..ApiSettings::default()
    })
    .expect("backend")
}

fn source_file(bytes: usize) -> (tempfile::NamedTempFile, UploadFile) {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(&vec![b'x'; bytes]).expect("write");
    file.flush().expect("flush");
    let upload = UploadFile {
        path: file.path().to_path_buf(),
        name: "report.txt".to_string(),
        mime_type: "text/plain".to_string(),
    };
    (file, upload)
}

fn progress(events: &[EngineEvent]) -> Vec<(u64, u64)> {
    events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::UploadProgress { sent, total, .. } => Some((*sent, *total)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn upload_sends_multipart_files_field_and_reports_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("name=\"files\""))
        .and(body_string_contains("filename=\"report.txt\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Files uploaded",
            "files": ["report.txt"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_guard, upload) = source_file(10_000);
    let sink = TestSink::new();
    let response = backend_for(&server, 4096)
        .upload(3, &upload, &sink)
        .await
        .expect("upload ok");

    assert_eq!(response.files, vec!["report.txt".to_string()]);

    let ticks = progress(&sink.take());
    assert_eq!(
        ticks,
        vec![(4096, 10_000), (8192, 10_000), (10_000, 10_000)]
    );
}

#[tokio::test]
async fn upload_error_uses_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(413).set_body_json(json!({"detail": "File too large"})))
        .mount(&server)
        .await;

    let (_guard, upload) = source_file(128);
    let err = backend_for(&server, 64)
        .upload(1, &upload, &TestSink::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(413));
    assert_eq!(err.message, "File too large");
}

#[tokio::test]
async fn missing_source_file_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("temp dir");
    let upload = UploadFile {
        path: dir.path().join("missing.pdf"),
        name: "missing.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
    };
    let sink = TestSink::new();
    let err = backend_for(&server, 64)
        .upload(1, &upload, &sink)
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Io);
    assert!(sink.take().is_empty());
}
