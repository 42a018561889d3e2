#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use docchat_engine::{
    ApiError, AskOutcome, ChatBackend, EngineEvent, FileInfo, NewsArticle, OpId, ProgressSink,
    ScrapeResponse, StatusMessage, UploadFile, UploadResponse,
};

#[derive(Default, Clone)]
pub struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Backend double whose scrape takes `scrape_delay` (or never finishes).
pub struct FakeBackend {
    pub scrape_delay: Option<Duration>,
}

impl FakeBackend {
    pub fn scrape_after(delay: Duration) -> Self {
        Self {
            scrape_delay: Some(delay),
        }
    }

    pub fn scrape_never() -> Self {
        Self { scrape_delay: None }
    }
}

#[async_trait::async_trait]
impl ChatBackend for FakeBackend {
    async fn ask(
        &self,
        op: OpId,
        question: &str,
        sink: &dyn ProgressSink,
    ) -> Result<AskOutcome, ApiError> {
        if question.starts_with("stream:") {
            sink.emit(EngineEvent::AnswerChunk {
                op,
                text: question.trim_start_matches("stream:").to_string(),
            });
            return Ok(AskOutcome::Streamed);
        }
        Ok(AskOutcome::Answer {
            answer: format!("echo: {question}"),
            conversation_id: Some("conv-1".to_string()),
        })
    }

    async fn upload(
        &self,
        _op: OpId,
        file: &UploadFile,
        _sink: &dyn ProgressSink,
    ) -> Result<UploadResponse, ApiError> {
        Ok(UploadResponse {
            message: Some("ok".to_string()),
            files: vec![file.name.clone()],
        })
    }

    async fn list_files(&self) -> Result<Vec<FileInfo>, ApiError> {
        Ok(vec![FileInfo {
            name: "a.pdf".to_string(),
            ..FileInfo::default()
        }])
    }

    async fn delete_file(&self, name: &str) -> Result<StatusMessage, ApiError> {
        Ok(StatusMessage {
            message: Some(format!("deleted {name}")),
        })
    }

    async fn clear_history(&self) -> Result<StatusMessage, ApiError> {
        Ok(StatusMessage::default())
    }

    async fn news(&self, _query: &str) -> Result<Vec<NewsArticle>, ApiError> {
        Ok(Vec::new())
    }

    async fn scrape(&self, url: &str) -> Result<ScrapeResponse, ApiError> {
        match self.scrape_delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => std::future::pending::<()>().await,
        }
        Ok(ScrapeResponse {
            status: Some("success".to_string()),
            title: Some(url.to_string()),
            ..ScrapeResponse::default()
        })
    }
}

pub fn progress_elapsed(events: &[EngineEvent]) -> Vec<Duration> {
    events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::ScrapeProgress { elapsed, .. } => Some(*elapsed),
            _ => None,
        })
        .collect()
}
