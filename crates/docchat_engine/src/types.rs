use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::ApiError;

/// Correlates engine events with the command that caused them.
pub type OpId = u64;

/// A local file to send to `/upload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub path: PathBuf,
    pub name: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    /// JSON reply carrying the whole answer.
    Answer {
        answer: String,
        conversation_id: Option<String>,
    },
    /// Plain-text reply; the text went out as `AnswerChunk` events.
    Streamed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    AnswerChunk {
        op: OpId,
        text: String,
    },
    AskCompleted {
        op: OpId,
        result: Result<AskOutcome, ApiError>,
        elapsed: Duration,
    },
    UploadProgress {
        op: OpId,
        sent: u64,
        total: u64,
        elapsed: Duration,
    },
    UploadCompleted {
        op: OpId,
        result: Result<UploadResponse, ApiError>,
        elapsed: Duration,
    },
    FilesListed {
        op: OpId,
        result: Result<Vec<FileInfo>, ApiError>,
    },
    FileDeleted {
        op: OpId,
        name: String,
        result: Result<StatusMessage, ApiError>,
    },
    HistoryCleared {
        result: Result<StatusMessage, ApiError>,
    },
    NewsFetched {
        op: OpId,
        query: String,
        result: Result<Vec<NewsArticle>, ApiError>,
    },
    ScrapeProgress {
        op: OpId,
        elapsed: Duration,
    },
    ScrapeCompleted {
        op: OpId,
        result: Result<ScrapeResponse, ApiError>,
        elapsed: Duration,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct AskResponse {
    #[serde(default)]
    pub(crate) answer: Option<String>,
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    pub(crate) sources: Vec<serde_json::Value>,
    #[serde(default)]
    pub(crate) conversation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct FileInfo {
    #[serde(alias = "file_name")]
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, rename = "type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct StatusMessage {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct NewsArticle {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source: String,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ScrapeResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub details: Option<ScrapeDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ScrapeDetails {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub chunks_generated: Option<u64>,
    #[serde(default)]
    pub source_name: Option<String>,
}

/// Articles may carry `null` where a string is expected.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}
