//! Backend records as the state machine sees them.
//!
//! The engine owns the wire formats; the app maps them into these types.
use std::path::PathBuf;

/// A file picked for upload, already inspected by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSource {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

/// One entry of the backend's file listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteFile {
    pub name: String,
    pub size: Option<u64>,
    pub mime_type: Option<String>,
    pub uploaded_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub published_at: Option<String>,
    pub source: String,
    pub summary: Option<String>,
}

/// Processing summary returned by a scrape. The backend never sends the
/// scraped content itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScrapeReport {
    pub status: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
    /// Top-level title, used when `details` carries none.
    pub title: Option<String>,
    pub detail_url: Option<String>,
    pub detail_title: Option<String>,
    pub chunks_generated: Option<u64>,
    pub source_name: Option<String>,
}

impl ScrapeReport {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}
