//! Docchat engine: backend API client and effect execution.
mod api;
mod decode;
mod engine;
mod error;
mod scrape;
mod types;
mod upload;

pub use api::{
    ApiSettings, ChannelProgressSink, ChatBackend, DeleteStyle, ProgressSink, ReqwestBackend,
    DEFAULT_BASE_URL,
};
pub use decode::{extract_charset, StreamDecoder};
pub use engine::{EngineCommand, EngineHandle, EngineStartError};
pub use error::{error_detail, ApiError, FailureKind};
pub use scrape::scrape_with_progress;
pub use types::{
    AskOutcome, EngineEvent, FileInfo, NewsArticle, OpId, ScrapeDetails, ScrapeResponse,
    StatusMessage, UploadFile, UploadResponse,
};
