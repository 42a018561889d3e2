//! Docchat core: pure chat state machine and view-model helpers.
mod content;
mod effect;
mod files;
mod message;
mod msg;
mod remote;
mod state;
mod suggestions;
mod token;
mod update;
mod view_model;

pub use content::{
    answer_with_footer, estimate_scrape_progress, format_seconds, news_digest, upload_percent,
    NEWS_DIGEST_LIMIT, SCRAPE_BASELINE, SCRAPE_PROGRESS_CAP,
};
pub use effect::Effect;
pub use files::{format_file_size, FileId, FileItem, FileRegistry, FileStatus};
pub use message::{Author, Clock, Message, MessageId};
pub use msg::Msg;
pub use remote::{NewsItem, RemoteFile, ScrapeReport, UploadSource};
pub use state::{AppState, DEFAULT_NEWS_QUERY};
pub use suggestions::{classify_document, suggestions, DocumentType};
pub use token::{Generations, RequestSlot, RequestToken};
pub use update::update;
pub use view_model::{AppViewModel, FileRowView, MessageView};
