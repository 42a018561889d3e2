use crate::{FileId, MessageId, RequestToken, UploadSource};

/// Side effects requested by `update`; the app executes them against the
/// backend and feeds the outcome back as `Msg`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Ask {
        token: RequestToken,
        question: String,
    },
    Upload {
        message_id: MessageId,
        source: UploadSource,
    },
    ListFiles {
        token: RequestToken,
    },
    DeleteFile {
        name: String,
        file_id: Option<FileId>,
    },
    ClearHistory,
    FetchNews {
        token: RequestToken,
        query: String,
    },
    Scrape {
        message_id: MessageId,
        url: String,
    },
}
