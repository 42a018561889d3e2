use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the question input.
    InputChanged(String),
    /// User submitted the current input as a question.
    SendSubmitted,
    /// User picked one of the displayed suggestions (by position).
    SuggestionChosen(usize),
    /// User picked a local file for upload.
    UploadRequested(crate::UploadSource),
    /// Bytes of an upload body handed to the transport so far.
    UploadProgress {
        message_id: crate::MessageId,
        sent: u64,
        total: u64,
        elapsed: Duration,
    },
    /// Upload settled. `Err` carries the human readable reason.
    UploadFinished {
        message_id: crate::MessageId,
        result: Result<(), String>,
        elapsed: Duration,
    },
    /// Complete (non-streamed) answer.
    AskAnswered {
        token: crate::RequestToken,
        answer: String,
        conversation_id: Option<String>,
        elapsed: Duration,
    },
    /// Next decoded piece of a streamed answer.
    AnswerChunk {
        token: crate::RequestToken,
        text: String,
    },
    /// Streamed answer body exhausted.
    AnswerStreamEnded {
        token: crate::RequestToken,
        elapsed: Duration,
    },
    AskFailed {
        token: crate::RequestToken,
        error: String,
    },
    /// User asked for the backend's file listing.
    RefreshFilesRequested,
    FilesListed {
        token: crate::RequestToken,
        result: Result<Vec<crate::RemoteFile>, String>,
    },
    /// User selected an entry of the local file registry.
    FileSelected(crate::FileId),
    /// User removed an entry of the local file registry.
    RemoveFileRequested(crate::FileId),
    /// User deleted a backend file by name.
    DeleteFileRequested(String),
    FileDeleted {
        name: String,
        file_id: Option<crate::FileId>,
        result: Result<(), String>,
    },
    /// User clicked clear chat.
    ClearRequested,
    HistoryCleared {
        result: Result<(), String>,
    },
    /// User asked for news; `None` uses the default query.
    NewsRequested(Option<String>),
    NewsFetched {
        token: crate::RequestToken,
        query: String,
        result: Result<Vec<crate::NewsItem>, String>,
    },
    /// User asked the backend to scrape a URL.
    ScrapeRequested(String),
    /// Periodic tick while a scrape is in flight.
    ScrapeTick {
        message_id: crate::MessageId,
        elapsed: Duration,
    },
    ScrapeFinished {
        message_id: crate::MessageId,
        result: Result<crate::ScrapeReport, String>,
        elapsed: Duration,
    },
    /// User dismissed the error banner.
    ErrorDismissed,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
