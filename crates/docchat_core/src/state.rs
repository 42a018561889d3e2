use std::collections::BTreeMap;

use crate::view_model::{AppViewModel, FileRowView, MessageView};
use crate::{
    suggestions, Author, Clock, FileId, FileRegistry, Generations, Message, MessageId, NewsItem,
    RemoteFile, RequestSlot, RequestToken,
};

/// Query used when the user asks for news without naming a topic.
pub const DEFAULT_NEWS_QUERY: &str = "weather";

/// Where the current question is in its round trip.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) enum AskPhase {
    #[default]
    Idle,
    Waiting {
        token: RequestToken,
    },
    Streaming {
        token: RequestToken,
        buffer: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingUpload {
    pub(crate) file_id: FileId,
    pub(crate) name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    input: String,
    messages: Vec<Message>,
    next_message_id: u64,
    pub(crate) files: FileRegistry,
    pub(crate) remote_files: Vec<RemoteFile>,
    pub(crate) news: Vec<NewsItem>,
    pub(crate) conversation_id: Option<String>,
    pub(crate) current_file: Option<String>,
    error: Option<String>,
    pub(crate) ask: AskPhase,
    pub(crate) pending_uploads: BTreeMap<MessageId, PendingUpload>,
    pub(crate) pending_scrapes: BTreeMap<MessageId, String>,
    pub(crate) upload_progress: Option<u8>,
    pub(crate) generations: Generations,
    dirty: bool,
    clock: Clock,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State whose timestamps come from `clock` instead of the system time.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let selected_id = self.files.selected_id();
        AppViewModel {
            input: self.input.clone(),
            messages: self.messages.iter().map(MessageView::from_message).collect(),
            typing: match &self.ask {
                AskPhase::Streaming { buffer, .. } => Some(buffer.clone()),
                _ => None,
            },
            is_loading: self.is_loading(),
            is_uploading: !self.pending_uploads.is_empty() || self.files.is_uploading(),
            upload_progress: self.upload_progress,
            error: self.error.clone(),
            conversation_id: self.conversation_id.clone(),
            current_file: self.current_file.clone(),
            files: self
                .files
                .items()
                .iter()
                .map(|item| FileRowView::from_item(item, selected_id == Some(item.id)))
                .collect(),
            selected_file: selected_id,
            has_upload_error: self.files.has_upload_error(),
            remote_files: self.remote_files.clone(),
            news_count: self.news.len(),
            suggestions: self
                .suggestions()
                .into_iter()
                .map(ToOwned::to_owned)
                .collect(),
            dirty: self.dirty,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn files(&self) -> &FileRegistry {
        &self.files
    }

    pub fn remote_files(&self) -> &[RemoteFile] {
        &self.remote_files
    }

    /// Full result of the latest news request, not only the digested part.
    pub fn news(&self) -> &[NewsItem] {
        &self.news
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    /// True from submitting a question until its answer settles.
    pub fn is_loading(&self) -> bool {
        self.ask != AskPhase::Idle
    }

    /// Live text of a streamed answer that has not finished yet.
    pub fn typing(&self) -> Option<&str> {
        match &self.ask {
            AskPhase::Streaming { buffer, .. } => Some(buffer),
            _ => None,
        }
    }

    pub fn suggestions(&self) -> Vec<&'static str> {
        let selected_name = self.files.selected().map(|item| item.name.as_str());
        suggestions(&self.messages, selected_name)
    }

    /// Returns whether anything changed since the last call and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    pub(crate) fn set_input(&mut self, text: String) {
        if self.input != text {
            self.input = text;
            self.mark_dirty();
        }
    }

    pub(crate) fn take_input(&mut self) -> String {
        self.mark_dirty();
        std::mem::take(&mut self.input)
    }

    pub(crate) fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.mark_dirty();
    }

    pub(crate) fn clear_error(&mut self) {
        if self.error.take().is_some() {
            self.mark_dirty();
        }
    }

    pub(crate) fn push_message(
        &mut self,
        author: Author,
        content: impl Into<String>,
        progress: Option<u8>,
    ) -> MessageId {
        self.next_message_id += 1;
        let id = MessageId(self.next_message_id);
        let timestamp = self.now();
        self.messages.push(Message {
            id,
            author,
            content: content.into(),
            timestamp,
            progress,
        });
        self.mark_dirty();
        id
    }

    /// Rewrites one message in place. Returns false when the id is unknown,
    /// e.g. because the history was cleared meanwhile.
    pub(crate) fn rewrite_message(
        &mut self,
        id: MessageId,
        content: String,
        progress: Option<u8>,
    ) -> bool {
        let Some(message) = self.messages.iter_mut().find(|message| message.id == id) else {
            return false;
        };
        message.content = content;
        message.progress = progress;
        self.dirty = true;
        true
    }

    pub(crate) fn clear_messages(&mut self) {
        self.messages.clear();
        self.mark_dirty();
    }

    pub(crate) fn issue(&mut self, slot: RequestSlot) -> RequestToken {
        self.generations.issue(slot)
    }
}
