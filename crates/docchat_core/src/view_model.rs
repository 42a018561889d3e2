use chrono::Local;

use crate::{Author, FileId, FileItem, FileStatus, Message, MessageId, RemoteFile};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub input: String,
    pub messages: Vec<MessageView>,
    /// Partial streamed answer, shown until it is committed as a message.
    pub typing: Option<String>,
    pub is_loading: bool,
    pub is_uploading: bool,
    pub upload_progress: Option<u8>,
    pub error: Option<String>,
    pub conversation_id: Option<String>,
    pub current_file: Option<String>,
    pub files: Vec<FileRowView>,
    pub selected_file: Option<FileId>,
    pub has_upload_error: bool,
    pub remote_files: Vec<RemoteFile>,
    pub news_count: usize,
    pub suggestions: Vec<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub id: MessageId,
    pub author: Author,
    pub content: String,
    /// Local wall-clock time, `HH:MM`.
    pub time: String,
    pub progress: Option<u8>,
}

impl MessageView {
    pub(crate) fn from_message(message: &Message) -> Self {
        Self {
            id: message.id,
            author: message.author,
            content: message.content.clone(),
            time: message
                .timestamp
                .with_timezone(&Local)
                .format("%H:%M")
                .to_string(),
            progress: message.progress,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRowView {
    pub id: FileId,
    pub name: String,
    pub size: String,
    pub mime_type: String,
    pub status: FileStatus,
    pub selected: bool,
}

impl FileRowView {
    pub(crate) fn from_item(item: &FileItem, selected: bool) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            size: item.size.clone(),
            mime_type: item.mime_type.clone(),
            status: item.status.clone(),
            selected,
        }
    }
}
