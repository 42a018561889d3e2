use std::fmt;

use chrono::{DateTime, Utc};

/// Client-side file id. The backend knows files by name only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(pub u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Uploading,
    Success,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    pub id: FileId,
    pub name: String,
    /// Human readable size, e.g. `"1.5 KB"`.
    pub size: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub mime_type: String,
    pub status: FileStatus,
}

/// Local registry of files uploaded during this session.
///
/// Entries are inserted optimistically when an upload starts and only leave
/// through `remove`/`remove_by_name` (after the backend confirmed a delete)
/// or `clear`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRegistry {
    items: Vec<FileItem>,
    selected: Option<FileId>,
    next_id: u64,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a file as `Uploading` and selects it.
    pub fn begin_upload(
        &mut self,
        name: impl Into<String>,
        size_bytes: u64,
        mime_type: impl Into<String>,
        now: DateTime<Utc>,
    ) -> FileId {
        self.next_id += 1;
        let id = FileId(self.next_id);
        let mime_type = mime_type.into();
        self.items.push(FileItem {
            id,
            name: name.into(),
            size: format_file_size(size_bytes),
            size_bytes,
            uploaded_at: now,
            mime_type: if mime_type.is_empty() {
                "application/octet-stream".to_string()
            } else {
                mime_type
            },
            status: FileStatus::Uploading,
        });
        self.selected = Some(id);
        id
    }

    pub fn mark_success(&mut self, id: FileId) -> bool {
        self.set_status(id, FileStatus::Success)
    }

    pub fn mark_failed(&mut self, id: FileId, reason: impl Into<String>) -> bool {
        self.set_status(id, FileStatus::Error(reason.into()))
    }

    pub fn get(&self, id: FileId) -> Option<&FileItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Drops an entry and clears the selection if it pointed at it.
    pub fn remove(&mut self, id: FileId) -> Option<FileItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(self.items.remove(index))
    }

    /// Drops every entry with the given name. Returns how many were removed.
    pub fn remove_by_name(&mut self, name: &str) -> usize {
        let ids: Vec<FileId> = self
            .items
            .iter()
            .filter(|item| item.name == name)
            .map(|item| item.id)
            .collect();
        for id in &ids {
            self.remove(*id);
        }
        ids.len()
    }

    /// Selects an existing entry. Unknown ids leave the selection alone.
    pub fn select(&mut self, id: FileId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.selected = Some(id);
        true
    }

    pub fn selected_id(&self) -> Option<FileId> {
        self.selected
    }

    pub fn selected(&self) -> Option<&FileItem> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.selected = None;
    }

    pub fn items(&self) -> &[FileItem] {
        &self.items
    }

    pub fn is_uploading(&self) -> bool {
        self.items
            .iter()
            .any(|item| item.status == FileStatus::Uploading)
    }

    pub fn has_upload_error(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item.status, FileStatus::Error(_)))
    }

    fn set_status(&mut self, id: FileId, status: FileStatus) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.status = status;
                true
            }
            None => false,
        }
    }
}

/// Formats a byte count with base-1024 units and at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut scale: u64 = 1;
    while unit + 1 < UNITS.len() && bytes >= scale * 1024 {
        scale *= 1024;
        unit += 1;
    }

    let value = bytes as f64 / scale as f64;
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", text, UNITS[unit])
}
