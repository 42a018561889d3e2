use std::collections::HashMap;

use docchat_core::{
    format_file_size, AppViewModel, Author, FileRowView, FileStatus, MessageId, MessageView,
    RemoteFile,
};

/// A piece of terminal output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// A complete line.
    Line(String),
    /// Text continuing the current line (streamed answer).
    Partial(String),
}

/// Turns successive view models into terminal output, printing only what
/// changed since the previous call.
#[derive(Debug, Default)]
pub struct Renderer {
    printed: HashMap<MessageId, String>,
    typing_shown: String,
    /// Text already streamed for an answer that has not been committed yet.
    streamed: Option<String>,
    error: Option<String>,
    files: Vec<FileRowView>,
    remote_files: Vec<RemoteFile>,
    loading: bool,
}

impl Renderer {
    pub fn render(&mut self, view: &AppViewModel) -> Vec<Output> {
        let mut out = Vec::new();

        self.printed
            .retain(|id, _| view.messages.iter().any(|message| message.id == *id));

        if let Some(typing) = &view.typing {
            self.render_typing(typing, &mut out);
        } else if !self.typing_shown.is_empty() {
            self.streamed = Some(std::mem::take(&mut self.typing_shown));
        }

        for message in &view.messages {
            self.render_message(message, &mut out);
        }

        if view.is_loading && !self.loading && view.typing.is_none() {
            out.push(Output::Line("… thinking".to_string()));
        }
        self.loading = view.is_loading;

        if view.files != self.files {
            out.extend(file_lines(&view.files).into_iter().map(Output::Line));
            self.files = view.files.clone();
        }

        if view.remote_files != self.remote_files {
            out.extend(remote_lines(&view.remote_files).into_iter().map(Output::Line));
            self.remote_files = view.remote_files.clone();
        }

        if view.error != self.error {
            if let Some(error) = &view.error {
                out.push(Output::Line(format!("! {error}")));
            }
            self.error = view.error.clone();
        }

        out
    }

    fn render_typing(&mut self, typing: &str, out: &mut Vec<Output>) {
        if self.typing_shown.is_empty() && !typing.is_empty() {
            out.push(Output::Partial("bot > ".to_string()));
        }
        match typing.strip_prefix(self.typing_shown.as_str()) {
            Some(delta) if !delta.is_empty() => out.push(Output::Partial(delta.to_string())),
            Some(_) => {}
            None => out.push(Output::Partial(typing.to_string())),
        }
        self.typing_shown = typing.to_string();
    }

    fn render_message(&mut self, message: &MessageView, out: &mut Vec<Output>) {
        if self.printed.get(&message.id) == Some(&message.content) {
            return;
        }
        let is_new = !self.printed.contains_key(&message.id);
        self.printed.insert(message.id, message.content.clone());

        if is_new && message.author == Author::Bot {
            if let Some(streamed) = self.streamed.take() {
                if let Some(rest) = message.content.strip_prefix(streamed.as_str()) {
                    if !rest.is_empty() {
                        out.push(Output::Partial(rest.to_string()));
                    }
                    out.push(Output::Line(String::new()));
                    return;
                }
                out.push(Output::Line(String::new()));
            }
        }

        let label = match message.author {
            Author::User => "you",
            Author::Bot => "bot",
        };
        out.push(Output::Line(format!(
            "{label} [{}] > {}",
            message.time, message.content
        )));
    }
}

pub fn file_lines(files: &[FileRowView]) -> Vec<String> {
    if files.is_empty() {
        return vec!["Uploaded files: none".to_string()];
    }
    let mut lines = vec!["Uploaded files:".to_string()];
    lines.extend(files.iter().map(|file| {
        let status = match &file.status {
            FileStatus::Uploading => "uploading".to_string(),
            FileStatus::Success => "ready".to_string(),
            FileStatus::Error(reason) => format!("failed: {reason}"),
        };
        let marker = if file.selected { "*" } else { " " };
        format!(
            " {marker} f{} {} ({}, {}) {status}",
            file.id, file.name, file.size, file.mime_type
        )
    }));
    lines
}

pub fn remote_lines(files: &[RemoteFile]) -> Vec<String> {
    if files.is_empty() {
        return vec!["Backend documents: none".to_string()];
    }
    let mut lines = vec!["Backend documents:".to_string()];
    lines.extend(files.iter().map(|file| {
        let mut line = format!("   {}", file.name);
        if let Some(size) = file.size {
            line.push_str(&format!(" ({})", format_file_size(size)));
        }
        if let Some(uploaded_at) = file.uploaded_at.as_deref().filter(|s| !s.is_empty()) {
            line.push_str(&format!(" uploaded {uploaded_at}"));
        }
        line
    }));
    lines
}

pub fn suggestion_lines(view: &AppViewModel) -> Vec<String> {
    let mut lines = vec!["Suggestions (use /pick <n>):".to_string()];
    lines.extend(
        view.suggestions
            .iter()
            .enumerate()
            .map(|(index, text)| format!("  {}. {text}", index + 1)),
    );
    lines
}
