use std::time::Duration;

use docchat_logging::{chat_debug, chat_info, chat_warn};

use crate::content;
use crate::state::{AskPhase, PendingUpload};
use crate::{
    AppState, Author, Effect, FileId, MessageId, Msg, RequestSlot, RequestToken, ScrapeReport,
    UploadSource, DEFAULT_NEWS_QUERY,
};

const EMPTY_MESSAGE: &str = "Message cannot be empty";
const EMPTY_URL: &str = "URL cannot be empty";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::SendSubmitted => submit_question(&mut state),
        Msg::SuggestionChosen(index) => {
            if state.is_loading() {
                chat_debug!("Suggestion chosen while an answer is pending; ignored");
                return (state, Vec::new());
            }
            let chosen = state.suggestions().get(index).copied();
            match chosen {
                Some(text) => {
                    state.set_input(text.to_string());
                    submit_question(&mut state)
                }
                None => Vec::new(),
            }
        }
        Msg::AskAnswered {
            token,
            answer,
            conversation_id,
            elapsed,
        } => {
            if take_ask(&mut state, token).is_some() {
                if let Some(id) = conversation_id.filter(|id| !id.is_empty()) {
                    if state.conversation_id.as_deref() != Some(id.as_str()) {
                        chat_info!("Conversation id is now {}", id);
                        state.conversation_id = Some(id);
                    }
                }
                state.push_message(
                    Author::Bot,
                    content::answer_with_footer(&answer, elapsed),
                    None,
                );
            }
            Vec::new()
        }
        Msg::AnswerChunk { token, text } => {
            apply_answer_chunk(&mut state, token, text);
            Vec::new()
        }
        Msg::AnswerStreamEnded { token, elapsed } => {
            if let Some(buffer) = take_ask(&mut state, token) {
                if !buffer.trim().is_empty() {
                    state.push_message(
                        Author::Bot,
                        content::answer_with_footer(&buffer, elapsed),
                        None,
                    );
                }
            }
            Vec::new()
        }
        Msg::AskFailed { token, error } => {
            if take_ask(&mut state, token).is_some() {
                chat_warn!("Question failed: {}", error);
                state.push_message(
                    Author::Bot,
                    format!("Sorry, I encountered an error. Please try again.\n{error}"),
                    None,
                );
                state.set_error(error);
            }
            Vec::new()
        }
        Msg::UploadRequested(source) => begin_upload(&mut state, source),
        Msg::UploadProgress {
            message_id,
            sent,
            total,
            elapsed,
        } => {
            if let Some(pending) = state.pending_uploads.get(&message_id) {
                let percent = content::upload_percent(sent, total);
                let text = content::upload_progress(&pending.name, percent, elapsed);
                state.upload_progress = Some(percent);
                state.rewrite_message(message_id, text, Some(percent));
            }
            Vec::new()
        }
        Msg::UploadFinished {
            message_id,
            result,
            elapsed,
        } => finish_upload(&mut state, message_id, result, elapsed),
        Msg::RefreshFilesRequested => vec![request_file_list(&mut state)],
        Msg::FilesListed { token, result } => {
            if !state.generations.is_current(token) {
                chat_debug!("Dropping stale file listing {:?}", token);
                return (state, Vec::new());
            }
            match result {
                Ok(files) => {
                    state.remote_files = files;
                    state.mark_dirty();
                }
                Err(error) => state.set_error(error),
            }
            Vec::new()
        }
        Msg::FileSelected(file_id) => {
            if state.files.select(file_id) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::RemoveFileRequested(file_id) => match state.files.get(file_id) {
            Some(item) => vec![Effect::DeleteFile {
                name: item.name.clone(),
                file_id: Some(file_id),
            }],
            None => {
                chat_debug!("Ignoring removal of unknown file {}", file_id);
                Vec::new()
            }
        },
        Msg::DeleteFileRequested(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                state.set_error("File name cannot be empty");
                Vec::new()
            } else {
                vec![Effect::DeleteFile {
                    name,
                    file_id: None,
                }]
            }
        }
        Msg::FileDeleted {
            name,
            file_id,
            result,
        } => finish_delete(&mut state, name, file_id, result),
        Msg::ClearRequested => vec![Effect::ClearHistory],
        Msg::HistoryCleared { result } => {
            match result {
                Ok(()) => reset_chat(&mut state),
                Err(error) => state.set_error(error),
            }
            Vec::new()
        }
        Msg::NewsRequested(query) => {
            let query = query
                .map(|query| query.trim().to_string())
                .filter(|query| !query.is_empty())
                .unwrap_or_else(|| DEFAULT_NEWS_QUERY.to_string());
            let token = state.issue(RequestSlot::News);
            vec![Effect::FetchNews { token, query }]
        }
        Msg::NewsFetched {
            token,
            query,
            result,
        } => {
            if !state.generations.is_current(token) {
                chat_debug!("Dropping stale news result {:?}", token);
                return (state, Vec::new());
            }
            match result {
                Ok(items) => {
                    if let Some(digest) = content::news_digest(&query, &items) {
                        state.push_message(Author::Bot, digest, None);
                    }
                    state.news = items;
                    state.mark_dirty();
                }
                Err(error) => {
                    state.push_message(
                        Author::Bot,
                        format!("❌ Failed to fetch news: {error}"),
                        None,
                    );
                    state.set_error(error);
                }
            }
            Vec::new()
        }
        Msg::ScrapeRequested(url) => begin_scrape(&mut state, url),
        Msg::ScrapeTick {
            message_id,
            elapsed,
        } => {
            // Settled scrapes are no longer pending, so late ticks fall through.
            if let Some(url) = state.pending_scrapes.get(&message_id) {
                let percent = content::estimate_scrape_progress(elapsed);
                let text = content::scrape_progress(url, percent, elapsed);
                state.rewrite_message(message_id, text, Some(percent));
            }
            Vec::new()
        }
        Msg::ScrapeFinished {
            message_id,
            result,
            elapsed,
        } => finish_scrape(&mut state, message_id, result, elapsed),
        Msg::ErrorDismissed => {
            state.clear_error();
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit_question(state: &mut AppState) -> Vec<Effect> {
    let question = state.input().trim().to_string();
    if question.is_empty() {
        state.set_error(EMPTY_MESSAGE);
        return Vec::new();
    }
    if state.is_loading() {
        chat_debug!("Question submitted while another answer is pending; ignored");
        return Vec::new();
    }

    state.take_input();
    state.clear_error();
    state.push_message(Author::User, question.clone(), None);
    let token = state.issue(RequestSlot::Ask);
    state.ask = AskPhase::Waiting { token };
    vec![Effect::Ask { token, question }]
}

fn apply_answer_chunk(state: &mut AppState, token: RequestToken, text: String) {
    if !state.generations.is_current(token) {
        return;
    }
    let next = match std::mem::take(&mut state.ask) {
        AskPhase::Waiting { token: current } if current == token => AskPhase::Streaming {
            token,
            buffer: text,
        },
        AskPhase::Streaming {
            token: current,
            mut buffer,
        } if current == token => {
            buffer.push_str(&text);
            AskPhase::Streaming { token, buffer }
        }
        other => {
            state.ask = other;
            return;
        }
    };
    state.ask = next;
    state.mark_dirty();
}

/// Ends the pending question if `token` belongs to it, returning whatever
/// text was streamed so far.
fn take_ask(state: &mut AppState, token: RequestToken) -> Option<String> {
    if !state.generations.is_current(token) {
        chat_debug!("Dropping stale answer {:?}", token);
        return None;
    }
    let buffer = match std::mem::take(&mut state.ask) {
        AskPhase::Waiting { token: current } if current == token => String::new(),
        AskPhase::Streaming {
            token: current,
            buffer,
        } if current == token => buffer,
        other => {
            state.ask = other;
            return None;
        }
    };
    state.mark_dirty();
    Some(buffer)
}

fn begin_upload(state: &mut AppState, source: UploadSource) -> Vec<Effect> {
    let now = state.now();
    let file_id = state.files.begin_upload(
        source.name.clone(),
        source.size_bytes,
        source.mime_type.clone(),
        now,
    );
    let message_id = state.push_message(
        Author::Bot,
        content::upload_started(&source.name),
        Some(0),
    );
    state.pending_uploads.insert(
        message_id,
        PendingUpload {
            file_id,
            name: source.name.clone(),
        },
    );
    state.upload_progress = Some(0);
    state.clear_error();
    chat_info!(
        "Upload {} started for {} ({} bytes)",
        message_id,
        source.name,
        source.size_bytes
    );
    vec![Effect::Upload { message_id, source }]
}

fn finish_upload(
    state: &mut AppState,
    message_id: MessageId,
    result: Result<(), String>,
    elapsed: Duration,
) -> Vec<Effect> {
    let Some(pending) = state.pending_uploads.remove(&message_id) else {
        return Vec::new();
    };
    state.mark_dirty();
    match result {
        Ok(()) => {
            state.files.mark_success(pending.file_id);
            state.rewrite_message(
                message_id,
                content::upload_done(&pending.name, elapsed),
                Some(100),
            );
            state.upload_progress = Some(100);
            state.current_file = Some(pending.name);
            vec![request_file_list(state)]
        }
        Err(error) => {
            chat_warn!("Upload of {} failed: {}", pending.name, error);
            state.files.mark_failed(pending.file_id, error.clone());
            state.rewrite_message(
                message_id,
                content::upload_failed(&pending.name, elapsed, &error),
                Some(0),
            );
            state.upload_progress = None;
            state.set_error(error);
            Vec::new()
        }
    }
}

fn finish_delete(
    state: &mut AppState,
    name: String,
    file_id: Option<FileId>,
    result: Result<(), String>,
) -> Vec<Effect> {
    match result {
        Ok(()) => {
            match file_id {
                Some(file_id) => {
                    state.files.remove(file_id);
                }
                None => {
                    state.files.remove_by_name(&name);
                }
            }
            if state.current_file.as_deref() == Some(name.as_str()) {
                state.current_file = None;
            }
            state.push_message(
                Author::Bot,
                format!("File \"{name}\" has been deleted."),
                None,
            );
            vec![request_file_list(state)]
        }
        Err(error) => {
            state.push_message(
                Author::Bot,
                format!("❌ Failed to delete {name}: {error}"),
                None,
            );
            state.set_error(error);
            Vec::new()
        }
    }
}

fn reset_chat(state: &mut AppState) {
    state.clear_messages();
    state.generations.advance_all();
    state.ask = AskPhase::Idle;
    state.pending_uploads.clear();
    state.pending_scrapes.clear();
    state.upload_progress = None;
    state.conversation_id = None;
    state.current_file = None;
    state.files.clear();
    state.clear_error();
    state.push_message(Author::Bot, "Chat history has been cleared.", None);
}

fn begin_scrape(state: &mut AppState, raw: String) -> Vec<Effect> {
    let url = raw.trim().to_string();
    if url.is_empty() {
        state.set_error(EMPTY_URL);
        return Vec::new();
    }
    match url::Url::parse(&url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        Ok(parsed) => {
            state.set_error(format!("Unsupported URL scheme: {}", parsed.scheme()));
            return Vec::new();
        }
        Err(err) => {
            state.set_error(format!("Invalid URL: {err}"));
            return Vec::new();
        }
    }

    let message_id = state.push_message(Author::Bot, content::scrape_started(&url), Some(0));
    state.pending_scrapes.insert(message_id, url.clone());
    chat_info!("Scrape {} started for {}", message_id, url);
    vec![Effect::Scrape { message_id, url }]
}

fn finish_scrape(
    state: &mut AppState,
    message_id: MessageId,
    result: Result<ScrapeReport, String>,
    elapsed: Duration,
) -> Vec<Effect> {
    let Some(url) = state.pending_scrapes.remove(&message_id) else {
        return Vec::new();
    };
    state.mark_dirty();
    match result {
        Ok(report) if report.is_success() => {
            state.rewrite_message(
                message_id,
                content::scrape_done(&url, &report, elapsed),
                Some(100),
            );
            vec![request_file_list(state)]
        }
        Ok(report) => {
            let reason = content::scrape_rejection_reason(&report);
            chat_warn!("Scrape of {} rejected: {}", url, reason);
            let text = content::scrape_failed(&url, reason, elapsed);
            state.rewrite_message(message_id, text, Some(0));
            Vec::new()
        }
        Err(error) => {
            chat_warn!("Scrape of {} failed: {}", url, error);
            state.rewrite_message(
                message_id,
                content::scrape_failed(&url, &error, elapsed),
                Some(0),
            );
            state.set_error(error);
            Vec::new()
        }
    }
}

fn request_file_list(state: &mut AppState) -> Effect {
    let token = state.issue(RequestSlot::FileList);
    Effect::ListFiles { token }
}
