use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use docchat_core::{
    Effect, FileId, MessageId, Msg, NewsItem, RemoteFile, RequestToken, ScrapeReport,
    UploadSource,
};
use docchat_engine::{
    AskOutcome, EngineCommand, EngineEvent, EngineHandle, FileInfo, NewsArticle, OpId,
    ScrapeResponse, UploadFile,
};
use docchat_logging::{chat_debug, chat_info, chat_warn};

use super::app::AppEvent;

/// What an in-flight engine operation reports back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpTarget {
    Ask(RequestToken),
    Upload(MessageId),
    Files(RequestToken),
    Delete(Option<FileId>),
    News(RequestToken),
    Scrape(MessageId),
}

#[derive(Debug, Default)]
struct OpTable {
    next: OpId,
    ops: HashMap<OpId, OpTarget>,
}

impl OpTable {
    fn register(&mut self, target: OpTarget) -> OpId {
        self.next += 1;
        self.ops.insert(self.next, target);
        self.next
    }

    fn peek(&self, op: OpId) -> Option<OpTarget> {
        self.ops.get(&op).copied()
    }

    fn finish(&mut self, op: OpId) -> Option<OpTarget> {
        self.ops.remove(&op)
    }
}

/// Commands sent to the engine whose completion has not reached the main
/// loop yet.
#[derive(Debug, Default, Clone)]
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn start(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    /// Call only after the completion has been forwarded to the main loop.
    fn settle_one(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

fn completes_command(event: &EngineEvent) -> bool {
    !matches!(
        event,
        EngineEvent::AnswerChunk { .. }
            | EngineEvent::UploadProgress { .. }
            | EngineEvent::ScrapeProgress { .. }
    )
}

/// Runs core effects on the engine and feeds engine events back as `Msg`s.
pub struct EffectRunner {
    engine: EngineHandle,
    table: Arc<Mutex<OpTable>>,
    in_flight: InFlight,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, msg_tx: mpsc::Sender<AppEvent>) -> Self {
        let runner = Self {
            engine,
            table: Arc::new(Mutex::new(OpTable::default())),
            in_flight: InFlight::default(),
        };
        runner.spawn_event_loop(msg_tx);
        runner
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            let command = self.command_for(effect);
            self.in_flight.start();
            self.engine.send(command);
        }
    }

    /// Number of engine commands still waiting for their completion event.
    pub fn in_flight(&self) -> usize {
        self.in_flight.count()
    }

    fn register(&self, target: OpTarget) -> OpId {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .register(target)
    }

    fn command_for(&self, effect: Effect) -> EngineCommand {
        match effect {
            Effect::Ask { token, question } => {
                chat_info!("Ask question_len={}", question.len());
                EngineCommand::Ask {
                    op: self.register(OpTarget::Ask(token)),
                    question,
                }
            }
            Effect::Upload { message_id, source } => {
                chat_info!("Upload {} path={}", message_id, source.path.display());
                EngineCommand::Upload {
                    op: self.register(OpTarget::Upload(message_id)),
                    file: UploadFile {
                        path: source.path,
                        name: source.name,
                        mime_type: source.mime_type,
                    },
                }
            }
            Effect::ListFiles { token } => EngineCommand::ListFiles {
                op: self.register(OpTarget::Files(token)),
            },
            Effect::DeleteFile { name, file_id } => EngineCommand::DeleteFile {
                op: self.register(OpTarget::Delete(file_id)),
                name,
            },
            Effect::ClearHistory => EngineCommand::ClearHistory,
            Effect::FetchNews { token, query } => EngineCommand::FetchNews {
                op: self.register(OpTarget::News(token)),
                query,
            },
            Effect::Scrape { message_id, url } => {
                chat_info!("Scrape {} url={}", message_id, url);
                EngineCommand::Scrape {
                    op: self.register(OpTarget::Scrape(message_id)),
                    url,
                }
            }
        }
    }

    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<AppEvent>) {
        let engine = self.engine.clone();
        let table = self.table.clone();
        let in_flight = self.in_flight.clone();
        thread::spawn(move || loop {
            let Some(event) = engine.recv_timeout(Duration::from_millis(50)) else {
                continue;
            };
            let completes = completes_command(&event);
            let msg = {
                let mut table = table.lock().unwrap_or_else(PoisonError::into_inner);
                translate(&mut table, event)
            };
            if let Some(msg) = msg {
                if msg_tx.send(AppEvent::Msg(msg)).is_err() {
                    break;
                }
            }
            if completes {
                in_flight.settle_one();
            }
        });
    }
}

/// Maps one engine event onto the `Msg` the state machine expects. Events
/// for unknown ops are dropped.
fn translate(table: &mut OpTable, event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::AnswerChunk { op, text } => match table.peek(op)? {
            OpTarget::Ask(token) => Some(Msg::AnswerChunk { token, text }),
            _ => None,
        },
        EngineEvent::AskCompleted {
            op,
            result,
            elapsed,
        } => {
            let OpTarget::Ask(token) = table.finish(op)? else {
                return None;
            };
            Some(match result {
                Ok(AskOutcome::Answer {
                    answer,
                    conversation_id,
                }) => Msg::AskAnswered {
                    token,
                    answer,
                    conversation_id,
                    elapsed,
                },
                Ok(AskOutcome::Streamed) => Msg::AnswerStreamEnded { token, elapsed },
                Err(err) => {
                    chat_warn!("Ask failed ({}): {}", err.kind, err);
                    Msg::AskFailed {
                        token,
                        error: err.message,
                    }
                }
            })
        }
        EngineEvent::UploadProgress {
            op,
            sent,
            total,
            elapsed,
        } => match table.peek(op)? {
            OpTarget::Upload(message_id) => Some(Msg::UploadProgress {
                message_id,
                sent,
                total,
                elapsed,
            }),
            _ => None,
        },
        EngineEvent::UploadCompleted {
            op,
            result,
            elapsed,
        } => {
            let OpTarget::Upload(message_id) = table.finish(op)? else {
                return None;
            };
            Some(Msg::UploadFinished {
                message_id,
                result: result.map(|_| ()).map_err(|err| err.message),
                elapsed,
            })
        }
        EngineEvent::FilesListed { op, result } => {
            let OpTarget::Files(token) = table.finish(op)? else {
                return None;
            };
            Some(Msg::FilesListed {
                token,
                result: result
                    .map(|files| files.into_iter().map(remote_file).collect())
                    .map_err(|err| err.message),
            })
        }
        EngineEvent::FileDeleted { op, name, result } => {
            let OpTarget::Delete(file_id) = table.finish(op)? else {
                return None;
            };
            Some(Msg::FileDeleted {
                name,
                file_id,
                result: result.map(|_| ()).map_err(|err| err.message),
            })
        }
        EngineEvent::HistoryCleared { result } => Some(Msg::HistoryCleared {
            result: result.map(|_| ()).map_err(|err| err.message),
        }),
        EngineEvent::NewsFetched { op, query, result } => {
            let OpTarget::News(token) = table.finish(op)? else {
                return None;
            };
            Some(Msg::NewsFetched {
                token,
                query,
                result: result
                    .map(|items| items.into_iter().map(news_item).collect())
                    .map_err(|err| err.message),
            })
        }
        EngineEvent::ScrapeProgress { op, elapsed } => match table.peek(op)? {
            OpTarget::Scrape(message_id) => Some(Msg::ScrapeTick {
                message_id,
                elapsed,
            }),
            _ => None,
        },
        EngineEvent::ScrapeCompleted {
            op,
            result,
            elapsed,
        } => {
            let OpTarget::Scrape(message_id) = table.finish(op)? else {
                return None;
            };
            Some(Msg::ScrapeFinished {
                message_id,
                result: result.map(scrape_report).map_err(|err| err.message),
                elapsed,
            })
        }
    }
}

fn remote_file(info: FileInfo) -> RemoteFile {
    RemoteFile {
        name: info.name,
        size: info.size,
        mime_type: info.mime_type,
        uploaded_at: info.uploaded_at,
    }
}

fn news_item(article: NewsArticle) -> NewsItem {
    NewsItem {
        title: article.title,
        url: article.url,
        published_at: article.published_at,
        source: article.source,
        summary: article.summary,
    }
}

fn scrape_report(response: ScrapeResponse) -> ScrapeReport {
    let details = response.details.unwrap_or_default();
    ScrapeReport {
        status: response.status,
        message: response.message,
        error: response.error,
        title: response.title,
        detail_url: details.url,
        detail_title: details.title,
        chunks_generated: details.chunks_generated,
        source_name: details.source_name,
    }
}

/// Reads size and guesses the MIME type of a file picked for upload.
pub fn inspect_upload(path: &Path) -> Result<UploadSource, String> {
    let metadata = std::fs::metadata(path)
        .map_err(|err| format!("Cannot read {}: {err}", path.display()))?;
    if !metadata.is_file() {
        return Err(format!("{} is not a file", path.display()));
    }
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| format!("{} has no file name", path.display()))?;
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();
    chat_debug!("Inspected {} ({} bytes, {})", name, metadata.len(), mime_type);
    Ok(UploadSource {
        path: path.to_path_buf(),
        name,
        size_bytes: metadata.len(),
        mime_type,
    })
}
