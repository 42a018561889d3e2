use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use tokio::time::Instant;

use docchat_logging::{chat_debug, chat_info};

use crate::api::{ApiSettings, ChannelProgressSink, ChatBackend, ProgressSink, ReqwestBackend};
use crate::scrape::scrape_with_progress;
use crate::{ApiError, EngineEvent, OpId, UploadFile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Ask { op: OpId, question: String },
    Upload { op: OpId, file: UploadFile },
    ListFiles { op: OpId },
    DeleteFile { op: OpId, name: String },
    ClearHistory,
    FetchNews { op: OpId, query: String },
    Scrape { op: OpId, url: String },
}

#[derive(Debug, thiserror::Error)]
pub enum EngineStartError {
    #[error("invalid backend settings: {0}")]
    Backend(#[from] ApiError),
    #[error("could not start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Owns the engine thread. Commands run as independent tasks on its tokio
/// runtime, so completions arrive in the order they resolve.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(settings: ApiSettings) -> Result<Self, EngineStartError> {
        let scrape_tick = settings.scrape_tick;
        let backend = ReqwestBackend::new(settings)?;
        Self::with_backend(Arc::new(backend), scrape_tick)
    }

    pub fn with_backend(
        backend: Arc<dyn ChatBackend>,
        scrape_tick: Duration,
    ) -> Result<Self, EngineStartError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("docchat-engine")
            .build()?;

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let backend = backend.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(backend.as_ref(), command, scrape_tick, event_tx).await;
                });
            }
            chat_info!("engine command channel closed; shutting down");
        });

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    pub fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        let rx = self.event_rx.lock().ok()?;
        rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        let rx = self.event_rx.lock().ok()?;
        rx.recv_timeout(timeout).ok()
    }
}

async fn handle_command(
    backend: &dyn ChatBackend,
    command: EngineCommand,
    scrape_tick: Duration,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let sink = ChannelProgressSink::new(event_tx);
    match command {
        EngineCommand::Ask { op, question } => {
            let started = Instant::now();
            let result = backend.ask(op, &question, &sink).await;
            sink.emit(EngineEvent::AskCompleted {
                op,
                result,
                elapsed: started.elapsed(),
            });
        }
        EngineCommand::Upload { op, file } => {
            let started = Instant::now();
            let result = backend.upload(op, &file, &sink).await;
            sink.emit(EngineEvent::UploadCompleted {
                op,
                result,
                elapsed: started.elapsed(),
            });
        }
        EngineCommand::ListFiles { op } => {
            let result = backend.list_files().await;
            sink.emit(EngineEvent::FilesListed { op, result });
        }
        EngineCommand::DeleteFile { op, name } => {
            let result = backend.delete_file(&name).await;
            sink.emit(EngineEvent::FileDeleted { op, name, result });
        }
        EngineCommand::ClearHistory => {
            let result = backend.clear_history().await;
            sink.emit(EngineEvent::HistoryCleared { result });
        }
        EngineCommand::FetchNews { op, query } => {
            let result = backend.news(&query).await;
            sink.emit(EngineEvent::NewsFetched { op, query, result });
        }
        EngineCommand::Scrape { op, url } => {
            let (result, elapsed) =
                scrape_with_progress(backend, op, &url, scrape_tick, &sink).await;
            chat_debug!("scrape op={op} settled after {:?}", elapsed);
            sink.emit(EngineEvent::ScrapeCompleted {
                op,
                result,
                elapsed,
            });
        }
    }
}
