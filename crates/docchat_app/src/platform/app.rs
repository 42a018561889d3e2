use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use docchat_core::{update, AppState, Msg};
use docchat_engine::EngineHandle;
use docchat_logging::{chat_info, chat_warn};

use super::commands::{self, Command};
use super::config::{AppConfig, Args};
use super::effects::{inspect_upload, EffectRunner};
use super::logging;
use super::ui::render::{suggestion_lines, Output, Renderer};

/// Everything the main loop reacts to.
pub enum AppEvent {
    Msg(Msg),
    Line(String),
    InputClosed,
}

/// After stdin closes, exit once nothing has happened for this long and no
/// engine command is outstanding.
const DRAIN_IDLE: Duration = Duration::from_secs(1);

pub fn run_app() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(&args).context("loading configuration")?;
    logging::initialize(&config.log_config(args.verbose));
    chat_info!("docchat starting; backend {}", config.api_url);

    let engine =
        EngineHandle::new(config.api_settings()).context("starting the backend client")?;
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    let runner = EffectRunner::new(engine, event_tx.clone());
    spawn_stdin_reader(event_tx);

    let mut app = App {
        state: AppState::new(),
        renderer: Renderer::default(),
        runner,
        news_query: config.news_query.clone(),
    };
    app.print(&[Output::Line(format!(
        "docchat connected to {}. Type /help for commands.",
        config.api_url
    ))]);

    let mut input_closed = false;
    loop {
        let event = if input_closed {
            match event_rx.recv_timeout(DRAIN_IDLE) {
                Ok(event) => event,
                Err(mpsc::RecvTimeoutError::Timeout) if !app.busy() => break,
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match event_rx.recv() {
                Ok(event) => event,
                Err(_) => break,
            }
        };

        match event {
            AppEvent::Msg(msg) => app.dispatch(msg),
            AppEvent::Line(line) => {
                if app.handle_line(&line) == Flow::Quit {
                    break;
                }
            }
            AppEvent::InputClosed => input_closed = true,
        }
    }

    chat_info!("docchat exiting");
    Ok(())
}

fn spawn_stdin_reader(tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(AppEvent::Line(line)).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    chat_warn!("stdin read failed: {}", err);
                    break;
                }
            }
        }
        let _ = tx.send(AppEvent::InputClosed);
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct App {
    state: AppState,
    renderer: Renderer,
    runner: EffectRunner,
    news_query: String,
}

impl App {
    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);
        if self.state.consume_dirty() {
            let output = self.renderer.render(&self.state.view());
            self.print(&output);
        }
    }

    fn handle_line(&mut self, line: &str) -> Flow {
        match commands::parse(line) {
            Command::Ask(text) => {
                self.dispatch(Msg::InputChanged(text));
                self.dispatch(Msg::SendSubmitted);
            }
            Command::Upload(path) => match inspect_upload(&path) {
                Ok(source) => self.dispatch(Msg::UploadRequested(source)),
                Err(reason) => self.notice(format!("! {reason}")),
            },
            Command::Files => self.dispatch(Msg::RefreshFilesRequested),
            Command::Delete(name) => self.dispatch(Msg::DeleteFileRequested(name)),
            Command::Remove(file_id) => self.dispatch(Msg::RemoveFileRequested(file_id)),
            Command::Select(file_id) => self.dispatch(Msg::FileSelected(file_id)),
            Command::Clear => self.dispatch(Msg::ClearRequested),
            Command::News(query) => {
                let query = query.unwrap_or_else(|| self.news_query.clone());
                self.dispatch(Msg::NewsRequested(Some(query)));
            }
            Command::Scrape(url) => self.dispatch(Msg::ScrapeRequested(url)),
            Command::Suggest => {
                let lines = suggestion_lines(&self.state.view());
                self.print(&lines.into_iter().map(Output::Line).collect::<Vec<_>>());
            }
            Command::Pick(index) => self.dispatch(Msg::SuggestionChosen(index)),
            Command::Dismiss => self.dispatch(Msg::ErrorDismissed),
            Command::Help => self.notice(commands::HELP.to_string()),
            Command::Quit => return Flow::Quit,
            Command::Nothing => {}
            Command::Invalid(message) => self.notice(message),
        }
        Flow::Continue
    }

    fn busy(&self) -> bool {
        let view = self.state.view();
        view.is_loading || view.is_uploading || self.runner.in_flight() > 0
    }

    fn notice(&self, text: String) {
        self.print(&[Output::Line(text)]);
    }

    fn print(&self, output: &[Output]) {
        let mut stdout = io::stdout().lock();
        for item in output {
            let _ = match item {
                Output::Line(text) => writeln!(stdout, "{text}"),
                Output::Partial(text) => write!(stdout, "{text}"),
            };
        }
        let _ = stdout.flush();
    }
}
