//! Parses terminal input lines into chat commands.

use std::path::PathBuf;

use docchat_core::FileId;

pub const HELP: &str = "\
Type a question and press Enter to ask it.
  /upload <path>     upload a local document
  /files             list documents known to the backend
  /delete <name>     delete a backend document by name
  /remove <file-id>  remove an uploaded file (ids are shown as f<n>)
  /select <file-id>  select an uploaded file for suggestions
  /clear             clear the chat history
  /news [query]      fetch the latest news
  /scrape <url>      index a web page
  /suggest           show suggested questions
  /pick <n>          ask suggestion number n
  /dismiss           dismiss the current error
  /help              show this help
  /quit              exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Upload(PathBuf),
    Files,
    Delete(String),
    Remove(FileId),
    Select(FileId),
    Clear,
    News(Option<String>),
    Scrape(String),
    Suggest,
    /// Zero-based suggestion index.
    Pick(usize),
    Dismiss,
    Help,
    Quit,
    /// Blank line.
    Nothing,
    /// Unknown command or bad arguments; carries the message to show.
    Invalid(String),
}

pub fn parse(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Nothing;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Ask(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name.to_ascii_lowercase().as_str() {
        "upload" => required(arg, "/upload <path>").map(|path| Command::Upload(PathBuf::from(path))),
        "files" => Ok(Command::Files),
        "delete" => required(arg, "/delete <name>").map(|name| Command::Delete(name.to_string())),
        "remove" => file_id(arg, "/remove <file-id>").map(Command::Remove),
        "select" => file_id(arg, "/select <file-id>").map(Command::Select),
        "clear" => Ok(Command::Clear),
        "news" => Ok(Command::News(
            Some(arg).filter(|query| !query.is_empty()).map(str::to_string),
        )),
        "scrape" => required(arg, "/scrape <url>").map(|url| Command::Scrape(url.to_string())),
        "suggest" => Ok(Command::Suggest),
        "pick" => arg
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .map(|n| Command::Pick(n - 1))
            .ok_or_else(|| "Usage: /pick <n> (n starts at 1)".to_string()),
        "dismiss" => Ok(Command::Dismiss),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("Unknown command /{other}. Type /help for the list.")),
    }
    .unwrap_or_else(Command::Invalid)
}

fn required<'a>(arg: &'a str, usage: &str) -> Result<&'a str, String> {
    if arg.is_empty() {
        Err(format!("Usage: {usage}"))
    } else {
        Ok(arg)
    }
}

/// Accepts `f3` as printed by the file list, or a bare `3`.
fn file_id(arg: &str, usage: &str) -> Result<FileId, String> {
    let digits = arg.strip_prefix(['f', 'F']).unwrap_or(arg);
    digits
        .parse::<u64>()
        .map(FileId)
        .map_err(|_| format!("Usage: {usage}"))
}
