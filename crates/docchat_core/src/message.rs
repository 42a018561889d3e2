use std::fmt;

use chrono::{DateTime, Utc};

/// Identifies one chat message for in-place rewrites.
///
/// Ids come from a per-state counter, so two messages never share one even
/// when several uploads or scrapes start in the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub author: Author,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// 0..=100 while an upload or scrape owns this message.
    pub progress: Option<u8>,
}

impl Message {
    pub fn is_bot(&self) -> bool {
        self.author == Author::Bot
    }
}

/// Source of message and file timestamps.
///
/// Equality ignores the function so that two states holding the same chat
/// compare equal regardless of which clock produced them.
#[derive(Clone, Copy)]
pub struct Clock(pub fn() -> DateTime<Utc>);

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        (self.0)()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Clock(Utc::now)
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Clock")
    }
}

impl PartialEq for Clock {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for Clock {}
