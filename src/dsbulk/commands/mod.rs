//! # Bulk Action Drivers
//!
//! Each driver lists targets under a root, optionally changes something on
//! each, overlays before/after keys on the target and renders it with the
//! printer. Drivers return a [`CmdResult`]: the rendered lines plus
//! messages for the user. They never write to stdout themselves.
//!
//! A failure on one object is written under the `result` key of that
//! target and the batch carries on. Only repository-level failures (and a
//! failed commit) abort the driver.

pub mod helpers;
pub mod list;
pub mod metadata;
pub mod policy;
pub mod replace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    /// Rendered output, one entry per line.
    pub lines: Vec<String>,
    pub messages: Vec<CmdMessage>,
    /// Targets the driver visited.
    pub processed: usize,
    /// Targets whose state changed (or would change, on a dry run).
    pub changed: usize,
    /// Targets whose edit failed.
    pub failed: usize,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_lines(mut self, lines: Vec<String>) -> Self {
        self.lines = lines;
        self
    }
}
