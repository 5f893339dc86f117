//! Console log entries

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsoleEntryType {
    UserInput,
    ConsoleMessage,
    Warning,
    Error,
}

impl ConsoleEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsoleEntryType::UserInput => "input",
            ConsoleEntryType::ConsoleMessage => "message",
            ConsoleEntryType::Warning => "warning",
            ConsoleEntryType::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleEntry {
    pub message: String,
    pub entry_type: ConsoleEntryType,
}

impl ConsoleEntry {
    pub fn new(message: impl Into<String>, entry_type: ConsoleEntryType) -> Self {
        Self {
            message: message.into(),
            entry_type,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::new(message, ConsoleEntryType::ConsoleMessage)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, ConsoleEntryType::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, ConsoleEntryType::Error)
    }
}

impl std::fmt::Display for ConsoleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.entry_type {
            ConsoleEntryType::UserInput => write!(f, "> {}", self.message),
            ConsoleEntryType::ConsoleMessage => write!(f, "{}", self.message),
            ConsoleEntryType::Warning => write!(f, "[warning] {}", self.message),
            ConsoleEntryType::Error => write!(f, "[error] {}", self.message),
        }
    }
}
