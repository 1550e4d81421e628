use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleLevel {
    Log,
    Warn,
    Error,
}

impl ConsoleLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// One captured diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub text: String,
}

impl fmt::Display for ConsoleMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[console.{}] {}", self.level.as_str(), self.text)
    }
}

#[derive(Debug)]
pub(crate) struct ConsoleState {
    messages: VecDeque<ConsoleMessage>,
    pub(crate) limit: usize,
    pub(crate) to_stderr: bool,
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self {
            messages: VecDeque::new(),
            limit: 10_000,
            to_stderr: false,
        }
    }
}

impl ConsoleState {
    pub(crate) fn push(&mut self, level: ConsoleLevel, text: String) {
        let message = ConsoleMessage { level, text };
        if self.to_stderr {
            eprintln!("{message}");
        }
        while self.messages.len() >= self.limit {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub(crate) fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        while self.messages.len() > self.limit {
            self.messages.pop_front();
        }
    }

    pub(crate) fn messages(&self) -> Vec<ConsoleMessage> {
        self.messages.iter().cloned().collect()
    }

    pub(crate) fn take(&mut self) -> Vec<ConsoleMessage> {
        self.messages.drain(..).collect()
    }
}
