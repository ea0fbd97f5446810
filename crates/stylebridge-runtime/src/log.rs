/*
 * log.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * LogSink implementations.
 */

use std::sync::Mutex;

use crate::traits::LogSink;

/// Forwards both channels to `tracing`.
///
/// This is the sink used by the command-line binary, where a
/// `tracing-subscriber` formatter decides what reaches the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "stylebridge", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "stylebridge", "{}", message);
    }
}

/// Which channel a recorded message was sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Warn,
}

/// Captures messages in memory.
///
/// Embedders use this to collect diagnostics for their own UI; tests use it
/// to assert on exactly what was reported.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message, in the order it was logged.
    pub fn messages(&self) -> Vec<(LogLevel, String)> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Only the warning-channel messages.
    pub fn warnings(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(level, _)| *level == LogLevel::Warn)
            .map(|(_, message)| message)
            .collect()
    }

    /// Only the debug-channel messages.
    pub fn debugs(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(level, _)| *level == LogLevel::Debug)
            .map(|(_, message)| message)
            .collect()
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((level, message.to_string()));
    }
}

impl LogSink for RecordingSink {
    fn debug(&self, message: &str) {
        self.push(LogLevel::Debug, message);
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message);
    }
}
