//! Transient status line
//!
//! Storage and import outcomes are reported here instead of propagating.
//! Messages expire after a TTL measured against a caller-supplied clock
//! (`now` in seconds), so nothing here reads the system time.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Info => "info",
            StatusKind::Success => "success",
            StatusKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
    /// Clock value when posted
    pub posted_at: f64,
    pub ttl: f64,
}

impl StatusMessage {
    pub fn is_expired(&self, now: f64) -> bool {
        now - self.posted_at >= self.ttl
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

/// Holds at most one message; a new post replaces the old one
#[derive(Debug, Clone)]
pub struct StatusLine {
    current: Option<StatusMessage>,
    ttl: f64,
}

impl StatusLine {
    pub fn new(ttl: f64) -> Self {
        Self { current: None, ttl }
    }

    pub fn post(&mut self, kind: StatusKind, text: impl Into<String>, now: f64) {
        self.current = Some(StatusMessage {
            kind,
            text: text.into(),
            posted_at: now,
            ttl: self.ttl,
        });
    }

    pub fn info(&mut self, text: impl Into<String>, now: f64) {
        self.post(StatusKind::Info, text, now);
    }

    pub fn success(&mut self, text: impl Into<String>, now: f64) {
        self.post(StatusKind::Success, text, now);
    }

    pub fn error(&mut self, text: impl Into<String>, now: f64) {
        self.post(StatusKind::Error, text, now);
    }

    /// The live message, if it has not expired
    pub fn current(&self, now: f64) -> Option<&StatusMessage> {
        self.current.as_ref().filter(|m| !m.is_expired(now))
    }
}
