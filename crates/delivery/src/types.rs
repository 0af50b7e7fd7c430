//! Public types for the delivery engine.

use std::time::Duration;

/// Session state as the engine sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session open.
    Disconnected,
    /// Session being opened, secured and authenticated.
    Connecting,
    /// Session ready, between submissions.
    Authenticated,
    /// A submission is in flight.
    Sending,
    /// A message exhausted its attempts; the session was dropped.
    Failed,
}

/// Configuration for bounded per-message retry.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts per message, the first try included.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(5),
        }
    }
}

/// Everything the engine needs to deliver transfers.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Mail server host name.
    pub host: String,
    /// Mail server port.
    pub port: u16,
    /// Whether to upgrade the session to TLS before authenticating.
    pub starttls: bool,
    /// Account name, also used as the sender address.
    pub login: String,
    pub password: String,
    /// Charset declared on the text part of every message.
    pub email_charset: String,
    /// Maximum package payload size in bytes. 0 means the packaging default.
    pub max_package_size: u64,
    pub retry: RetryConfig,
}

/// Events emitted by the delivery engine.
#[derive(Debug, Clone)]
pub enum DeliveryEvent {
    /// A file transfer began. `estimated_messages` is display-only; the
    /// emitted count can differ if the file changes mid-transfer.
    FileStarted {
        file_name: String,
        total_bytes: u64,
        estimated_messages: u64,
    },
    /// Byte-level progress within the current file.
    Progress {
        total_bytes: u64,
        sent_bytes: u64,
        status: String,
    },
    /// One message was accepted by the server.
    MessageDelivered { subject: String, attempts: u32 },
    /// One attempt failed; the engine will back off and retry.
    AttemptFailed {
        subject: String,
        attempt: u32,
        max_attempts: u32,
        error: String,
    },
    /// All messages of a file were delivered.
    FileCompleted { file_name: String, messages: u32 },
    /// The file was abandoned part-way through.
    FileFailed { file_name: String, error: String },
}

/// Outcome for one file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file_name: String,
    pub messages_delivered: u32,
    /// Why the file was abandoned, if it was.
    pub error: Option<String>,
}

impl FileReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome for a whole run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub files: Vec<FileReport>,
}

impl RunReport {
    /// True when every file was fully delivered.
    pub fn all_delivered(&self) -> bool {
        self.files.iter().all(FileReport::succeeded)
    }
}
