//! Error types for the SMTP transport.

/// Errors produced while talking to a mail server.
///
/// Server replies are split by reply class so callers can tell a failure
/// worth repeating (`Transient`, 4xx) from one that is final (`Permanent`,
/// 5xx). Credential rejections get their own variant since they abort the
/// whole run rather than a single message.
#[derive(Debug, thiserror::Error)]
pub enum SmtpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server did not answer in time")]
    Timeout,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("authentication rejected: {reply}")]
    Auth { reply: String },

    #[error("transient server failure: {reply}")]
    Transient { reply: String },

    #[error("permanent server failure: {reply}")]
    Permanent { reply: String },
}
