//! SMTP submission transport.
//!
//! Speaks enough of the protocol to push messages through a provider's
//! submission port: EHLO with a HELO fallback, STARTTLS against the
//! webpki root store, AUTH PLAIN with an AUTH LOGIN fallback, MAIL, RCPT
//! and dot-stuffed DATA, NOOP liveness probes and QUIT.
//!
//! [`SmtpTransport`] plugs the client into the delivery engine; the rest
//! of the crate is usable on its own for one-off submissions.

pub mod client;
pub mod error;
pub mod transport;
pub mod wire;

pub use client::SmtpClient;
pub use error::SmtpError;
pub use transport::SmtpTransport;
pub use wire::Reply;

use std::time::Duration;

/// How long the TCP connection attempt may take.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// How long to wait for a single server reply.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(60);
