//! Mail transport traits.
//!
//! `MailTransport` is implemented by the SMTP crate to bridge the delivery
//! engine to an actual server dialogue. Using traits keeps the engine
//! decoupled from sockets and testable with mocks.

use std::future::Future;
use std::pin::Pin;

use mailpack_message::{Envelope, MailMessage};

use crate::error::DeliveryError;

/// Boxed future returned by the transport traits.
pub type TransportFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, DeliveryError>> + Send + 'a>>;

/// Factory for mail submission sessions.
pub trait MailTransport: Send + Sync {
    /// Opens a fresh session to the server.
    ///
    /// Connection-level failures are reported as
    /// [`DeliveryError::Transient`] so the engine's retry loop covers them.
    fn open<'a>(&'a self, host: &'a str, port: u16) -> TransportFuture<'a, Box<dyn MailSession>>;
}

/// One open submission session.
pub trait MailSession: Send {
    /// Upgrades the session to TLS.
    fn negotiate_security(&mut self) -> TransportFuture<'_, ()>;

    /// Authenticates the account.
    ///
    /// Rejected credentials must map to [`DeliveryError::Auth`]; anything
    /// recoverable maps to [`DeliveryError::Transient`].
    fn authenticate<'a>(
        &'a mut self,
        login: &'a str,
        password: &'a str,
    ) -> TransportFuture<'a, ()>;

    /// Probes whether the server still answers on this session.
    fn is_alive(&mut self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;

    /// Submits one message to the envelope recipients.
    fn deliver<'a>(
        &'a mut self,
        message: &'a MailMessage,
        envelope: &'a Envelope,
    ) -> TransportFuture<'a, ()>;

    /// Closes the session. Best effort; errors are ignored by callers.
    fn close(&mut self) -> TransportFuture<'_, ()>;
}
