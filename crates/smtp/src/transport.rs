//! Bridges [`SmtpClient`] onto the delivery engine's transport traits.

use std::future::Future;
use std::pin::Pin;

use mailpack_delivery::{DeliveryError, MailSession, MailTransport, TransportFuture};
use mailpack_message::{Envelope, MailMessage};

use crate::client::SmtpClient;
use crate::error::SmtpError;

/// [`MailTransport`] that opens real SMTP sessions.
pub struct SmtpTransport;

impl MailTransport for SmtpTransport {
    fn open<'a>(&'a self, host: &'a str, port: u16) -> TransportFuture<'a, Box<dyn MailSession>> {
        Box::pin(async move {
            let client = SmtpClient::connect(host, port)
                .await
                .map_err(to_delivery_error)?;
            Ok(Box::new(SmtpSession { client }) as Box<dyn MailSession>)
        })
    }
}

struct SmtpSession {
    client: SmtpClient,
}

impl MailSession for SmtpSession {
    fn negotiate_security(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move { self.client.starttls().await.map_err(to_delivery_error) })
    }

    fn authenticate<'a>(
        &'a mut self,
        login: &'a str,
        password: &'a str,
    ) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            self.client
                .authenticate(login, password)
                .await
                .map_err(to_delivery_error)
        })
    }

    fn is_alive(&mut self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move { self.client.noop().await.is_ok() })
    }

    fn deliver<'a>(
        &'a mut self,
        message: &'a MailMessage,
        envelope: &'a Envelope,
    ) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            let data = message.to_rfc2822();
            self.client
                .send_mail(&envelope.from, &envelope.recipients, &data)
                .await
                .map_err(to_delivery_error)
        })
    }

    fn close(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move { self.client.quit().await.map_err(to_delivery_error) })
    }
}

/// Maps wire errors onto the engine's taxonomy.
///
/// Socket trouble, timeouts and garbled replies all land on `Transient`:
/// the session is gone but a fresh one may well work. Only 5xx replies and
/// credential rejections are final.
fn to_delivery_error(e: SmtpError) -> DeliveryError {
    match e {
        SmtpError::Auth { reply } => DeliveryError::Auth(reply),
        SmtpError::Permanent { reply } => DeliveryError::Rejected(reply),
        SmtpError::Transient { reply } => DeliveryError::Transient(reply),
        SmtpError::Io(e) => DeliveryError::Transient(e.to_string()),
        SmtpError::Timeout => DeliveryError::Transient("server did not answer in time".into()),
        SmtpError::Tls(e) => DeliveryError::Transient(e),
        SmtpError::Protocol(e) => DeliveryError::Transient(e),
    }
}

// ---------------------------------------------------------------------------
