//! SMTP submission client.
//!
//! Drives the command dialogue over a plain or TLS-upgraded TCP stream:
//! greeting, EHLO, optional STARTTLS, AUTH, then MAIL, RCPT and DATA for
//! each message and QUIT at the end. Replies are checked after every
//! command and surfaced through [`SmtpError`] by reply class.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use base64::{Engine, engine::general_purpose::STANDARD};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufStream, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tracing::{debug, info};

use crate::error::SmtpError;
use crate::wire::{Reply, dot_stuff, read_reply, write_command};
use crate::{CONNECT_TIMEOUT, REPLY_TIMEOUT};

/// The connection before or after the STARTTLS upgrade.
#[derive(Debug)]
enum MaybeTls {
    Plain(TcpStream),
    Tls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl AsyncRead for MaybeTls {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MaybeTls::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            MaybeTls::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for MaybeTls {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            MaybeTls::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            MaybeTls::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MaybeTls::Plain(stream) => Pin::new(stream).poll_flush(cx),
            MaybeTls::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MaybeTls::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            MaybeTls::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}

/// One client connection to a mail server.
#[derive(Debug)]
pub struct SmtpClient {
    stream: Option<BufStream<MaybeTls>>,
    host: String,
    local_name: String,
    extensions: Vec<String>,
}

impl SmtpClient {
    /// Connects, consumes the greeting and introduces itself with EHLO.
    pub async fn connect(host: &str, port: u16) -> Result<Self, SmtpError> {
        let tcp = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port)))
            .await
            .map_err(|_| SmtpError::Timeout)??;
        info!(host, port, "connected to mail server");

        let mut client = Self {
            stream: Some(BufStream::new(MaybeTls::Plain(tcp))),
            host: host.to_string(),
            local_name: local_name(),
            extensions: Vec::new(),
        };
        let greeting = client.read_one().await?;
        if greeting.code != 220 {
            return Err(classify(greeting));
        }
        client.hello().await?;
        Ok(client)
    }

    /// EHLO, falling back to HELO for servers that predate extensions.
    async fn hello(&mut self) -> Result<(), SmtpError> {
        let reply = self.command(&format!("EHLO {}", self.local_name)).await?;
        if reply.is_positive() {
            // The first line is the server's name, the rest are keywords.
            self.extensions = reply
                .lines
                .iter()
                .skip(1)
                .map(|line| line.to_ascii_uppercase())
                .collect();
            return Ok(());
        }
        let reply = self.command(&format!("HELO {}", self.local_name)).await?;
        if reply.is_positive() {
            self.extensions.clear();
            return Ok(());
        }
        Err(classify(reply))
    }

    /// Whether the server advertised an EHLO keyword.
    pub fn supports(&self, keyword: &str) -> bool {
        let keyword = keyword.to_ascii_uppercase();
        self.extensions
            .iter()
            .any(|ext| *ext == keyword || ext.starts_with(&format!("{keyword} ")))
    }

    /// Upgrades the connection to TLS and repeats EHLO.
    ///
    /// The server forgets everything it learned before the upgrade, so the
    /// extension list is refreshed from the post-TLS EHLO.
    pub async fn starttls(&mut self) -> Result<(), SmtpError> {
        if !self.supports("STARTTLS") {
            return Err(SmtpError::Protocol(
                "server does not advertise STARTTLS".into(),
            ));
        }
        let reply = self.command("STARTTLS").await?;
        if reply.code != 220 {
            return Err(classify(reply));
        }

        let plain = match self.stream.take() {
            Some(buffered) => match buffered.into_inner() {
                MaybeTls::Plain(tcp) => tcp,
                upgraded @ MaybeTls::Tls(_) => {
                    self.stream = Some(BufStream::new(upgraded));
                    return Err(SmtpError::Protocol("TLS negotiated twice".into()));
                }
            },
            None => return Err(SmtpError::Protocol("session closed".into())),
        };

        let server_name = ServerName::try_from(self.host.clone())
            .map_err(|e| SmtpError::Tls(e.to_string()))?;
        let tls = tls_connector()
            .connect(server_name, plain)
            .await
            .map_err(|e| SmtpError::Tls(e.to_string()))?;
        debug!(host = %self.host, "TLS established");
        self.stream = Some(BufStream::new(MaybeTls::Tls(Box::new(tls))));

        self.hello().await
    }

    /// Authenticates with AUTH PLAIN, walking through AUTH LOGIN when the
    /// server does not take the one-shot mechanism.
    pub async fn authenticate(&mut self, login: &str, password: &str) -> Result<(), SmtpError> {
        let token = STANDARD.encode(format!("\0{login}\0{password}"));
        let reply = self.command(&format!("AUTH PLAIN {token}")).await?;
        if reply.is_positive() {
            debug!(login, "authenticated");
            return Ok(());
        }
        if matches!(reply.code, 500 | 502 | 504) {
            return self.auth_login(login, password).await;
        }
        Err(auth_failure(reply))
    }

    async fn auth_login(&mut self, login: &str, password: &str) -> Result<(), SmtpError> {
        let reply = self.command("AUTH LOGIN").await?;
        if reply.code != 334 {
            return Err(auth_failure(reply));
        }
        let reply = self.command(&STANDARD.encode(login)).await?;
        if reply.code != 334 {
            return Err(auth_failure(reply));
        }
        let reply = self.command(&STANDARD.encode(password)).await?;
        if reply.is_positive() {
            debug!(login, "authenticated");
            return Ok(());
        }
        Err(auth_failure(reply))
    }

    /// Cheap probe for whether the session still answers.
    pub async fn noop(&mut self) -> Result<(), SmtpError> {
        let reply = self.command("NOOP").await?;
        if reply.is_positive() {
            Ok(())
        } else {
            Err(classify(reply))
        }
    }

    /// Submits one rendered message to the given recipients.
    pub async fn send_mail(
        &mut self,
        from: &str,
        recipients: &[String],
        data: &[u8],
    ) -> Result<(), SmtpError> {
        if recipients.is_empty() {
            return Err(SmtpError::Protocol("no recipients".into()));
        }
        self.expect_positive(&format!("MAIL FROM:<{from}>")).await?;
        for recipient in recipients {
            self.expect_positive(&format!("RCPT TO:<{recipient}>"))
                .await?;
        }
        let reply = self.command("DATA").await?;
        if reply.code != 354 {
            return Err(classify(reply));
        }

        let stuffed = dot_stuff(data);
        let stream = self.stream_mut()?;
        stream.write_all(&stuffed).await?;
        stream.flush().await?;
        let reply = self.read_one().await?;
        if !reply.is_positive() {
            return Err(classify(reply));
        }
        debug!(bytes = stuffed.len(), "message accepted");
        Ok(())
    }

    /// Says goodbye and drops the connection. The QUIT reply is not checked;
    /// the messages are already accepted by this point.
    pub async fn quit(&mut self) -> Result<(), SmtpError> {
        if self.stream.is_some() {
            let _ = self.command("QUIT").await;
            self.stream = None;
        }
        Ok(())
    }

    async fn expect_positive(&mut self, line: &str) -> Result<Reply, SmtpError> {
        let reply = self.command(line).await?;
        if reply.is_positive() {
            Ok(reply)
        } else {
            Err(classify(reply))
        }
    }

    // Command lines can carry credentials, so they are never logged here.
    async fn command(&mut self, line: &str) -> Result<Reply, SmtpError> {
        let stream = self.stream_mut()?;
        write_command(stream, line).await?;
        self.read_one().await
    }

    async fn read_one(&mut self) -> Result<Reply, SmtpError> {
        let stream = self.stream_mut()?;
        match tokio::time::timeout(REPLY_TIMEOUT, read_reply(stream)).await {
            Ok(reply) => reply,
            Err(_) => Err(SmtpError::Timeout),
        }
    }

    fn stream_mut(&mut self) -> Result<&mut BufStream<MaybeTls>, SmtpError> {
        self.stream
            .as_mut()
            .ok_or_else(|| SmtpError::Protocol("session closed".into()))
    }
}

/// Maps a refused command onto the error taxonomy by reply class.
fn classify(reply: Reply) -> SmtpError {
    if reply.is_transient() {
        SmtpError::Transient { reply: reply.text() }
    } else {
        SmtpError::Permanent { reply: reply.text() }
    }
}

/// Authentication refusals are permanent unless the server says otherwise.
fn auth_failure(reply: Reply) -> SmtpError {
    if reply.is_transient() {
        SmtpError::Transient { reply: reply.text() }
    } else {
        SmtpError::Auth { reply: reply.text() }
    }
}

fn tls_connector() -> TlsConnector {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

/// Name announced in EHLO.
fn local_name() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "localhost".into())
}

// ---------------------------------------------------------------------------
