//! The delivery engine: walks package streams and submits each message
//! over a [`MailTransport`] with bounded retry.

use std::path::{Path, PathBuf};

use mailpack_message::{Envelope, MailMessage, MessageAssembler};
use mailpack_packaging::{PackageStream, PackageUnit};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::DeliveryError;
use crate::transport::{MailSession, MailTransport};
use crate::types::{DeliveryConfig, DeliveryEvent, FileReport, RunReport, SessionState};

/// Delivers files as ordered message runs over one lazily-opened session.
///
/// Messages of a file go out strictly in stream order, summary last. A
/// message only counts as delivered after the server accepts it; once one
/// message of a file is given up on, the rest of that file is dropped so
/// the receiver never sees a gap filled by later packages.
pub struct DeliveryEngine {
    transport: Box<dyn MailTransport>,
    config: DeliveryConfig,
    session: Option<Box<dyn MailSession>>,
    state: SessionState,
    cancel: CancellationToken,
}

impl DeliveryEngine {
    pub fn new(
        transport: Box<dyn MailTransport>,
        config: DeliveryConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            config,
            session: None,
            state: SessionState::Disconnected,
            cancel,
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Sends every file to the same recipients, one at a time.
    ///
    /// A file that exhausts its retries is recorded in the report and the
    /// run moves on to the next file; authentication failures and
    /// interruption abort the whole run. The session is closed on exit
    /// either way.
    pub async fn send_files(
        &mut self,
        paths: &[PathBuf],
        recipients: &[String],
        events_tx: &mpsc::Sender<DeliveryEvent>,
    ) -> Result<RunReport, DeliveryError> {
        let result = self.send_all(paths, recipients, events_tx).await;
        self.close_session().await;
        result
    }

    async fn send_all(
        &mut self,
        paths: &[PathBuf],
        recipients: &[String],
        events_tx: &mpsc::Sender<DeliveryEvent>,
    ) -> Result<RunReport, DeliveryError> {
        let mut report = RunReport::default();
        for path in paths {
            self.check_cancelled()?;
            let file = self.send_file(path, recipients, events_tx).await?;
            if let Some(error) = &file.error {
                warn!(file = %file.file_name, error = %error, "file failed, moving on");
            }
            report.files.push(file);
        }
        Ok(report)
    }

    /// Streams one file as messages. Returns `Ok` with an error recorded in
    /// the report when the file was abandoned; `Err` only for conditions
    /// that end the whole run.
    async fn send_file(
        &mut self,
        path: &Path,
        recipients: &[String],
        events_tx: &mpsc::Sender<DeliveryEvent>,
    ) -> Result<FileReport, DeliveryError> {
        let mut stream = {
            let path = path.to_path_buf();
            let max = self.config.max_package_size;
            tokio::task::spawn_blocking(move || PackageStream::open(&path, max))
                .await
                .map_err(join_error)??
        };

        let descriptor = stream.descriptor().clone();
        let total_bytes = descriptor.total_size;
        info!(
            file = %descriptor.file_name,
            bytes = total_bytes,
            messages = stream.estimated_message_count(),
            split = stream.is_split(),
            "sending file"
        );
        emit(
            events_tx,
            DeliveryEvent::FileStarted {
                file_name: descriptor.file_name.clone(),
                total_bytes,
                estimated_messages: stream.estimated_message_count(),
            },
        )
        .await;

        let assembler = MessageAssembler::new(&self.config.login, &self.config.email_charset);
        let envelope = Envelope {
            from: self.config.login.clone(),
            recipients: recipients.to_vec(),
        };

        let mut sent_bytes = 0u64;
        let mut delivered = 0u32;
        loop {
            self.check_cancelled()?;

            // Package reads block on file I/O, so they run off the runtime.
            let (returned, next) = tokio::task::spawn_blocking(move || {
                let mut stream = stream;
                let next = stream.next_unit();
                (stream, next)
            })
            .await
            .map_err(join_error)?;
            stream = returned;
            let Some(unit) = next? else {
                break;
            };

            let (message, payload_size) = match unit {
                PackageUnit::Single { payload } => {
                    let size = payload.len() as u64;
                    (assembler.single(&descriptor, payload), size)
                }
                PackageUnit::Part { record, payload } => {
                    let size = record.size;
                    (assembler.part(&descriptor, &record, payload), size)
                }
                PackageUnit::Summary { record } => (assembler.summary(&descriptor, &record), 0),
            };

            emit(
                events_tx,
                DeliveryEvent::Progress {
                    total_bytes,
                    sent_bytes,
                    status: format!("sending {}", message.subject),
                },
            )
            .await;

            match self.send_with_retry(&message, &envelope, events_tx).await {
                Ok(attempts) => {
                    delivered += 1;
                    sent_bytes += payload_size;
                    emit(
                        events_tx,
                        DeliveryEvent::MessageDelivered {
                            subject: message.subject.clone(),
                            attempts,
                        },
                    )
                    .await;
                    emit(
                        events_tx,
                        DeliveryEvent::Progress {
                            total_bytes,
                            sent_bytes,
                            status: format!("delivered {}", message.subject),
                        },
                    )
                    .await;
                }
                Err(
                    e @ (DeliveryError::RetriesExhausted { .. } | DeliveryError::Rejected(_)),
                ) => {
                    // Later packages would only hand the receiver an
                    // unfillable gap; drop the rest of this file.
                    error!(file = %descriptor.file_name, error = %e, "abandoning file");
                    emit(
                        events_tx,
                        DeliveryEvent::FileFailed {
                            file_name: descriptor.file_name.clone(),
                            error: e.to_string(),
                        },
                    )
                    .await;
                    return Ok(FileReport {
                        file_name: descriptor.file_name.clone(),
                        messages_delivered: delivered,
                        error: Some(e.to_string()),
                    });
                }
                Err(fatal) => return Err(fatal),
            }
        }

        info!(file = %descriptor.file_name, messages = delivered, "file delivered");
        emit(
            events_tx,
            DeliveryEvent::FileCompleted {
                file_name: descriptor.file_name.clone(),
                messages: delivered,
            },
        )
        .await;
        Ok(FileReport {
            file_name: descriptor.file_name.clone(),
            messages_delivered: delivered,
            error: None,
        })
    }

    /// Attempts one message up to the configured limit, sleeping the fixed
    /// delay between attempts. Returns the number of attempts used.
    async fn send_with_retry(
        &mut self,
        message: &MailMessage,
        envelope: &Envelope,
        events_tx: &mpsc::Sender<DeliveryEvent>,
    ) -> Result<u32, DeliveryError> {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            self.check_cancelled()?;
            match self.try_send(message, envelope).await {
                Ok(()) => {
                    if attempt > 1 {
                        info!(subject = %message.subject, attempt, "delivered after retry");
                    }
                    return Ok(attempt);
                }
                Err(DeliveryError::Transient(reason)) => {
                    warn!(
                        subject = %message.subject,
                        attempt,
                        max_attempts,
                        error = %reason,
                        "delivery attempt failed"
                    );
                    emit(
                        events_tx,
                        DeliveryEvent::AttemptFailed {
                            subject: message.subject.clone(),
                            attempt,
                            max_attempts,
                            error: reason.clone(),
                        },
                    )
                    .await;
                    if attempt >= max_attempts {
                        self.state = SessionState::Failed;
                        return Err(DeliveryError::RetriesExhausted {
                            subject: message.subject.clone(),
                            attempts: attempt,
                        });
                    }
                    self.backoff().await?;
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// One submission attempt over a live session.
    async fn try_send(
        &mut self,
        message: &MailMessage,
        envelope: &Envelope,
    ) -> Result<(), DeliveryError> {
        self.ensure_session().await?;
        self.state = SessionState::Sending;
        let outcome = match self.session.as_mut() {
            Some(session) => session.deliver(message, envelope).await,
            None => Err(DeliveryError::Transient("session missing after connect".into())),
        };
        match outcome {
            Ok(()) => {
                self.state = SessionState::Authenticated;
                Ok(())
            }
            Err(e) => {
                // A failed submission leaves the dialogue at an unknown
                // point; drop the session so the next attempt starts clean.
                self.close_session().await;
                Err(e)
            }
        }
    }

    /// Reuses the session when the server still answers, otherwise opens,
    /// secures and authenticates a fresh one.
    async fn ensure_session(&mut self) -> Result<(), DeliveryError> {
        let alive = match self.session.as_mut() {
            Some(session) => session.is_alive().await,
            None => false,
        };
        if alive {
            self.state = SessionState::Authenticated;
            return Ok(());
        }
        if self.session.is_some() {
            debug!("session went stale, reconnecting");
            self.close_session().await;
        }

        self.state = SessionState::Connecting;
        info!(host = %self.config.host, port = self.config.port, "connecting to mail server");
        let mut session = self.transport.open(&self.config.host, self.config.port).await?;

        if self.config.starttls
            && let Err(e) = session.negotiate_security().await
        {
            let _ = session.close().await;
            self.state = SessionState::Disconnected;
            return Err(e);
        }
        if let Err(e) = session.authenticate(&self.config.login, &self.config.password).await {
            let _ = session.close().await;
            self.state = SessionState::Disconnected;
            return Err(e);
        }
        debug!("session authenticated");

        self.session = Some(session);
        self.state = SessionState::Authenticated;
        Ok(())
    }

    /// Sleeps the retry delay, waking early on cancellation.
    async fn backoff(&self) -> Result<(), DeliveryError> {
        let delay = self.config.retry.delay;
        debug!(delay_secs = delay.as_secs_f64(), "waiting before retry");
        tokio::select! {
            _ = self.cancel.cancelled() => Err(DeliveryError::Interrupted),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    fn check_cancelled(&self) -> Result<(), DeliveryError> {
        if self.cancel.is_cancelled() {
            Err(DeliveryError::Interrupted)
        } else {
            Ok(())
        }
    }

    async fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            let _ = session.close().await;
        }
        if self.state != SessionState::Failed {
            self.state = SessionState::Disconnected;
        }
    }
}

async fn emit(events_tx: &mpsc::Sender<DeliveryEvent>, event: DeliveryEvent) {
    let _ = events_tx.send(event).await;
}

fn join_error(e: tokio::task::JoinError) -> DeliveryError {
    DeliveryError::Io(std::io::Error::other(format!("task join error: {e}")))
}
