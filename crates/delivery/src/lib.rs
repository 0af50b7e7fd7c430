//! Delivery engine for file transfers over mail.
//!
//! This crate implements the **sending logic** only: it walks a
//! [`PackageStream`](mailpack_packaging::PackageStream), assembles each
//! unit into a message and submits it over an abstract [`MailTransport`].
//! The SMTP crate provides the real transport; tests use mocks.
//!
//! # Guarantees
//!
//! - Messages of a file go out strictly in stream order, summary last.
//! - Each message gets a bounded number of attempts with a fixed delay
//!   between them; a stale session is reopened without burning an attempt.
//! - Once a message is given up on, the rest of its file is dropped, so a
//!   receiver never sees later packages of a file with a hole in it.

pub mod engine;
pub mod error;
pub mod transport;
pub mod types;

pub use engine::DeliveryEngine;
pub use error::DeliveryError;
pub use transport::{MailSession, MailTransport, TransportFuture};
pub use types::{
    DeliveryConfig, DeliveryEvent, FileReport, RetryConfig, RunReport, SessionState,
};
