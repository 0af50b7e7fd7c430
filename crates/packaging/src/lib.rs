//! Cuts files into checksummed packages sized for mail transfer.
//!
//! A file below the package limit becomes one [`PackageUnit::Single`];
//! anything else becomes a run of [`PackageUnit::Part`]s closed by a
//! [`PackageUnit::Summary`]. Package payloads are read lazily, one package
//! in memory at a time.

mod checksum;
mod stream;

pub use checksum::{calculate_file_checksum, checksum_bytes};
pub use stream::{PackageStream, PackageUnit};

/// Bytes per mebibyte; package limits are configured in MiB.
pub const MEGABYTE: u64 = 1024 * 1024;

/// Default maximum package size: 5 MiB.
///
/// Larger packages mean fewer messages, but the base64 transport encoding
/// adds a third on top, and mail providers reject oversized messages
/// outright instead of truncating them.
pub const DEFAULT_PACKAGE_SIZE: u64 = 5 * MEGABYTE;

/// Errors produced by the packaging crate.
#[derive(Debug, thiserror::Error)]
pub enum PackagingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a regular file: {0}")]
    NotAFile(String),

    #[error("refusing to send empty file: {0}")]
    EmptyFile(String),
}
