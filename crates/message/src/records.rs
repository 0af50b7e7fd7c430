//! Records describing a file transfer and its packages.

use uuid::Uuid;

/// Identity and integrity data for one file transfer.
///
/// A fresh `file_id` is minted per transfer, so re-sending the same file
/// produces a distinct descriptor. The checksum covers the whole file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub file_id: String,
    pub file_name: String,
    pub total_size: u64,
    pub checksum: String,
}

impl FileDescriptor {
    pub fn new(file_name: impl Into<String>, total_size: u64, checksum: impl Into<String>) -> Self {
        Self {
            file_id: Uuid::new_v4().to_string(),
            file_name: file_name.into(),
            total_size,
            checksum: checksum.into(),
        }
    }
}

/// One package cut from a file.
///
/// Indices are zero-based and contiguous; `size` and `checksum` describe
/// the raw package bytes before any transport encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub index: u32,
    pub size: u64,
    pub checksum: String,
}

/// Trailing record closing a multi-package transfer.
///
/// `package_count` is the number of packages actually emitted, which the
/// receiver compares against the parts it collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryRecord {
    pub package_count: u32,
}
