//! Wire format for sending files as tagged email messages.
//!
//! A file travels either as one `[GS_SINGLE]` message or as a run of
//! `[GS_PART]` messages closed by a `[GS_SUM]` summary. Each message pairs
//! a human-readable info body with an optional base64 attachment.
//!
//! # Message layout
//!
//! ```text
//! Subject: [GS_PART][NAME: backup.tar.gz][003]
//!
//! File Name: backup.tar.gz
//! Total Size: 12582912
//! FID: 8a2f66e4-7cbe-4bfa-9d51-0123456789ab
//! Md5sum: 9e107d9d372bb6826bd81d3542a419d6
//! ----------------------------------------------------------------- (100 dashes)
//! Package Id: 003
//! Package Size: 5242880
//! Package Md5sum: e4d909c290d0fb1ca068ffaddf22cbd0
//! ```
//!
//! Receivers group messages by subject tag and file name, verify each
//! package against its `Package Md5sum`, and the reassembled file against
//! the whole-file `Md5sum`.

pub mod assemble;
pub mod compose;
pub mod mime;
pub mod parse;
pub mod records;

pub use assemble::MessageAssembler;
pub use mime::{Attachment, Envelope, MailMessage};
pub use parse::{FileInfo, ParseError, SubjectTag, parse_info, parse_subject};
pub use records::{FileDescriptor, PackageRecord, SummaryRecord};
