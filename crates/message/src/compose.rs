//! Subject tags and info bodies.
//!
//! Every message subject starts with a bracket tag that tells the receiver
//! what the message carries, followed by the file name and, for parts, the
//! zero-padded package index. The plain-text body repeats the file metadata
//! line by line so a human can read it and a script can parse it.

use crate::records::{FileDescriptor, PackageRecord, SummaryRecord};

/// Subject tag for a file that fits in one message.
pub const TAG_SINGLE: &str = "[GS_SINGLE]";
/// Subject tag for one package of a split file.
pub const TAG_PART: &str = "[GS_PART]";
/// Subject tag for the summary closing a split transfer.
pub const TAG_SUMMARY: &str = "[GS_SUM]";

/// Width of the dashed line separating body sections.
pub const SEPARATOR_WIDTH: usize = 100;

// Single subjects use `Name:` where parts and summaries use `NAME:`.
// Receivers match on the exact casing, so both spellings are load-bearing.
pub(crate) const SINGLE_PREFIX: &str = "[GS_SINGLE][Name: ";
pub(crate) const PART_PREFIX: &str = "[GS_PART][NAME: ";
pub(crate) const SUMMARY_PREFIX: &str = "[GS_SUM][NAME: ";

pub fn single_subject(file_name: &str) -> String {
    format!("{SINGLE_PREFIX}{file_name}]")
}

pub fn part_subject(file_name: &str, index: u32) -> String {
    format!("{PART_PREFIX}{file_name}][{index:03}]")
}

pub fn summary_subject(file_name: &str) -> String {
    format!("{SUMMARY_PREFIX}{file_name}]")
}

/// Body for a single-message transfer.
pub fn single_info(descriptor: &FileDescriptor, additional_text: &str) -> String {
    compose_info(descriptor, None, None, additional_text)
}

/// Body for one package of a split transfer.
pub fn part_info(
    descriptor: &FileDescriptor,
    package: &PackageRecord,
    additional_text: &str,
) -> String {
    compose_info(descriptor, None, Some(package), additional_text)
}

/// Body for the summary message.
pub fn summary_info(
    descriptor: &FileDescriptor,
    summary: &SummaryRecord,
    additional_text: &str,
) -> String {
    compose_info(descriptor, Some(summary.package_count), None, additional_text)
}

pub(crate) fn separator_line() -> String {
    "-".repeat(SEPARATOR_WIDTH)
}

/// Renders the info body. Line order is fixed: file fields first, then an
/// optional package section, then optional free text, each extra section
/// introduced by a dashed separator.
fn compose_info(
    descriptor: &FileDescriptor,
    package_count: Option<u32>,
    package: Option<&PackageRecord>,
    additional_text: &str,
) -> String {
    let mut info = String::new();
    info.push_str(&format!("File Name: {}\n", descriptor.file_name));
    info.push_str(&format!("Total Size: {}\n", descriptor.total_size));
    info.push_str(&format!("FID: {}\n", descriptor.file_id));
    if let Some(count) = package_count {
        info.push_str(&format!("Num of Packages: {count}\n"));
    }
    info.push_str(&format!("Md5sum: {}\n", descriptor.checksum));
    if let Some(package) = package {
        info.push_str(&separator_line());
        info.push('\n');
        info.push_str(&format!("Package Id: {:03}\n", package.index));
        info.push_str(&format!("Package Size: {}\n", package.size));
        info.push_str(&format!("Package Md5sum: {}\n", package.checksum));
    }
    if !additional_text.is_empty() {
        info.push_str(&separator_line());
        info.push('\n');
        info.push_str(additional_text);
    }
    info
}
