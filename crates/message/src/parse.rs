//! Receiver-side parsing of subjects and info bodies.
//!
//! The inverse of [`compose`](crate::compose): given the subject line and the
//! plain-text part of a message, recover the records needed to regroup and
//! verify packages.

use crate::compose::{PART_PREFIX, SEPARATOR_WIDTH, SINGLE_PREFIX, SUMMARY_PREFIX};
use crate::records::PackageRecord;

/// What a subject line says the message carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectTag {
    Single { file_name: String },
    Part { file_name: String, index: u32 },
    Summary { file_name: String },
}

impl SubjectTag {
    pub fn file_name(&self) -> &str {
        match self {
            SubjectTag::Single { file_name }
            | SubjectTag::Part { file_name, .. }
            | SubjectTag::Summary { file_name } => file_name,
        }
    }
}

/// Classifies a subject line.
///
/// Returns `None` for anything that is not a transfer message, so callers
/// can run this over a whole mailbox.
pub fn parse_subject(subject: &str) -> Option<SubjectTag> {
    if let Some(rest) = subject.strip_prefix(SINGLE_PREFIX) {
        let file_name = rest.strip_suffix(']')?;
        return Some(SubjectTag::Single {
            file_name: file_name.to_string(),
        });
    }
    if let Some(rest) = subject.strip_prefix(PART_PREFIX) {
        let rest = rest.strip_suffix(']')?;
        // The index is the last bracket group; the file name may itself
        // contain brackets.
        let (file_name, index) = rest.rsplit_once("][")?;
        let index = index.parse().ok()?;
        return Some(SubjectTag::Part {
            file_name: file_name.to_string(),
            index,
        });
    }
    if let Some(rest) = subject.strip_prefix(SUMMARY_PREFIX) {
        let file_name = rest.strip_suffix(']')?;
        return Some(SubjectTag::Summary {
            file_name: file_name.to_string(),
        });
    }
    None
}

/// Fields recovered from an info body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub file_name: String,
    pub total_size: u64,
    pub file_id: String,
    pub checksum: String,
    pub package_count: Option<u32>,
    pub package: Option<PackageRecord>,
    pub additional_text: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

fn is_separator(line: &str) -> bool {
    line.len() == SEPARATOR_WIDTH && line.bytes().all(|b| b == b'-')
}

fn parse_number<T: std::str::FromStr>(
    field: &'static str,
    value: &str,
) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue {
        field,
        value: value.to_string(),
    })
}

/// Parses an info body back into its fields.
///
/// Field lines are read until a separator that does not introduce the
/// package section; everything after that separator is free text.
pub fn parse_info(body: &str) -> Result<FileInfo, ParseError> {
    let mut file_name = None;
    let mut total_size = None;
    let mut file_id = None;
    let mut checksum = None;
    let mut package_count = None;
    let mut package_index = None;
    let mut package_size = None;
    let mut package_checksum = None;
    let mut additional_text = String::new();

    let mut lines = body.lines().peekable();
    while let Some(line) = lines.next() {
        if is_separator(line) {
            match lines.peek() {
                Some(next) if next.starts_with("Package Id: ") => continue,
                _ => {
                    additional_text = lines.collect::<Vec<_>>().join("\n");
                    break;
                }
            }
        }
        if let Some(value) = line.strip_prefix("File Name: ") {
            file_name = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("Total Size: ") {
            total_size = Some(parse_number("Total Size", value)?);
        } else if let Some(value) = line.strip_prefix("FID: ") {
            file_id = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("Num of Packages: ") {
            package_count = Some(parse_number("Num of Packages", value)?);
        } else if let Some(value) = line.strip_prefix("Package Id: ") {
            package_index = Some(parse_number("Package Id", value)?);
        } else if let Some(value) = line.strip_prefix("Package Size: ") {
            package_size = Some(parse_number("Package Size", value)?);
        } else if let Some(value) = line.strip_prefix("Package Md5sum: ") {
            package_checksum = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("Md5sum: ") {
            checksum = Some(value.to_string());
        }
    }

    let package = match (package_index, package_size, package_checksum) {
        (None, None, None) => None,
        (Some(index), Some(size), Some(checksum)) => Some(PackageRecord {
            index,
            size,
            checksum,
        }),
        (None, ..) => return Err(ParseError::MissingField("Package Id")),
        (_, None, _) => return Err(ParseError::MissingField("Package Size")),
        (_, _, None) => return Err(ParseError::MissingField("Package Md5sum")),
    };

    Ok(FileInfo {
        file_name: file_name.ok_or(ParseError::MissingField("File Name"))?,
        total_size: total_size.ok_or(ParseError::MissingField("Total Size"))?,
        file_id: file_id.ok_or(ParseError::MissingField("FID"))?,
        checksum: checksum.ok_or(ParseError::MissingField("Md5sum"))?,
        package_count,
        package,
        additional_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose;
    use crate::records::{FileDescriptor, SummaryRecord};

    fn descriptor() -> FileDescriptor {
        FileDescriptor {
            file_id: "fid-1234".into(),
            file_name: "notes.txt".into(),
            total_size: 42,
            checksum: "c0ffee".into(),
        }
    }

    #[test]
    fn subject_round_trips_for_all_tags() {
        assert_eq!(
            parse_subject(&compose::single_subject("notes.txt")),
            Some(SubjectTag::Single {
                file_name: "notes.txt".into()
            })
        );
        assert_eq!(
            parse_subject(&compose::part_subject("notes.txt", 42)),
            Some(SubjectTag::Part {
                file_name: "notes.txt".into(),
                index: 42
            })
        );
        assert_eq!(
            parse_subject(&compose::summary_subject("notes.txt")),
            Some(SubjectTag::Summary {
                file_name: "notes.txt".into()
            })
        );
    }

    #[test]
    fn part_subject_with_brackets_in_name_parses() {
        let subject = compose::part_subject("odd][name.bin", 3);
        assert_eq!(
            parse_subject(&subject),
            Some(SubjectTag::Part {
                file_name: "odd][name.bin".into(),
                index: 3
            })
        );
    }

    #[test]
    fn foreign_subjects_are_ignored() {
        assert_eq!(parse_subject("Re: lunch?"), None);
        assert_eq!(parse_subject("[GS_PART][NAME: x]"), None);
        assert_eq!(parse_subject("[GS_PART][NAME: x][abc]"), None);
    }

    #[test]
    fn single_body_round_trips() {
        let body = compose::single_info(&descriptor(), "");
        let info = parse_info(&body).unwrap();
        assert_eq!(info.file_name, "notes.txt");
        assert_eq!(info.total_size, 42);
        assert_eq!(info.file_id, "fid-1234");
        assert_eq!(info.checksum, "c0ffee");
        assert_eq!(info.package_count, None);
        assert_eq!(info.package, None);
        assert_eq!(info.additional_text, "");
    }

    #[test]
    fn part_body_round_trips_with_package_record() {
        let package = PackageRecord {
            index: 5,
            size: 1000,
            checksum: "beef".into(),
        };
        let body = compose::part_info(&descriptor(), &package, "trailing note");
        let info = parse_info(&body).unwrap();
        assert_eq!(info.package, Some(package));
        assert_eq!(info.additional_text, "trailing note");
    }

    #[test]
    fn summary_body_round_trips_with_count() {
        let body = compose::summary_info(&descriptor(), &SummaryRecord { package_count: 9 }, "");
        let info = parse_info(&body).unwrap();
        assert_eq!(info.package_count, Some(9));
        assert_eq!(info.package, None);
    }

    #[test]
    fn free_text_after_single_body_is_not_a_package_section() {
        let body = compose::single_info(&descriptor(), "hello\nworld");
        let info = parse_info(&body).unwrap();
        assert_eq!(info.additional_text, "hello\nworld");
        assert_eq!(info.package, None);
    }

    #[test]
    fn missing_checksum_is_reported() {
        let body = "File Name: x\nTotal Size: 1\nFID: f\n";
        assert_eq!(parse_info(body), Err(ParseError::MissingField("Md5sum")));
    }

    #[test]
    fn bad_number_is_reported_with_value() {
        let body = "File Name: x\nTotal Size: twelve\nFID: f\nMd5sum: m\n";
        assert_eq!(
            parse_info(body),
            Err(ParseError::InvalidValue {
                field: "Total Size",
                value: "twelve".into()
            })
        );
    }
}
