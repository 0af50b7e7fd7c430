//! Stamps records and payloads into ready-to-send messages.

use crate::compose;
use crate::mime::{Attachment, MailMessage};
use crate::records::{FileDescriptor, PackageRecord, SummaryRecord};

/// Builds the concrete [`MailMessage`] for each record a transfer emits.
///
/// Sender address, charset and the optional free-text trailer are fixed per
/// transfer, so they live here instead of threading through every call.
#[derive(Debug, Clone)]
pub struct MessageAssembler {
    from: String,
    charset: String,
    additional_text: String,
}

impl MessageAssembler {
    pub fn new(from: impl Into<String>, charset: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            charset: charset.into(),
            additional_text: String::new(),
        }
    }

    /// Free text appended to every info body after a separator.
    pub fn with_additional_text(mut self, text: impl Into<String>) -> Self {
        self.additional_text = text.into();
        self
    }

    /// Message carrying a whole file at once.
    pub fn single(&self, descriptor: &FileDescriptor, payload: Vec<u8>) -> MailMessage {
        MailMessage {
            subject: compose::single_subject(&descriptor.file_name),
            from: self.from.clone(),
            body: compose::single_info(descriptor, &self.additional_text),
            charset: self.charset.clone(),
            attachment: Some(Attachment {
                file_name: descriptor.file_name.clone(),
                content: payload,
            }),
        }
    }

    /// Message carrying one package of a split file. The attachment is named
    /// after the file with the zero-padded index as its extension.
    pub fn part(
        &self,
        descriptor: &FileDescriptor,
        package: &PackageRecord,
        payload: Vec<u8>,
    ) -> MailMessage {
        MailMessage {
            subject: compose::part_subject(&descriptor.file_name, package.index),
            from: self.from.clone(),
            body: compose::part_info(descriptor, package, &self.additional_text),
            charset: self.charset.clone(),
            attachment: Some(Attachment {
                file_name: format!("{}.{:03}", descriptor.file_name, package.index),
                content: payload,
            }),
        }
    }

    /// Summary message closing a split transfer. Text only, no attachment.
    pub fn summary(&self, descriptor: &FileDescriptor, summary: &SummaryRecord) -> MailMessage {
        MailMessage {
            subject: compose::summary_subject(&descriptor.file_name),
            from: self.from.clone(),
            body: compose::summary_info(descriptor, summary, &self.additional_text),
            charset: self.charset.clone(),
            attachment: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> FileDescriptor {
        FileDescriptor {
            file_id: "11111111-2222-3333-4444-555555555555".into(),
            file_name: "video.mkv".into(),
            total_size: 1024,
            checksum: "abcdef".into(),
        }
    }

    fn assembler() -> MessageAssembler {
        MessageAssembler::new("me@example.com", "utf-8")
    }

    #[test]
    fn single_carries_whole_file_as_attachment() {
        let message = assembler().single(&descriptor(), vec![1, 2, 3]);
        assert_eq!(message.subject, "[GS_SINGLE][Name: video.mkv]");
        let attachment = message.attachment.unwrap();
        assert_eq!(attachment.file_name, "video.mkv");
        assert_eq!(attachment.content, vec![1, 2, 3]);
    }

    #[test]
    fn part_attachment_extension_is_padded_index() {
        let package = PackageRecord {
            index: 12,
            size: 3,
            checksum: "00".into(),
        };
        let message = assembler().part(&descriptor(), &package, vec![7, 8, 9]);
        assert_eq!(message.subject, "[GS_PART][NAME: video.mkv][012]");
        assert_eq!(message.attachment.unwrap().file_name, "video.mkv.012");
        assert!(message.body.contains("Package Id: 012\n"));
    }

    #[test]
    fn summary_has_count_and_no_attachment() {
        let message = assembler().summary(&descriptor(), &SummaryRecord { package_count: 13 });
        assert_eq!(message.subject, "[GS_SUM][NAME: video.mkv]");
        assert!(message.attachment.is_none());
        assert!(message.body.contains("Num of Packages: 13\n"));
    }

    #[test]
    fn additional_text_reaches_every_body() {
        let assembler = assembler().with_additional_text("hello");
        let single = assembler.single(&descriptor(), vec![]);
        let summary = assembler.summary(&descriptor(), &SummaryRecord { package_count: 2 });
        assert!(single.body.ends_with("hello"));
        assert!(summary.body.ends_with("hello"));
    }
}
