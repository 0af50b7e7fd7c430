//! Assembled messages and their RFC 2822 rendering.

use base64::{Engine, engine::general_purpose::STANDARD};
use uuid::Uuid;

/// Base64 attachment lines are wrapped at this width.
const BASE64_LINE_WIDTH: usize = 76;

/// Binary payload carried by a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// One renderable mail message.
///
/// Recipients travel on the [`Envelope`] only; the rendered header block
/// carries no To, Cc or Bcc line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub subject: String,
    pub from: String,
    pub body: String,
    pub charset: String,
    pub attachment: Option<Attachment>,
}

/// Delivery addressing, handed to the transport next to the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from: String,
    pub recipients: Vec<String>,
}

impl MailMessage {
    /// Renders the full message as wire-ready bytes.
    ///
    /// The output is always multipart/mixed: a text/plain part holding the
    /// info body, plus one base64 application/octet-stream part when an
    /// attachment is present. Date, Message-ID and the part boundary are
    /// generated per call.
    pub fn to_rfc2822(&self) -> Vec<u8> {
        let boundary = format!("={}=", Uuid::new_v4().simple());
        let mut out = Vec::with_capacity(self.wire_size_hint());

        push_line(&mut out, &format!("From: {}", self.from));
        push_line(&mut out, &format!("Subject: {}", self.subject));
        push_line(&mut out, &format!("Date: {}", chrono::Local::now().to_rfc2822()));
        push_line(
            &mut out,
            &format!("Message-ID: <{}@{}>", Uuid::new_v4(), local_host_name()),
        );
        push_line(&mut out, "MIME-Version: 1.0");
        push_line(
            &mut out,
            &format!("Content-Type: multipart/mixed; boundary=\"{boundary}\""),
        );
        push_line(&mut out, "");

        push_line(&mut out, &format!("--{boundary}"));
        push_line(
            &mut out,
            &format!("Content-Type: text/plain; charset={}", self.charset),
        );
        push_line(&mut out, "Content-Transfer-Encoding: 8bit");
        push_line(&mut out, "");
        push_line(&mut out, &self.body.replace('\n', "\r\n"));

        if let Some(attachment) = &self.attachment {
            push_line(&mut out, &format!("--{boundary}"));
            push_line(&mut out, "Content-Type: application/octet-stream");
            push_line(&mut out, "Content-Transfer-Encoding: base64");
            push_line(
                &mut out,
                &format!(
                    "Content-Disposition: attachment; filename=\"{}\"",
                    attachment.file_name
                ),
            );
            push_line(&mut out, "");
            let encoded = STANDARD.encode(&attachment.content);
            for chunk in encoded.as_bytes().chunks(BASE64_LINE_WIDTH) {
                out.extend_from_slice(chunk);
                out.extend_from_slice(b"\r\n");
            }
        }

        push_line(&mut out, &format!("--{boundary}--"));
        out
    }

    /// Rough wire size, used to size buffers and report progress.
    pub fn wire_size_hint(&self) -> usize {
        let attachment = self
            .attachment
            .as_ref()
            // base64 expands by 4/3 plus line breaks
            .map(|a| a.content.len() * 4 / 3 + a.content.len() / BASE64_LINE_WIDTH * 2 + 256)
            .unwrap_or(0);
        self.body.len() + attachment + 512
    }
}

fn push_line(out: &mut Vec<u8>, line: &str) {
    out.extend_from_slice(line.as_bytes());
    out.extend_from_slice(b"\r\n");
}

/// Host part for generated Message-IDs.
fn local_host_name() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "localhost".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_with_attachment(content: Vec<u8>) -> MailMessage {
        MailMessage {
            subject: "[GS_PART][NAME: data.bin][000]".into(),
            from: "sender@example.com".into(),
            body: "File Name: data.bin\nTotal Size: 4\n".into(),
            charset: "utf-8".into(),
            attachment: Some(Attachment {
                file_name: "data.bin.000".into(),
                content,
            }),
        }
    }

    fn rendered_text(message: &MailMessage) -> String {
        String::from_utf8(message.to_rfc2822()).unwrap()
    }

    #[test]
    fn renders_required_headers_and_no_recipients() {
        let text = rendered_text(&message_with_attachment(vec![1, 2, 3, 4]));
        assert!(text.starts_with("From: sender@example.com\r\n"));
        assert!(text.contains("Subject: [GS_PART][NAME: data.bin][000]\r\n"));
        assert!(text.contains("Date: "));
        assert!(text.contains("Message-ID: <"));
        assert!(text.contains("MIME-Version: 1.0\r\n"));
        assert!(text.contains("Content-Type: multipart/mixed; boundary="));
        assert!(!text.contains("\r\nTo:"));
        assert!(!text.contains("\r\nCc:"));
        assert!(!text.contains("\r\nBcc:"));
    }

    #[test]
    fn body_newlines_become_crlf() {
        let text = rendered_text(&message_with_attachment(vec![0]));
        assert!(text.contains("File Name: data.bin\r\nTotal Size: 4\r\n"));
    }

    #[test]
    fn attachment_round_trips_through_base64() {
        let payload: Vec<u8> = (0u16..4096).map(|b| (b % 251) as u8).collect();
        let text = rendered_text(&message_with_attachment(payload.clone()));

        let marker = "Content-Transfer-Encoding: base64";
        let start = text.find(marker).unwrap();
        let encoded_start = text[start..].find("\r\n\r\n").unwrap() + start + 4;
        let encoded_end = text[encoded_start..].find("\r\n--").unwrap() + encoded_start;
        let encoded: String = text[encoded_start..encoded_end]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        assert_eq!(STANDARD.decode(encoded).unwrap(), payload);
    }

    #[test]
    fn base64_lines_stay_within_width() {
        let text = rendered_text(&message_with_attachment(vec![0xAB; 10_000]));
        let marker = "Content-Transfer-Encoding: base64";
        let start = text.find(marker).unwrap();
        for line in text[start..].lines().skip(2) {
            if line.starts_with("--") {
                break;
            }
            assert!(line.len() <= BASE64_LINE_WIDTH, "line too long: {line:?}");
        }
    }

    #[test]
    fn attachment_disposition_names_the_part_file() {
        let text = rendered_text(&message_with_attachment(vec![9]));
        assert!(text.contains("Content-Disposition: attachment; filename=\"data.bin.000\"\r\n"));
    }

    #[test]
    fn message_without_attachment_has_single_text_part() {
        let message = MailMessage {
            subject: "[GS_SUM][NAME: data.bin]".into(),
            from: "sender@example.com".into(),
            body: "File Name: data.bin\n".into(),
            charset: "utf-8".into(),
            attachment: None,
        };
        let text = rendered_text(&message);
        assert!(text.contains("Content-Type: text/plain; charset=utf-8\r\n"));
        assert!(!text.contains("application/octet-stream"));
        assert!(text.trim_end().ends_with("--"));
    }
}
