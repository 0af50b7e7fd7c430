//! Reply parsing and command framing for the SMTP dialogue.
//!
//! Commands are single CRLF-terminated lines. Replies carry a three digit
//! status code on every line; a dash after the code marks a continuation
//! and a space marks the final line:
//!
//! ```text
//! S: 220 mail.example.com ESMTP ready
//! C: EHLO workstation
//! S: 250-mail.example.com
//! S: 250-STARTTLS
//! S: 250 AUTH PLAIN LOGIN
//! ```

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::SmtpError;

/// One complete server reply: the status code and the text of each line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl Reply {
    /// 2xx and 3xx replies mean the server took the command.
    pub fn is_positive(&self) -> bool {
        (200..400).contains(&self.code)
    }

    /// 4xx replies are temporary conditions worth repeating later.
    pub fn is_transient(&self) -> bool {
        (400..500).contains(&self.code)
    }

    /// 5xx replies are final; repeating the command will not help.
    pub fn is_permanent(&self) -> bool {
        (500..600).contains(&self.code)
    }

    /// Code and text flattened onto one line for error messages.
    pub fn text(&self) -> String {
        format!("{} {}", self.code, self.lines.join(" "))
    }
}

/// Reads one reply, following continuation lines until the final one.
pub async fn read_reply<R>(reader: &mut R) -> Result<Reply, SmtpError>
where
    R: AsyncBufRead + Unpin,
{
    let mut code = None;
    let mut lines = Vec::new();

    loop {
        let mut raw = String::new();
        let read = reader.read_line(&mut raw).await?;
        if read == 0 {
            return Err(SmtpError::Protocol("connection closed mid-reply".into()));
        }
        let line = raw.trim_end_matches(['\r', '\n']);

        let Some(digits) = line.get(..3) else {
            return Err(SmtpError::Protocol(format!("reply line too short: {line:?}")));
        };
        let parsed: u16 = digits
            .parse()
            .map_err(|_| SmtpError::Protocol(format!("bad status code: {line:?}")))?;
        match code {
            None => code = Some(parsed),
            Some(first) if first != parsed => {
                return Err(SmtpError::Protocol(format!(
                    "status code changed mid-reply: {first} then {parsed}"
                )));
            }
            Some(_) => {}
        }

        lines.push(line.get(4..).unwrap_or_default().to_string());
        if line.as_bytes().get(3) != Some(&b'-') {
            break;
        }
    }

    match code {
        Some(code) => Ok(Reply { code, lines }),
        None => Err(SmtpError::Protocol("empty reply".into())),
    }
}

/// Writes one command line and flushes it out.
pub async fn write_command<W>(writer: &mut W, command: &str) -> Result<(), SmtpError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(command.as_bytes()).await?;
    writer.write_all(b"\r\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Prepares message bytes for the DATA phase.
///
/// Doubles any dot that opens a line so the server cannot mistake it for
/// the end marker, makes sure the data finishes on a CRLF, then appends
/// the lone-dot terminator.
pub fn dot_stuff(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 8);
    let mut at_line_start = true;
    for &byte in data {
        if at_line_start && byte == b'.' {
            out.push(b'.');
        }
        out.push(byte);
        at_line_start = byte == b'\n';
    }
    if !out.ends_with(b"\r\n") {
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b".\r\n");
    out
}

// ---------------------------------------------------------------------------
