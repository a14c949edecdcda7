//! Confirmation and diagnostic email.
//!
//! The confirmation message is the author's proof artifact: it carries the
//! exact normalized payload, so the digest can be recomputed from the email
//! alone with any SHA-256 tool.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use originstamp_core::Fingerprint;

use crate::error::{ClientError, Result};

const INSTRUCTIONS: &str =
    "Please store this Email. You need to hash following value with a SHA256:\n\n";
const START_BANNER: &str = "================ START TEXT =================\n";
const END_BANNER: &str = "\n================ END TEXT ===================";
const FAILURE_PREFIX: &str = "Sorry, we had some issues posting your data to OriginStamp:\n";

/// Subject of the diagnostic email sent when submission fails.
pub const FAILURE_SUBJECT: &str = "Originstamp: Error.";

/// A file attached to an [`Email`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub content: String,
}

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<Attachment>,
}

/// The confirmation sent after every stamped save.
pub fn confirmation_email(to: &str, fingerprint: &Fingerprint) -> Email {
    let digest = fingerprint.digest.to_hex();
    let payload = fingerprint.payload();

    let mut body = String::with_capacity(
        INSTRUCTIONS.len() + START_BANNER.len() + payload.len() + END_BANNER.len(),
    );
    body.push_str(INSTRUCTIONS);
    body.push_str(START_BANNER);
    body.push_str(&payload);
    body.push_str(END_BANNER);

    Email {
        to: to.to_string(),
        subject: format!("OriginStamp {}", digest),
        body,
        attachment: Some(Attachment {
            filename: format!("{}.txt", digest),
            content: payload,
        }),
    }
}

/// The diagnostic sent when the remote submission failed.
pub fn failure_email(to: &str, error: &ClientError) -> Email {
    Email {
        to: to.to_string(),
        subject: FAILURE_SUBJECT.to_string(),
        body: format!("{}{}", FAILURE_PREFIX, error),
        attachment: None,
    }
}

/// Outbound mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<()>;
}

/// Drops RFC 5322 messages into a pickup directory for the local MTA.
///
/// Each message is written to a `.tmp` file first and renamed into place, so
/// a pickup agent never sees a partial file.
pub struct SpoolMailer {
    dir: PathBuf,
    from: String,
    seq: AtomicU64,
}

impl SpoolMailer {
    pub fn new(dir: impl Into<PathBuf>, from: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            from: from.into(),
            seq: AtomicU64::new(0),
        }
    }

    /// The pickup directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Render `email` as a MIME message with CRLF line endings.
    pub fn render(&self, email: &Email, boundary: &str) -> Result<String> {
        let from = header_value("From", &self.from)?;
        let to = header_value("To", &email.to)?;
        let subject = header_value("Subject", &email.subject)?;

        let mut out = String::new();
        out.push_str(&format!("From: {}\r\n", from));
        out.push_str(&format!("To: {}\r\n", to));
        out.push_str(&format!("Subject: {}\r\n", subject));
        out.push_str(&format!("Date: {}\r\n", chrono::Utc::now().to_rfc2822()));
        out.push_str("MIME-Version: 1.0\r\n");

        match &email.attachment {
            None => {
                out.push_str("Content-Type: text/plain; charset=utf-8\r\n");
                out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
                out.push_str(&base64_lines(crlf(&email.body).as_bytes()));
            }
            Some(attachment) => {
                let filename = header_value("filename", &attachment.filename)?;
                out.push_str(&format!(
                    "Content-Type: multipart/mixed; boundary=\"{}\"\r\n\r\n",
                    boundary
                ));

                out.push_str(&format!("--{}\r\n", boundary));
                out.push_str("Content-Type: text/plain; charset=utf-8\r\n");
                out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
                out.push_str(&base64_lines(crlf(&email.body).as_bytes()));

                out.push_str(&format!("--{}\r\n", boundary));
                out.push_str("Content-Type: text/plain; charset=utf-8\r\n");
                out.push_str("Content-Transfer-Encoding: base64\r\n");
                out.push_str(&format!(
                    "Content-Disposition: attachment; filename=\"{}\"\r\n\r\n",
                    filename
                ));
                // The attachment is the proof text: encoded as-is, no line ending rewrite.
                out.push_str(&base64_lines(attachment.content.as_bytes()));

                out.push_str(&format!("--{}--\r\n", boundary));
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl Mailer for SpoolMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        let millis = chrono::Utc::now().timestamp_millis();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let stem = format!("{}-{:06}", millis, seq);
        let message = self.render(email, &format!("=_originstamp_{}", stem))?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = self.dir.join(format!("{}.tmp", stem));
        let path = self.dir.join(format!("{}.eml", stem));
        tokio::fs::write(&tmp, message.as_bytes()).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(to = %email.to, path = %path.display(), "Spooled email");
        Ok(())
    }
}

/// Header values must not contain line breaks.
fn header_value<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    if value.contains(['\r', '\n']) {
        return Err(ClientError::Mail(format!("line break in {} header", name)));
    }
    Ok(value)
}

/// Base64 in 76-character CRLF-terminated lines (RFC 2045).
fn base64_lines(bytes: &[u8]) -> String {
    let encoded = BASE64.encode(bytes);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / 38 + 2);
    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(76));
        out.push_str(line);
        out.push_str("\r\n");
        rest = tail;
    }
    out
}

fn crlf(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

/// In-memory mailer for tests.
pub mod memory {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Mutex;

    /// Records every message it is asked to send.
    #[derive(Default)]
    pub struct MemoryMailer {
        sent: Mutex<Vec<Email>>,
        fail: AtomicBool,
    }

    impl MemoryMailer {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent `send` fail.
        pub fn fail_sends(&self) {
            self.fail.store(true, Ordering::SeqCst);
        }

        /// Messages sent so far, in order.
        pub fn sent(&self) -> Vec<Email> {
            self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
        }
    }

    #[async_trait]
    impl Mailer for MemoryMailer {
        async fn send(&self, email: &Email) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ClientError::Mail("mailer unavailable".into()));
            }
            self.sent
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(email.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use originstamp_core::{fingerprint, verify_payload};

    #[test]
    fn test_confirmation_email_layout() {
        let fp = fingerprint("Hello  World", "<p>Line1\n\nLine2</p>");
        let email = confirmation_email("author@example.org", &fp);

        assert_eq!(
            email.subject,
            "OriginStamp 5cbefb114555356e119c47966be417fb2bdfd91d99d5a03a4d630f339b4089a2"
        );
        assert_eq!(
            email.body,
            "Please store this Email. You need to hash following value with a SHA256:\n\n\
             ================ START TEXT =================\n\
             Hello WorldLine1 Line2\n\
             ================ END TEXT ==================="
        );
        let attachment = email.attachment.unwrap();
        assert_eq!(
            attachment.filename,
            "5cbefb114555356e119c47966be417fb2bdfd91d99d5a03a4d630f339b4089a2.txt"
        );
        assert_eq!(attachment.content, "Hello WorldLine1 Line2");
    }

    #[test]
    fn test_failure_email_layout() {
        let email = failure_email("a@example.org", &ClientError::Remote("refused".into()));
        assert_eq!(email.subject, "Originstamp: Error.");
        assert_eq!(
            email.body,
            "Sorry, we had some issues posting your data to OriginStamp:\n\
             request to timestamp service failed: refused"
        );
        assert!(email.attachment.is_none());
    }

    /// Decode the base64 part that follows `marker` up to the next boundary.
    fn decode_part(message: &str, marker: &str, boundary: &str) -> Vec<u8> {
        let start = message.find(marker).unwrap() + marker.len();
        let end = start + message[start..].find(&format!("--{}", boundary)).unwrap();
        let encoded: String = message[start..end].split("\r\n").collect();
        BASE64.decode(encoded).unwrap()
    }

    #[test]
    fn test_render_multipart() {
        let mailer = SpoolMailer::new("/unused", "originstamp@localhost");
        let email = confirmation_email("author@example.org", &fingerprint("T", "B"));
        let filename = &email.attachment.as_ref().unwrap().filename;
        let message = mailer.render(&email, "BOUNDARY").unwrap();

        let headers = "From: originstamp@localhost\r\nTo: author@example.org\r\n";
        let content_type = "Content-Type: multipart/mixed; boundary=\"BOUNDARY\"\r\n";
        assert!(message.starts_with(headers));
        assert!(message.contains(content_type));
        assert!(message.ends_with("--BOUNDARY--\r\n"));
        assert!(!message.replace("\r\n", "").contains('\n'));

        let encoding = "Content-Transfer-Encoding: base64\r\n\r\n";
        let body = decode_part(&message, encoding, "BOUNDARY");
        let body = String::from_utf8(body).unwrap();
        let framed = "================ START TEXT =================\r\nTB\r\n";
        assert!(body.contains(framed));

        let attachment = decode_part(
            &message,
            &format!("filename=\"{}\"\r\n\r\n", filename),
            "BOUNDARY",
        );
        assert_eq!(attachment, b"TB");
    }

    #[test]
    fn test_long_payload_survives_line_limits() {
        let body: String = (0..400).map(|i| format!("w{} ", i % 10)).collect();
        let fp = fingerprint("Long", &body);
        assert!(fp.payload().len() > 1000);

        let mailer = SpoolMailer::new("/unused", "originstamp@localhost");
        let email = confirmation_email("author@example.org", &fp);
        let message = mailer.render(&email, "BOUNDARY").unwrap();

        let longest = message.split("\r\n").map(str::len).max().unwrap();
        assert!(longest <= 998, "longest line is {} octets", longest);

        let filename = &email.attachment.as_ref().unwrap().filename;
        let attachment = decode_part(
            &message,
            &format!("filename=\"{}\"\r\n\r\n", filename),
            "BOUNDARY",
        );
        assert!(verify_payload(&attachment, &fp.digest));
        assert_eq!(attachment, fp.payload().into_bytes());
    }

    #[test]
    fn test_render_rejects_header_injection() {
        let mailer = SpoolMailer::new("/unused", "originstamp@localhost");
        let mut email = failure_email("a@example.org", &ClientError::Mail("x".into()));
        email.to = "a@example.org\r\nBcc: victim@example.org".into();
        assert!(matches!(
            mailer.render(&email, "B"),
            Err(ClientError::Mail(_))
        ));
    }

    #[tokio::test]
    async fn test_spool_writes_eml_files() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = SpoolMailer::new(dir.path().join("spool"), "originstamp@localhost");
        let email = confirmation_email("author@example.org", &fingerprint("T", "B"));

        mailer.send(&email).await.unwrap();
        mailer.send(&email).await.unwrap();

        let mut names: Vec<String> = std::fs::read_dir(mailer.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| n.ends_with(".eml")));
        assert_ne!(names[0], names[1]);
    }

    #[tokio::test]
    async fn test_memory_mailer_records_and_fails() {
        let mailer = memory::MemoryMailer::new();
        let email = failure_email("a@example.org", &ClientError::Remote("x".into()));
        mailer.send(&email).await.unwrap();
        assert_eq!(mailer.sent(), vec![email.clone()]);

        mailer.fail_sends();
        assert!(mailer.send(&email).await.is_err());
        assert_eq!(mailer.sent().len(), 1);
    }
}
