//! Content normalization and SHA-256 fingerprinting.
//!
//! The digest scheme is fixed: anyone holding a copy of the normalized text
//! must be able to recompute the digest with an ordinary SHA-256 tool.
//!
//! ```text
//! payload = normalize(title) || normalize(body)      (no separator)
//! digest  = SHA-256(payload as UTF-8)
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CoreError, Result};
use crate::types::ContentDigest;

/// Elements whose contents are dropped along with their tags.
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

/// The result of fingerprinting a title/body pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// SHA-256 of `title || body`.
    pub digest: ContentDigest,
    /// Normalized title.
    pub title: String,
    /// Normalized body.
    pub body: String,
}

impl Fingerprint {
    /// The exact string that was hashed.
    pub fn payload(&self) -> String {
        let mut payload = String::with_capacity(self.title.len() + self.body.len());
        payload.push_str(&self.title);
        payload.push_str(&self.body);
        payload
    }
}

/// Fingerprint raw title and body text.
pub fn fingerprint(title: &str, body: &str) -> Fingerprint {
    let title = normalize(title);
    let body = normalize(body);

    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(body.as_bytes());

    Fingerprint {
        digest: ContentDigest(hasher.finalize().into()),
        title,
        body,
    }
}

/// Fingerprint raw bytes, rejecting input that is not UTF-8.
pub fn fingerprint_bytes(title: &[u8], body: &[u8]) -> Result<Fingerprint> {
    let invalid = |e: std::str::Utf8Error| CoreError::InvalidEncoding(e.to_string());
    let title = std::str::from_utf8(title).map_err(invalid)?;
    let body = std::str::from_utf8(body).map_err(invalid)?;
    Ok(fingerprint(title, body))
}

/// SHA-256 of an already-normalized payload.
pub fn digest_payload(payload: &[u8]) -> ContentDigest {
    ContentDigest(Sha256::digest(payload).into())
}

/// Re-hash a downloaded or emailed payload and compare it to a digest.
pub fn verify_payload(payload: &[u8], expected: &ContentDigest) -> bool {
    digest_payload(payload) == *expected
}

/// Normalize authored text for hashing.
///
/// Strips markup, trims, then collapses every run of `\n`, `\r` and spaces
/// into a single space. Tabs survive.
pub fn normalize(text: &str) -> String {
    let without_raw = remove_raw_text_elements(text);
    let stripped = strip_markup(&without_raw);
    collapse_breaks(trim_blank(&stripped))
}

/// Drop `<script>`/`<style>` elements together with their contents.
///
/// An opening tag without a matching close is left for [`strip_markup`].
fn remove_raw_text_elements(input: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let mut out = String::with_capacity(input.len());
    let mut pos = 0;

    while let Some(rel) = lower[pos..].find('<') {
        let start = pos + rel;
        match raw_text_element_end(&lower, start) {
            Some(end) => {
                out.push_str(&input[pos..start]);
                pos = end;
            }
            None => {
                out.push_str(&input[pos..=start]);
                pos = start + 1;
            }
        }
    }

    out.push_str(&input[pos..]);
    out
}

/// End offset (exclusive) of a raw-text element opening at `start`.
fn raw_text_element_end(lower: &str, start: usize) -> Option<usize> {
    let tag = &lower[start + 1..];
    let name = RAW_TEXT_ELEMENTS.iter().find(|name| tag.starts_with(*name))?;

    let after_name = start + 1 + name.len();
    let open_end = after_name + lower[after_name..].find('>')? + 1;
    let close = format!("</{}>", name);
    let close_at = open_end + lower[open_end..].find(&close)?;
    Some(close_at + close.len())
}

/// Remove tags, comments and processing instructions.
///
/// A `<` followed by whitespace is text. An unterminated tag swallows the
/// remainder of the input.
fn strip_markup(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        if matches!(bytes.get(i + 1), Some(b) if b.is_ascii_whitespace()) {
            i += 1;
            continue;
        }

        out.push_str(&input[text_start..i]);
        i = markup_end(input, i).unwrap_or(bytes.len());
        text_start = i;
    }

    out.push_str(&input[text_start..]);
    out
}

/// End offset (exclusive) of the markup starting at `start`.
fn markup_end(input: &str, start: usize) -> Option<usize> {
    if input[start..].starts_with("<!--") {
        let body = start + 4;
        return input[body..].find("-->").map(|rel| body + rel + 3);
    }

    let mut quote: Option<u8> = None;
    for (offset, &b) in input.as_bytes()[start + 1..].iter().enumerate() {
        match (quote, b) {
            (None, b'"' | b'\'') => quote = Some(b),
            (Some(q), _) if q == b => quote = None,
            (None, b'>') => return Some(start + 1 + offset + 1),
            _ => {}
        }
    }
    None
}

fn trim_blank(text: &str) -> &str {
    text.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B'))
}

fn collapse_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if matches!(c, '\n' | '\r' | ' ') {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}
