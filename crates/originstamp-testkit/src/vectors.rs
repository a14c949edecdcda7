//! Golden test vectors for deterministic verification.
//!
//! Every digest here can be reproduced with an ordinary SHA-256 tool over the
//! `payload` string, e.g. `printf '%s' "$payload" | sha256sum`.

use originstamp_core::{fingerprint, Fingerprint};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Raw title as delivered by the editor.
    pub title: &'static str,
    /// Raw body as delivered by the editor.
    pub body: &'static str,
    /// Expected normalized `title || body`.
    pub payload: &'static str,
    /// Expected digest (hex).
    pub digest: &'static str,
}

impl GoldenVector {
    pub fn fingerprint(&self) -> Fingerprint {
        fingerprint(self.title, self.body)
    }
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "paragraph markup and blank lines",
            title: "Hello  World",
            body: "<p>Line1\n\nLine2</p>",
            payload: "Hello WorldLine1 Line2",
            digest: "5cbefb114555356e119c47966be417fb2bdfd91d99d5a03a4d630f339b4089a2",
        },
        GoldenVector {
            name: "empty content",
            title: "",
            body: "",
            payload: "",
            digest: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        },
        GoldenVector {
            name: "plain title and body",
            title: "Title",
            body: "Body",
            payload: "TitleBody",
            digest: "03763c3730d046c9f46f00741fcacb63796ffc30e375bdddae835f54abd51ad6",
        },
        GoldenVector {
            name: "script element dropped with contents",
            title: "Title",
            body: "<script>alert(1)</script>Body",
            payload: "TitleBody",
            digest: "03763c3730d046c9f46f00741fcacb63796ffc30e375bdddae835f54abd51ad6",
        },
        GoldenVector {
            name: "CRLF and inline markup",
            title: "  Spaced\r\nTitle ",
            body: "a  <b>bold</b>\r\n\r\n text",
            payload: "Spaced Titlea bold text",
            digest: "515393d35fad29e0010cefe43d75563756fa7110d74f7d2ed1a06bd0e1432cf4",
        },
        GoldenVector {
            name: "tabs survive and a spaced < is text",
            title: "Tabs\tkept",
            body: "x < y",
            payload: "Tabs\tkeptx < y",
            digest: "dafa7a89b1688541560456c9fc38b670ccb68537c40657ff101dc31d68443d35",
        },
        GoldenVector {
            name: "non-ASCII text",
            title: "Café naïve",
            body: "",
            payload: "Café naïve",
            digest: "5bb2124689a6329ac8512eec2079b9cf745d0474f9fa9e9e4ee0577a41a3a8c7",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectors_match() {
        for vector in all_vectors() {
            let fp = vector.fingerprint();
            assert_eq!(fp.payload(), vector.payload, "{}", vector.name);
            assert_eq!(fp.digest.to_hex(), vector.digest, "{}", vector.name);
        }
    }
}
