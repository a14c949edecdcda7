//! Proptest generators for property-based testing.

use proptest::prelude::*;

use originstamp_core::{ContentDigest, EditEvent};

/// Generate a random ContentDigest.
pub fn content_digest() -> impl Strategy<Value = ContentDigest> {
    any::<[u8; 32]>().prop_map(ContentDigest::from_bytes)
}

/// Plain words and the whitespace an editor produces.
pub fn plain_text() -> impl Strategy<Value = String> {
    "([A-Za-z0-9]{1,8}|[ \\t\\n\\r]{1,3}){0,24}".prop_map(String::from)
}

/// Text interleaved with inline tags, comments and raw-text elements.
pub fn markup_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            "[A-Za-z0-9]{1,8}".prop_map(String::from),
            "[ \\n\\r]{1,3}".prop_map(String::from),
            Just("<p>".to_string()),
            Just("</p>".to_string()),
            Just("<b>".to_string()),
            Just("</b>".to_string()),
            Just("<br/>".to_string()),
            Just("<a href=\"x>y\">".to_string()),
            Just("<!-- note -->".to_string()),
            Just("<script>var a = 1;</script>".to_string()),
            Just("<style>p { color: red }</style>".to_string()),
        ],
        0..24,
    )
    .prop_map(|parts| parts.concat())
}

/// A regular (non-revision) save with markup in title and body.
pub fn edit_event() -> impl Strategy<Value = EditEvent> {
    ("[0-9]{1,4}", plain_text(), markup_text())
        .prop_map(|(id, title, body)| EditEvent::new(id, title, body))
}

/// Two distinct plain strings.
pub fn distinct_texts() -> impl Strategy<Value = (String, String)> {
    ("[a-z]{1,16}", "[a-z]{1,16}").prop_filter("texts must differ", |(a, b)| a != b)
}
