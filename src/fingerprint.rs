//! Response fingerprinting
//!
//! A fingerprint is the comparable signal used to decide whether two HTTP
//! responses serve the same content: the text of the first `<title>` element
//! and the exact byte length of the body. The baseline and every candidate
//! probe extract fingerprints with the same logic, so comparison is
//! field-for-field.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

/// Which fingerprint field(s) matched the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    Title,
    BodyLength,
    Both,
}

impl std::fmt::Display for MatchField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchField::Title => f.write_str("title"),
            MatchField::BodyLength => f.write_str("body length"),
            MatchField::Both => f.write_str("title + body length"),
        }
    }
}

/// Comparable response fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Text of the first `<title>` element, if the body has one
    pub title: Option<String>,

    /// Exact byte length of the response body
    pub body_len: usize,
}

impl Fingerprint {
    /// Extract a fingerprint from a raw response body.
    ///
    /// The byte length is taken from the raw bytes; title extraction works
    /// on a lossy UTF-8 view so a body with stray bytes still fingerprints.
    pub fn from_bytes(body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        Self {
            title: extract_title(&text),
            body_len: body.len(),
        }
    }

    /// Compare this fingerprint against a baseline, field for field.
    ///
    /// The title field participates only when the baseline has a non-empty
    /// title; a title-less baseline falls back to body length alone.
    pub fn matches(&self, baseline: &Fingerprint) -> Option<MatchField> {
        let title_match = baseline.title.is_some() && self.title == baseline.title;
        let length_match = self.body_len == baseline.body_len;

        match (title_match, length_match) {
            (true, true) => Some(MatchField::Both),
            (true, false) => Some(MatchField::Title),
            (false, true) => Some(MatchField::BodyLength),
            (false, false) => None,
        }
    }
}

/// Text of the first `<title>` element, trimmed. Empty or absent titles
/// normalize to `None` so they never participate in comparison.
fn extract_title(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse("title").ok()?;

    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();

    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}
