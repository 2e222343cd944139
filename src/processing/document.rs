//! Document structures for one ranking pass

use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// A named file as handed to the ranker, before any processing.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// A resume that was extracted and normalized successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub name: String,
    pub bytes: Vec<u8>,
    pub extracted_text: String,
    pub normalized_text: String,
}

impl Document {
    /// Leading `max_chars` characters of the extracted text plus the original bytes.
    pub fn preview(&self, max_chars: usize, score: Option<f32>) -> DocumentPreview {
        let (text_prefix, truncated) = truncate_graphemes(&self.extracted_text, max_chars);
        DocumentPreview {
            name: self.name.clone(),
            score,
            text_prefix,
            truncated,
            pdf_bytes: self.bytes.clone(),
        }
    }
}

/// A resume excluded from the ranking, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPreview {
    pub name: String,
    pub score: Option<f32>,
    pub text_prefix: String,
    pub truncated: bool,
    #[serde(skip)]
    pub pdf_bytes: Vec<u8>,
}

/// Collapse uploads to one entry per name. A repeated name takes the later
/// upload's bytes but keeps the position where the name first appeared.
pub fn dedupe_uploads(uploads: Vec<Upload>) -> IndexMap<String, Vec<u8>> {
    let mut by_name = IndexMap::with_capacity(uploads.len());
    for upload in uploads {
        if by_name.insert(upload.name.clone(), upload.bytes).is_some() {
            warn!("Duplicate upload name '{}': keeping the later file", upload.name);
        }
    }
    by_name
}

/// Cut `text` after `max_chars` grapheme clusters. Returns the prefix and
/// whether anything was removed.
pub fn truncate_graphemes(text: &str, max_chars: usize) -> (String, bool) {
    match text.grapheme_indices(true).nth(max_chars) {
        Some((byte_index, _)) => (text[..byte_index].to_string(), true),
        None => (text.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_keeps_later_bytes_at_first_position() {
        let uploads = vec![
            Upload::new("alice.pdf", b"first".to_vec()),
            Upload::new("bob.pdf", b"bob".to_vec()),
            Upload::new("alice.pdf", b"second".to_vec()),
        ];

        let deduped = dedupe_uploads(uploads);
        assert_eq!(deduped.len(), 2);

        let names: Vec<&str> = deduped.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["alice.pdf", "bob.pdf"]);
        assert_eq!(deduped["alice.pdf"], b"second".to_vec());
    }

    #[test]
    fn test_truncate_graphemes() {
        assert_eq!(truncate_graphemes("short", 10), ("short".to_string(), false));
        assert_eq!(truncate_graphemes("exactly", 7), ("exactly".to_string(), false));
        assert_eq!(truncate_graphemes("résumé text", 6), ("résumé".to_string(), true));
        assert_eq!(truncate_graphemes("anything", 0), (String::new(), true));
        assert_eq!(truncate_graphemes("", 0), (String::new(), false));
    }

    #[test]
    fn test_preview() {
        let document = Document {
            name: "alice.pdf".to_string(),
            bytes: b"%PDF".to_vec(),
            extracted_text: "Alice Smith\nBackend Engineer".to_string(),
            normalized_text: "alice smith backend engineer".to_string(),
        };

        let preview = document.preview(11, Some(0.5));
        assert_eq!(preview.text_prefix, "Alice Smith");
        assert!(preview.truncated);
        assert_eq!(preview.pdf_bytes, b"%PDF".to_vec());
    }
}
