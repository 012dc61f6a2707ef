//! Chart documents
//!
//! Chart text with an optional YAML front-matter block:
//!
//! ```text
//! ---
//! title: Twinkle Twinkle Little Star
//! difficulty: beginner
//! bpm: 120
//! ---
//! C4:0:400,C4:500:400,G4:1000:400
//! ```
//!
//! Line breaks in the note text are treated like commas, so long charts can
//! be split across lines; a comma at the end of a line is allowed.

use crate::beat::{MAX_BPM, MIN_BPM};
use crate::chart::{parse_chart, ScheduledNote};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ChartMetadata {
    pub title: Option<String>,
    pub difficulty: Option<String>,
    /// Suggested metronome tempo
    pub bpm: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDocument {
    pub metadata: ChartMetadata,
    pub notes: Vec<ScheduledNote>,
}

impl ChartDocument {
    /// Parse a chart document.
    ///
    /// # Example
    /// ```
    /// use keyfall_engine::ChartDocument;
    ///
    /// let doc = ChartDocument::parse("---\ntitle: Scale\nbpm: 100\n---\nC4:0:400,D4:500:400\n")?;
    /// assert_eq!(doc.metadata.title.as_deref(), Some("Scale"));
    /// assert_eq!(doc.metadata.bpm, Some(100));
    /// assert_eq!(doc.notes.len(), 2);
    /// # Ok::<(), keyfall_engine::EngineError>(())
    /// ```
    ///
    /// # Errors
    /// [`EngineError::MetadataError`] for bad front matter, [`EngineError::ParseError`]
    /// for bad note text.
    pub fn parse(source: &str) -> Result<Self, EngineError> {
        let (front_matter, body) = extract_metadata(source);

        let metadata = match front_matter {
            Some(content) if !content.trim().is_empty() => parse_metadata(&content)?,
            _ => ChartMetadata::default(),
        };

        let note_text = body
            .lines()
            .map(|line| line.trim().trim_end_matches(','))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(",");

        Ok(Self {
            metadata,
            notes: parse_chart(&note_text)?,
        })
    }

    /// Display title, falling back to `fallback` (usually the file name)
    pub fn title_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.metadata.title.as_deref().unwrap_or(fallback)
    }
}

fn parse_metadata(content: &str) -> Result<ChartMetadata, EngineError> {
    let metadata: ChartMetadata =
        serde_yaml::from_str(content).map_err(|e| EngineError::MetadataError(e.to_string()))?;

    if let Some(bpm) = metadata.bpm {
        if !(MIN_BPM..=MAX_BPM).contains(&bpm) {
            return Err(EngineError::MetadataError(format!(
                "bpm {} is outside {}-{}",
                bpm, MIN_BPM, MAX_BPM
            )));
        }
    }
    Ok(metadata)
}

/// Split a document into its front-matter content and the remaining text.
///
/// Only a block opened on the first non-blank line counts as front matter.
fn extract_metadata(source: &str) -> (Option<String>, String) {
    let lines: Vec<&str> = source.lines().collect();

    let Some(start) = lines.iter().position(|line| !line.trim().is_empty()) else {
        return (None, String::new());
    };
    if lines[start].trim() != "---" {
        return (None, source.to_string());
    }

    match lines[start + 1..].iter().position(|line| line.trim() == "---") {
        Some(offset) => {
            let end = start + 1 + offset;
            let metadata = lines[start + 1..end].join("\n");
            let remaining = lines[end + 1..].join("\n");
            (Some(metadata), remaining)
        }
        None => (None, source.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_chart_has_default_metadata() {
        let doc = ChartDocument::parse("C4:0:400,E4:500:400").unwrap();
        assert_eq!(doc.metadata, ChartMetadata::default());
        assert_eq!(doc.notes.len(), 2);
        assert_eq!(doc.title_or("untitled"), "untitled");
    }

    #[test]
    fn test_front_matter_fields() {
        let source = r#"---
title: Happy Birthday
difficulty: beginner
bpm: 100
---
C4:0:300,C4:400:300,
D4:800:600
"#;
        let doc = ChartDocument::parse(source).unwrap();
        assert_eq!(doc.title_or("x"), "Happy Birthday");
        assert_eq!(doc.metadata.difficulty.as_deref(), Some("beginner"));
        assert_eq!(doc.metadata.bpm, Some(100));
        assert_eq!(doc.notes.len(), 3);
        assert_eq!(doc.notes[2].onset_ms, 800);
    }

    #[test]
    fn test_multiline_body_joins_lines() {
        let doc = ChartDocument::parse("C4:0:400\nD4:500:400\n\nE4:1000:400\n").unwrap();
        let ids: Vec<usize> = doc.notes.iter().map(|n| n.id).collect();
        assert_eq!(ids, [0, 1, 2]);
    }

    #[test]
    fn test_bad_yaml_is_metadata_error() {
        let err = ChartDocument::parse("---\ntitle: [oops\n---\nC4:0:400").unwrap_err();
        assert!(matches!(err, EngineError::MetadataError(_)));
    }

    #[test]
    fn test_out_of_range_bpm_is_metadata_error() {
        let err = ChartDocument::parse("---\nbpm: 30\n---\nC4:0:400").unwrap_err();
        assert!(matches!(err, EngineError::MetadataError(_)));
    }

    #[test]
    fn test_bad_notes_is_parse_error() {
        let err = ChartDocument::parse("---\ntitle: t\n---\nC4:0:400,H4:500:400").unwrap_err();
        assert!(matches!(err, EngineError::ParseError { note: 2, .. }));
    }

    #[test]
    fn test_empty_front_matter() {
        let doc = ChartDocument::parse("---\n---\nC4:0:400").unwrap();
        assert_eq!(doc.metadata, ChartMetadata::default());
        assert_eq!(doc.notes.len(), 1);
    }

    #[test]
    fn test_unclosed_front_matter_is_note_text() {
        assert!(ChartDocument::parse("---\ntitle: t\nC4:0:400").is_err());
    }

    #[test]
    fn test_empty_document() {
        let doc = ChartDocument::parse("   \n").unwrap();
        assert!(doc.notes.is_empty());
    }
}
