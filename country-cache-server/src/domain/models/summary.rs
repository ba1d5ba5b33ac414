use chrono::{DateTime, Utc};
use serde::Serialize;

/// Placeholder shown in the summary when a country has no estimate.
pub const INDICATOR_UNAVAILABLE: &str = "unavailable";

/// One ranked line of the summary's top list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub rank: usize,
    pub name: String,
    pub indicator: String,
}

/// A single line of text placed on the summary canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub x: u32,
    pub y: u32,
    /// Integer glyph magnification.
    pub scale: u32,
}

/// Fixed-size canvas description handed to a `Renderer`.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryLayout {
    pub width: u32,
    pub height: u32,
    pub lines: Vec<TextLine>,
}

/// The rendered summary of one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryArtifact {
    pub total_count: usize,
    pub generated_at: DateTime<Utc>,
    pub top: Vec<SummaryEntry>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}
