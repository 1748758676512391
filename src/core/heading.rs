//! Section heading detection and chunk annotation.
//!
//! Headings give retrieval hits human-readable provenance ("found
//! under *Incident Reporting*"). Detection is line-based with three
//! rules: numbered prefixes ("2.1 Incident Reporting"), short lines
//! ending in a colon, and short ALL-CAPS lines. All offsets are
//! character offsets into the source text, matching `Chunk` spans.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

// Accepts both "2.1 Title" and the dot-terminated "1. Title" form.
static NUMBERED_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)*\.?\s+").expect("static regex must compile"));

/// Source-text span and heading for one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSpan {
    /// Character offset where the chunk starts in the source text
    pub char_start: usize,
    /// Character offset where the chunk ends
    pub char_end: usize,
    /// Heading in effect at `char_start`, if any
    pub heading: Option<String>,
}

/// Whether a line reads as a section heading.
///
/// Rules:
/// - numbered prefix: `1. Leave Policy`, `2.1 Incident Reporting`
/// - ends with `:` and shorter than 120 characters
/// - ALL CAPS (ASCII letters and spaces only) and shorter than 80
pub fn is_heading(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return false;
    }

    if NUMBERED_PREFIX.is_match(line) {
        return true;
    }

    if line.ends_with(':') && line.chars().count() < 120 {
        return true;
    }

    line.chars().count() < 80
        && line.chars().any(|c| c.is_ascii_uppercase())
        && line.chars().all(|c| c.is_ascii_uppercase() || c.is_whitespace())
}

/// Strip the numbering prefix and trailing colon from a heading line.
fn clean_heading(line: &str) -> String {
    let line = line.trim();
    let cleaned = NUMBERED_PREFIX.replace(line, "");
    let cleaned = cleaned.trim().trim_end_matches(':').trim();
    if cleaned.is_empty() {
        line.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Map each line-start character offset to the heading in effect
/// there. A heading stays in effect until the next one appears.
pub fn extract_headings(text: &str) -> BTreeMap<usize, Option<String>> {
    let mut map = BTreeMap::new();
    let mut current: Option<String> = None;
    let mut char_pos = 0usize;

    for line in text.split('\n') {
        if is_heading(line) {
            current = Some(clean_heading(line));
        }
        map.insert(char_pos, current.clone());
        // +1 for the newline separator
        char_pos += line.chars().count() + 1;
    }

    map
}

/// Heading in effect at `position`: the entry at the closest line
/// start at or before it.
pub fn find_heading_for_position(
    headings: &BTreeMap<usize, Option<String>>,
    position: usize,
) -> Option<String> {
    headings
        .range(..=position)
        .next_back()
        .and_then(|(_, heading)| heading.clone())
}

/// Locate each chunk in the source text and attach its span and
/// heading.
///
/// Chunks are searched for in order, each from just past the previous
/// chunk's start, so overlapping chunks resolve to advancing
/// positions. A chunk whose text was rewritten during chunking (joined
/// sentences, carried overlap) may not appear verbatim; its span then
/// falls back to the current search position.
pub fn annotate_chunks(text: &str, chunks: &[String]) -> Vec<ChunkSpan> {
    let headings = extract_headings(text);
    let mut spans = Vec::with_capacity(chunks.len());
    let mut search_byte = 0usize;

    for chunk in chunks {
        let start_byte = text
            .get(search_byte..)
            .and_then(|rest| rest.find(chunk.as_str()))
            .map(|rel| search_byte + rel)
            .unwrap_or_else(|| search_byte.min(text.len()));

        let char_start = text[..start_byte].chars().count();
        let char_end = char_start + chunk.chars().count();

        // Advance one character past this chunk's start for the next
        // search, so a later overlapping chunk is still found.
        search_byte = start_byte
            + text[start_byte..]
                .chars()
                .next()
                .map_or(0, |c| c.len_utf8());

        spans.push(ChunkSpan {
            char_start,
            char_end,
            heading: find_heading_for_position(&headings, char_start),
        });
    }

    spans
}
