//! Boundary-aware text chunking.
//!
//! Splits document text into overlapping segments, preferring
//! paragraph boundaries, then sentence boundaries, then word
//! boundaries. All sizes are measured in **characters**, not bytes,
//! and every slice falls on a char boundary, so multi-byte UTF-8
//! input never panics.
//!
//! Adjacent chunks share context: when a chunk is emitted, the
//! trailing `overlap` characters seed the next chunk's buffer. A
//! chunk may therefore exceed `target_size` by up to the overlap
//! plus separator; `max_size`, when set, is a hard cap enforced in
//! a final pass.

use once_cell::sync::Lazy;
use regex::Regex;

static EXCESS_NEWLINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("static regex must compile"));

/// Boundary-aware chunker.
///
/// Pure and deterministic: identical input always yields identical
/// chunks, in emission order.
#[derive(Debug, Clone)]
pub struct Chunker {
    /// Target characters per chunk
    target_size: usize,

    /// Characters carried over from the end of one chunk into the
    /// start of the next
    overlap: usize,

    /// Minimum chunk length; only the final chunk of a document may
    /// fall below it
    min_size: usize,

    /// Hard upper bound on chunk length, if set
    max_size: Option<usize>,
}

impl Chunker {
    /// Create a chunker with the given target size and overlap.
    ///
    /// # Panics
    ///
    /// Panics if `target_size` is 0 or if `overlap >= target_size`;
    /// both are configuration errors caught by `Config::validate`
    /// before a chunker is ever built from user input.
    pub fn new(target_size: usize, overlap: usize) -> Self {
        assert!(target_size > 0, "target_size must be > 0");
        assert!(overlap < target_size, "overlap must be < target_size");

        Self {
            target_size,
            overlap,
            min_size: 1,
            max_size: None,
        }
    }

    /// Set the minimum chunk size.
    #[must_use]
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size.max(1);
        self
    }

    /// Set a hard maximum chunk size.
    #[must_use]
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size.max(1));
        self
    }

    /// Get the target chunk size in characters.
    pub fn target_size(&self) -> usize {
        self.target_size
    }

    /// Get the overlap size in characters.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk text into overlapping, boundary-aware segments.
    ///
    /// Empty or whitespace-only input yields an empty vector, not an
    /// error. No emitted chunk is empty or whitespace-only, and no
    /// split ever lands inside a word.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let normalized = normalize_whitespace(text);
        if normalized.is_empty() {
            return Vec::new();
        }

        let mut chunks: Vec<String> = Vec::new();
        // Accumulation buffer; starts each chunk with the carried
        // overlap of the previous one.
        let mut buf = String::new();
        // True once buf holds content beyond the carried overlap.
        let mut has_content = false;

        for para in normalized.split("\n\n") {
            let para = para.trim();
            if para.is_empty() {
                continue;
            }

            if char_len(para) > self.target_size {
                // Oversized paragraph: flush what we have, then fall
                // back to sentence (and word) boundaries within it.
                self.emit(&mut chunks, &mut buf, &mut has_content);
                self.split_oversized_paragraph(para, &mut chunks, &mut buf, &mut has_content);
                continue;
            }

            if !self.fits(&buf, para, 2) {
                self.emit(&mut chunks, &mut buf, &mut has_content);
            }
            push_part(&mut buf, para, "\n\n");
            has_content = true;
        }

        self.emit(&mut chunks, &mut buf, &mut has_content);

        let chunks = self.merge_undersized(chunks);
        let chunks = match self.max_size {
            Some(max) => self.enforce_max_size(chunks, max),
            None => chunks,
        };

        chunks
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Whether `part` still fits the buffer within `target_size`,
    /// accounting for a separator of `sep_len` characters.
    fn fits(&self, buf: &str, part: &str, sep_len: usize) -> bool {
        if buf.is_empty() {
            return char_len(part) <= self.target_size;
        }
        char_len(buf) + sep_len + char_len(part) <= self.target_size
    }

    /// Emit the buffer as a chunk and reseed it with the trailing
    /// overlap. A buffer holding nothing beyond carried overlap is
    /// not emitted (it would duplicate the previous chunk's tail).
    fn emit(&self, chunks: &mut Vec<String>, buf: &mut String, has_content: &mut bool) {
        if !*has_content {
            return;
        }
        let emitted = std::mem::take(buf);
        let emitted = emitted.trim().to_string();
        if emitted.is_empty() {
            *has_content = false;
            return;
        }
        let carry = tail_on_word_boundary(&emitted, self.overlap);
        chunks.push(emitted);
        *buf = carry;
        *has_content = false;
    }

    /// Sentence-boundary splitting for a paragraph that exceeds
    /// `target_size`, with word-boundary fallback for sentences that
    /// are themselves oversized. The paragraph's remainder is flushed
    /// so the following paragraph starts from a fresh (overlap-seeded)
    /// buffer.
    fn split_oversized_paragraph(
        &self,
        para: &str,
        chunks: &mut Vec<String>,
        buf: &mut String,
        has_content: &mut bool,
    ) {
        for sentence in split_sentences(para) {
            if char_len(&sentence) > self.target_size {
                // Oversized sentence: word-boundary fallback.
                for word in sentence.split_whitespace() {
                    if !self.fits(buf, word, 1) {
                        self.emit(chunks, buf, has_content);
                    }
                    push_part(buf, word, " ");
                    *has_content = true;
                }
                continue;
            }

            if !self.fits(buf, &sentence, 1) {
                self.emit(chunks, buf, has_content);
            }
            push_part(buf, &sentence, " ");
            *has_content = true;
        }
        self.emit(chunks, buf, has_content);
    }

    /// Merge non-final chunks smaller than `min_size` into their
    /// successor. The final chunk is allowed to be short.
    fn merge_undersized(&self, chunks: Vec<String>) -> Vec<String> {
        if self.min_size <= 1 || chunks.len() < 2 {
            return chunks;
        }
        let mut merged: Vec<String> = Vec::with_capacity(chunks.len());
        let mut pending: Option<String> = None;
        let last = chunks.len() - 1;
        for (i, chunk) in chunks.into_iter().enumerate() {
            let chunk = match pending.take() {
                Some(prefix) => format!("{prefix} {chunk}"),
                None => chunk,
            };
            if i < last && char_len(&chunk) < self.min_size {
                pending = Some(chunk);
            } else {
                merged.push(chunk);
            }
        }
        if let Some(rest) = pending {
            merged.push(rest);
        }
        merged
    }

    /// Hard-split any chunk exceeding `max_size`, preferring word
    /// boundaries within the window and stepping back by `overlap`.
    fn enforce_max_size(&self, chunks: Vec<String>, max: usize) -> Vec<String> {
        let mut out = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            if char_len(&chunk) <= max {
                out.push(chunk);
                continue;
            }
            let chars: Vec<char> = chunk.chars().collect();
            let mut start = 0usize;
            while start < chars.len() {
                let window_end = (start + max).min(chars.len());
                let end = if window_end == chars.len() {
                    window_end
                } else {
                    // Prefer the last whitespace in the window so the
                    // split does not land inside a word.
                    match chars[start..window_end]
                        .iter()
                        .rposition(|c| c.is_whitespace())
                    {
                        Some(rel) if rel > 0 => start + rel,
                        _ => window_end,
                    }
                };
                let piece: String = chars[start..end].iter().collect();
                let piece = piece.trim().to_string();
                if !piece.is_empty() {
                    out.push(piece);
                }
                if end == chars.len() {
                    break;
                }
                // Step back for overlap, always advancing by at least
                // one character to guarantee termination.
                start = end.saturating_sub(self.overlap).max(start + 1);
            }
        }
        out
    }
}

/// Collapse runs of 3+ newlines to a paragraph break and trim.
fn normalize_whitespace(text: &str) -> String {
    EXCESS_NEWLINES.replace_all(text, "\n\n").trim().to_string()
}

/// Character count (not byte count).
fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Append `part` to `buf` with `sep` between existing content.
fn push_part(buf: &mut String, part: &str, sep: &str) {
    if !buf.is_empty() {
        buf.push_str(sep);
    }
    buf.push_str(part);
}

/// Last `n` characters of `s`, adjusted forward to the next word
/// boundary so a carried overlap never begins mid-word. Returns an
/// empty string when no boundary exists inside the tail.
fn tail_on_word_boundary(s: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= n {
        return s.trim().to_string();
    }
    let mut start = chars.len() - n;
    // If the cut lands inside a word, advance past it.
    if !chars[start - 1].is_whitespace() && !chars[start].is_whitespace() {
        match chars[start..].iter().position(|c| c.is_whitespace()) {
            Some(rel) => start += rel,
            None => return String::new(),
        }
    }
    chars[start..].iter().collect::<String>().trim().to_string()
}

/// Split on sentence boundaries: one or more of `. ! ?` followed by
/// whitespace (or end of text). Keeps terminators with their
/// sentence.
fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start_byte = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        if matches!(chars[i].1, '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len() && matches!(chars[j].1, '.' | '!' | '?') {
                j += 1;
            }
            if j >= chars.len() || chars[j].1.is_whitespace() {
                let end_byte = if j < chars.len() { chars[j].0 } else { text.len() };
                let sentence = text[start_byte..end_byte].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                while j < chars.len() && chars[j].1.is_whitespace() {
                    j += 1;
                }
                start_byte = if j < chars.len() { chars[j].0 } else { text.len() };
            }
            i = j;
        } else {
            i += 1;
        }
    }

    let rest = text[start_byte..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}
