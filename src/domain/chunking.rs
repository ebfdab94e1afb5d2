//! Character-window text splitting.
//!
//! Text is cut into units on a separator (every char is a unit when the
//! separator is empty). Units are packed greedily into windows of at most
//! `chunk_size` chars, and each window after the first re-reads the trailing
//! `chunk_overlap` chars of its predecessor. All positions are char offsets
//! into the original text, so every chunk is an exact substring.

use serde::{Deserialize, Serialize};

use crate::domain::{errors::DomainError, Chunk, Document, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub separator: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            separator: "\n".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingConfig {
    pub fn new(separator: impl Into<String>, chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            separator: separator.into(),
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(DomainError::invalid_config("chunk_size must be greater than 0"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(DomainError::invalid_config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Half-open range of char positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

#[derive(Debug, Clone)]
pub struct TextChunker {
    config: ChunkingConfig,
}

impl TextChunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Window positions for `text`, in order.
    pub fn spans(&self, text: &str) -> Vec<Span> {
        let bounds = char_bounds(text);
        let units = split_units(text, &self.config.separator, &bounds);
        pack_windows(&units, self.config.chunk_size, self.config.chunk_overlap)
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let bounds = char_bounds(text);
        self.spans(text)
            .into_iter()
            .map(|span| text[bounds[span.start]..bounds[span.end]].to_string())
            .collect()
    }

    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let text = document.text.as_str();
        let bounds = char_bounds(text);
        self.spans(text)
            .into_iter()
            .enumerate()
            .map(|(index, span)| {
                Chunk::new(
                    document.id.as_str(),
                    &text[bounds[span.start]..bounds[span.end]],
                    span.start,
                    index,
                )
            })
            .collect()
    }
}

/// Splits `text` into chunks attributed to `document_id`.
pub fn chunk_text(document_id: &str, text: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    let chunker = TextChunker::new(config.clone())?;
    Ok(chunker.chunk(&Document::new(document_id, text)))
}

/// Byte offset of every char, plus the total length as a sentinel.
fn char_bounds(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .collect()
}

fn split_units(text: &str, separator: &str, bounds: &[usize]) -> Vec<Span> {
    let char_count = bounds.len() - 1;
    if separator.is_empty() {
        return (0..char_count)
            .map(|i| Span { start: i, end: i + 1 })
            .collect();
    }

    // match_indices only yields char boundaries, so the lookup is exact.
    let char_at = |byte: usize| bounds.partition_point(|&b| b < byte);

    let mut units = Vec::new();
    let mut from = 0;
    for (at, _) in text.match_indices(separator) {
        units.push(Span {
            start: char_at(from),
            end: char_at(at),
        });
        from = at + separator.len();
    }
    units.push(Span {
        start: char_at(from),
        end: char_count,
    });

    units.retain(|unit| !unit.is_empty());
    units
}

fn pack_windows(units: &[Span], size: usize, overlap: usize) -> Vec<Span> {
    let Some(text_end) = units.last().map(|unit| unit.end) else {
        return Vec::new();
    };

    let mut windows: Vec<Span> = Vec::new();
    let mut next = 0;

    while next < units.len() {
        let fresh = units[next];

        if fresh.len() > size {
            windows.push(fresh);
            next += 1;
            continue;
        }

        let start = match windows.last() {
            Some(prev) if overlap > 0 => prev.end.saturating_sub(overlap).max(prev.start),
            _ => fresh.start,
        };

        let (start, end) = if text_end - fresh.start <= size {
            // The remaining text fits one more window of fresh content.
            next = units.len();
            (start, text_end)
        } else {
            // Overlap gives way before a non-final window outgrows `size`.
            let start = start.max(fresh.end.saturating_sub(size));
            let mut end = fresh.end;
            next += 1;
            while next < units.len() && units[next].end - start <= size {
                end = units[next].end;
                next += 1;
            }
            (start, end)
        };

        windows.push(Span { start, end });
    }

    windows
}
