//! Boundary-aware text chunker.
//!
//! Splits text into bounded, optionally overlapping segments that end at
//! natural boundaries. Sizes and overlaps are measured in characters
//! (Unicode scalar values), never bytes, so a chunk boundary can never fall
//! inside a multi-byte character.
//!
//! # Algorithm
//!
//! 1. If the text fits in `chunk_size` characters, return it trimmed as a
//!    single chunk.
//! 2. Otherwise emit the window `[start, start + chunk_size)`, pulling its
//!    end back to a breakpoint. The search scans backward from the window
//!    end, never past the window midpoint:
//!    - a sentence terminator (`.`, `!`, `?`) followed by whitespace or the
//!      end of text (the terminator stays in the chunk);
//!    - failing that, any whitespace;
//!    - failing that, a hard cut at the window end.
//! 3. Advance `start` to `end - chunk_overlap`, or to `start + 1` if that
//!    would not move forward. Stop once a window reaches the end of text.
//! 4. Trim every chunk and drop the empty ones.
//!
//! [`Chunker::chunk_by_paragraph`] first splits on blank lines and chunks
//! each paragraph independently, so overlap never crosses a paragraph.
//!
//! # Example
//!
//! ```rust
//! use ragkb_core::chunk::{ChunkOptions, Chunker};
//!
//! let chunker = Chunker::new(ChunkOptions { chunk_size: 500, chunk_overlap: 50 });
//! let chunks = chunker.chunk_by_paragraph("Hello world.\n\nSecond paragraph.");
//! assert_eq!(chunks, vec!["Hello world.", "Second paragraph."]);
//! ```

/// Chunk size used when none (or zero) is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 500;
/// Overlap used together with [`DEFAULT_CHUNK_SIZE`].
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Chunk sizing, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks of one paragraph.
    pub chunk_overlap: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Splits text into chunks for independent embedding. Pure and stateless
/// apart from its options.
#[derive(Debug, Clone)]
pub struct Chunker {
    opts: ChunkOptions,
}

impl Chunker {
    /// A zero `chunk_size` falls back to [`ChunkOptions::default`].
    pub fn new(opts: ChunkOptions) -> Self {
        let opts = if opts.chunk_size == 0 {
            ChunkOptions::default()
        } else {
            opts
        };
        Self { opts }
    }

    pub fn options(&self) -> ChunkOptions {
        self.opts
    }

    /// Split `text` into overlapping chunks.
    ///
    /// # Guarantees
    ///
    /// - Text of at most `chunk_size` characters yields exactly one chunk,
    ///   the trimmed input.
    /// - No chunk is longer than `chunk_size` characters.
    /// - Consecutive windows overlap (or touch), so no character outside
    ///   trimmed whitespace is lost.
    /// - At most one chunk per character of input, whatever the overlap.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let size = self.opts.chunk_size;
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();

        if len <= size {
            return vec![text.trim().to_string()];
        }

        // Byte offset of every char position, plus the end of text, for slicing.
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();

        let mut chunks = Vec::new();
        let mut start = 0usize;

        while start < len {
            let target = start + size;
            let end = if target >= len {
                len
            } else {
                self.find_breakpoint(&chars, start, target)
            };

            let piece = text[offsets[start]..offsets[end]].trim();
            if !piece.is_empty() {
                chunks.push(piece.to_string());
            }

            if end == len {
                break;
            }

            let next = end.saturating_sub(self.opts.chunk_overlap);
            start = if next <= start { start + 1 } else { next };
        }

        chunks
    }

    /// Split on blank lines, then [`chunk`](Self::chunk) each non-empty
    /// paragraph. Chunks from different paragraphs never share text.
    pub fn chunk_by_paragraph(&self, text: &str) -> Vec<String> {
        split_paragraphs(text)
            .into_iter()
            .flat_map(|para| self.chunk(para))
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Choose the end (exclusive, in chars) of the window starting at
    /// `start` whose hard limit is `target`.
    fn find_breakpoint(&self, chars: &[char], start: usize, target: usize) -> usize {
        let floor = start + self.opts.chunk_size / 2;

        for i in (floor + 1..target).rev() {
            if matches!(chars[i], '.' | '!' | '?')
                && chars.get(i + 1).map_or(true, |c| c.is_whitespace())
            {
                return i + 1;
            }
        }

        for i in (floor + 1..target).rev() {
            if chars[i].is_whitespace() {
                return i;
            }
        }

        target
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(ChunkOptions::default())
    }
}

/// Split text into trimmed, non-empty paragraphs separated by blank lines
/// (lines that are empty or whitespace-only).
fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut paragraphs = Vec::new();
    let mut para_start: Option<usize> = None;
    let mut offset = 0usize;

    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            if let Some(s) = para_start.take() {
                paragraphs.push(&text[s..offset]);
            }
        } else if para_start.is_none() {
            para_start = Some(offset);
        }
        offset += line.len();
    }
    if let Some(s) = para_start {
        paragraphs.push(&text[s..]);
    }

    paragraphs
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}
