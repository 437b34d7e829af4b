// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Sliding-window chunking of page texts and word streams
//!
//! A local 8B model has a small context window, so documents are fed to it in
//! overlapping slices. Cheatsheets slice by page, quizzes slice by word.

use serde::Serialize;

/// A window of consecutive pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageChunk {
    /// Pages joined with newlines
    pub text: String,
    /// First page, 1-based
    pub start_page: usize,
    /// Last page, 1-based, inclusive
    pub end_page: usize,
}

/// Split pages into overlapping windows of `pages_per_chunk` pages.
pub fn page_windows<S: AsRef<str>>(
    pages: &[S],
    pages_per_chunk: usize,
    overlap: usize,
) -> Vec<PageChunk> {
    let total = pages.len();
    let size = pages_per_chunk.max(1);
    let step = size.saturating_sub(overlap).max(1);

    (0..total)
        .step_by(step)
        .map(|start| {
            let end = (start + size).min(total);
            let text = pages[start..end]
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join("\n");
            PageChunk {
                text,
                start_page: start + 1,
                end_page: end,
            }
        })
        .collect()
}

/// Split text into chunks of `words_per_chunk` whitespace-separated words.
///
/// Consecutive chunks share `overlap` words. Chunking stops at the first
/// window that reaches the end of the text.
pub fn word_chunks(text: &str, words_per_chunk: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let size = words_per_chunk.max(1);
    let step = size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();

    let mut start = 0;
    while start < words.len() {
        let end = (start + size).min(words.len());
        chunks.push(words[start..end].join(" "));
        if start + size >= words.len() {
            break;
        }
        start += step;
    }

    chunks
}
