// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Cheatsheet generation: structured knowledge extracted from study material
//!
//! A document is split into overlapping page windows, each window is sent to
//! the model for extraction, and the per-window results are merged into one
//! deduplicated, sorted cheatsheet.

pub mod extract;
pub mod merge;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::chunker::page_windows;
use crate::ollama::ChatBackend;
use crate::{AppConfig, Result};

pub use extract::{extract_knowledge, parse_extraction, try_extract_knowledge};
pub use merge::merge_results;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub definition: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    #[serde(default)]
    pub subject_a: String,
    #[serde(default)]
    pub subject_b: String,
    #[serde(default)]
    pub difference_or_similarity: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub event: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub explanation: String,
}

/// Knowledge extracted from one chunk, or a merged cheatsheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    #[serde(default)]
    pub definitions: Vec<Definition>,
    #[serde(default)]
    pub comparisons: Vec<Comparison>,
    #[serde(default)]
    pub timelines: Vec<TimelineEntry>,
    #[serde(default)]
    pub concepts: Vec<Concept>,
}

impl Extraction {
    /// Total number of entries across all categories
    pub fn item_count(&self) -> usize {
        self.definitions.len() + self.comparisons.len() + self.timelines.len() + self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }
}

/// Knobs for one cheatsheet run
#[derive(Debug, Clone)]
pub struct CheatsheetOptions {
    pub model: String,
    pub system_prompt: String,
    pub pages_per_chunk: usize,
    pub page_overlap: usize,
}

impl CheatsheetOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.ai_engine.model.clone(),
            system_prompt: config.prompts.cheatsheet.clone(),
            pages_per_chunk: config.cheatsheet.pages_per_chunk,
            page_overlap: config.cheatsheet.page_overlap,
        }
    }
}

/// Outcome of a cheatsheet run
#[derive(Debug, Clone)]
pub struct CheatsheetRun {
    pub extraction: Extraction,
    pub chunk_count: usize,
    pub failed_chunks: usize,
}

/// Run extraction over already-extracted page texts
pub async fn generate_from_pages(
    backend: &dyn ChatBackend,
    options: &CheatsheetOptions,
    pages: &[String],
) -> CheatsheetRun {
    let chunks = page_windows(pages, options.pages_per_chunk, options.page_overlap);
    info!("Total chunks created: {}", chunks.len());

    let mut extracted = Vec::with_capacity(chunks.len());
    let mut failed_chunks = 0;

    for (i, chunk) in chunks.iter().enumerate() {
        info!(
            "Extracting knowledge from chunk {}/{} (pages {}-{})",
            i + 1,
            chunks.len(),
            chunk.start_page,
            chunk.end_page
        );
        match try_extract_knowledge(backend, &options.model, &options.system_prompt, &chunk.text).await {
            Ok(extraction) => extracted.push(extraction),
            Err(e) => {
                warn!("Error extracting knowledge from pages {}-{}: {}", chunk.start_page, chunk.end_page, e);
                failed_chunks += 1;
            }
        }
    }

    info!("Merging and deduplicating results...");
    CheatsheetRun {
        extraction: merge_results(&extracted),
        chunk_count: chunks.len(),
        failed_chunks,
    }
}

/// Extract a cheatsheet from a PDF or notes file
pub async fn generate_cheatsheet(
    backend: &dyn ChatBackend,
    options: &CheatsheetOptions,
    path: &Path,
) -> Result<CheatsheetRun> {
    info!("Reading {:?} and creating chunks...", path);
    let pages = crate::documents::extract_pages(path)?;
    Ok(generate_from_pages(backend, options, &pages).await)
}

/// Write a cheatsheet as pretty-printed JSON
pub fn save(extraction: &Extraction, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(extraction)?;
    std::fs::write(path, json)?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::ScriptedBackend;
    use super::*;

    fn options() -> CheatsheetOptions {
        CheatsheetOptions::from_config(&AppConfig::default())
    }

    #[tokio::test]
    async fn test_pipeline_merges_chunks_and_survives_failures() {
        let backend = ScriptedBackend::new(vec![
            Some(r#"{"definitions": [{"term": "ATP", "definition": "Energy currency"}],
                     "concepts": [{"name": "Glycolysis", "explanation": "Glucose breakdown"}]}"#),
            None,
            Some(r#"{"definitions": [{"term": "ATP ", "definition": "Duplicate"},
                                     {"term": "ADP", "definition": "Spent ATP"}]}"#),
        ]);
        let pages: Vec<String> = (1..=5).map(|i| format!("page {}", i)).collect();

        let run = generate_from_pages(&backend, &options(), &pages).await;

        assert_eq!(run.chunk_count, 3);
        assert_eq!(run.failed_chunks, 1);
        let terms: Vec<_> = run.extraction.definitions.iter().map(|d| d.term.as_str()).collect();
        assert_eq!(terms, vec!["ADP", "ATP"]);
        assert_eq!(run.extraction.definitions[1].definition, "Energy currency");
        assert_eq!(run.extraction.concepts.len(), 1);

        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[0].1.starts_with("Analyze this text and extract knowledge:"));
        assert!(prompts[0].1.contains("page 1\npage 2\npage 3"));
    }

    #[tokio::test]
    async fn test_empty_document_produces_empty_cheatsheet() {
        let backend = ScriptedBackend::new(vec![]);
        let run = generate_from_pages(&backend, &options(), &[]).await;
        assert_eq!(run.chunk_count, 0);
        assert!(run.extraction.is_empty());
    }

    #[tokio::test]
    async fn test_generate_from_text_file_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("history.txt");
        std::fs::write(&notes, "The Treaty of Versailles was signed in 1919.").unwrap();

        let backend = ScriptedBackend::new(vec![Some(
            r#"{"timelines": [{"date": "1919", "event": "Treaty of Versailles signed"}]}"#,
        )]);
        let run = generate_cheatsheet(&backend, &options(), &notes).await.unwrap();
        assert_eq!(run.extraction.timelines.len(), 1);

        let out = dir.path().join("output.json");
        save(&run.extraction, &out).unwrap();
        let reloaded: Extraction =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(reloaded, run.extraction);
    }
}
