// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Per-chunk knowledge extraction

use serde_json::{Map, Value};
use tracing::warn;

use super::{Comparison, Concept, Definition, Extraction, TimelineEntry};
use crate::ollama::{json_payload, ChatBackend};
use crate::{LuminaraError, Result};

pub const SYSTEM_PROMPT: &str = "\
You are an expert knowledge extractor. Your task is to analyze the provided text from a document and extract structured information into JSON format.

Extract the following categories:
1. \"definitions\": A list of objects with \"term\" and \"definition\".
2. \"comparisons\": A list of objects with \"subject_a\", \"subject_b\", and \"difference_or_similarity\".
3. \"timelines\": A list of objects with \"date\" and \"event\".
4. \"concepts\": A list of objects with \"name\" and \"explanation\".

Rules:
- Output strictly valid JSON.
- If a category has no data, return an empty list for it.
- Be concise and accurate.
- Do not make up information.
";

pub fn user_message(chunk: &str) -> String {
    format!("Analyze this text and extract knowledge:\n\n{}", chunk)
}

/// Parse model output into an [`Extraction`].
///
/// Missing categories become empty lists, missing fields become empty
/// strings, and scalar values are stringified (models like to emit years as
/// numbers). Entries that are not objects are dropped.
pub fn parse_extraction(raw: &str) -> Result<Extraction> {
    let value: Value = serde_json::from_str(json_payload(raw))?;
    let Value::Object(root) = value else {
        return Err(LuminaraError::ModelOutput(
            "expected a JSON object with knowledge categories".to_string(),
        ));
    };

    let items = |key: &str| category_items(&root, key);

    Ok(Extraction {
        definitions: items("definitions")
            .into_iter()
            .map(|o| Definition {
                term: text_field(o, "term"),
                definition: text_field(o, "definition"),
            })
            .collect(),
        comparisons: items("comparisons")
            .into_iter()
            .map(|o| Comparison {
                subject_a: text_field(o, "subject_a"),
                subject_b: text_field(o, "subject_b"),
                difference_or_similarity: text_field(o, "difference_or_similarity"),
            })
            .collect(),
        timelines: items("timelines")
            .into_iter()
            .map(|o| TimelineEntry {
                date: text_field(o, "date"),
                event: text_field(o, "event"),
            })
            .collect(),
        concepts: items("concepts")
            .into_iter()
            .map(|o| Concept {
                name: text_field(o, "name"),
                explanation: text_field(o, "explanation"),
            })
            .collect(),
    })
}

fn category_items<'a>(root: &'a Map<String, Value>, key: &str) -> Vec<&'a Map<String, Value>> {
    root.get(key)
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default()
}

fn text_field(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Ask the model for the knowledge in one chunk
pub async fn try_extract_knowledge(
    backend: &dyn ChatBackend,
    model: &str,
    system_prompt: &str,
    chunk: &str,
) -> Result<Extraction> {
    let raw = backend.chat_json(model, system_prompt, &user_message(chunk)).await?;
    parse_extraction(&raw)
}

/// Like [`try_extract_knowledge`] but degrades to an empty extraction
pub async fn extract_knowledge(
    backend: &dyn ChatBackend,
    model: &str,
    system_prompt: &str,
    chunk: &str,
) -> Extraction {
    match try_extract_knowledge(backend, model, system_prompt, chunk).await {
        Ok(extraction) => extraction,
        Err(e) => {
            warn!("Error extracting knowledge: {}", e);
            Extraction::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cheatsheet::test_support::ScriptedBackend;

    #[test]
    fn test_parse_full_extraction() {
        let raw = r#"{
            "definitions": [{"term": "Entropy", "definition": "Disorder"}],
            "comparisons": [{"subject_a": "Mitosis", "subject_b": "Meiosis", "difference_or_similarity": "2 vs 4 cells"}],
            "timelines": [{"date": 1789, "event": "French Revolution"}],
            "concepts": [{"name": "Supply", "explanation": "Goods offered"}]
        }"#;
        let extraction = parse_extraction(raw).unwrap();
        assert_eq!(extraction.definitions[0].term, "Entropy");
        assert_eq!(extraction.comparisons[0].subject_b, "Meiosis");
        assert_eq!(extraction.timelines[0].date, "1789");
        assert_eq!(extraction.concepts[0].explanation, "Goods offered");
    }

    #[test]
    fn test_parse_missing_categories_and_fields() {
        let extraction = parse_extraction(r#"{"definitions": [{"term": "Orphan"}, "junk"]}"#).unwrap();
        assert_eq!(extraction.definitions.len(), 1);
        assert_eq!(extraction.definitions[0].definition, "");
        assert!(extraction.comparisons.is_empty());
        assert!(extraction.timelines.is_empty());
        assert!(extraction.concepts.is_empty());
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(parse_extraction("[1, 2, 3]").is_err());
        assert!(parse_extraction("not json").is_err());
    }

    #[tokio::test]
    async fn test_extract_knowledge_degrades_to_empty() {
        let backend = ScriptedBackend::new(vec![Some("{oops")]);
        let extraction = extract_knowledge(&backend, "llama3.1:8b", SYSTEM_PROMPT, "text").await;
        assert!(extraction.is_empty());
    }
}
