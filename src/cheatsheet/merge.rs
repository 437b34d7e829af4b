// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Merging per-chunk extractions into one cheatsheet

use std::collections::{BTreeSet, HashSet};

use super::{Comparison, Concept, Definition, Extraction, TimelineEntry};

/// Merge extractions, dropping duplicates.
///
/// Definitions and concepts are keyed by trimmed term/name and keep the first
/// occurrence. Comparisons are keyed by the full trimmed triple, timelines by
/// trimmed date and event. Output is sorted for stable diffs.
pub fn merge_results(results: &[Extraction]) -> Extraction {
    let mut seen_terms = HashSet::new();
    let mut definitions = Vec::new();
    let mut comparisons = BTreeSet::new();
    let mut seen_events = HashSet::new();
    let mut timelines = Vec::new();
    let mut seen_names = HashSet::new();
    let mut concepts = Vec::new();

    for result in results {
        for item in &result.definitions {
            let term = item.term.trim();
            if !term.is_empty() && seen_terms.insert(term.to_string()) {
                definitions.push(Definition {
                    term: term.to_string(),
                    definition: item.definition.clone(),
                });
            }
        }

        for item in &result.comparisons {
            let key = (
                item.subject_a.trim().to_string(),
                item.subject_b.trim().to_string(),
                item.difference_or_similarity.trim().to_string(),
            );
            if !(key.0.is_empty() && key.1.is_empty() && key.2.is_empty()) {
                comparisons.insert(key);
            }
        }

        for item in &result.timelines {
            let key = (item.date.trim().to_string(), item.event.trim().to_string());
            if key.0.is_empty() && key.1.is_empty() {
                continue;
            }
            if seen_events.insert(key) {
                timelines.push(item.clone());
            }
        }

        for item in &result.concepts {
            let name = item.name.trim();
            if !name.is_empty() && seen_names.insert(name.to_string()) {
                concepts.push(Concept {
                    name: name.to_string(),
                    explanation: item.explanation.clone(),
                });
            }
        }
    }

    definitions.sort_by(|a, b| a.term.cmp(&b.term));
    timelines.sort_by(|a: &TimelineEntry, b: &TimelineEntry| a.date.cmp(&b.date));
    concepts.sort_by(|a, b| a.name.cmp(&b.name));

    Extraction {
        definitions,
        comparisons: comparisons
            .into_iter()
            .map(|(subject_a, subject_b, difference_or_similarity)| Comparison {
                subject_a,
                subject_b,
                difference_or_similarity,
            })
            .collect(),
        timelines,
        concepts,
    }
}
