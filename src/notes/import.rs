// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Import of exported notes / Q&A JSON
//!
//! Exports come from several tools and shapes vary, so parsing is a tolerant
//! walk over the JSON tree rather than a fixed schema.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const NOTE_LIST_KEYS: &[&str] = &["exportedNotes", "exported_notes", "noteExports", "notes_export"];
const QNA_LIST_KEYS: &[&str] = &["exportedQnA", "exported_qna", "qa", "qas", "questions"];
const QNA_ITEM_TYPES: &[&str] = &["qna", "qa", "question", "flashcard"];
const FALLBACK_TITLE_CHARS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedNote {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QnaPair {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Default)]
struct Collector {
    notes: Vec<ImportedNote>,
    qna: Vec<QnaPair>,
}

/// Split an exported JSON document into notes and question/answer pairs
pub fn parse_export(data: &Value) -> (Vec<ImportedNote>, Vec<QnaPair>) {
    let mut collector = Collector::default();
    collector.walk(data);
    (collector.notes, collector.qna)
}

/// Render any JSON value as note text; containers become pretty JSON
fn coerce_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Array(_) | Value::Object(_))) => {
            serde_json::to_string_pretty(v).unwrap_or_default()
        }
        Some(other) => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// First of `keys` holding a truthy value, else the last key's value
fn pick<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| is_truthy(v))
        .or_else(|| keys.last().and_then(|k| obj.get(*k)))
}

fn has_any(obj: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().any(|k| obj.contains_key(*k))
}

impl Collector {
    fn push_note(&mut self, title: Option<&Value>, content: Option<&Value>) {
        let content = coerce_text(content).trim().to_string();
        if content.is_empty() {
            return;
        }
        let mut title = coerce_text(title).trim().to_string();
        if title.is_empty() {
            title = content
                .lines()
                .next()
                .map(|l| l.chars().take(FALLBACK_TITLE_CHARS).collect())
                .filter(|t: &String| !t.is_empty())
                .unwrap_or_else(|| "Untitled".to_string());
        }
        self.notes.push(ImportedNote { title, content });
    }

    fn push_qna(&mut self, question: Option<&Value>, answer: Option<&Value>) {
        let question = coerce_text(question).trim().to_string();
        let answer = coerce_text(answer).trim().to_string();
        if question.is_empty() && answer.is_empty() {
            return;
        }
        self.qna.push(QnaPair {
            question: if question.is_empty() { "Question".to_string() } else { question },
            answer,
        });
    }

    fn push_note_object(&mut self, obj: &Map<String, Value>) {
        self.push_note(pick(obj, &["title", "name"]), pick(obj, &["content", "text", "note"]));
    }

    fn push_qna_object(&mut self, obj: &Map<String, Value>) {
        self.push_qna(pick(obj, &["question", "q"]), pick(obj, &["answer", "a"]));
    }

    fn note_list(&mut self, list: &[Value]) {
        for item in list {
            match item {
                Value::Object(obj) => self.push_note_object(obj),
                other => self.push_note(Some(&Value::String("Note".into())), Some(other)),
            }
        }
    }

    fn qna_list(&mut self, list: &[Value]) {
        for item in list {
            match item {
                Value::Object(obj) => self.push_qna_object(obj),
                other => self.push_qna(Some(&Value::String("Question".into())), Some(other)),
            }
        }
    }

    fn typed_item(&mut self, item: &Map<String, Value>) {
        let kind = coerce_text(pick(item, &["type", "kind"])).to_lowercase();
        if kind.contains("note") {
            self.push_note_object(item);
        } else if QNA_ITEM_TYPES.contains(&kind.as_str()) {
            self.push_qna_object(item);
        } else if has_any(item, &["question", "answer"]) || (has_any(item, &["q"]) && has_any(item, &["a"])) {
            self.push_qna_object(item);
        } else if has_any(item, &["content", "text", "note"]) {
            self.push_note_object(item);
        }
    }

    fn walk(&mut self, value: &Value) {
        match value {
            Value::Array(items) => items.iter().for_each(|item| self.walk(item)),
            Value::Object(obj) => self.walk_object(obj),
            primitive => self.push_note(Some(&Value::String("Note".into())), Some(primitive)),
        }
    }

    fn walk_object(&mut self, obj: &Map<String, Value>) {
        if let Some(Value::Array(list)) = obj.get("notes") {
            self.note_list(list);
        }
        if let Some(Value::Array(list)) = obj.get("qna") {
            self.qna_list(list);
        }

        for key in NOTE_LIST_KEYS {
            if let Some(Value::Array(list)) = obj.get(*key) {
                self.note_list(list);
            }
        }
        for key in QNA_LIST_KEYS {
            if let Some(Value::Array(list)) = obj.get(*key) {
                self.qna_list(list);
            }
        }

        if let Some(Value::Array(items)) = obj.get("items") {
            for item in items {
                if let Value::Object(item) = item {
                    self.typed_item(item);
                }
            }
        }

        // The object itself may be a single note or flashcard
        let looks_like_qna = has_any(obj, &["question", "q"]) && has_any(obj, &["answer", "a"]);
        if looks_like_qna {
            self.push_qna_object(obj);
        } else if has_any(obj, &["content", "text", "note"]) {
            self.push_note_object(obj);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notes_and_qna_keys() {
        let (notes, qna) = parse_export(&json!({
            "notes": [{"title": "Cells", "content": "Basic unit of life"}, "loose note"],
            "qna": [{"q": "Powerhouse?", "a": "Mitochondria"}, {"question": "", "answer": ""}]
        }));
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0], ImportedNote { title: "Cells".into(), content: "Basic unit of life".into() });
        assert_eq!(notes[1].title, "Note");
        assert_eq!(qna, vec![QnaPair { question: "Powerhouse?".into(), answer: "Mitochondria".into() }]);
    }

    #[test]
    fn test_alternative_key_names() {
        let (notes, qna) = parse_export(&json!({
            "exportedNotes": [{"name": "Optics", "text": "Snell's law"}],
            "questions": [{"question": "n1 sin θ1 = ?", "answer": "n2 sin θ2"}, "What is refraction?"]
        }));
        assert_eq!(notes[0].title, "Optics");
        assert_eq!(qna.len(), 2);
        assert_eq!(qna[1].question, "Question");
        assert_eq!(qna[1].answer, "What is refraction?");
    }

    #[test]
    fn test_typed_items() {
        let (notes, qna) = parse_export(&json!({
            "items": [
                {"type": "Note", "title": "Summary", "content": "Chapter 1"},
                {"kind": "flashcard", "q": "H2O?", "a": "Water"},
                {"type": "other", "question": "Heuristic?", "answer": "Yes"},
                {"type": "other", "text": "Heuristic note"},
                "ignored"
            ]
        }));
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1].title, "Heuristic note");
        assert_eq!(qna.len(), 2);
        assert_eq!(qna[0].answer, "Water");
    }

    #[test]
    fn test_bare_list_and_primitives() {
        let (notes, qna) = parse_export(&json!([
            {"question": "Capital of France?", "answer": "Paris"},
            {"content": {"nested": true}},
            42,
            null
        ]));
        assert_eq!(qna.len(), 1);
        assert_eq!(notes.len(), 2);
        assert!(notes[0].content.contains("\"nested\": true"));
        assert_eq!(notes[0].title, "{");
        assert_eq!(notes[1].content, "42");
    }

    #[test]
    fn test_fallback_title_is_first_line_truncated() {
        let long = "a".repeat(60);
        let (notes, _) = parse_export(&json!({"content": format!("{}\nsecond", long)}));
        assert_eq!(notes[0].title.chars().count(), 40);
    }

    #[test]
    fn test_qna_dict_not_double_counted_as_note() {
        let (notes, qna) = parse_export(&json!({"question": "Q", "answer": "A", "text": "extra"}));
        assert!(notes.is_empty());
        assert_eq!(qna.len(), 1);
    }
}
