// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Quiz generation from study material

pub mod setup;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use crate::chunker::word_chunks;
use crate::ollama::{json_payload, ChatBackend};
use crate::{AppConfig, LuminaraError, Result};

pub use setup::{prompt_setup, QuizSetup};

/// Kind of question the model is asked for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "MCQ")]
    Mcq,
    #[serde(rename = "True/False")]
    TrueFalse,
    #[default]
    #[serde(rename = "Long Answer")]
    LongAnswer,
}

impl QuestionType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mcq => "MCQ",
            Self::TrueFalse => "True/False",
            Self::LongAnswer => "Long Answer",
        }
    }

    /// Menu choice (1-3) or label; anything else falls back to the default
    pub fn from_choice(input: &str) -> Self {
        input.parse().unwrap_or_default()
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QuestionType {
    type Err = LuminaraError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "mcq" | "multiple choice" | "multiple-choice" => Ok(Self::Mcq),
            "2" | "true/false" | "true-false" | "truefalse" | "tf" => Ok(Self::TrueFalse),
            "3" | "long answer" | "long-answer" | "long" => Ok(Self::LongAnswer),
            other => Err(LuminaraError::InvalidInput(format!("unknown question type '{}'", other))),
        }
    }
}

/// A generated question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(rename = "type", default)]
    pub question_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_snippet: Option<String>,
    /// Anything else the model produced, e.g. MCQ options
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Build the system prompt for one question type
pub fn build_prompt(preamble: &str, question_type: QuestionType, char_limit: usize) -> String {
    let label = question_type.label();
    format!(
        r#"{preamble}
Generate {label} questions only.

    Focus on extracting:
    - Definitions
    - Comparisons
    - Timelines
    - Causes and Effects
    - Processes
    - Relationships
    - Important Concepts

    Constraints:
    1. The 'type' field must be '{label}'.
    2. Include a short 'context_snippet' from the text that supports the answer.
    3. Keep each answer under roughly {char_limit} characters.
    4. Return ONLY a valid JSON list of objects.

    Output Schema:
    [
        {{
            "question": "The question text",
            "answer": "The answer text",
            "type": "{label}",
            "context_snippet": "Relevant text from source"
        }}
    ]
"#
    )
}

pub fn user_message(chunk: &str) -> String {
    format!("Generate questions from this text:\n\n{}", chunk)
}

/// Parse model output into questions.
///
/// Accepts a bare list, an object wrapping a list under any key, or a single
/// question object. Entries without a question are skipped.
pub fn parse_questions(raw: &str, question_type: QuestionType) -> Result<Vec<Question>> {
    let value: Value = serde_json::from_str(json_payload(raw))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => {
            let wrapped = map.values().find_map(|v| v.as_array().cloned());
            match wrapped {
                Some(items) => items,
                None => vec![Value::Object(map)],
            }
        }
        other => {
            return Err(LuminaraError::ModelOutput(format!(
                "expected a list of questions, got {}",
                other
            )))
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => question_from_map(map, question_type),
            _ => None,
        })
        .collect())
}

fn question_from_map(mut map: Map<String, Value>, question_type: QuestionType) -> Option<Question> {
    let question = take_text(&mut map, "question").filter(|q| !q.trim().is_empty())?;
    let answer = take_text(&mut map, "answer").unwrap_or_default();
    let kind = take_text(&mut map, "type")
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| question_type.label().to_string());
    let context_snippet = take_text(&mut map, "context_snippet").filter(|s| !s.is_empty());

    Some(Question {
        question,
        answer,
        question_type: kind,
        context_snippet,
        extra: map,
    })
}

fn take_text(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Ask the model for questions about one chunk; failures yield no questions
pub async fn generate_questions(
    backend: &dyn ChatBackend,
    model: &str,
    system_prompt: &str,
    chunk: &str,
    question_type: QuestionType,
) -> Result<Vec<Question>> {
    let raw = backend.chat_json(model, system_prompt, &user_message(chunk)).await?;
    parse_questions(&raw, question_type)
}

/// Knobs for one quiz run
#[derive(Debug, Clone)]
pub struct QuizOptions {
    pub model: String,
    pub preamble: String,
    pub question_type: QuestionType,
    pub char_limit: usize,
    pub words_per_chunk: usize,
    pub word_overlap: usize,
}

impl QuizOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.ai_engine.model.clone(),
            preamble: config.prompts.quiz_preamble.clone(),
            question_type: config.quiz.default_type,
            char_limit: config.quiz.answer_char_limit,
            words_per_chunk: config.quiz.words_per_chunk,
            word_overlap: config.quiz.word_overlap,
        }
    }
}

/// Outcome of a quiz run
#[derive(Debug, Clone)]
pub struct QuizRun {
    pub questions: Vec<Question>,
    pub chunk_count: usize,
    pub failed_chunks: usize,
}

/// Generate questions for a whole text
pub async fn generate_from_text(
    backend: &dyn ChatBackend,
    options: &QuizOptions,
    text: &str,
) -> QuizRun {
    let chunks = word_chunks(text, options.words_per_chunk, options.word_overlap);
    info!(
        "Created {} chunks ({} words each with overlap)",
        chunks.len(),
        options.words_per_chunk
    );

    let system_prompt = build_prompt(&options.preamble, options.question_type, options.char_limit);
    let mut questions = Vec::new();
    let mut failed_chunks = 0;

    for (i, chunk) in chunks.iter().enumerate() {
        info!("Generating questions for chunk {}/{}", i + 1, chunks.len());
        match generate_questions(backend, &options.model, &system_prompt, chunk, options.question_type).await {
            Ok(mut batch) => questions.append(&mut batch),
            Err(e) => {
                warn!("Error generating questions: {}", e);
                failed_chunks += 1;
            }
        }
    }

    QuizRun {
        questions,
        chunk_count: chunks.len(),
        failed_chunks,
    }
}

/// Generate a quiz from a PDF or notes file
pub async fn generate_quiz(
    backend: &dyn ChatBackend,
    options: &QuizOptions,
    path: &Path,
) -> Result<QuizRun> {
    if !path.exists() {
        return Err(LuminaraError::NotFound(format!("File not found at {}", path.display())));
    }
    info!("Extracting text and creating chunks...");
    let text = crate::documents::extract_text(path)?;
    Ok(generate_from_text(backend, options, &text).await)
}

/// Write questions as pretty-printed JSON
pub fn save(questions: &[Question], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(questions)?;
    std::fs::write(path, json)?;
    Ok(())
}
