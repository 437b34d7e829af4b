// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for Luminara

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::quiz::QuestionType;

/// Environment variable that overrides `ai_engine.url`
pub const OLLAMA_URL_ENV: &str = "LUMINARA_OLLAMA_URL";

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// AI engine configuration
    pub ai_engine: EngineConfig,

    /// Cheatsheet extraction settings
    #[serde(default)]
    pub cheatsheet: CheatsheetConfig,

    /// Quiz generation settings
    #[serde(default)]
    pub quiz: QuizConfig,

    /// Prompt templates
    #[serde(default)]
    pub prompts: PromptConfig,

    /// Focus timer settings
    #[serde(default)]
    pub focus: FocusConfig,

    /// Where notes, calendar, library and database live
    #[serde(default)]
    pub storage: StorageConfig,

    /// Web UI settings
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CheatsheetConfig {
    /// Pages per sliding window
    #[serde(default = "default_pages_per_chunk")]
    pub pages_per_chunk: usize,
    /// Pages shared between consecutive windows
    #[serde(default = "default_page_overlap")]
    pub page_overlap: usize,
    #[serde(default = "default_cheatsheet_output")]
    pub output: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QuizConfig {
    #[serde(default = "default_words_per_chunk")]
    pub words_per_chunk: usize,
    #[serde(default = "default_word_overlap")]
    pub word_overlap: usize,
    #[serde(default)]
    pub default_type: QuestionType,
    /// Approximate character limit for answers
    #[serde(default = "default_answer_char_limit")]
    pub answer_char_limit: usize,
    #[serde(default = "default_quiz_output")]
    pub output: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_cheatsheet_prompt")]
    pub cheatsheet: String,
    #[serde(default = "default_quiz_preamble")]
    pub quiz_preamble: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FocusConfig {
    #[serde(default = "default_focus_minutes")]
    pub default_minutes: u64,
    #[serde(default = "default_presets")]
    pub presets: Vec<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_library_dir")]
    pub library_dir: String,
    #[serde(default = "default_db_path")]
    pub database: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

// Default value functions
fn default_model() -> String { "llama3.1:8b".to_string() }
fn default_timeout() -> u64 { 300 }
fn default_retries() -> u32 { 2 }
fn default_pages_per_chunk() -> usize { 3 }
fn default_page_overlap() -> usize { 1 }
fn default_cheatsheet_output() -> String { "output.json".to_string() }
fn default_words_per_chunk() -> usize { 2500 }
fn default_word_overlap() -> usize { 100 }
fn default_answer_char_limit() -> usize { 200 }
fn default_quiz_output() -> String { "final_questions.json".to_string() }
fn default_focus_minutes() -> u64 { 25 }
fn default_presets() -> Vec<u64> { vec![25, 30, 55, 60] }
fn default_data_dir() -> String { "data".to_string() }
fn default_library_dir() -> String { "library".to_string() }
fn default_db_path() -> String { "luminara.db".to_string() }
fn default_web_host() -> String { "127.0.0.1".to_string() }
fn default_web_port() -> u16 { 8080 }

fn default_cheatsheet_prompt() -> String {
    crate::cheatsheet::extract::SYSTEM_PROMPT.to_string()
}

fn default_quiz_preamble() -> String {
    "You are an expert educational content generator. Analyze the provided text \
     and generate the maximum number of questions."
        .to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ai_engine: EngineConfig {
                url: "http://localhost:11434".to_string(),
                model: default_model(),
                timeout_secs: default_timeout(),
                retries: default_retries(),
            },
            cheatsheet: CheatsheetConfig::default(),
            quiz: QuizConfig::default(),
            prompts: PromptConfig::default(),
            focus: FocusConfig::default(),
            storage: StorageConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl Default for CheatsheetConfig {
    fn default() -> Self {
        Self {
            pages_per_chunk: default_pages_per_chunk(),
            page_overlap: default_page_overlap(),
            output: default_cheatsheet_output(),
        }
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            words_per_chunk: default_words_per_chunk(),
            word_overlap: default_word_overlap(),
            default_type: QuestionType::default(),
            answer_char_limit: default_answer_char_limit(),
            output: default_quiz_output(),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            cheatsheet: default_cheatsheet_prompt(),
            quiz_preamble: default_quiz_preamble(),
        }
    }
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_focus_minutes(),
            presets: default_presets(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            library_dir: default_library_dir(),
            database: default_db_path(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

impl StorageConfig {
    pub fn notes_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("notes.jsonl")
    }

    pub fn calendar_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("calendar.json")
    }

    pub fn alarms_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("alarms.json")
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str::<Self>(&content)
                .map_err(|e| crate::LuminaraError::Config(format!("Failed to parse config: {}", e)))?
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Self::default()
        };

        if let Ok(url) = std::env::var(OLLAMA_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::debug!("Ollama URL overridden by {}", OLLAMA_URL_ENV);
                config.ai_engine.url = url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings that would make chunking or timers meaningless
    pub fn validate(&self) -> crate::Result<()> {
        if self.cheatsheet.pages_per_chunk == 0 {
            return Err(crate::LuminaraError::Config(
                "cheatsheet.pages_per_chunk must be at least 1".to_string(),
            ));
        }
        if self.quiz.words_per_chunk == 0 {
            return Err(crate::LuminaraError::Config(
                "quiz.words_per_chunk must be at least 1".to_string(),
            ));
        }
        if self.focus.default_minutes == 0 {
            return Err(crate::LuminaraError::Config(
                "focus.default_minutes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_settings() {
        let config = AppConfig::default();
        assert_eq!(config.ai_engine.model, "llama3.1:8b");
        assert_eq!(config.cheatsheet.pages_per_chunk, 3);
        assert_eq!(config.cheatsheet.page_overlap, 1);
        assert_eq!(config.quiz.words_per_chunk, 2500);
        assert_eq!(config.quiz.word_overlap, 100);
        assert_eq!(config.quiz.answer_char_limit, 200);
        assert_eq!(config.focus.presets, vec![25, 30, 55, 60]);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{ "ai_engine": { "url": "http://gpu-box:11434" } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.ai_engine.url, "http://gpu-box:11434");
        assert_eq!(config.ai_engine.model, "llama3.1:8b");
        assert_eq!(config.quiz.output, "final_questions.json");
        assert_eq!(config.storage.database, "luminara.db");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.focus.default_minutes = 50;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.focus.default_minutes, 50);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.web.port, 8080);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let mut config = AppConfig::default();
        config.cheatsheet.pages_per_chunk = 0;
        assert!(config.validate().is_err());
    }
}
