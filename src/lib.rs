// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Luminara: Local AI Study Companion
//!
//! Turns PDFs and notes into cheatsheets and quizzes with a local Ollama model,
//! and keeps the study desk around them: a PDF library, notes history,
//! exam calendar and focus timers.

pub mod calendar;
pub mod cheatsheet;
pub mod chunker;
pub mod config;
pub mod db;
pub mod documents;
pub mod error;
pub mod library;
pub mod notes;
pub mod ollama;
pub mod quiz;
pub mod timer;
pub mod watcher;
pub mod web;

pub use config::AppConfig;
pub use error::{LuminaraError, Result};
