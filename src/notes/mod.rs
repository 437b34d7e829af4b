// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Notes history stored as JSON lines

pub mod import;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::{LuminaraError, Result};

pub use import::{parse_export, ImportedNote, QnaPair};

const TITLE_MAX_CHARS: usize = 28;

/// A saved note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub imported: bool,
}

/// Title shown in the history list: first line, shortened, plus the time
pub fn make_title(content: &str, counter: usize, now: DateTime<Local>) -> String {
    let clock = now.format("%H:%M");
    let first_line = content.trim().lines().next().unwrap_or("").trim();

    if first_line.is_empty() {
        return format!("Note {} • {}", counter, clock);
    }

    if first_line.chars().count() > TITLE_MAX_CHARS {
        let short: String = first_line.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}… • {}", short.trim_end(), clock)
    } else {
        format!("{} • {}", first_line, clock)
    }
}

/// Notes history backed by a JSONL file
pub struct NoteStore {
    path: PathBuf,
}

impl NoteStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn append(&self, note: &Note) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(note)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    /// Save a note, deriving the title from its content
    pub fn add(&self, content: &str) -> Result<Note> {
        if content.trim().is_empty() {
            return Err(LuminaraError::InvalidInput("note is empty".to_string()));
        }
        let counter = self.read_all()?.len() + 1;
        let note = Note {
            id: uuid::Uuid::new_v4().to_string(),
            title: make_title(content, counter, Local::now()),
            content: content.to_string(),
            created_at: Utc::now(),
            imported: false,
        };
        self.append(&note)?;
        Ok(note)
    }

    /// Save notes that came from an exported JSON file
    pub fn add_imported(&self, notes: &[ImportedNote]) -> Result<usize> {
        let mut added = 0;
        for imported in notes {
            let content = imported.content.trim();
            if content.is_empty() {
                continue;
            }
            let title = match imported.title.trim() {
                "" => "Imported Note",
                t => t,
            };
            self.append(&Note {
                id: uuid::Uuid::new_v4().to_string(),
                title: format!("{} • imported", title),
                content: content.to_string(),
                created_at: Utc::now(),
                imported: true,
            })?;
            added += 1;
        }
        Ok(added)
    }

    /// Read all notes, oldest first
    pub fn read_all(&self) -> Result<Vec<Note>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut notes = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(note) => notes.push(note),
                Err(e) => tracing::warn!("Failed to parse note entry: {}", e),
            }
        }
        Ok(notes)
    }

    /// Newest first
    pub fn list(&self) -> Result<Vec<Note>> {
        let mut notes = self.read_all()?;
        notes.reverse();
        Ok(notes)
    }

    /// Notes whose title or body contains `query`, newest first
    pub fn search(&self, query: &str) -> Result<Vec<Note>> {
        let query = query.trim().to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .filter(|n| {
                n.title.to_lowercase().contains(&query) || n.content.to_lowercase().contains(&query)
            })
            .collect())
    }

    /// Find a note by id or unambiguous id prefix
    pub fn get(&self, id: &str) -> Result<Note> {
        let mut matches: Vec<Note> = self
            .read_all()?
            .into_iter()
            .filter(|n| n.id.starts_with(id))
            .collect();
        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(LuminaraError::NotFound(format!("note {}", id))),
            _ => Err(LuminaraError::InvalidInput(format!("note id '{}' is ambiguous", id))),
        }
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
