// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Exam and event calendar

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{LuminaraError, Result};

/// Something happening on a day: an exam, a deadline, a study block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub date: NaiveDate,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Parse `YYYY-MM-DD`
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| LuminaraError::InvalidInput(format!("invalid date '{}': {}", input, e)))
}

/// Parse `YYYY-MM` into (year, month)
pub fn parse_month(input: &str) -> Result<(i32, u32)> {
    let first = format!("{}-01", input.trim());
    let date = NaiveDate::parse_from_str(&first, "%Y-%m-%d")
        .map_err(|_| LuminaraError::InvalidInput(format!("invalid month '{}', expected YYYY-MM", input)))?;
    Ok((date.year(), date.month()))
}

/// Calendar persisted as a JSON array
pub struct CalendarStore {
    path: PathBuf,
}

impl CalendarStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Every event, sorted by date then creation time
    pub fn all(&self) -> Result<Vec<CalendarEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut events: Vec<CalendarEvent> = serde_json::from_str(&content)?;
        events.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(events)
    }

    fn write(&self, events: &[CalendarEvent]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(events)?)?;
        Ok(())
    }

    pub fn add(&self, date: NaiveDate, text: &str) -> Result<CalendarEvent> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LuminaraError::InvalidInput("event text is empty".to_string()));
        }
        let mut events = self.all()?;
        let event = CalendarEvent {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        events.push(event.clone());
        self.write(&events)?;
        Ok(event)
    }

    pub fn on(&self, date: NaiveDate) -> Result<Vec<CalendarEvent>> {
        Ok(self.all()?.into_iter().filter(|e| e.date == date).collect())
    }

    pub fn month(&self, year: i32, month: u32) -> Result<Vec<CalendarEvent>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|e| e.date.year() == year && e.date.month() == month)
            .collect())
    }

    /// Events from `from` onwards, at most `limit`
    pub fn upcoming(&self, from: NaiveDate, limit: usize) -> Result<Vec<CalendarEvent>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|e| e.date >= from)
            .take(limit)
            .collect())
    }

    /// Remove by id or id prefix; returns the removed event
    pub fn remove(&self, id: &str) -> Result<CalendarEvent> {
        let mut events = self.all()?;
        let matching: Vec<usize> = events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.id.starts_with(id))
            .map(|(i, _)| i)
            .collect();
        match matching.as_slice() {
            [index] => {
                let removed = events.remove(*index);
                self.write(&events)?;
                Ok(removed)
            }
            [] => Err(LuminaraError::NotFound(format!("event {}", id))),
            _ => Err(LuminaraError::InvalidInput(format!("event id '{}' is ambiguous", id))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
