// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Stopwatch with laps

use super::ButtonLabel;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stopwatch {
    elapsed_ms: u64,
    running: bool,
    laps: Vec<u64>,
}

/// `MM:SS.cc`; minutes are not wrapped into hours
pub fn format_elapsed(ms: u64) -> String {
    format!("{:02}:{:02}.{:02}", ms / 60_000, (ms / 1000) % 60, (ms % 1000) / 10)
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    pub fn tick(&mut self, elapsed_ms: u64) {
        if self.running {
            self.elapsed_ms += elapsed_ms;
        }
    }

    pub fn display(&self) -> String {
        format_elapsed(self.elapsed_ms)
    }

    /// Record a lap; ignored before the stopwatch has ever run
    pub fn lap(&mut self) -> Option<String> {
        if !self.running && self.elapsed_ms == 0 {
            return None;
        }
        self.laps.push(self.elapsed_ms);
        Some(lap_line(self.laps.len(), self.elapsed_ms))
    }

    /// Lap lines, newest first
    pub fn laps(&self) -> Vec<String> {
        self.laps
            .iter()
            .enumerate()
            .rev()
            .map(|(i, ms)| lap_line(i + 1, *ms))
            .collect()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn label(&self) -> ButtonLabel {
        if self.running {
            ButtonLabel::Pause
        } else if self.elapsed_ms > 0 {
            ButtonLabel::Resume
        } else {
            ButtonLabel::Start
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }
}

fn lap_line(n: usize, ms: u64) -> String {
    format!("Lap {} — {}", n, format_elapsed(ms))
}
