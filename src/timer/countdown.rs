// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Countdown timer

use super::ButtonLabel;
use crate::{LuminaraError, Result};

pub const DEFAULT_MINUTES: u64 = 25;
pub const PRESET_MINUTES: [u64; 4] = [25, 30, 55, 60];

/// Result of advancing the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Idle,
    Running,
    Finished,
}

/// Parse `H:M:S`, `M:S` or plain minutes into (hours, minutes, seconds)
pub fn parse_hms(input: &str) -> Result<(u64, u64, u64)> {
    let invalid = || LuminaraError::InvalidInput(format!("invalid duration '{}', expected H:M:S", input));
    let parts = input
        .trim()
        .split(':')
        .map(|p| p.trim().parse::<u64>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>>>()?;
    match parts.as_slice() {
        [m] => Ok((0, *m, 0)),
        [m, s] => Ok((0, *m, *s)),
        [h, m, s] => Ok((*h, *m, *s)),
        _ => Err(invalid()),
    }
}

/// Total milliseconds for a duration, rejecting values that overflow
pub fn duration_ms(hours: u64, minutes: u64, seconds: u64) -> Result<u64> {
    hours
        .checked_mul(3600)
        .zip(minutes.checked_mul(60))
        .and_then(|(h, m)| h.checked_add(m))
        .and_then(|secs| secs.checked_add(seconds))
        .and_then(|secs| secs.checked_mul(1000))
        .ok_or_else(|| {
            LuminaraError::InvalidInput(format!(
                "duration {}:{}:{} is too long",
                hours, minutes, seconds
            ))
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    total_ms: u64,
    remaining_ms: u64,
    running: bool,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::from_minutes(DEFAULT_MINUTES)
    }
}

impl Countdown {
    /// Countdown of `minutes`, saturating at the largest representable duration
    pub fn from_minutes(minutes: u64) -> Self {
        let total_ms = minutes.saturating_mul(60_000);
        Self {
            total_ms,
            remaining_ms: total_ms,
            running: false,
        }
    }

    /// Set a new duration. A zero duration is ignored and returns false.
    pub fn set(&mut self, hours: u64, minutes: u64, seconds: u64) -> Result<bool> {
        let total_ms = duration_ms(hours, minutes, seconds)?;
        if total_ms == 0 {
            return Ok(false);
        }
        self.running = false;
        self.total_ms = total_ms;
        self.remaining_ms = total_ms;
        Ok(true)
    }

    pub fn set_preset(&mut self, minutes: u64) -> Result<bool> {
        self.set(0, minutes, 0)
    }

    /// Start or pause. Starting a finished countdown runs it again from the top.
    pub fn toggle(&mut self) {
        if self.running {
            self.running = false;
        } else {
            if self.remaining_ms == 0 {
                self.remaining_ms = self.total_ms;
            }
            self.running = true;
        }
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.remaining_ms = self.total_ms;
    }

    pub fn tick(&mut self, elapsed_ms: u64) -> Tick {
        if !self.running {
            return Tick::Idle;
        }
        self.remaining_ms = self.remaining_ms.saturating_sub(elapsed_ms);
        if self.remaining_ms == 0 {
            self.running = false;
            Tick::Finished
        } else {
            Tick::Running
        }
    }

    /// Remaining time as `HH:MM:SS`, seconds rounded up
    pub fn display(&self) -> String {
        let secs = self.remaining_ms.div_ceil(1000);
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
    }

    /// Fraction of the duration still left, in [0, 1]
    pub fn progress(&self) -> f64 {
        if self.total_ms == 0 {
            return 0.0;
        }
        (self.remaining_ms as f64 / self.total_ms as f64).clamp(0.0, 1.0)
    }

    pub fn label(&self) -> ButtonLabel {
        if self.running {
            ButtonLabel::Pause
        } else if self.remaining_ms > 0 && self.remaining_ms < self.total_ms {
            ButtonLabel::Resume
        } else {
            ButtonLabel::Start
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.total_ms - self.remaining_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hms() {
        assert_eq!(parse_hms("1:30:05").unwrap(), (1, 30, 5));
        assert_eq!(parse_hms("45:00").unwrap(), (0, 45, 0));
        assert_eq!(parse_hms("55").unwrap(), (0, 55, 0));
        assert!(parse_hms("1:2:3:4").is_err());
        assert!(parse_hms("ten").is_err());
    }

    #[test]
    fn test_default_is_25_minutes() {
        let timer = Countdown::default();
        assert_eq!(timer.display(), "00:25:00");
        assert_eq!(timer.progress(), 1.0);
        assert_eq!(timer.label(), ButtonLabel::Start);
    }

    #[test]
    fn test_set_ignores_zero() {
        let mut timer = Countdown::default();
        assert!(!timer.set(0, 0, 0).unwrap());
        assert_eq!(timer.total_ms(), 25 * 60_000);

        timer.toggle();
        assert!(timer.set(1, 2, 3).unwrap());
        assert!(!timer.is_running());
        assert_eq!(timer.display(), "01:02:03");
    }

    #[test]
    fn test_display_rounds_up() {
        let mut timer = Countdown::default();
        timer.set(0, 0, 10).unwrap();
        timer.toggle();
        timer.tick(20);
        assert_eq!(timer.display(), "00:00:10");
        timer.tick(980);
        assert_eq!(timer.display(), "00:00:09");
    }

    #[test]
    fn test_finishes_once() {
        let mut timer = Countdown::default();
        timer.set(0, 0, 1).unwrap();
        assert_eq!(timer.tick(500), Tick::Idle);

        timer.toggle();
        assert_eq!(timer.tick(600), Tick::Running);
        assert_eq!(timer.label(), ButtonLabel::Pause);
        assert_eq!(timer.tick(600), Tick::Finished);
        assert_eq!(timer.tick(20), Tick::Idle);
        assert_eq!(timer.progress(), 0.0);
        assert_eq!(timer.label(), ButtonLabel::Start);
        assert_eq!(timer.display(), "00:00:00");
    }

    #[test]
    fn test_pause_resume_reset() {
        let mut timer = Countdown::default();
        timer.set_preset(30).unwrap();
        timer.toggle();
        timer.tick(60_000);
        timer.toggle();
        assert_eq!(timer.label(), ButtonLabel::Resume);
        assert_eq!(timer.display(), "00:29:00");
        assert_eq!(timer.elapsed_ms(), 60_000);
        assert!((timer.progress() - 29.0 / 30.0).abs() < 1e-9);

        timer.reset();
        assert_eq!(timer.display(), "00:30:00");
        assert_eq!(timer.label(), ButtonLabel::Start);
    }

    #[test]
    fn test_oversized_duration_is_rejected() {
        let mut timer = Countdown::default();
        let (h, m, s) = parse_hms("9999999999999999:0:0").unwrap();
        assert!(matches!(timer.set(h, m, s), Err(LuminaraError::InvalidInput(_))));
        assert!(timer.set_preset(u64::MAX).is_err());
        assert_eq!(timer.total_ms(), 25 * 60_000);

        assert_eq!(Countdown::from_minutes(u64::MAX).total_ms(), u64::MAX);
        assert_eq!(duration_ms(1, 1, 1).unwrap(), 3_661_000);
    }
}
