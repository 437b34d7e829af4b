// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Wall-clock alarms

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{LuminaraError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Alarm {
    pub hour: u32,
    pub minute: u32,
}

impl Alarm {
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(LuminaraError::InvalidInput(format!(
                "alarm time {}:{:02} is out of range",
                hour, minute
            )));
        }
        Ok(Self { hour, minute })
    }
}

impl std::fmt::Display for Alarm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_12h(self.hour, self.minute))
    }
}

/// `h:mm AM` / `h:mm PM`
pub fn format_12h(hour: u32, minute: u32) -> String {
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let h = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", h, minute, suffix)
}

/// Parse `HH:MM` (24-hour) or `h:mm AM` / `h:mm PM`
pub fn parse_alarm_time(input: &str) -> Result<Alarm> {
    let invalid = || LuminaraError::InvalidInput(format!("invalid alarm time '{}'", input));

    let upper = input.trim().to_uppercase();
    let (clock, meridiem) = if let Some(rest) = upper.strip_suffix("AM") {
        (rest.trim(), Some(false))
    } else if let Some(rest) = upper.strip_suffix("PM") {
        (rest.trim(), Some(true))
    } else {
        (upper.as_str(), None)
    };

    let (h, m) = clock.split_once(':').ok_or_else(invalid)?;
    let hour: u32 = h.trim().parse().map_err(|_| invalid())?;
    let minute: u32 = m.trim().parse().map_err(|_| invalid())?;

    let hour = match meridiem {
        None => hour,
        Some(_) if hour == 0 || hour > 12 => return Err(invalid()),
        Some(true) if hour == 12 => 12,
        Some(true) => hour + 12,
        Some(false) if hour == 12 => 0,
        Some(false) => hour,
    };
    Alarm::new(hour, minute)
}

/// Alarm list persisted as a JSON array
pub struct AlarmBook {
    path: PathBuf,
    alarms: Vec<Alarm>,
}

impl AlarmBook {
    /// Load from `path`; a missing file starts empty
    pub fn load(path: PathBuf) -> Result<Self> {
        let mut alarms: Vec<Alarm> = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Vec::new()
        };
        alarms.sort();
        Ok(Self { path, alarms })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.alarms)?)?;
        Ok(())
    }

    pub fn add(&mut self, alarm: Alarm) {
        self.alarms.push(alarm);
        self.alarms.sort();
    }

    /// Remove one alarm at this time; false if none was set
    pub fn remove(&mut self, alarm: Alarm) -> bool {
        match self.alarms.iter().position(|a| *a == alarm) {
            Some(index) => {
                self.alarms.remove(index);
                true
            }
            None => false,
        }
    }

    /// Sorted by hour then minute
    pub fn list(&self) -> &[Alarm] {
        &self.alarms
    }

    /// Alarms ringing at `now`: same hour and minute, on second zero
    pub fn due<T: Timelike>(&self, now: &T) -> Vec<Alarm> {
        if now.second() != 0 {
            return Vec::new();
        }
        self.alarms
            .iter()
            .filter(|a| a.hour == now.hour() && a.minute == now.minute())
            .copied()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_parse_24h_and_12h() {
        assert_eq!(parse_alarm_time("07:30").unwrap(), Alarm { hour: 7, minute: 30 });
        assert_eq!(parse_alarm_time("23:05").unwrap(), Alarm { hour: 23, minute: 5 });
        assert_eq!(parse_alarm_time("7:30 pm").unwrap(), Alarm { hour: 19, minute: 30 });
        assert_eq!(parse_alarm_time("12:00 AM").unwrap(), Alarm { hour: 0, minute: 0 });
        assert_eq!(parse_alarm_time("12:15PM").unwrap(), Alarm { hour: 12, minute: 15 });
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "7", "24:00", "13:00 PM", "0:30 AM", "ab:cd", "10:60"] {
            assert!(parse_alarm_time(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_format_12h() {
        assert_eq!(format_12h(0, 5), "12:05 AM");
        assert_eq!(format_12h(12, 0), "12:00 PM");
        assert_eq!(format_12h(18, 45), "6:45 PM");
        assert_eq!(Alarm { hour: 9, minute: 0 }.to_string(), "9:00 AM");
    }

    #[test]
    fn test_book_sorted_due_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("alarms.json");

        let mut book = AlarmBook::load(path.clone()).unwrap();
        assert!(book.is_empty());
        book.add(Alarm { hour: 14, minute: 0 });
        book.add(Alarm { hour: 6, minute: 30 });
        book.add(Alarm { hour: 6, minute: 15 });
        book.save().unwrap();

        let mut book = AlarmBook::load(path).unwrap();
        let hours: Vec<(u32, u32)> = book.list().iter().map(|a| (a.hour, a.minute)).collect();
        assert_eq!(hours, vec![(6, 15), (6, 30), (14, 0)]);

        let ring = NaiveTime::from_hms_opt(6, 30, 0).unwrap();
        let late = NaiveTime::from_hms_opt(6, 30, 1).unwrap();
        assert_eq!(book.due(&ring), vec![Alarm { hour: 6, minute: 30 }]);
        assert!(book.due(&late).is_empty());

        assert!(book.remove(Alarm { hour: 6, minute: 30 }));
        assert!(!book.remove(Alarm { hour: 6, minute: 30 }));
        assert!(book.due(&ring).is_empty());
    }
}
