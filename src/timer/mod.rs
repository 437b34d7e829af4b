// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Focus mode clocks
//!
//! Pure state machines: callers feed elapsed milliseconds from whatever
//! ticker they run (the CLI uses `tokio::time::interval`).

pub mod alarm;
pub mod countdown;
pub mod stopwatch;

pub use alarm::{format_12h, parse_alarm_time, Alarm, AlarmBook};
pub use countdown::{parse_hms, Countdown, Tick, PRESET_MINUTES};
pub use stopwatch::Stopwatch;

use std::io::BufRead;
use tokio::sync::mpsc;

/// Label for the start/pause control shared by both clocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonLabel {
    Start,
    Pause,
    Resume,
}

impl ButtonLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonLabel::Start => "Start",
            ButtonLabel::Pause => "Pause",
            ButtonLabel::Resume => "Resume",
        }
    }
}

impl std::fmt::Display for ButtonLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forward lines from a blocking reader (stdin for the interactive clocks).
///
/// Reads happen on a plain thread: a read still pending when the caller
/// finishes never holds up runtime shutdown. The channel closes at EOF.
pub fn spawn_line_reader<R>(reader: R) -> mpsc::UnboundedReceiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in reader.lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_line_reader_forwards_then_closes() {
        let mut lines = spawn_line_reader(std::io::Cursor::new("\nlap\n"));
        assert_eq!(lines.recv().await.as_deref(), Some(""));
        assert_eq!(lines.recv().await.as_deref(), Some("lap"));
        assert_eq!(lines.recv().await, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_line_reader_does_not_block_on_exit() {
        let (_keep_open, reader) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut lines = spawn_line_reader(std::io::BufReader::new(reader));
        let pending = tokio::time::timeout(std::time::Duration::from_millis(50), lines.recv()).await;
        assert!(pending.is_err());
        drop(lines);
    }

    #[test]
    fn test_button_label_text() {
        assert_eq!(ButtonLabel::Resume.to_string(), "Resume");
    }
}
