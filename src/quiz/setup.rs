// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Interactive quiz setup for when no PDF is given on the command line

use std::io::{BufRead, Write};
use std::path::PathBuf;

use super::QuestionType;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSetup {
    pub path: PathBuf,
    pub question_type: QuestionType,
    pub char_limit: usize,
}

/// Ask for the document, question type and answer length.
///
/// A blank or non-numeric limit keeps `default_limit`; an unknown type choice
/// falls back to Long Answer.
pub fn prompt_setup<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    default_limit: usize,
) -> Result<QuizSetup> {
    writeln!(output, "--- PDF Question Generator Setup ---")?;
    let path = ask(input, output, "Enter path to PDF file: ")?;

    writeln!(output, "\nSelect Question Type:")?;
    writeln!(output, "1. MCQ")?;
    writeln!(output, "2. True/False")?;
    writeln!(output, "3. Long Answer (Default)")?;
    let choice = ask(input, output, "Choice (1-3): ")?;

    let limit = ask(
        input,
        output,
        &format!("\nEnter approximate character limit for answers (Default: {}): ", default_limit),
    )?;
    let char_limit = if !limit.is_empty() && limit.chars().all(|c| c.is_ascii_digit()) {
        limit.parse().unwrap_or(default_limit)
    } else {
        default_limit
    };

    Ok(QuizSetup {
        path: PathBuf::from(path),
        question_type: QuestionType::from_choice(&choice),
        char_limit,
    })
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> Result<String> {
    write!(output, "{}", prompt)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}
