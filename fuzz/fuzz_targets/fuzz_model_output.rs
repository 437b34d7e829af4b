// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use libfuzzer_sys::fuzz_target;
use luminara::cheatsheet::extract::parse_extraction;
use luminara::quiz::{parse_questions, QuestionType};

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        let _ = parse_extraction(raw);
        let _ = parse_questions(raw, QuestionType::Mcq);
    }
});
