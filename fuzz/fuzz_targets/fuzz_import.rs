// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use libfuzzer_sys::fuzz_target;
use luminara::notes::parse_export;

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) {
        let (notes, qna) = parse_export(&value);
        assert!(notes.iter().all(|n| !n.content.is_empty() && !n.title.is_empty()));
        assert!(qna.iter().all(|q| !q.question.is_empty()));
    }
});
