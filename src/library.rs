// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! The PDF library folder

use chrono::{Local, Utc};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::Result;

const SAFE_CHARS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._- ()";

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// PDF file names in `dir`, sorted case-insensitively. A missing folder is empty.
pub fn list_pdfs(dir: &Path) -> Result<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_pdf(p))
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
        .collect();

    names.sort_by_key(|n| n.to_lowercase());
    Ok(names)
}

/// Case-insensitive substring filter over library names
pub fn filter<'a>(names: &'a [String], query: &str) -> Vec<&'a String> {
    let query = query.trim().to_lowercase();
    names.iter().filter(|n| n.to_lowercase().contains(&query)).collect()
}

/// Strip characters that misbehave in file names on common platforms.
/// A name with nothing usable left before its extension becomes
/// `file_<unix seconds>` and keeps the extension.
pub fn safe_filename(name: &str) -> String {
    let cleaned: String = name.chars().filter(|c| SAFE_CHARS.contains(*c)).collect();
    let cleaned = cleaned.trim();
    let fallback = || format!("file_{}", Utc::now().timestamp());

    if cleaned.chars().all(|c| c == '.') {
        return fallback();
    }
    match cleaned.rsplit_once('.') {
        Some((stem, ext)) if stem.trim().is_empty() && !ext.is_empty() => {
            format!("{}.{}", fallback(), ext)
        }
        _ => cleaned.to_string(),
    }
}

/// First free path for `name` in `dir`: the name itself, then
/// `<stem>_<HHMMSS>`, then `<stem>_<HHMMSS>_<n>`
fn free_target(dir: &Path, name: &str) -> PathBuf {
    let target = dir.join(name);
    if !target.exists() {
        return target;
    }

    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("pdf");
    let timestamp = Local::now().format("%H%M%S").to_string();

    let mut candidate = dir.join(format!("{}_{}.{}", stem, timestamp, ext));
    let mut counter = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{}_{}_{}.{}", stem, timestamp, counter, ext));
        counter += 1;
    }
    candidate
}

/// Copy PDFs into the library, returning their new locations
pub fn import_pdfs(paths: &[PathBuf], library_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(library_dir)?;
    let mut imported = Vec::new();

    for source in paths {
        if !is_pdf(source) {
            warn!("Skipping non-PDF file: {:?}", source);
            continue;
        }

        let raw_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let target = free_target(library_dir, &safe_filename(raw_name));

        std::fs::copy(source, &target)?;
        info!("Added to library: {:?}", target);
        imported.push(target);
    }

    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_pdfs_sorted_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["beta.pdf", "Alpha.PDF", "notes.txt", "gamma.pdf"] {
            std::fs::write(dir.path().join(name), b"%PDF").unwrap();
        }
        std::fs::create_dir(dir.path().join("folder.pdf")).unwrap();

        let names = list_pdfs(dir.path()).unwrap();
        assert_eq!(names, vec!["Alpha.PDF", "beta.pdf", "gamma.pdf"]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_pdfs(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_filter() {
        let names = vec!["Organic Chemistry.pdf".to_string(), "Calculus.pdf".to_string()];
        let hits = filter(&names, "CHEM");
        assert_eq!(hits, vec![&names[0]]);
        assert_eq!(filter(&names, "").len(), 2);
    }

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename("Lecture #3: Cells (v2).pdf"), "Lecture 3 Cells (v2).pdf");
        assert!(safe_filename("???").starts_with("file_"));
        assert!(!safe_filename("..").contains(".."));

        let renamed = safe_filename("講義.pdf");
        assert!(renamed.starts_with("file_"));
        assert!(renamed.ends_with(".pdf"));
    }

    #[test]
    fn test_import_non_ascii_name_stays_listed() {
        let src = tempfile::tempdir().unwrap();
        let lib = tempfile::tempdir().unwrap();
        let pdf = src.path().join("講義.pdf");
        std::fs::write(&pdf, b"%PDF-1.5").unwrap();

        let imported = import_pdfs(&[pdf], lib.path()).unwrap();
        assert_eq!(imported.len(), 1);
        let names = list_pdfs(lib.path()).unwrap();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("file_"));
    }

    #[test]
    fn test_import_same_name_three_times_keeps_all() {
        let lib = tempfile::tempdir().unwrap();
        let sources: Vec<_> = (0..3).map(|_| tempfile::tempdir().unwrap()).collect();
        let paths: Vec<PathBuf> = sources
            .iter()
            .enumerate()
            .map(|(i, dir)| {
                let path = dir.path().join("week1.pdf");
                std::fs::write(&path, format!("%PDF-1.5 copy {}", i)).unwrap();
                path
            })
            .collect();

        let imported = import_pdfs(&paths, lib.path()).unwrap();
        assert_eq!(imported.len(), 3);
        assert_eq!(list_pdfs(lib.path()).unwrap().len(), 3);

        let mut contents: Vec<String> = imported
            .iter()
            .map(|p| std::fs::read_to_string(p).unwrap())
            .collect();
        contents.sort();
        assert_eq!(
            contents,
            vec!["%PDF-1.5 copy 0", "%PDF-1.5 copy 1", "%PDF-1.5 copy 2"]
        );
    }

    #[test]
    fn test_import_handles_collisions_and_skips_non_pdf() {
        let src = tempfile::tempdir().unwrap();
        let lib = tempfile::tempdir().unwrap();
        let pdf = src.path().join("week1.pdf");
        let txt = src.path().join("todo.txt");
        std::fs::write(&pdf, b"%PDF-1.5").unwrap();
        std::fs::write(&txt, b"todo").unwrap();

        let first = import_pdfs(&[pdf.clone(), txt], lib.path()).unwrap();
        assert_eq!(first, vec![lib.path().join("week1.pdf")]);

        let second = import_pdfs(&[pdf], lib.path()).unwrap();
        assert_eq!(second.len(), 1);
        assert_ne!(second[0], first[0]);
        assert!(second[0].file_name().unwrap().to_str().unwrap().starts_with("week1_"));
        assert_eq!(list_pdfs(lib.path()).unwrap().len(), 2);
    }
}
