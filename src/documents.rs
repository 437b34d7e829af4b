// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Text extraction from study material (PDFs and plain-text notes)

use std::path::Path;
use tracing::{debug, warn};

use crate::{LuminaraError, Result};

/// Extensions accepted as plain-text notes
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Check whether a path looks like something we can read
pub fn is_supported(path: &Path) -> bool {
    match extension(path).as_deref() {
        Some("pdf") => true,
        Some(ext) => TEXT_EXTENSIONS.contains(&ext),
        None => false,
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Extract text page by page.
///
/// Plain-text files come back as a single page.
pub fn extract_pages(path: &Path) -> Result<Vec<String>> {
    match extension(path).as_deref() {
        Some("pdf") => extract_pdf_pages(path),
        Some(ext) if TEXT_EXTENSIONS.contains(&ext) => {
            Ok(vec![std::fs::read_to_string(path)?])
        }
        _ => Err(LuminaraError::UnsupportedFileType(path.display().to_string())),
    }
}

/// Extract the whole document as one string, each page followed by a newline
pub fn extract_text(path: &Path) -> Result<String> {
    let pages = extract_pages(path)?;
    let mut text = String::new();
    for page in pages {
        text.push_str(&page);
        text.push('\n');
    }
    Ok(text)
}

fn extract_pdf_pages(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path)?;
    let doc = lopdf::Document::load_mem(&bytes)
        .map_err(|e| LuminaraError::Pdf(format!("Failed to load PDF: {}", e)))?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(text) => pages.push(text),
            Err(e) => {
                debug!("No text on page {}: {}", page_number, e);
                pages.push(String::new());
            }
        }
    }

    if pages.iter().all(|p| p.trim().is_empty()) {
        // Some encodings defeat per-page extraction; try the whole document
        match pdf_extract::extract_text_from_mem(&bytes) {
            Ok(text) if !text.trim().is_empty() => {
                debug!("Falling back to whole-document extraction for {:?}", path);
                return Ok(text.split('\u{c}').map(str::to_string).collect());
            }
            Ok(_) => warn!("No extractable text in {:?}", path),
            Err(e) => warn!("Text extraction failed for {:?}: {}", path, e),
        }
    }

    Ok(pages)
}

/// Get document metadata (page count, title, author, subject)
pub fn metadata(path: &Path) -> Result<serde_json::Value> {
    if extension(path).as_deref() != Some("pdf") {
        let text = std::fs::read_to_string(path)?;
        return Ok(serde_json::json!({
            "page_count": 1,
            "word_count": text.split_whitespace().count(),
        }));
    }

    let bytes = std::fs::read(path)?;
    let doc = lopdf::Document::load_mem(&bytes)
        .map_err(|e| LuminaraError::Pdf(format!("Failed to load PDF: {}", e)))?;

    let mut metadata = serde_json::json!({
        "page_count": doc.get_pages().len(),
    });

    if let Ok(info) = doc.trailer.get(b"Info") {
        if let Ok(info_ref) = info.as_reference() {
            if let Ok(info_dict) = doc.get_dictionary(info_ref) {
                for (key, field) in [("Title", "title"), ("Author", "author"), ("Subject", "subject")] {
                    if let Ok(value) = info_dict.get(key.as_bytes()).and_then(|v| v.as_str()) {
                        metadata[field] =
                            serde_json::Value::String(String::from_utf8_lossy(value).to_string());
                    }
                }
            }
        }
    }

    Ok(metadata)
}

/// Calculate a content hash so unchanged files can be recognised
pub fn file_hash(path: &Path) -> Result<String> {
    let data = std::fs::read(path)?;
    Ok(blake3::hash(&data).to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    fn write_pdf(path: &Path, page_texts: &[&str]) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in page_texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_text_file_is_single_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# Osmosis\nWater moves across a membrane.").unwrap();

        let pages = extract_pages(&path).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains("Osmosis"));
        assert!(extract_text(&path).unwrap().ends_with('\n'));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slides.pptx");
        std::fs::write(&path, b"binary").unwrap();

        assert!(matches!(
            extract_pages(&path),
            Err(LuminaraError::UnsupportedFileType(_))
        ));
        assert!(!is_supported(&path));
    }

    #[test]
    fn test_pdf_page_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lecture.pdf");
        write_pdf(&path, &["Mitochondria", "Ribosomes"]);

        let meta = metadata(&path).unwrap();
        assert_eq!(meta["page_count"], 2);
        assert!(!extract_pages(&path).unwrap().is_empty());
        assert!(is_supported(&path));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(extract_pages(&dir.path().join("gone.pdf")).is_err());
    }

    #[test]
    fn test_file_hash_stable() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, "same").unwrap();
        std::fs::write(&b, "same").unwrap();
        assert_eq!(file_hash(&a).unwrap(), file_hash(&b).unwrap());
        assert_eq!(file_hash(&a).unwrap().len(), 64);
    }
}
