//! Supporting document text extraction
//!
//! Turns the files passed with `--doc` into [`DocumentText`] entries. Only
//! UTF-8 text is read. Anything else (PDFs, office formats, unreadable paths)
//! becomes a short placeholder so one bad file never fails the batch.

use std::path::Path;

use tracing::{debug, warn};

use valuecheck_engine::DocumentText;

/// Text recorded for a file whose content could not be extracted
pub const UNSUPPORTED_PLACEHOLDER: &str = "[content could not be extracted]";

/// Extract text from every file in `paths`, preserving order.
#[must_use]
pub fn extract_documents<P: AsRef<Path>>(paths: &[P]) -> Vec<DocumentText> {
    paths.iter().map(|p| extract_document(p.as_ref())).collect()
}

/// Extract text from one file.
///
/// The filename is the final path component; the full path is only logged.
#[must_use]
pub fn extract_document(path: &Path) -> DocumentText {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if is_binary_format(path) {
        debug!(path = %path.display(), "Skipping binary document format");
        return DocumentText::capped(filename, UNSUPPORTED_PLACEHOLDER);
    }

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read document");
            return DocumentText::capped(filename, UNSUPPORTED_PLACEHOLDER);
        }
    };

    match String::from_utf8(bytes) {
        Ok(text) => DocumentText::capped(filename, &text),
        Err(_) => {
            warn!(path = %path.display(), "Document is not UTF-8 text");
            DocumentText::capped(filename, UNSUPPORTED_PLACEHOLDER)
        }
    }
}

fn is_binary_format(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            matches!(
                ext.to_ascii_lowercase().as_str(),
                "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "png" | "jpg" | "jpeg"
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use valuecheck_engine::product::{DOCUMENT_TRUNCATION_MARKER, MAX_DOCUMENT_CHARS};

    #[test]
    fn test_reads_text_file_trimmed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("datasheet.txt");
        fs::write(&path, "\n  Frame: 80% recycled aluminium  \n").unwrap();

        let doc = extract_document(&path);
        assert_eq!(doc.filename, "datasheet.txt");
        assert_eq!(doc.text, "Frame: 80% recycled aluminium");
    }

    #[test]
    fn test_long_file_is_capped_with_marker() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lca.md");
        fs::write(&path, "x".repeat(MAX_DOCUMENT_CHARS + 500)).unwrap();

        let doc = extract_document(&path);
        assert!(doc.text.ends_with(DOCUMENT_TRUNCATION_MARKER));
        assert_eq!(
            doc.text.chars().count(),
            MAX_DOCUMENT_CHARS + DOCUMENT_TRUNCATION_MARKER.chars().count()
        );
    }

    #[test]
    fn test_bad_files_yield_placeholders_without_failing_batch() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("notes.txt");
        let binary = dir.path().join("blob.bin");
        let pdf = dir.path().join("brochure.pdf");
        let missing = dir.path().join("missing.txt");
        fs::write(&good, "Warranty: 5 years").unwrap();
        fs::write(&binary, [0xff, 0xfe, 0x00, 0x80]).unwrap();
        fs::write(&pdf, "%PDF-1.7").unwrap();

        let docs = extract_documents(&[&good, &binary, &pdf, &missing]);
        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Warranty: 5 years",
                UNSUPPORTED_PLACEHOLDER,
                UNSUPPORTED_PLACEHOLDER,
                UNSUPPORTED_PLACEHOLDER
            ]
        );
        assert_eq!(docs[2].filename, "brochure.pdf");
    }

    #[test]
    fn test_empty_list() {
        let paths: [&Path; 0] = [];
        assert!(extract_documents(&paths).is_empty());
    }
}
