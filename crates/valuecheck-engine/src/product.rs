//! Product facts supplied by the caller and the shared prompt projection.

use serde::{Deserialize, Serialize};

use valuecheck_utils::error::AssessmentError;

/// Maximum characters kept from one extracted document
pub const MAX_DOCUMENT_CHARS: usize = 3000;

/// Appended to document text cut at [`MAX_DOCUMENT_CHARS`]
pub const DOCUMENT_TRUNCATION_MARKER: &str = "...[truncated]";

/// Text extracted from one supporting document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentText {
    pub filename: String,
    pub text: String,
}

impl DocumentText {
    /// Trim `text` and cap it at [`MAX_DOCUMENT_CHARS`], marking the cut.
    #[must_use]
    pub fn capped(filename: impl Into<String>, text: &str) -> Self {
        let trimmed = text.trim();
        let text = if trimmed.chars().count() > MAX_DOCUMENT_CHARS {
            let head: String = trimmed.chars().take(MAX_DOCUMENT_CHARS).collect();
            format!("{}{DOCUMENT_TRUNCATION_MARKER}", head.trim_end())
        } else {
            trimmed.to_string()
        };

        Self {
            filename: filename.into(),
            text,
        }
    }
}

/// Everything known about the product under assessment.
///
/// Read-only once an assessment starts. `alternatives` and `documents`
/// accept the `nbaProducts` and `extractedTexts` spellings used by older
/// input files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    #[serde(default, alias = "nbaProducts", skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    #[serde(default, alias = "extractedTexts", skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<DocumentText>,
}

impl ProductInput {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_alternatives(mut self, alternatives: impl Into<String>) -> Self {
        self.alternatives = Some(alternatives.into());
        self
    }

    #[must_use]
    pub fn with_additional_info(mut self, info: impl Into<String>) -> Self {
        self.additional_info = Some(info.into());
        self
    }

    #[must_use]
    pub fn with_document(mut self, document: DocumentText) -> Self {
        self.documents.push(document);
        self
    }

    /// Name and description must both be non-blank.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::Validation` naming the missing field.
    pub fn validate(&self) -> Result<(), AssessmentError> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AssessmentError::Validation(format!(
                "product {} must not be empty",
                missing.join(" and ")
            )))
        }
    }
}

/// Flattened product facts quoted by every prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseInfo {
    pub name: String,
    pub description: String,
    pub alternatives: String,
    pub additional_info: String,
    pub docs: String,
}

impl BaseInfo {
    /// Build the projection, quoting at most `excerpt_chars` of each document.
    #[must_use]
    pub fn from_product(product: &ProductInput, excerpt_chars: usize) -> Self {
        let docs = if product.documents.is_empty() {
            "None".to_string()
        } else {
            product
                .documents
                .iter()
                .map(|doc| {
                    let excerpt: String = doc.text.chars().take(excerpt_chars).collect();
                    format!("{}: {excerpt}...", doc.filename)
                })
                .collect::<Vec<_>>()
                .join(" | ")
        };

        Self {
            name: product.name.trim().to_string(),
            description: product.description.trim().to_string(),
            alternatives: non_blank(product.alternatives.as_deref())
                .unwrap_or("None specified")
                .to_string(),
            additional_info: non_blank(product.additional_info.as_deref())
                .unwrap_or("None provided")
                .to_string(),
            docs,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_blank_fields() {
        let err = ProductInput::new("  ", "").validate().unwrap_err();
        assert!(matches!(err, AssessmentError::Validation(msg) if msg.contains("name and description")));

        let err = ProductInput::new("EcoBike", " ").validate().unwrap_err();
        assert!(matches!(err, AssessmentError::Validation(msg) if msg.contains("description")));

        assert!(ProductInput::new("EcoBike", "electric bike").validate().is_ok());
    }

    #[test]
    fn base_info_uses_placeholders() {
        let base = BaseInfo::from_product(&ProductInput::new("EcoBike", "electric bike"), 500);
        assert_eq!(base.alternatives, "None specified");
        assert_eq!(base.additional_info, "None provided");
        assert_eq!(base.docs, "None");
    }

    #[test]
    fn base_info_quotes_document_excerpts() {
        let product = ProductInput::new("EcoBike", "electric bike")
            .with_alternatives("City bikes")
            .with_document(DocumentText::capped("datasheet.txt", "abcdefghij"))
            .with_document(DocumentText::capped("notes.md", "xyz"));

        let base = BaseInfo::from_product(&product, 4);
        assert_eq!(base.alternatives, "City bikes");
        assert_eq!(base.docs, "datasheet.txt: abcd... | notes.md: xyz...");
    }

    #[test]
    fn capped_documents_carry_marker() {
        let long = "a".repeat(MAX_DOCUMENT_CHARS + 10);
        let doc = DocumentText::capped("big.txt", &long);
        assert!(doc.text.ends_with(DOCUMENT_TRUNCATION_MARKER));
        assert_eq!(
            doc.text.chars().count(),
            MAX_DOCUMENT_CHARS + DOCUMENT_TRUNCATION_MARKER.len()
        );

        let short = DocumentText::capped("small.txt", "  hello  ");
        assert_eq!(short.text, "hello");
    }

    #[test]
    fn input_accepts_legacy_field_names() {
        let product: ProductInput = serde_json::from_str(
            r#"{"name":"EcoBike","description":"bike","nbaProducts":"Vanmoof","extractedTexts":[{"filename":"a.txt","text":"t"}]}"#,
        )
        .unwrap();
        assert_eq!(product.alternatives.as_deref(), Some("Vanmoof"));
        assert_eq!(product.documents.len(), 1);
    }
}
