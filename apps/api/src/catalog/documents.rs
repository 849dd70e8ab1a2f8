//! Text extraction for uploaded documents (course syllabi, student submissions).

use tracing::{info, warn};

use crate::errors::AppError;

const PDF_EXTRACT_FAILED: &str =
    "Failed to extract text from PDF. Please ensure the file is a valid PDF.";

/// Extracts plain text from an uploaded document.
/// PDFs go through `pdf-extract` on the blocking pool; anything else is read as UTF-8.
pub async fn extract_document_text(
    content_type: Option<&str>,
    file_name: Option<&str>,
    bytes: Vec<u8>,
) -> Result<String, AppError> {
    if !is_pdf(content_type, file_name) {
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }

    let size = bytes.len();
    let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| {
            warn!("PDF extraction task aborted: {e}");
            AppError::Validation(PDF_EXTRACT_FAILED.to_string())
        })?
        .map_err(|e| {
            warn!("PDF extraction error: {e}");
            AppError::Validation(PDF_EXTRACT_FAILED.to_string())
        })?;

    info!(
        "Extracted {} characters from {size}-byte PDF",
        extracted.chars().count()
    );
    Ok(extracted)
}

pub fn is_pdf(content_type: Option<&str>, file_name: Option<&str>) -> bool {
    content_type == Some("application/pdf")
        || file_name.is_some_and(|n| n.to_ascii_lowercase().ends_with(".pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf_by_content_type_or_extension() {
        assert!(is_pdf(Some("application/pdf"), None));
        assert!(is_pdf(None, Some("Syllabus.PDF")));
        assert!(!is_pdf(Some("text/plain"), Some("syllabus.txt")));
        assert!(!is_pdf(None, None));
    }

    #[tokio::test]
    async fn test_plain_text_is_read_directly() {
        let text = extract_document_text(
            Some("text/plain"),
            Some("syllabus.txt"),
            b"Week 1: Introduction".to_vec(),
        )
        .await
        .unwrap();
        assert_eq!(text, "Week 1: Introduction");
    }

    #[tokio::test]
    async fn test_invalid_pdf_is_validation_error() {
        let err = extract_document_text(
            Some("application/pdf"),
            Some("syllabus.pdf"),
            b"definitely not a pdf".to_vec(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
