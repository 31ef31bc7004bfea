//! PDF text extraction, page by page

use lopdf::Document;

use crate::error::{Result, ToolsError};

/// Text of every page in page order. A page whose text cannot be decoded
/// yields an empty string rather than failing the whole document.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>> {
    let doc = Document::load_mem(bytes).map_err(|e| ToolsError::Pdf(e.to_string()))?;

    Ok(doc
        .get_pages()
        .into_keys()
        .map(|page| match doc.extract_text(&[page]) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(page, error = %e, "No text extracted from PDF page");
                String::new()
            }
        })
        .collect())
}

/// [`extract_pages`] on the blocking pool; a parser panic becomes `ToolsError::Pdf`.
pub async fn extract_pages_blocking(bytes: Vec<u8>) -> Result<Vec<String>> {
    tokio::task::spawn_blocking(move || extract_pages(&bytes))
        .await
        .map_err(|e| ToolsError::Pdf(e.to_string()))?
}

/// Tool-facing rendering: a header with the page count, then each page
/// under its own marker.
pub fn format_pages(filename: &str, pages: &[String]) -> String {
    let mut out = format!("PDF File: {} ({} pages)\n\n", filename, pages.len());
    for (i, text) in pages.iter().enumerate() {
        out.push_str(&format!("\n--- Page {} ---\n", i + 1));
        let text = text.trim();
        out.push_str(if text.is_empty() { "[No extractable text on this page]" } else { text });
    }
    out
}
