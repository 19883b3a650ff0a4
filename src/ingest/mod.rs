pub mod chunking;

pub use chunking::{chunk_pages, DocumentChunk};

use lopdf::{Document, Object};
use tracing::{debug, warn};

use crate::error::ServiceError;

/// Text extracted from a single PDF page.
#[derive(Debug, Clone)]
pub struct PageText {
    /// 1-based page number.
    pub page: u32,
    pub text: String,
}

/// Extract page-tagged text from PDF bytes.
///
/// Decodes each page's content stream and collects the string operands of
/// the `Tj`/`TJ` text-showing operators. Pages that fail to decode are
/// skipped with a warning; the document as a whole only fails when it
/// cannot be parsed at all.
pub fn extract_pdf(name: &str, bytes: &[u8]) -> Result<Vec<PageText>, ServiceError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| ServiceError::Ingestion(format!("cannot parse '{name}': {e}")))?;

    let mut pages = Vec::new();
    for (&page_number, &page_id) in doc.get_pages().iter() {
        let content = match doc.get_page_content(page_id) {
            Ok(c) => c,
            Err(e) => {
                warn!(name, page = page_number, "unreadable page content: {e}");
                continue;
            }
        };
        let content = match lopdf::content::Content::decode(&content) {
            Ok(c) => c,
            Err(e) => {
                warn!(name, page = page_number, "undecodable content stream: {e}");
                continue;
            }
        };

        let mut text = String::new();
        for operation in content.operations {
            match operation.operator.as_str() {
                "Tj" => {
                    for operand in &operation.operands {
                        push_text_operand(operand, &mut text);
                    }
                }
                "TJ" => {
                    for operand in &operation.operands {
                        if let Object::Array(parts) = operand {
                            for part in parts {
                                push_text_operand(part, &mut text);
                            }
                        }
                    }
                }
                // Text-positioning operators that imply a line break.
                "Td" | "TD" | "T*" => {
                    if !text.ends_with('\n') && !text.is_empty() {
                        text.push('\n');
                    }
                }
                _ => {}
            }
        }

        let text = text.trim().to_string();
        if !text.is_empty() {
            pages.push(PageText {
                page: page_number,
                text,
            });
        }
    }

    debug!(name, pages = pages.len(), "extracted pdf text");
    Ok(pages)
}

fn push_text_operand(operand: &Object, out: &mut String) {
    if let Object::String(bytes, _) = operand {
        if let Ok(text) = std::str::from_utf8(bytes) {
            out.push_str(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_as_ingestion_error() {
        let err = extract_pdf("junk.pdf", b"not a pdf at all").unwrap_err();
        assert!(matches!(err, ServiceError::Ingestion(_)));
    }

    #[test]
    fn empty_input_fails() {
        assert!(extract_pdf("empty.pdf", b"").is_err());
    }
}
