use super::PageText;

/// A bounded span of document text ready for indexing.
#[derive(Debug, Clone)]
pub struct DocumentChunk {
    pub text: String,
    /// 1-based page the chunk starts on.
    pub page: u32,
    /// File name of the uploaded document.
    pub source: String,
    /// Position of the chunk within its document.
    pub index: usize,
}

/// Split extracted pages into overlapping character windows.
///
/// Windows are `chunk_size` characters with `overlap` characters carried
/// into the next chunk so that context spanning a boundary survives in at
/// least one chunk. Breaks prefer whitespace near the window edge to avoid
/// splitting words. Chunks never cross page boundaries, which keeps the
/// page tag exact for citations.
pub fn chunk_pages(
    source: &str,
    pages: &[PageText],
    chunk_size: usize,
    overlap: usize,
) -> Vec<DocumentChunk> {
    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size.saturating_sub(1));

    let mut chunks = Vec::new();
    for page in pages {
        let chars: Vec<char> = page.text.chars().collect();
        if chars.is_empty() {
            continue;
        }

        let mut start = 0;
        while start < chars.len() {
            let hard_end = (start + chunk_size).min(chars.len());
            let end = if hard_end < chars.len() {
                break_at_whitespace(&chars, start, hard_end)
            } else {
                hard_end
            };

            let text: String = chars[start..end].iter().collect();
            let text = text.trim().to_string();
            if !text.is_empty() {
                chunks.push(DocumentChunk {
                    text,
                    page: page.page,
                    source: source.to_string(),
                    index: chunks.len(),
                });
            }

            if end >= chars.len() {
                break;
            }
            start = end.saturating_sub(overlap).max(start + 1);
        }
    }
    chunks
}

/// Walk back from `hard_end` looking for whitespace to break on, giving up
/// after a quarter of the window and splitting mid-word instead.
fn break_at_whitespace(chars: &[char], start: usize, hard_end: usize) -> usize {
    let window = hard_end - start;
    let floor = hard_end - (window / 4).max(1);
    let mut end = hard_end;
    while end > floor {
        if chars[end - 1].is_whitespace() {
            return end;
        }
        end -= 1;
    }
    hard_end
}
