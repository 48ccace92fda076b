//! Markdown extraction: split on blank-line paragraph boundaries.
//!
//! Only paragraphs containing at least one alphanumeric character are
//! emitted. Line numbers track a running cursor through the file rather than
//! a substring search, so repeated paragraph text gets the correct distinct
//! line number for each occurrence.

use crate::model::{ChunkDraft, ChunkKind};

pub fn extract(content: &str) -> Vec<ChunkDraft> {
    let lines: Vec<&str> = content.lines().collect();
    let mut drafts = Vec::new();

    let mut paragraph_lines: Vec<&str> = Vec::new();
    let mut paragraph_start: Option<usize> = None;

    let mut flush = |paragraph_lines: &mut Vec<&str>,
                     paragraph_start: &mut Option<usize>,
                     end_line: usize,
                     drafts: &mut Vec<ChunkDraft>| {
        if let Some(start) = paragraph_start.take() {
            let text = paragraph_lines.join("\n");
            if text.chars().any(|c| c.is_alphanumeric()) {
                drafts.push(ChunkDraft {
                    kind: ChunkKind::Doc,
                    language: "markdown".to_string(),
                    node_kind: "paragraph".to_string(),
                    container_path: String::new(),
                    start_line: start,
                    end_line,
                    content: text,
                    imports: Vec::new(),
                    symbols: Vec::new(),
                    exports: Vec::new(),
                });
            }
            paragraph_lines.clear();
        }
    };

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            flush(&mut paragraph_lines, &mut paragraph_start, line_no - 1, &mut drafts);
        } else {
            if paragraph_start.is_none() {
                paragraph_start = Some(line_no);
            }
            paragraph_lines.push(line);
        }
    }
    flush(&mut paragraph_lines, &mut paragraph_start, lines.len(), &mut drafts);

    drafts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_paragraphs_get_distinct_line_numbers() {
        let content = "Repeat me\n\nRepeat me\n\nRepeat me\n";
        let drafts = extract(content);
        assert_eq!(drafts.len(), 3);
        let start_lines: Vec<usize> = drafts.iter().map(|d| d.start_line).collect();
        assert_eq!(start_lines, vec![1, 3, 5]);
        for draft in &drafts {
            assert_eq!(draft.content, "Repeat me");
        }
    }

    #[test]
    fn blank_only_paragraphs_are_skipped() {
        let content = "---\n\n***\n\nreal text\n";
        let drafts = extract(content);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].content, "real text");
    }

    #[test]
    fn multi_line_paragraph_is_one_chunk() {
        let content = "line one\nline two\n\nnext paragraph\n";
        let drafts = extract(content);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].content, "line one\nline two");
        assert_eq!(drafts[0].start_line, 1);
        assert_eq!(drafts[0].end_line, 2);
    }
}
