//! YAML extraction: split on the document separator, then split each
//! document into non-empty lines; each non-empty line becomes a chunk.

use crate::model::{ChunkDraft, ChunkKind};

pub fn extract(content: &str) -> Vec<ChunkDraft> {
    let mut drafts = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let line_no = line_no + 1;
        if line == "---" {
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        drafts.push(ChunkDraft {
            kind: ChunkKind::Doc,
            language: "yaml".to_string(),
            node_kind: "line".to_string(),
            container_path: String::new(),
            start_line: line_no,
            end_line: line_no,
            content: line.to_string(),
            imports: Vec::new(),
            symbols: Vec::new(),
            exports: Vec::new(),
        });
    }

    drafts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_documents_on_separator() {
        let content = "---\nkey: value\n---\nother: thing\n";
        let drafts = extract(content);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].content, "key: value");
        assert_eq!(drafts[0].start_line, 2);
        assert_eq!(drafts[1].content, "other: thing");
        assert_eq!(drafts[1].start_line, 4);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let content = "a: 1\n\nb: 2\n";
        let drafts = extract(content);
        assert_eq!(drafts.len(), 2);
    }
}
