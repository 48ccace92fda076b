//! Plain-text / properties-style extraction: each non-blank line is a chunk.
//! The fallback shallow-format splitter used by JSON content that isn't a
//! recognizable object or array.

use crate::model::{ChunkDraft, ChunkKind};

pub fn extract(content: &str) -> Vec<ChunkDraft> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| ChunkDraft {
            kind: ChunkKind::Doc,
            language: "plaintext".to_string(),
            node_kind: "line".to_string(),
            container_path: String::new(),
            start_line: idx + 1,
            end_line: idx + 1,
            content: line.to_string(),
            imports: Vec::new(),
            symbols: Vec::new(),
            exports: Vec::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_nonblank_line_becomes_a_chunk() {
        let content = "line one\n\nline two\n";
        let drafts = extract(content);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].start_line, 1);
        assert_eq!(drafts[1].start_line, 3);
    }
}
