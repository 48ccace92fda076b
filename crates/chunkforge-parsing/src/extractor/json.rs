//! JSON extraction: reasonable per-element splits with accurate start/end
//! lines. Splits the top-level object's properties (or array's elements)
//! on depth-1 commas, tracking string/escape state so commas inside string
//! values don't fool the splitter.

use crate::model::{ChunkDraft, ChunkKind};

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    depth: i32,
    in_string: bool,
    escape: bool,
}

impl<'a> Scanner<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            bytes: content.as_bytes(),
            pos: 0,
            line: 1,
            depth: 0,
            in_string: false,
            escape: false,
        }
    }

    fn advance(&mut self) -> Option<u8> {
        let byte = *self.bytes.get(self.pos)?;
        self.pos += 1;
        if byte == b'\n' {
            self.line += 1;
        }
        if self.in_string {
            if self.escape {
                self.escape = false;
            } else if byte == b'\\' {
                self.escape = true;
            } else if byte == b'"' {
                self.in_string = false;
            }
        } else {
            match byte {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => self.depth -= 1,
                _ => {}
            }
        }
        Some(byte)
    }
}

pub fn extract(content: &str) -> Vec<ChunkDraft> {
    let trimmed = content.trim_start();
    if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
        return super::plain::extract(content);
    }

    let mut scanner = Scanner::new(content);
    let mut drafts = Vec::new();

    let mut element_start_byte: Option<usize> = None;
    let mut element_start_line = 1;

    while let Some(byte) = scanner.advance() {
        let depth_after = scanner.depth;
        let before_in_string = scanner.in_string;

        if depth_after == 1 && !before_in_string && element_start_byte.is_none() {
            if matches!(byte, b'{' | b'[') {
                // entering the top-level container; element starts after it
                element_start_byte = Some(scanner.pos);
                element_start_line = scanner.line;
            }
        } else if depth_after == 1 && !before_in_string && byte == b',' {
            if let Some(start) = element_start_byte.take() {
                push_element(content, start, scanner.pos - 1, element_start_line, scanner.line, &mut drafts);
            }
            element_start_byte = Some(scanner.pos);
            element_start_line = scanner.line;
        } else if depth_after == 0 && !before_in_string && matches!(byte, b'}' | b']') {
            if let Some(start) = element_start_byte.take() {
                push_element(content, start, scanner.pos - 1, element_start_line, scanner.line, &mut drafts);
            }
        }
    }

    if drafts.is_empty() {
        return super::plain::extract(content);
    }

    drafts
}

fn push_element(
    content: &str,
    start_byte: usize,
    end_byte: usize,
    start_line: usize,
    end_line: usize,
    drafts: &mut Vec<ChunkDraft>,
) {
    if end_byte <= start_byte {
        return;
    }
    let text = content[start_byte..end_byte].trim();
    if text.is_empty() {
        return;
    }
    drafts.push(ChunkDraft {
        kind: ChunkKind::Code,
        language: "json".to_string(),
        node_kind: "property".to_string(),
        container_path: String::new(),
        start_line,
        end_line,
        content: text.to_string(),
        imports: Vec::new(),
        symbols: Vec::new(),
        exports: Vec::new(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_top_level_object_properties() {
        let content = "{\n  \"a\": 1,\n  \"b\": 2\n}\n";
        let drafts = extract(content);
        assert_eq!(drafts.len(), 2);
        assert!(drafts[0].content.contains("\"a\": 1"));
        assert!(drafts[1].content.contains("\"b\": 2"));
    }

    #[test]
    fn commas_inside_string_values_do_not_split() {
        let content = "{\n  \"a\": \"x,y\",\n  \"b\": 2\n}\n";
        let drafts = extract(content);
        assert_eq!(drafts.len(), 2);
        assert!(drafts[0].content.contains("x,y"));
    }

    #[test]
    fn splits_top_level_array_elements() {
        let content = "[1, 2, 3]";
        let drafts = extract(content);
        assert_eq!(drafts.len(), 3);
    }
}
