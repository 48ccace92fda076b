//! The Language Extractor (C2): converts one file's raw bytes into an
//! ordered sequence of [`Chunk`]s.

mod imports;
mod json;
mod markdown;
mod plain;
mod tree_sitter;
mod yaml;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::binary::looks_binary;
use crate::error::ParsingError;
use crate::hashing::git_file_hash;
use crate::languages::{get_language_for_path, LanguageBackend};
use crate::model::Chunk;

/// Metrics recorded per extraction invocation; aggregated by the parser pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionMetrics {
    pub files_processed: usize,
    pub files_failed: usize,
    pub chunks_created: usize,
    pub chunks_skipped: usize,
    /// Byte size of every emitted chunk's content, for a size distribution.
    pub chunk_sizes: Vec<usize>,
    pub language: String,
}

/// Result of extracting a single file.
pub struct ExtractionOutcome {
    pub chunks: Vec<Chunk>,
    pub metrics: ExtractionMetrics,
}

/// Convert one file's raw bytes into Chunks.
///
/// # Errors
/// Returns [`ParsingError::UnsupportedExtension`] for files with no
/// registered language (including files sniffed as binary), or
/// [`ParsingError::ParseError`] if the language's extractor fails outright.
pub fn extract(
    raw_bytes: &[u8],
    file_path: &str,
    git_branch: &str,
    max_chunk_size_bytes: usize,
) -> Result<ExtractionOutcome, ParsingError> {
    if looks_binary(raw_bytes) {
        return Err(ParsingError::unsupported_extension("<binary>"));
    }

    let config = get_language_for_path(file_path).ok_or_else(|| {
        let ext = file_path.rsplit_once('.').map_or("", |(_, e)| e);
        ParsingError::unsupported_extension(ext)
    })?;

    let content = decode_text(raw_bytes, file_path)?;

    let git_hash = git_file_hash(raw_bytes);
    let now = Utc::now();

    let mut drafts = match &config.backend {
        LanguageBackend::TreeSitter(backend) => tree_sitter::extract(&content, config, backend)?,
        LanguageBackend::Custom => match config.id {
            "markdown" => markdown::extract(&content),
            "yaml" => yaml::extract(&content),
            "json" => json::extract(&content),
            "plaintext" => plain::extract(&content),
            other => {
                return Err(ParsingError::file_parse_error(
                    file_path,
                    format!("no custom extractor registered for language '{other}'"),
                ));
            }
        },
    };

    let file_imports = imports::extract_imports(config.id, &content, file_path);
    for draft in &mut drafts {
        if !file_imports.is_empty() {
            draft.imports = file_imports.clone();
        }
    }

    drafts.sort_by_key(|d| (d.start_line, d.end_line));

    let mut metrics = ExtractionMetrics {
        files_processed: 1,
        language: config.id.to_string(),
        ..Default::default()
    };

    let mut chunks = Vec::with_capacity(drafts.len());
    for draft in drafts {
        if draft.content.len() > max_chunk_size_bytes {
            metrics.chunks_skipped += 1;
            continue;
        }
        let chunk = Chunk::from_draft(draft, file_path, git_branch, &git_hash, now);
        metrics.chunk_sizes.push(chunk.content_size());
        metrics.chunks_created += 1;
        chunks.push(chunk);
    }

    Ok(ExtractionOutcome { chunks, metrics })
}

/// Decode raw file bytes to text, matching what [`crate::binary::looks_binary`]
/// is willing to let through: UTF-8 on the fast path, and BOM-sniffed
/// UTF-16 (the only case `looks_binary` accepts besides UTF-8) otherwise.
fn decode_text(raw_bytes: &[u8], file_path: &str) -> Result<String, ParsingError> {
    if let Ok(s) = std::str::from_utf8(raw_bytes) {
        return Ok(s.to_string());
    }

    let (decoded, _, had_errors) = encoding_rs::UTF_16LE.decode(raw_bytes);
    if had_errors {
        return Err(ParsingError::file_parse_error(
            file_path,
            "content is not valid UTF-8 or UTF-16",
        ));
    }
    Ok(decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension_is_skipped_not_an_error() {
        let result = extract(b"binary-ish content", "assets/logo.png", "main", 1_000_000);
        assert!(matches!(result, Err(ParsingError::UnsupportedExtension(_))));
    }

    #[test]
    fn binary_content_is_treated_as_unsupported() {
        let result = extract(b"\x00\x01\x02\x03", "src/data.rs", "main", 1_000_000);
        assert!(matches!(result, Err(ParsingError::UnsupportedExtension(_))));
    }

    #[test]
    fn rust_file_produces_chunks_with_git_file_hash() {
        let outcome = extract(b"fn main() {}\n", "src/main.rs", "main", 1_000_000).unwrap();
        assert!(!outcome.chunks.is_empty());
        assert_eq!(outcome.metrics.chunks_created, outcome.chunks.len());
        assert_eq!(outcome.chunks[0].git_branch, "main");
        assert!(!outcome.chunks[0].git_file_hash.is_empty());
    }

    #[test]
    fn oversized_chunk_is_skipped_and_counted() {
        let content = format!("fn big() {{\n{}\n}}\n", "x".repeat(100));
        let outcome = extract(content.as_bytes(), "src/big.rs", "main", 10).unwrap();
        assert_eq!(outcome.chunks.len(), 0);
        assert_eq!(outcome.metrics.chunks_skipped, 1);
    }

    #[test]
    fn utf16_bom_content_is_decoded_not_dropped() {
        let (encoded, _, had_errors) = encoding_rs::UTF_16LE.encode("fn main() {}\n");
        assert!(!had_errors);
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend_from_slice(&encoded);
        let outcome = extract(&bytes, "src/main.rs", "main", 1_000_000).unwrap();
        assert!(!outcome.chunks.is_empty());
    }

    #[test]
    fn markdown_duplicate_paragraphs_share_chunk_hash() {
        let content = b"Repeat me\n\nRepeat me\n\nRepeat me\n";
        let outcome = extract(content, "docs/readme.md", "main", 1_000_000).unwrap();
        assert_eq!(outcome.chunks.len(), 3);
        let hashes: std::collections::HashSet<_> =
            outcome.chunks.iter().map(|c| c.chunk_hash.clone()).collect();
        assert_eq!(hashes.len(), 1);
    }
}
