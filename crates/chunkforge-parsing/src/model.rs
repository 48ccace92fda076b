//! The Chunk data model and its constituent value types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hashing::chunk_hash;

/// Whether a chunk represents source code or prose documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkKind {
    Code,
    Doc,
}

/// Where an import resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportKind {
    /// An ecosystem package/module name (e.g. `std::collections`, `numpy`).
    Module,
    /// A repo-relative file path resolved from the importing file.
    File,
}

/// One import statement found in a chunk's enclosing file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Import {
    pub path: String,
    pub kind: ImportKind,
    pub symbols: Vec<String>,
}

/// One named declaration found inside a chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: String,
    pub line: usize,
}

/// Whether an export is the module's default export or a named one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportKind {
    Named,
    Default,
}

/// One symbol exported from a chunk's enclosing file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Export {
    pub name: String,
    pub kind: ExportKind,
}

/// A unit of indexable content produced by the language extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub kind: ChunkKind,
    pub language: String,
    /// Grammar-defined node kind, e.g. `function_item`. Opaque to the core.
    pub node_kind: String,
    /// Dotted path of enclosing symbols; empty when the chunk is top-level.
    pub container_path: String,
    /// Repo-relative file path, forward slashes.
    pub file_path: String,
    pub directory_path: String,
    pub directory_name: String,
    pub directory_depth: usize,
    pub git_branch: String,
    /// Content hash of the whole file, used for change detection.
    pub git_file_hash: String,
    /// Stable content-addressed id: `SHA256_hex(content)`.
    pub chunk_hash: String,
    pub start_line: usize,
    pub end_line: usize,
    pub content: String,
    pub imports: Vec<Import>,
    pub symbols: Vec<Symbol>,
    pub exports: Vec<Export>,
    /// `{filePath, kind, containerPath}` header + blank line + content.
    pub semantic_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields the extractor computes per chunk before identity/derived fields
/// (hash, directory breakdown, semantic text, timestamps) are filled in.
pub struct ChunkDraft {
    pub kind: ChunkKind,
    pub language: String,
    pub node_kind: String,
    pub container_path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub content: String,
    pub imports: Vec<Import>,
    pub symbols: Vec<Symbol>,
    pub exports: Vec<Export>,
}

impl Chunk {
    /// Build a complete [`Chunk`] from a [`ChunkDraft`] plus the file-level
    /// context the extractor contract threads through every chunk of a file.
    pub fn from_draft(
        draft: ChunkDraft,
        file_path: &str,
        git_branch: &str,
        git_file_hash: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let (directory_path, directory_name, directory_depth) = split_directory(file_path);
        let hash = chunk_hash(&draft.content);
        let semantic_text = format!(
            "{{\"filePath\":\"{file_path}\",\"kind\":\"{node_kind}\",\"containerPath\":\"{container_path}\"}}\n\n{content}",
            node_kind = draft.node_kind,
            container_path = draft.container_path,
            content = draft.content,
        );

        Self {
            kind: draft.kind,
            language: draft.language,
            node_kind: draft.node_kind,
            container_path: draft.container_path,
            file_path: file_path.to_string(),
            directory_path,
            directory_name,
            directory_depth,
            git_branch: git_branch.to_string(),
            git_file_hash: git_file_hash.to_string(),
            chunk_hash: hash,
            start_line: draft.start_line,
            end_line: draft.end_line,
            content: draft.content,
            imports: draft.imports,
            symbols: draft.symbols,
            exports: draft.exports,
            semantic_text,
            created_at: now,
            updated_at: now,
        }
    }

    /// Byte size of the raw content, used against `maxChunkSizeBytes`.
    pub fn content_size(&self) -> usize {
        self.content.len()
    }
}

/// Derive `(directoryPath, directoryName, directoryDepth)` purely from a
/// repo-relative, forward-slash path. Root files have depth 0 and an empty
/// directory path/name.
fn split_directory(relative_path: &str) -> (String, String, usize) {
    match relative_path.rsplit_once('/') {
        None => (String::new(), String::new(), 0),
        Some((dir, _file)) => {
            let depth = dir.split('/').count();
            let name = dir.rsplit('/').next().unwrap_or_default().to_string();
            (dir.to_string(), name, depth)
        }
    }
}
