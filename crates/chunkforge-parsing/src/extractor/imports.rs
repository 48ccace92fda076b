//! Per-language import-statement extraction and path normalization.
//!
//! Import statements are file-level, so every code chunk produced from the
//! same file shares the same import list; only the kind/path normalization
//! (module vs. repo-relative file) is language-specific.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Import, ImportKind};

static RUST_USE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?use\s+([A-Za-z0-9_:{}, *]+);").unwrap());
static PY_IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*import\s+([A-Za-z0-9_.]+)").unwrap());
static PY_FROM_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*from\s+(\.{0,2}[A-Za-z0-9_.]*)\s+import\s+(.+)").unwrap());
static JS_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*import\s+.*?from\s+['"]([^'"]+)['"]"#).unwrap());
static JS_REQUIRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());
static GO_IMPORT_SINGLE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?m)^\s*import\s+"([^"]+)""#).unwrap());
static GO_IMPORT_BLOCK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?m)^\s*"([^"]+)""#).unwrap());
static JAVA_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*import\s+(?:static\s+)?([A-Za-z0-9_.]+)(?:\.\*)?;").unwrap());

/// Extract every import statement in `content`, normalized relative to
/// `importing_file_path` (repo-relative, forward slashes).
pub fn extract_imports(language: &str, content: &str, importing_file_path: &str) -> Vec<Import> {
    match language {
        "rust" => rust_imports(content),
        "python" => python_imports(content, importing_file_path),
        "javascript" | "typescript" | "tsx" => js_imports(content, importing_file_path),
        "go" => go_imports(content),
        "java" => java_imports(content),
        _ => Vec::new(),
    }
}

fn rust_imports(content: &str) -> Vec<Import> {
    RUST_USE
        .captures_iter(content)
        .map(|c| {
            let path = c[1].split_whitespace().collect::<String>();
            let kind = if path.starts_with("crate::")
                || path.starts_with("self::")
                || path.starts_with("super::")
            {
                ImportKind::File
            } else {
                ImportKind::Module
            };
            Import {
                path,
                kind,
                symbols: Vec::new(),
            }
        })
        .collect()
}

fn python_imports(content: &str, importing_file_path: &str) -> Vec<Import> {
    let mut imports = Vec::new();

    for c in PY_IMPORT.captures_iter(content) {
        imports.push(Import {
            path: c[1].to_string(),
            kind: ImportKind::Module,
            symbols: Vec::new(),
        });
    }

    for c in PY_FROM_IMPORT.captures_iter(content) {
        let module = &c[1];
        let symbols: Vec<String> = c[2]
            .split(',')
            .map(|s| s.trim().trim_start_matches('(').trim_end_matches(')').to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if module.starts_with('.') {
            let levels = module.chars().take_while(|c| *c == '.').count();
            let rest = &module[levels..];
            let resolved = resolve_relative(importing_file_path, levels, rest, "py");
            imports.push(Import {
                path: resolved,
                kind: ImportKind::File,
                symbols,
            });
        } else {
            imports.push(Import {
                path: module.to_string(),
                kind: ImportKind::Module,
                symbols,
            });
        }
    }

    imports
}

fn js_imports(content: &str, importing_file_path: &str) -> Vec<Import> {
    let mut imports = Vec::new();

    let specs = JS_IMPORT
        .captures_iter(content)
        .map(|c| c[1].to_string())
        .chain(JS_REQUIRE.captures_iter(content).map(|c| c[1].to_string()));

    for path in specs {
        if path.starts_with('.') {
            let resolved = resolve_relative_dotted(importing_file_path, &path);
            imports.push(Import {
                path: resolved,
                kind: ImportKind::File,
                symbols: Vec::new(),
            });
        } else {
            imports.push(Import {
                path,
                kind: ImportKind::Module,
                symbols: Vec::new(),
            });
        }
    }

    imports
}

fn go_imports(content: &str) -> Vec<Import> {
    let mut imports: Vec<Import> = GO_IMPORT_SINGLE
        .captures_iter(content)
        .map(|c| Import {
            path: c[1].to_string(),
            kind: ImportKind::Module,
            symbols: Vec::new(),
        })
        .collect();

    if let Some(block_start) = content.find("import (") {
        if let Some(block_end) = content[block_start..].find(')') {
            let block = &content[block_start..block_start + block_end];
            for c in GO_IMPORT_BLOCK_LINE.captures_iter(block) {
                imports.push(Import {
                    path: c[1].to_string(),
                    kind: ImportKind::Module,
                    symbols: Vec::new(),
                });
            }
        }
    }

    imports
}

fn java_imports(content: &str) -> Vec<Import> {
    JAVA_IMPORT
        .captures_iter(content)
        .map(|c| Import {
            path: c[1].to_string(),
            kind: ImportKind::Module,
            symbols: Vec::new(),
        })
        .collect()
}

/// Resolve a Python relative import (`.`, `..`, `.foo`) against the
/// importing file's directory, then express it repo-relative.
fn resolve_relative(importing_file_path: &str, levels: usize, rest: &str, ext: &str) -> String {
    let dir = std::path::Path::new(importing_file_path)
        .parent()
        .unwrap_or_else(|| std::path::Path::new(""));
    let mut base = dir.to_path_buf();
    for _ in 1..levels {
        base.pop();
    }
    if !rest.is_empty() {
        for segment in rest.split('.') {
            base.push(segment);
        }
    }
    let mut result = base.to_string_lossy().replace('\\', "/");
    if !result.is_empty() {
        result.push('.');
        result.push_str(ext);
    }
    result
}

/// Resolve a JS/TS relative specifier (`./foo`, `../bar/baz`) against the
/// importing file's directory into a repo-relative path.
fn resolve_relative_dotted(importing_file_path: &str, spec: &str) -> String {
    let dir = std::path::Path::new(importing_file_path)
        .parent()
        .unwrap_or_else(|| std::path::Path::new(""));
    let mut base = dir.to_path_buf();
    for segment in spec.split('/') {
        match segment {
            "." | "" => {}
            ".." => {
                base.pop();
            }
            other => base.push(other),
        }
    }
    base.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_use_of_std_is_module() {
        let imports = rust_imports("use std::collections::HashMap;\n");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].kind, ImportKind::Module);
    }

    #[test]
    fn rust_use_of_crate_path_is_file() {
        let imports = rust_imports("use crate::model::Chunk;\n");
        assert_eq!(imports[0].kind, ImportKind::File);
    }

    #[test]
    fn python_relative_import_resolves_against_file_dir() {
        let imports = python_imports("from .helpers import parse\n", "src/pkg/mod.py");
        assert_eq!(imports[0].kind, ImportKind::File);
        assert_eq!(imports[0].path, "src/pkg/helpers.py");
    }

    #[test]
    fn python_absolute_import_is_module() {
        let imports = python_imports("import os\n", "src/pkg/mod.py");
        assert_eq!(imports[0].kind, ImportKind::Module);
        assert_eq!(imports[0].path, "os");
    }

    #[test]
    fn js_relative_import_resolves_path() {
        let imports = js_imports("import { foo } from './util';\n", "src/app/index.js");
        assert_eq!(imports[0].kind, ImportKind::File);
        assert_eq!(imports[0].path, "src/app/util");
    }

    #[test]
    fn js_package_import_is_module() {
        let imports = js_imports("import React from 'react';\n", "src/app/index.js");
        assert_eq!(imports[0].kind, ImportKind::Module);
        assert_eq!(imports[0].path, "react");
    }

    #[test]
    fn go_single_import_is_module() {
        let imports = go_imports("import \"fmt\"\n");
        assert_eq!(imports[0].path, "fmt");
    }

    #[test]
    fn java_import_is_module() {
        let imports = java_imports("import java.util.List;\n");
        assert_eq!(imports[0].path, "java.util.List");
    }
}
