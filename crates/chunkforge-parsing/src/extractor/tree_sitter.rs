//! Tree-sitter-backed extraction: run a language's capture rules against the
//! parse tree and turn captures into chunk/symbol/export drafts.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, StreamingIteratorMut};

use crate::error::ParsingError;
use crate::languages::{ExportFilter, LanguageConfig, TreeSitterBackend};
use crate::model::{ChunkDraft, ChunkKind, Export, ExportKind, Symbol};

type QueryCacheKey = (usize, String);
static QUERY_CACHE: Lazy<Mutex<HashMap<QueryCacheKey, Arc<Query>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn compile_query(language: &Language, query_str: &str) -> Result<Arc<Query>, ParsingError> {
    let key = (language as *const Language as usize, query_str.to_string());

    if let Some(cached) = QUERY_CACHE.lock().expect("query cache poisoned").get(&key) {
        return Ok(cached.clone());
    }

    let query = Query::new(language, query_str)
        .map_err(|err| ParsingError::QueryCompilation(err.to_string()))?;
    let query = Arc::new(query);
    QUERY_CACHE
        .lock()
        .expect("query cache poisoned")
        .insert(key, query.clone());
    Ok(query)
}

/// One match's captures, keyed by capture name (as declared with `@name` in
/// the query string).
type MatchCaptures<'tree> = HashMap<String, Node<'tree>>;

fn run_query<'tree>(
    language: &Language,
    query_str: &str,
    root: Node<'tree>,
    content: &str,
) -> Result<Vec<MatchCaptures<'tree>>, ParsingError> {
    if query_str.trim().is_empty() {
        return Ok(Vec::new());
    }

    let query = compile_query(language, query_str)?;
    let capture_names = query.capture_names();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, root, content.as_bytes());

    let mut results = Vec::new();
    while let Some(m) = matches.next_mut() {
        let mut captures = MatchCaptures::new();
        for capture in m.captures {
            let name = capture_names[capture.index as usize].to_string();
            captures.insert(name, capture.node);
        }
        results.push(captures);
    }
    Ok(results)
}

/// Structural node kinds whose name forms part of a chunk's container path:
/// classes/impls/modules/namespaces as well as enclosing functions, so a
/// closure or nested `fn` records the function it lives in.
const STRUCTURAL_KINDS: &[&str] = &[
    "impl_item",
    "trait_item",
    "mod_item",
    "struct_item",
    "enum_item",
    "class_definition",
    "class_declaration",
    "class_specifier",
    "interface_declaration",
    "namespace_definition",
    "module",
    "function_item",
    "function_definition",
    "function_declaration",
    "method_declaration",
    "arrow_function",
];

/// Body-wrapper kinds every grammar interposes between a structural
/// container and its members, e.g. Rust's `impl_item` holds its methods
/// under a `declaration_list`, Java's `class_declaration` under a
/// `class_body`. These never contribute a name segment, but the ancestor
/// walk must pass through them rather than stop.
const WRAPPER_KINDS: &[&str] = &[
    "declaration_list",
    "field_declaration_list",
    "enum_variant_list",
    "block",
    "statement_block",
    "class_body",
    "interface_body",
    "compound_statement",
    "suite",
];

fn node_name(node: Node, content: &str) -> Option<String> {
    if let Some(name_field) = node.child_by_field_name("name") {
        return Some(content[name_field.byte_range()].to_string());
    }
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .find(|child| matches!(child.kind(), "identifier" | "type_identifier" | "word"))
        .map(|child| content[child.byte_range()].to_string())
}

fn container_path(node: Node, content: &str) -> String {
    let mut segments = Vec::new();
    let mut current = node.parent();
    while let Some(ancestor) = current {
        let kind = ancestor.kind();
        if STRUCTURAL_KINDS.contains(&kind) {
            if let Some(name) = node_name(ancestor, content) {
                segments.push(name);
            }
        } else if !WRAPPER_KINDS.contains(&kind) {
            break;
        }
        current = ancestor.parent();
    }
    segments.reverse();
    segments.join(".")
}

fn symbol_kind_from_capture(capture_name: &str) -> String {
    capture_name
        .strip_prefix("symbol.")
        .unwrap_or(capture_name)
        .to_string()
}

fn extract_symbols(
    language: &Language,
    query_str: &str,
    root: Node,
    content: &str,
) -> Result<Vec<Symbol>, ParsingError> {
    let matches = run_query(language, query_str, root, content)?;
    let mut symbols = Vec::new();
    for captures in matches {
        let Some(name_node) = captures.get("name") else {
            continue;
        };
        let kind_capture = captures
            .keys()
            .find(|k| k.starts_with("symbol."))
            .cloned()
            .unwrap_or_else(|| "symbol".to_string());
        symbols.push(Symbol {
            name: content[name_node.byte_range()].to_string(),
            kind: symbol_kind_from_capture(&kind_capture),
            line: name_node.start_position().row + 1,
        });
    }
    Ok(symbols)
}

fn js_export_name(text: &str) -> Option<String> {
    static KEYWORD_RE: Lazy<regex::Regex> = Lazy::new(|| {
        regex::Regex::new(
            r"export\s+(?:default\s+)?(?:async\s+)?(?:function\*?|class|const|let|var)\s+([A-Za-z_$][A-Za-z0-9_$]*)",
        )
        .expect("static regex compiles")
    });
    static DEFAULT_BARE_RE: Lazy<regex::Regex> = Lazy::new(|| {
        regex::Regex::new(r"export\s+default\s+([A-Za-z_$][A-Za-z0-9_$]*)")
            .expect("static regex compiles")
    });

    KEYWORD_RE
        .captures(text)
        .or_else(|| DEFAULT_BARE_RE.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn export_from_match(
    captures: &MatchCaptures,
    content: &str,
    filter: ExportFilter,
) -> Option<(Export, usize)> {
    let export_node = captures.get("export")?;
    let text = &content[export_node.byte_range()];
    let line = export_node.start_position().row + 1;

    let named = |name: String| Export {
        name,
        kind: ExportKind::Named,
    };

    match filter {
        ExportFilter::None => None,
        ExportFilter::AllTopLevel | ExportFilter::PythonModuleLevel => captures
            .get("name")
            .map(|n| named(content[n.byte_range()].to_string()))
            .map(|e| (e, line)),
        ExportFilter::GoUppercase => captures.get("name").and_then(|n| {
            let name = &content[n.byte_range()];
            name.chars()
                .next()
                .filter(|c| c.is_uppercase())
                .map(|_| (named(name.to_string()), line))
        }),
        ExportFilter::JavaPublicModifier => captures.get("name").and_then(|n| {
            if text.contains("public") {
                Some((named(content[n.byte_range()].to_string()), line))
            } else {
                None
            }
        }),
        ExportFilter::JsExportKeyword => {
            let kind = if text.trim_start().starts_with("export default") {
                ExportKind::Default
            } else {
                ExportKind::Named
            };
            js_export_name(text).map(|name| (Export { name, kind }, line))
        }
    }
}

fn extract_exports(
    language: &Language,
    query_str: &str,
    root: Node,
    content: &str,
    filter: ExportFilter,
) -> Result<Vec<(Export, usize)>, ParsingError> {
    let matches = run_query(language, query_str, root, content)?;
    Ok(matches
        .iter()
        .filter_map(|captures| export_from_match(captures, content, filter))
        .collect())
}

/// Run the language's chunk/symbol/export capture rules and produce one
/// [`ChunkDraft`] per distinct captured node, deduplicated by
/// `(startOffset, endOffset, contentHash)`.
pub fn extract(
    content: &str,
    config: &LanguageConfig,
    backend: &TreeSitterBackend,
) -> Result<Vec<ChunkDraft>, ParsingError> {
    let mut parser = Parser::new();
    parser
        .set_language(&backend.language)
        .map_err(|err| ParsingError::QueryCompilation(err.to_string()))?;
    let tree = parser.parse(content, None).ok_or_else(|| {
        ParsingError::file_parse_error(config.id, "tree-sitter failed to produce a parse tree")
    })?;
    let root = tree.root_node();

    let symbols = extract_symbols(&backend.language, backend.symbol_query, root, content)?;
    let exports = extract_exports(
        &backend.language,
        backend.export_query,
        root,
        content,
        config.export_filter,
    )?;

    let chunk_matches = run_query(&backend.language, backend.chunk_query, root, content)?;

    let mut seen: HashSet<(usize, usize, u64)> = HashSet::new();
    let mut nodes: Vec<Node> = Vec::new();
    for captures in &chunk_matches {
        for node in captures.values() {
            let range = node.byte_range();
            let text = &content[range.clone()];
            let key = (range.start, range.end, fxhash(text));
            if seen.insert(key) {
                nodes.push(*node);
            }
        }
    }

    nodes.sort_by_key(|n| (n.start_position().row, n.end_position().row, n.start_byte()));

    let mut drafts = Vec::with_capacity(nodes.len());
    for node in nodes {
        let start_line = node.start_position().row + 1;
        let end_line = node.end_position().row + 1;
        let chunk_content = content[node.byte_range()].to_string();
        let path = container_path(node, content);

        let in_range = |line: &usize| *line >= start_line && *line <= end_line;
        let chunk_symbols: Vec<Symbol> = symbols
            .iter()
            .filter(|s| in_range(&s.line))
            .cloned()
            .collect();
        let chunk_exports: Vec<Export> = exports
            .iter()
            .filter(|(_, line)| in_range(line))
            .map(|(e, _)| e.clone())
            .collect();

        drafts.push(ChunkDraft {
            kind: ChunkKind::Code,
            language: config.id.to_string(),
            node_kind: node.kind().to_string(),
            container_path: path,
            start_line,
            end_line,
            content: chunk_content,
            imports: Vec::new(),
            symbols: chunk_symbols,
            exports: chunk_exports,
        });
    }

    Ok(drafts)
}

/// Cheap non-cryptographic hash used only for in-memory capture dedup; the
/// durable `chunk_hash` identity is computed later from SHA-256.
fn fxhash(text: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in text.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x1000_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::get_language_config;

    fn rust_backend() -> &'static TreeSitterBackend {
        match &get_language_config("rust").unwrap().backend {
            crate::languages::LanguageBackend::TreeSitter(backend) => backend,
            crate::languages::LanguageBackend::Custom => unreachable!(),
        }
    }

    #[test]
    fn extracts_function_and_struct_chunks() {
        let config = get_language_config("rust").unwrap();
        let backend = rust_backend();
        let code = "fn main() {}\n\nstruct Point { x: f64 }\n";
        let drafts = extract(code, config, backend).unwrap();
        assert!(drafts.iter().any(|d| d.node_kind == "function_item"));
        assert!(drafts.iter().any(|d| d.node_kind == "struct_item"));
    }

    #[test]
    fn chunks_are_ordered_by_start_line() {
        let config = get_language_config("rust").unwrap();
        let backend = rust_backend();
        let code = "fn a() {}\nfn b() {}\nstruct S {}\n";
        let drafts = extract(code, config, backend).unwrap();
        for pair in drafts.windows(2) {
            assert!(pair[0].start_line <= pair[1].start_line);
        }
    }

    #[test]
    fn impl_methods_get_container_path() {
        let config = get_language_config("rust").unwrap();
        let backend = rust_backend();
        let code = "struct Point;\nimpl Point {\n    fn new() -> Self { Point }\n}\n";
        let drafts = extract(code, config, backend).unwrap();
        let method = drafts
            .iter()
            .find(|d| d.node_kind == "function_item")
            .unwrap();
        assert_eq!(method.container_path, "Point");
    }

    #[test]
    fn nested_function_records_enclosing_function() {
        let config = get_language_config("rust").unwrap();
        let backend = rust_backend();
        let code = "fn outer() {\n    fn inner() {}\n    inner();\n}\n";
        let drafts = extract(code, config, backend).unwrap();
        let inner = drafts
            .iter()
            .find(|d| d.node_kind == "function_item" && d.content.contains("fn inner"))
            .unwrap();
        assert_eq!(inner.container_path, "outer");
    }

    #[test]
    fn go_export_filter_keeps_only_uppercase_names() {
        let config = get_language_config("go").unwrap();
        let backend = match &config.backend {
            crate::languages::LanguageBackend::TreeSitter(b) => b,
            _ => unreachable!(),
        };
        let code = "package main\n\nfunc Public() {}\n\nfunc private() {}\n";
        let drafts = extract(code, config, backend).unwrap();
        let all_exports: Vec<_> = drafts.iter().flat_map(|d| d.exports.clone()).collect();
        assert!(all_exports.iter().any(|e| e.name == "Public"));
        assert!(!all_exports.iter().any(|e| e.name == "private"));
    }
}
