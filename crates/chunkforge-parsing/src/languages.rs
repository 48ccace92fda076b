//! Language registry: the grammar-specific capture rules are opaque data to
//! the core. Each entry is a variant over `{TreeSitter(grammar, queries),
//! Custom(language)}`, routed from the file extension, kept tabular.

use lazy_static::lazy_static;
use std::collections::HashMap;
use tree_sitter::Language;

/// Post-filter applied to export captures, since "is this exported" is a
/// language-specific rule the grammar alone cannot express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFilter {
    /// No export concept (e.g. data formats).
    None,
    /// Go: only identifiers starting with an uppercase letter.
    GoUppercase,
    /// Java: only declarations whose modifier set contains `public`.
    JavaPublicModifier,
    /// Python: only module-level identifiers; ALL-CAPS constants count too.
    PythonModuleLevel,
    /// Header-based languages (C/C++): every top-level declaration exports.
    AllTopLevel,
    /// JS/TS: `export` keyword governs; default vs named distinguished by
    /// the presence of the `default` keyword.
    JsExportKeyword,
}

/// A tree-sitter-backed language's query set. All three queries run against
/// the same parse tree; capture names (`@function`, `@name`, etc.) are
/// consumed by the extractor, not interpreted here.
#[derive(Debug, Clone, Copy)]
pub struct TreeSitterBackend {
    pub language: Language,
    /// Captures that become Chunks.
    pub chunk_query: &'static str,
    /// Captures that become Symbols.
    pub symbol_query: &'static str,
    /// Captures that become candidate Exports (before `export_filter`).
    pub export_query: &'static str,
}

/// How a language's chunks are produced.
#[derive(Debug, Clone, Copy)]
pub enum LanguageBackend {
    TreeSitter(TreeSitterBackend),
    /// No grammar; a hand-written extractor in `crate::extractor` handles it.
    Custom,
}

/// Configuration for a single registered language.
#[derive(Debug, Clone, Copy)]
pub struct LanguageConfig {
    pub id: &'static str,
    pub extensions: &'static [&'static str],
    pub backend: LanguageBackend,
    pub export_filter: ExportFilter,
}

impl LanguageConfig {
    pub const fn is_tree_sitter(&self) -> bool {
        matches!(self.backend, LanguageBackend::TreeSitter(_))
    }
}

lazy_static! {
    pub static ref LANGUAGE_REGISTRY: HashMap<&'static str, LanguageConfig> = {
        let mut registry = HashMap::new();

        registry.insert(
            "rust",
            LanguageConfig {
                id: "rust",
                extensions: &["rs"],
                backend: LanguageBackend::TreeSitter(TreeSitterBackend {
                    language: tree_sitter_rust::LANGUAGE.into(),
                    chunk_query: r#"
                        (function_item) @function
                        (impl_item) @impl
                        (struct_item) @struct
                        (enum_item) @enum
                        (trait_item) @trait
                        (mod_item) @module
                    "#,
                    symbol_query: r#"
                        (function_item name: (identifier) @name) @symbol.function
                        (struct_item name: (type_identifier) @name) @symbol.struct
                        (enum_item name: (type_identifier) @name) @symbol.enum
                        (trait_item name: (type_identifier) @name) @symbol.trait
                    "#,
                    export_query: r#"
                        (function_item (visibility_modifier) name: (identifier) @name) @export
                        (struct_item (visibility_modifier) name: (type_identifier) @name) @export
                        (enum_item (visibility_modifier) name: (type_identifier) @name) @export
                    "#,
                }),
                export_filter: ExportFilter::AllTopLevel,
            },
        );

        registry.insert(
            "python",
            LanguageConfig {
                id: "python",
                extensions: &["py", "pyi"],
                backend: LanguageBackend::TreeSitter(TreeSitterBackend {
                    language: tree_sitter_python::LANGUAGE.into(),
                    chunk_query: r#"
                        (function_definition) @function
                        (class_definition) @class
                    "#,
                    symbol_query: r#"
                        (function_definition name: (identifier) @name) @symbol.function
                        (class_definition name: (identifier) @name) @symbol.class
                    "#,
                    export_query: r#"
                        (module (function_definition name: (identifier) @name)) @export
                        (module (class_definition name: (identifier) @name)) @export
                        (module (assignment left: (identifier) @name)) @export
                    "#,
                }),
                export_filter: ExportFilter::PythonModuleLevel,
            },
        );

        registry.insert(
            "javascript",
            LanguageConfig {
                id: "javascript",
                extensions: &["js", "mjs", "cjs"],
                backend: LanguageBackend::TreeSitter(TreeSitterBackend {
                    language: tree_sitter_javascript::LANGUAGE.into(),
                    chunk_query: r#"
                        (function_declaration) @function
                        (arrow_function) @arrow_function
                        (class_declaration) @class
                        (method_definition) @method
                    "#,
                    symbol_query: r#"
                        (function_declaration name: (identifier) @name) @symbol.function
                        (class_declaration name: (identifier) @name) @symbol.class
                    "#,
                    export_query: r#"
                        (export_statement) @export
                    "#,
                }),
                export_filter: ExportFilter::JsExportKeyword,
            },
        );

        registry.insert(
            "typescript",
            LanguageConfig {
                id: "typescript",
                extensions: &["ts", "mts", "cts"],
                backend: LanguageBackend::TreeSitter(TreeSitterBackend {
                    language: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
                    chunk_query: r#"
                        (function_declaration) @function
                        (arrow_function) @arrow_function
                        (class_declaration) @class
                        (method_definition) @method
                        (interface_declaration) @interface
                    "#,
                    symbol_query: r#"
                        (function_declaration name: (identifier) @name) @symbol.function
                        (class_declaration name: (type_identifier) @name) @symbol.class
                        (interface_declaration name: (type_identifier) @name) @symbol.interface
                    "#,
                    export_query: r#"
                        (export_statement) @export
                    "#,
                }),
                export_filter: ExportFilter::JsExportKeyword,
            },
        );

        registry.insert(
            "tsx",
            LanguageConfig {
                id: "tsx",
                extensions: &["tsx"],
                backend: LanguageBackend::TreeSitter(TreeSitterBackend {
                    language: tree_sitter_typescript::LANGUAGE_TSX.into(),
                    chunk_query: r#"
                        (function_declaration) @function
                        (arrow_function) @arrow_function
                        (class_declaration) @class
                        (method_definition) @method
                    "#,
                    symbol_query: r#"
                        (function_declaration name: (identifier) @name) @symbol.function
                        (class_declaration name: (type_identifier) @name) @symbol.class
                    "#,
                    export_query: r#"
                        (export_statement) @export
                    "#,
                }),
                export_filter: ExportFilter::JsExportKeyword,
            },
        );

        registry.insert(
            "go",
            LanguageConfig {
                id: "go",
                extensions: &["go"],
                backend: LanguageBackend::TreeSitter(TreeSitterBackend {
                    language: tree_sitter_go::LANGUAGE.into(),
                    chunk_query: r#"
                        (function_declaration) @function
                        (method_declaration) @method
                        (type_declaration) @type
                    "#,
                    symbol_query: r#"
                        (function_declaration name: (identifier) @name) @symbol.function
                        (type_spec name: (type_identifier) @name) @symbol.type
                    "#,
                    export_query: r#"
                        (function_declaration name: (identifier) @name) @export
                        (type_spec name: (type_identifier) @name) @export
                    "#,
                }),
                export_filter: ExportFilter::GoUppercase,
            },
        );

        registry.insert(
            "java",
            LanguageConfig {
                id: "java",
                extensions: &["java"],
                backend: LanguageBackend::TreeSitter(TreeSitterBackend {
                    language: tree_sitter_java::LANGUAGE.into(),
                    chunk_query: r#"
                        (class_declaration) @class
                        (interface_declaration) @interface
                        (method_declaration) @method
                    "#,
                    symbol_query: r#"
                        (class_declaration name: (identifier) @name) @symbol.class
                        (method_declaration name: (identifier) @name) @symbol.method
                    "#,
                    export_query: r#"
                        (class_declaration (modifiers) name: (identifier) @name) @export
                        (method_declaration (modifiers) name: (identifier) @name) @export
                    "#,
                }),
                export_filter: ExportFilter::JavaPublicModifier,
            },
        );

        registry.insert(
            "c",
            LanguageConfig {
                id: "c",
                extensions: &["c", "h"],
                backend: LanguageBackend::TreeSitter(TreeSitterBackend {
                    language: tree_sitter_c::LANGUAGE.into(),
                    chunk_query: r#"
                        (function_definition) @function
                        (struct_specifier) @struct
                    "#,
                    symbol_query: r#"
                        (function_definition declarator: (function_declarator declarator: (identifier) @name)) @symbol.function
                        (struct_specifier name: (type_identifier) @name) @symbol.struct
                    "#,
                    export_query: r#"
                        (function_definition declarator: (function_declarator declarator: (identifier) @name)) @export
                        (struct_specifier name: (type_identifier) @name) @export
                    "#,
                }),
                export_filter: ExportFilter::AllTopLevel,
            },
        );

        registry.insert(
            "cpp",
            LanguageConfig {
                id: "cpp",
                extensions: &["cpp", "cxx", "cc", "c++", "hpp", "hxx", "hh", "h++"],
                backend: LanguageBackend::TreeSitter(TreeSitterBackend {
                    language: tree_sitter_cpp::LANGUAGE.into(),
                    chunk_query: r#"
                        (function_definition) @function
                        (struct_specifier) @struct
                        (class_specifier) @class
                    "#,
                    symbol_query: r#"
                        (class_specifier name: (type_identifier) @name) @symbol.class
                        (struct_specifier name: (type_identifier) @name) @symbol.struct
                    "#,
                    export_query: r#"
                        (class_specifier name: (type_identifier) @name) @export
                        (struct_specifier name: (type_identifier) @name) @export
                    "#,
                }),
                export_filter: ExportFilter::AllTopLevel,
            },
        );

        registry.insert(
            "csharp",
            LanguageConfig {
                id: "csharp",
                extensions: &["cs", "csx"],
                backend: LanguageBackend::TreeSitter(TreeSitterBackend {
                    language: tree_sitter_c_sharp::LANGUAGE.into(),
                    chunk_query: r#"
                        (class_declaration) @class
                        (interface_declaration) @interface
                        (method_declaration) @method
                        (property_declaration) @property
                    "#,
                    symbol_query: r#"
                        (class_declaration name: (identifier) @name) @symbol.class
                        (method_declaration name: (identifier) @name) @symbol.method
                    "#,
                    export_query: r#"
                        (class_declaration (modifier) @modifier name: (identifier) @name) @export
                    "#,
                }),
                export_filter: ExportFilter::JavaPublicModifier,
            },
        );

        registry.insert(
            "bash",
            LanguageConfig {
                id: "bash",
                extensions: &["sh", "bash", "zsh", "fish", "ksh"],
                backend: LanguageBackend::TreeSitter(TreeSitterBackend {
                    language: tree_sitter_bash::LANGUAGE.into(),
                    chunk_query: r#"
                        (function_definition) @function
                    "#,
                    symbol_query: r#"
                        (function_definition name: (word) @name) @symbol.function
                    "#,
                    export_query: r#""#,
                }),
                export_filter: ExportFilter::None,
            },
        );

        registry.insert(
            "html",
            LanguageConfig {
                id: "html",
                extensions: &["html", "htm", "xhtml"],
                backend: LanguageBackend::TreeSitter(TreeSitterBackend {
                    language: tree_sitter_html::LANGUAGE.into(),
                    chunk_query: r#"
                        (element) @element
                        (script_element) @script
                        (style_element) @style
                    "#,
                    symbol_query: r#""#,
                    export_query: r#""#,
                }),
                export_filter: ExportFilter::None,
            },
        );

        // JSON and YAML are split by crate::extractor's custom splitters
        // rather than grammar captures (shallow per-element/per-line splits
        // read more naturally for these formats than named-node chunks).
        registry.insert(
            "json",
            LanguageConfig {
                id: "json",
                extensions: &["json", "jsonc"],
                backend: LanguageBackend::Custom,
                export_filter: ExportFilter::None,
            },
        );

        registry.insert(
            "yaml",
            LanguageConfig {
                id: "yaml",
                extensions: &["yaml", "yml"],
                backend: LanguageBackend::Custom,
                export_filter: ExportFilter::None,
            },
        );

        // Custom (non-grammar) formats, handled by crate::extractor directly.
        registry.insert(
            "markdown",
            LanguageConfig {
                id: "markdown",
                extensions: &["md", "markdown"],
                backend: LanguageBackend::Custom,
                export_filter: ExportFilter::None,
            },
        );

        registry.insert(
            "plaintext",
            LanguageConfig {
                id: "plaintext",
                extensions: &["txt"],
                backend: LanguageBackend::Custom,
                export_filter: ExportFilter::None,
            },
        );

        registry
    };

    pub static ref EXTENSION_MAP: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        for (lang_id, config) in LANGUAGE_REGISTRY.iter() {
            for ext in config.extensions {
                map.insert(*ext, *lang_id);
            }
        }
        map
    };
}

/// Gets a language configuration by id.
pub fn get_language_config(language_id: &str) -> Option<&'static LanguageConfig> {
    LANGUAGE_REGISTRY.get(language_id)
}

/// Gets a language id from a file extension.
pub fn get_language_from_extension(extension: &str) -> Option<&'static str> {
    EXTENSION_MAP.get(extension).copied()
}

/// Gets a language configuration directly from a file path's extension.
pub fn get_language_for_path(path: &str) -> Option<&'static LanguageConfig> {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext)?;
    get_language_from_extension(ext).and_then(get_language_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_contains_expected_languages() {
        for lang in [
            "rust", "python", "javascript", "typescript", "tsx", "go", "java", "c", "cpp",
            "csharp", "bash", "html", "json", "yaml", "markdown", "plaintext",
        ] {
            assert!(
                LANGUAGE_REGISTRY.contains_key(lang),
                "missing configuration for {lang}"
            );
        }
    }

    #[test]
    fn extension_lookup_resolves_language() {
        assert_eq!(get_language_from_extension("rs"), Some("rust"));
        assert_eq!(get_language_from_extension("py"), Some("python"));
        assert_eq!(get_language_from_extension("md"), Some("markdown"));
    }

    #[test]
    fn path_lookup_resolves_language_config() {
        let config = get_language_for_path("src/main.rs").unwrap();
        assert_eq!(config.id, "rust");
        assert!(config.is_tree_sitter());
    }

    #[test]
    fn custom_languages_have_no_tree_sitter_backend() {
        let config = get_language_config("markdown").unwrap();
        assert!(!config.is_tree_sitter());
    }

    #[test]
    fn h_extension_maps_to_single_language() {
        // C and C++ both use tree-sitter-c/cpp but only one claims `.h`.
        assert_eq!(get_language_from_extension("h"), Some("c"));
    }
}
