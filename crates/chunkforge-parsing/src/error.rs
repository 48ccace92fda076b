//! Error types for the language extractor and parser pool.

use std::fmt;

/// Detail carried by [`ParsingError::ParseError`].
#[derive(Debug, Clone)]
pub struct ParseErrorDetail {
    pub file_path: String,
    pub reason: String,
}

impl fmt::Display for ParseErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file_path, self.reason)
    }
}

chunkforge_common::define_error_enum! {
    /// Parsing-specific error types.
    pub enum ParsingError {
        #[error("unsupported file extension: {0}")]
        UnsupportedExtension(String),
        #[error("parse error in {0}")]
        ParseError(ParseErrorDetail),
        #[error("query compilation error: {0}")]
        QueryCompilation(String),
    }
}

chunkforge_common::impl_common_conversions!(ParsingError);

impl ParsingError {
    pub fn unsupported_extension(ext: impl Into<String>) -> Self {
        Self::UnsupportedExtension(ext.into())
    }

    pub fn file_parse_error(file_path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParseError(ParseErrorDetail {
            file_path: file_path.into(),
            reason: reason.into(),
        })
    }
}
