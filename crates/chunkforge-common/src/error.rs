//! Shared error-handling scaffolding.
//!
//! Every crate in this workspace defines its own `thiserror`-derived error
//! enum via [`define_error_enum`] and implements [`CommonError`] so callers
//! can construct io/config/parse/other variants without hand-rolling a
//! `From` impl per crate.

/// Common constructors every crate-local error enum implements.
pub trait CommonError: Sized {
    /// Wrap an I/O failure.
    fn io_error(err: std::io::Error) -> Self;
    /// Wrap a configuration problem.
    fn config_error(msg: impl Into<String>) -> Self;
    /// Wrap a parse/deserialize failure.
    fn parse_error(msg: impl Into<String>) -> Self;
    /// Wrap anything else as a catch-all.
    fn other_error(msg: impl Into<String>) -> Self;
}

/// Attach context to a `Result`, the way `anyhow::Context` does, but
/// producing a crate-local error type instead of `anyhow::Error`.
pub trait ErrorContext<T, E> {
    /// Attach a static context message.
    fn context(self, msg: &'static str) -> Result<T, E>;
    /// Attach a lazily-computed context message.
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T, E>;
}

impl<T, E, Err> ErrorContext<T, E> for Result<T, Err>
where
    Err: std::error::Error + Send + Sync + 'static,
    E: CommonError,
{
    fn context(self, msg: &'static str) -> Result<T, E> {
        self.map_err(|e| E::other_error(format!("{msg}: {e}")))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T, E> {
        self.map_err(|e| E::other_error(format!("{}: {e}", f())))
    }
}

/// Generate the boilerplate `From<std::io::Error>` (and, with `with_serde`,
/// `From<serde_json::Error>`) impls plus a `From<anyhow::Error>` impl for a
/// crate-local error enum that has `Io`, `Other`, and (for the serde variant)
/// `Parse` variants shaped like single-field tuple variants.
#[macro_export]
macro_rules! impl_common_conversions {
    ($err:ty) => {
        impl From<std::io::Error> for $err {
            fn from(e: std::io::Error) -> Self {
                <$err as $crate::CommonError>::io_error(e)
            }
        }

        impl From<anyhow::Error> for $err {
            fn from(e: anyhow::Error) -> Self {
                <$err as $crate::CommonError>::other_error(e.to_string())
            }
        }
    };
    ($err:ty, with_serde) => {
        $crate::impl_common_conversions!($err);

        impl From<serde_json::Error> for $err {
            fn from(e: serde_json::Error) -> Self {
                <$err as $crate::CommonError>::parse_error(e.to_string())
            }
        }
    };
}

/// Define a `thiserror`-derived error enum with the standard
/// `Io`/`Configuration`/`Parse`/`Other` variants plus caller-supplied
/// custom variants, a `CommonError` impl, and a crate-local `Result<T>`
/// alias.
///
/// ```ignore
/// define_error_enum! {
///     pub enum QueueError {
///         #[error("storage failure: {0}")]
///         Storage(String),
///     }
/// }
/// ```
#[macro_export]
macro_rules! define_error_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                #[error($variant_msg:expr)]
                $variant:ident ( $field_ty:ty ),
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, thiserror::Error)]
        $vis enum $name {
            $(
                #[error($variant_msg)]
                $variant ( $field_ty ),
            )*
            /// I/O failure.
            #[error("I/O error: {0}")]
            Io(String),
            /// Configuration problem.
            #[error("configuration error: {0}")]
            Configuration(String),
            /// Parse/deserialize failure.
            #[error("parse error: {0}")]
            Parse(String),
            /// Catch-all.
            #[error("{0}")]
            Other(String),
        }

        impl $crate::CommonError for $name {
            fn io_error(err: std::io::Error) -> Self {
                Self::Io(err.to_string())
            }
            fn config_error(msg: impl Into<String>) -> Self {
                Self::Configuration(msg.into())
            }
            fn parse_error(msg: impl Into<String>) -> Self {
                Self::Parse(msg.into())
            }
            fn other_error(msg: impl Into<String>) -> Self {
                Self::Other(msg.into())
            }
        }

        /// Crate-local result alias.
        $vis type Result<T> = std::result::Result<T, $name>;
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    define_error_enum! {
        pub enum TestError {
            #[error("widget broke: {0}")]
            Widget(String),
        }
    }

    impl_common_conversions!(TestError, with_serde);

    #[test]
    fn common_error_constructors_work() {
        let e = TestError::config_error("missing field");
        assert!(matches!(e, TestError::Configuration(_)));
        assert_eq!(e.to_string(), "configuration error: missing field");
    }

    #[test]
    fn io_error_converts_via_from() {
        let io = std::io::Error::other("disk full");
        let e: TestError = io.into();
        assert!(matches!(e, TestError::Io(_)));
    }

    #[test]
    fn context_wraps_foreign_errors() {
        fn fails() -> std::result::Result<(), std::io::Error> {
            Err(std::io::Error::other("nope"))
        }

        let result: Result<()> = fails().context("loading widget");
        let err = result.expect_err("should be an error");
        assert!(err.to_string().contains("loading widget"));
    }

    #[test]
    fn custom_variant_still_works() {
        let e = TestError::Widget("cracked".to_string());
        assert_eq!(e.to_string(), "widget broke: cracked");
    }
}
