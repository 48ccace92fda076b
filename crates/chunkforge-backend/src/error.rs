//! Error types for the injected search-backend client interface.

chunkforge_common::define_error_enum! {
    pub enum BackendError {
        #[error("backend transport failure: {0}")]
        Transport(String),
        #[error("backend rejected the request: {0}")]
        Rejected(String),
    }
}

chunkforge_common::impl_common_conversions!(BackendError);

impl BackendError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}
