//! Error types for repository detection and change planning.

chunkforge_common::define_error_enum! {
    pub enum GitError {
        #[error("not a git repository: {0}")]
        NotARepository(String),
        #[error("{0}")]
        Git(String),
        #[error("incremental index refused: {0}")]
        MissingAnchor(String),
        #[error("path is not within the repository root: {0}")]
        PathOutsideRepo(String),
    }
}

chunkforge_common::impl_common_conversions!(GitError);

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        Self::Git(err.to_string())
    }
}

impl GitError {
    pub fn not_a_repository(msg: impl Into<String>) -> Self {
        Self::NotARepository(msg.into())
    }

    pub fn missing_anchor(msg: impl Into<String>) -> Self {
        Self::MissingAnchor(msg.into())
    }

    pub fn path_outside_repo(msg: impl Into<String>) -> Self {
        Self::PathOutsideRepo(msg.into())
    }
}
