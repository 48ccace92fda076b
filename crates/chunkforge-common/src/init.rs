//! Process-wide environment bootstrap.

use std::sync::Once;

static INIT: Once = Once::new();

/// Load a `.env` file (if present) exactly once per process.
///
/// Safe to call from every crate's entry point; subsequent calls are no-ops.
pub fn initialize_environment() {
    INIT.call_once(|| {
        dotenvy::dotenv().ok();
    });
}

/// Test-only variant that prefers `.env.test` over `.env`, for integration
/// tests that need isolated configuration.
#[cfg(test)]
pub fn initialize_test_environment() {
    INIT.call_once(|| {
        dotenvy::from_filename(".env.test")
            .or_else(|_| dotenvy::dotenv())
            .ok();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_environment_is_idempotent() {
        initialize_environment();
        initialize_environment();
    }
}
