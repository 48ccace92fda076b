//! Shared test utilities for integration tests across all crates in this
//! workspace.
//!
//! Provides a single persistent Tokio runtime and an atomic counter, shared
//! across every test crate, so parallel test binaries don't each spin up
//! their own runtime or collide on generated index/collection names.
//!
//! ```no_run
//! #[test]
//! fn my_integration_test() {
//!     chunkforge_test_utils::get_test_runtime().block_on(async {
//!         let counter = chunkforge_test_utils::next_index_counter();
//!         // ... test logic ...
//!     })
//! }
//! ```

use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

static TEST_RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();

/// Unique counter for index/collection names, shared across all test crates.
static INDEX_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Get the shared test runtime, creating it on first call.
///
/// Override worker count with `TEST_RUNTIME_WORKERS`; defaults to the number
/// of available CPUs.
#[allow(clippy::expect_used)]
pub fn get_test_runtime() -> &'static tokio::runtime::Runtime {
    TEST_RUNTIME.get_or_init(|| {
        let workers = std::env::var("TEST_RUNTIME_WORKERS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or_else(|| {
                std::thread::available_parallelism().map(std::num::NonZero::get).unwrap_or(4)
            });

        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("chunkforge-test-runtime")
            .worker_threads(workers)
            .build()
            .expect("failed to create shared test runtime")
    })
}

/// Next value in a monotonically increasing counter, unique across all test
/// crates in this process. Combine with a test name to build collision-free
/// index names, e.g. `format!("idx_{}_{}", test_name, next_index_counter())`.
pub fn next_index_counter() -> usize {
    INDEX_COUNTER.fetch_add(1, Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_is_reusable() {
        let rt1 = get_test_runtime();
        let rt2 = get_test_runtime();
        assert!(std::ptr::eq(rt1, rt2));
    }

    #[test]
    fn counter_increments_monotonically() {
        let start = next_index_counter();
        let next = next_index_counter();
        assert_eq!(next, start + 1);
    }

    #[test]
    fn runtime_executes_async_work() {
        let result = get_test_runtime().block_on(async {
            tokio::time::sleep(tokio::time::Duration::from_millis(1)).await;
            42
        });
        assert_eq!(result, 42);
    }
}
