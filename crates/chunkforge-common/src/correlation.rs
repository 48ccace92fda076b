//! Correlation id threaded through a single pipeline run for cross-component
//! tracing (enqueue → dequeue → `processBatch` → anchor put).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation id type for tracking one orchestrator run across component
/// boundaries. Uses UUID v4 for guaranteed uniqueness without coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a new correlation id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn to_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CorrelationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<&str> for CorrelationId {
    fn from(id: &str) -> Self {
        Uuid::try_parse(id).map_or_else(|_| Self(Uuid::new_v4()), Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(CorrelationId::new(), CorrelationId::new());
    }

    #[test]
    fn parses_valid_uuid_string() {
        let uuid = Uuid::new_v4();
        let id = CorrelationId::from(uuid.to_string().as_str());
        assert_eq!(id.to_uuid(), uuid);
    }

    #[test]
    fn falls_back_to_fresh_uuid_on_bad_input() {
        let id = CorrelationId::from("not-a-uuid");
        assert_ne!(id.to_uuid(), Uuid::nil());
    }
}
