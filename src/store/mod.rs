use std::fmt;

use mongodb::bson::oid::ObjectId;
use serde::Serialize;

pub mod fallback;
pub mod mongo;
pub mod selector;

/// Failure taxonomy at the storage boundary. Driver errors are converted
/// here; nothing below this layer leaks to route handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The primary store could not be reached within budget. An expected
    /// degraded state, not an application error.
    Unavailable,
    /// A store or file write did not complete.
    WriteFailed(String),
    /// A caller-supplied identifier is not a 24-hex ObjectId. Rejected
    /// before any I/O.
    InvalidId,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable => write!(f, "primary store unavailable"),
            StoreError::WriteFailed(msg) => write!(f, "write failed: {}", msg),
            StoreError::InvalidId => write!(f, "invalid identifier"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Uniform outcome for mutating operations, so callers never branch on
/// which backend (primary collection vs. fallback file) performed the
/// write.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct OperationResult {
    pub succeeded: bool,
    pub affected: u64,
}

impl OperationResult {
    pub fn ok(affected: u64) -> Self {
        OperationResult {
            succeeded: true,
            affected,
        }
    }

    pub fn failed() -> Self {
        OperationResult {
            succeeded: false,
            affected: 0,
        }
    }
}

/// Outcome of an update aimed at specific documents: success requires a
/// match, even if the update changed nothing. A zero-match update means
/// the target does not exist and must not report success.
pub(crate) fn update_outcome(matched: u64, modified: u64) -> OperationResult {
    OperationResult {
        succeeded: matched > 0,
        affected: modified,
    }
}

/// Validate and parse a caller-supplied document id. The 24-hex shape is
/// checked up front so malformed ids never reach the driver.
pub fn parse_object_id(id: &str) -> Result<ObjectId, StoreError> {
    if id.len() != 24 || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(StoreError::InvalidId);
    }
    ObjectId::parse_str(id).map_err(|_| StoreError::InvalidId)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_ids_parse() {
        assert!(parse_object_id("507f1f77bcf86cd799439011").is_ok());
        assert!(parse_object_id("ABCDEF0123456789abcdef01").is_ok());
    }

    #[test]
    fn malformed_ids_rejected_before_io() {
        assert_eq!(parse_object_id(""), Err(StoreError::InvalidId));
        assert_eq!(parse_object_id("short"), Err(StoreError::InvalidId));
        assert_eq!(
            parse_object_id("507f1f77bcf86cd79943901z"),
            Err(StoreError::InvalidId)
        );
        assert_eq!(
            parse_object_id("507f1f77bcf86cd7994390111"),
            Err(StoreError::InvalidId)
        );
    }

    #[test]
    fn operation_result_constructors() {
        assert!(OperationResult::ok(3).succeeded);
        assert_eq!(OperationResult::ok(3).affected, 3);
        assert!(!OperationResult::failed().succeeded);
    }

    #[test]
    fn unmatched_update_is_not_a_success() {
        assert!(!update_outcome(0, 0).succeeded);
        // matched but unchanged still counts as success
        let noop = update_outcome(1, 0);
        assert!(noop.succeeded);
        assert_eq!(noop.affected, 0);
        assert_eq!(update_outcome(1, 1).affected, 1);
    }
}
