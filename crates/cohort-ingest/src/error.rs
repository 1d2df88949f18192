//! Error types for proposal ingestion
//!
//! Only the fatal, non-recoverable input problems are errors:
//! - payloads of a type that cannot carry JSON
//! - text that is not JSON at all
//! - JSON of the wrong shape
//!
//! Integrity problems are reported as data by the checker.

use crate::integrity::ValidationReport;

/// Fatal ingestion errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    /// Payload is neither text nor a structure
    #[error("unsupported payload type: {found}")]
    UnsupportedPayload { found: &'static str },

    /// Payload text does not parse as JSON
    #[error("malformed payload: {message}")]
    MalformedPayload { message: String },

    /// Payload parses but has the wrong shape
    #[error("schema violation at {path}: expected {expected}")]
    SchemaViolation { path: String, expected: String },
}

impl IngestError {
    /// Create malformed payload error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            message: message.into(),
        }
    }

    /// Create schema violation for path
    pub fn schema(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::SchemaViolation {
            path: path.into(),
            expected: expected.into(),
        }
    }
}

/// Repair left errors the engine must not guess at
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("repair incomplete: {} error(s) remain", report.error_count())]
pub struct RepairIncomplete {
    /// Report from the re-check after repair
    pub report: ValidationReport,
}

/// Result type alias for ingestion operations
pub type IngestResult<T> = Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_violation_display() {
        let err = IngestError::schema("groups[0].groupNumber", "positive integer");
        assert_eq!(
            err.to_string(),
            "schema violation at groups[0].groupNumber: expected positive integer"
        );
    }

    #[test]
    fn unsupported_payload_display() {
        let err = IngestError::UnsupportedPayload { found: "number" };
        assert_eq!(err.to_string(), "unsupported payload type: number");
    }
}
