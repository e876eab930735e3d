//! Host-side errors for the stowaway server.
//!
//! Worker and storage failures arrive as `stowaway_core::Error` and convert
//! on their own; these cover what can go wrong in the host itself.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The worker answered an event with an outcome of the wrong kind.
    #[error("UNEXPECTED_OUTCOME: {0} event produced a different outcome")]
    UnexpectedOutcome(&'static str),

    /// A tool result could not be serialized.
    #[error("SERIALIZE_FAILED: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<HostError> for McpError {
    fn from(err: HostError) -> Self {
        let code = match &err {
            HostError::UnexpectedOutcome(_) => -32603,
            HostError::Serialize(_) => -32000,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_outcome_code() {
        let err: McpError = HostError::UnexpectedOutcome("install").into();
        assert_eq!(err.code, ErrorCode(-32603));
        assert!(err.message.contains("install"));
    }
}
