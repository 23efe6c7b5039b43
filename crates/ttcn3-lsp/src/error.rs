use lsp_server::ErrorCode;
use thiserror::Error;

/// Error code of methods that are advertised but have no implementation.
pub const NOT_IMPLEMENTED: i32 = -32010;

/// Failure of a single request or notification handler. The session itself
/// keeps running.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("request canceled")]
    Canceled,

    #[error("{0} is not implemented")]
    NotImplemented(String),

    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("request handler panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Connection(#[from] anyhow::Error),
}

impl HandlerError {
    /// JSON-RPC error code sent back to the client.
    pub fn code(&self) -> i32 {
        match self {
            HandlerError::DocumentNotFound(_) => ErrorCode::RequestFailed as i32,
            HandlerError::InvalidParams(_) => ErrorCode::InvalidParams as i32,
            HandlerError::Canceled => ErrorCode::RequestCanceled as i32,
            HandlerError::NotImplemented(_) => NOT_IMPLEMENTED,
            HandlerError::Encode(_) | HandlerError::Panicked(_) | HandlerError::Connection(_) => {
                ErrorCode::InternalError as i32
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(HandlerError::DocumentNotFound("x".into()).code(), -32803);
        assert_eq!(HandlerError::Canceled.code(), -32800);
        assert_eq!(HandlerError::NotImplemented("m".into()).code(), -32010);
        assert_eq!(HandlerError::InvalidParams("p".into()).code(), -32602);
    }

    #[test]
    fn test_document_not_found_message() {
        let err = HandlerError::DocumentNotFound("file:///a.ttcn3".into());
        assert_eq!(err.to_string(), "document not found: file:///a.ttcn3");
    }
}
