//! Error types for jrpc
//!
//! Two error types live here:
//!
//! - **Error**: crate-level errors returned by registration, codec and method
//!   implementations (uses thiserror)
//! - **JsonRpcErrorData**: the wire-format error object from JSON-RPC 2.0
//!
//! Every `Error` converts into a `JsonRpcErrorData`, which is how the
//! dispatcher turns a failed invocation into an error response.
//!
//! # Reserved Error Codes
//!
//! - `-32700`: Parse error (invalid JSON)
//! - `-32600`: Invalid Request (envelope fails validation)
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//! - `-32000 to -32099`: Server error (implementation-defined)
//!
//! Any other code is application-defined.
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{Error, JsonRpcErrorData};
//!
//! let error = Error::MethodNotFound("unknownMethod".into());
//! let wire: JsonRpcErrorData = error.into();
//! assert_eq!(wire.code, -32601);
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Standard JSON-RPC 2.0 error codes
pub mod codes {
    /// Invalid JSON was received
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid Request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist / is not available
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameter(s)
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Upper bound of the implementation-defined server error range
    pub const SERVER_ERROR_MAX: i32 = -32000;
    /// Lower bound of the implementation-defined server error range
    pub const SERVER_ERROR_MIN: i32 = -32099;
}

/// Result type for jrpc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error type
///
/// Method implementations return this from their invocation function. The
/// variant decides which error object reaches the caller:
///
/// - `JsonRpc` carries a structured, application-supplied error object and is
///   passed through verbatim (its code, message and data win)
/// - `InvalidParams` keeps -32602 so a method can reject arguments itself
/// - everything else becomes an Internal error (-32603)
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Structured JSON-RPC error object, passed through unchanged
    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] JsonRpcErrorData),

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Envelope is not a valid JSON-RPC 2.0 request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No method is registered under this name
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Parameters could not be bound or were rejected by the method
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Unexpected failure during method execution
    #[error("Internal error: {0}")]
    Internal(String),

    /// Registration used an empty or `rpc.`-reserved method name
    #[error("Invalid method name: {0:?}")]
    InvalidMethodName(String),

    /// Registration declared a parameter name more than once
    #[error("Duplicate parameter '{param}' declared by method '{method}'")]
    DuplicateParam {
        /// Method being registered
        method: String,
        /// Parameter declared twice
        param: String,
    },

    /// The invocation ran past its deadline and was abandoned
    #[error("Invocation deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    /// Batch contains more elements than the configured limit
    #[error("Batch size limit exceeded: limit={limit}, actual={actual}")]
    BatchSizeExceeded {
        /// The maximum allowed batch size
        limit: usize,
        /// The actual batch size that was rejected
        actual: usize,
    },
}

impl Error {
    /// Convert this error into the error object sent on the wire
    pub fn to_error_data(&self) -> JsonRpcErrorData {
        match self {
            Error::JsonRpc(data) => data.clone(),
            Error::InvalidRequest(msg) => JsonRpcErrorData::invalid_request(msg.clone()),
            Error::MethodNotFound(method) => JsonRpcErrorData::method_not_found(method.clone()),
            Error::InvalidParams(msg) => JsonRpcErrorData::invalid_params(msg.clone()),
            Error::BatchSizeExceeded { limit, actual } => {
                JsonRpcErrorData::batch_size_exceeded(*limit, *actual)
            }
            Error::DeadlineExceeded(after) => JsonRpcErrorData::deadline_exceeded(*after),
            Error::Internal(msg) => JsonRpcErrorData::internal_error(msg.clone()),
            other => JsonRpcErrorData::internal_error(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<Error> for JsonRpcErrorData {
    fn from(err: Error) -> Self {
        match err {
            Error::JsonRpc(data) => data,
            other => other.to_error_data(),
        }
    }
}

/// JSON-RPC 2.0 error object
///
/// This structure is the exact wire format of the `error` member of a
/// response: an integer `code`, a short `message` and optional `data`.
///
/// # Examples
///
/// ```rust
/// use jrpc_core::JsonRpcErrorData;
/// use serde_json::json;
///
/// let error = JsonRpcErrorData::method_not_found("calculate");
/// assert_eq!(error.code, -32601);
///
/// // Application error with additional data
/// let custom = JsonRpcErrorData::with_data(
///     1001,
///     "Insufficient funds",
///     json!({"balance": 50, "required": 100})
/// );
/// assert!(!custom.is_reserved());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorData {
    /// Numeric error code
    ///
    /// Codes from -32768 to -32000 are reserved by the protocol.
    pub code: i32,

    /// Short description of the error
    pub message: String,

    /// Optional primitive or structured value with more detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcErrorData {
    /// Create an error object with code and message
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create an error object carrying additional data
    pub fn with_data(code: i32, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Attach data to an existing error object
    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Parse error (-32700)
    ///
    /// Raised at the transport boundary when the payload is not valid JSON.
    pub fn parse_error() -> Self {
        Self::new(codes::PARSE_ERROR, "Parse error")
    }

    /// Invalid request error (-32600)
    ///
    /// The JSON is valid but the value is not a Request object.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(codes::INVALID_REQUEST, msg)
    }

    /// Method not found error (-32601)
    ///
    /// ```rust
    /// use jrpc_core::JsonRpcErrorData;
    ///
    /// let error = JsonRpcErrorData::method_not_found("calculateFoo");
    /// assert_eq!(error.message, "Method not found: calculateFoo");
    /// ```
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(
            codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", method.into()),
        )
    }

    /// Invalid params error (-32602)
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(codes::INVALID_PARAMS, msg)
    }

    /// Internal error (-32603)
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL_ERROR, msg)
    }

    /// Internal error (-32603) for an invocation abandoned at its deadline
    pub fn deadline_exceeded(after: Duration) -> Self {
        Self::new(
            codes::INTERNAL_ERROR,
            format!("Invocation deadline exceeded after {:?}", after),
        )
    }

    /// Invalid request error (-32600) for an oversized batch
    pub fn batch_size_exceeded(limit: usize, actual: usize) -> Self {
        Self::new(
            codes::INVALID_REQUEST,
            format!("Batch size limit exceeded: limit={}, actual={}", limit, actual),
        )
    }

    /// Whether the code falls in the protocol-reserved range (-32768..=-32000)
    pub fn is_reserved(&self) -> bool {
        (-32768..=-32000).contains(&self.code)
    }

    /// Whether the code falls in the server error range (-32099..=-32000)
    pub fn is_server_error(&self) -> bool {
        (codes::SERVER_ERROR_MIN..=codes::SERVER_ERROR_MAX).contains(&self.code)
    }
}

impl std::fmt::Display for JsonRpcErrorData {
    /// Formats as "[code] message", e.g. "[-32601] Method not found: foo"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcErrorData {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_jsonrpc_error_codes() {
        let errors = vec![
            (JsonRpcErrorData::parse_error(), -32700),
            (JsonRpcErrorData::invalid_request("test"), -32600),
            (JsonRpcErrorData::method_not_found("test"), -32601),
            (JsonRpcErrorData::invalid_params("test"), -32602),
            (JsonRpcErrorData::internal_error("test"), -32603),
        ];

        for (error, expected_code) in errors {
            assert_eq!(error.code, expected_code);
            assert!(!error.message.is_empty());
            assert!(error.is_reserved());
        }
    }

    #[test]
    fn test_application_error_passes_through() {
        let app = JsonRpcErrorData::with_data(4001, "Insufficient funds", json!({"balance": 3}));
        let error = Error::JsonRpc(app.clone());

        assert_eq!(error.to_error_data(), app);
        assert_eq!(JsonRpcErrorData::from(error), app);
    }

    #[test]
    fn test_invalid_params_keeps_code() {
        let error = Error::InvalidParams("b must be positive".to_string());
        let wire = error.to_error_data();

        assert_eq!(wire.code, codes::INVALID_PARAMS);
        assert_eq!(wire.message, "b must be positive");
    }

    #[test]
    fn test_other_errors_become_internal() {
        let wire: JsonRpcErrorData = Error::Serialization("bad float".into()).into();
        assert_eq!(wire.code, codes::INTERNAL_ERROR);
        assert!(wire.message.contains("bad float"));

        let wire: JsonRpcErrorData = Error::Internal("db down".into()).into();
        assert_eq!(wire.code, codes::INTERNAL_ERROR);
        assert_eq!(wire.message, "db down");
    }

    #[test]
    fn test_deadline_message_is_distinct() {
        let wire: JsonRpcErrorData = Error::DeadlineExceeded(Duration::from_millis(50)).into();

        assert_eq!(wire.code, codes::INTERNAL_ERROR);
        assert_eq!(wire.message, "Invocation deadline exceeded after 50ms");
    }

    #[test]
    fn test_batch_size_exceeded_creation() {
        let error = JsonRpcErrorData::batch_size_exceeded(100, 150);

        assert_eq!(error.code, -32600);
        assert!(error.message.contains("100"));
        assert!(error.message.contains("150"));
    }

    #[test]
    fn test_server_error_range() {
        assert!(JsonRpcErrorData::new(-32000, "x").is_server_error());
        assert!(JsonRpcErrorData::new(-32099, "x").is_server_error());
        assert!(!JsonRpcErrorData::new(-32100, "x").is_server_error());
        assert!(!JsonRpcErrorData::internal_error("x").is_server_error());
    }

    #[test]
    fn test_jsonrpc_error_display() {
        let error = JsonRpcErrorData::method_not_found("unknownMethod");
        assert_eq!(error.to_string(), "[-32601] Method not found: unknownMethod");
    }

    #[test]
    fn test_error_data_omitted_when_absent() {
        let serialized = serde_json::to_value(JsonRpcErrorData::new(-32000, "Custom")).unwrap();
        assert_eq!(serialized, json!({"code": -32000, "message": "Custom"}));

        let with = JsonRpcErrorData::new(-32000, "Custom").data(json!([1, 2]));
        let serialized = serde_json::to_value(with).unwrap();
        assert_eq!(serialized["data"], json!([1, 2]));
    }

    #[test]
    fn test_serde_error_conversion() {
        let serde_error = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let error: Error = serde_error.into();
        assert!(matches!(error, Error::Serialization(msg) if !msg.is_empty()));
    }
}
