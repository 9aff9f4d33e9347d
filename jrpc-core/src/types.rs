//! JSON-RPC 2.0 wire types
//!
//! These types model the request and response objects of JSON-RPC 2.0
//! (https://www.jsonrpc.org):
//!
//! - **Id**: request identifier (string, integer or null)
//! - **Params**: positional or named parameters, decided once at decode time
//! - **JsonRpcRequest**: a validated request or notification
//! - **JsonRpcResponse**: a success or error outcome, never both
//! - **RequestMessage / ResponseMessage**: single object or batch array
//!
//! # Notifications
//!
//! A request whose `id` member is absent is a notification. `null` is a valid
//! id and does NOT make a request a notification, which is why
//! `JsonRpcRequest::id` is `Option<Id>` with `Some(Id::Null)` distinct from
//! `None`.

use crate::error::JsonRpcErrorData;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The only protocol version accepted and emitted
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request ID
///
/// Serialized untagged so the wire value is the bare string, integer or null.
///
/// ```rust
/// use jrpc_core::Id;
///
/// let id1: Id = "req-123".into();
/// let id2: Id = 42i64.into();
///
/// assert_eq!(id1.to_string(), "\"req-123\"");
/// assert_eq!(id2.to_string(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// String identifier
    String(String),
    /// Integer identifier
    Number(i64),
    /// Integer identifier above `i64::MAX`
    Unsigned(u64),
    /// Null identifier, also used when the request id could not be determined
    Null,
}

impl Id {
    /// Read an id from a raw JSON value
    ///
    /// Returns `None` for shapes the protocol does not allow as an id
    /// (booleans, arrays, objects, fractional or negative out-of-range
    /// numbers). Integers past `i64::MAX` are kept as [`Id::Unsigned`].
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Id::Null),
            Value::String(s) => Some(Id::String(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(Id::Number)
                .or_else(|| n.as_u64().map(Id::Unsigned)),
            _ => None,
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
            Id::Unsigned(n) => write!(f, "{}", n),
            Id::Null => write!(f, "null"),
        }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

impl From<u64> for Id {
    fn from(n: u64) -> Self {
        i64::try_from(n).map_or(Id::Unsigned(n), Id::Number)
    }
}

impl From<i32> for Id {
    fn from(n: i32) -> Self {
        Id::Number(i64::from(n))
    }
}

/// Request parameters
///
/// Exactly two shapes are legal; absence is modelled as `Option<Params>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    /// Ordered sequence, bound to declared parameters by index
    Positional(Vec<Value>),
    /// Name-keyed mapping, bound to declared parameters by name
    Named(Map<String, Value>),
}

impl Params {
    /// Read params from a raw JSON value, `None` if the shape is illegal
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(Params::Positional(items)),
            Value::Object(map) => Some(Params::Named(map)),
            _ => None,
        }
    }

    /// Number of supplied arguments
    pub fn len(&self) -> usize {
        match self {
            Params::Positional(items) => items.len(),
            Params::Named(map) => map.len(),
        }
    }

    /// Whether no arguments were supplied
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short shape name for logs and error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Params::Positional(_) => "positional",
            Params::Named(_) => "named",
        }
    }
}

impl From<Vec<Value>> for Params {
    fn from(items: Vec<Value>) -> Self {
        Params::Positional(items)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params::Named(map)
    }
}

/// JSON-RPC 2.0 request
///
/// Produced by request validation, or built directly by callers that want
/// to encode a request.
///
/// ```rust
/// use jrpc_core::{Id, JsonRpcRequest, Params};
/// use serde_json::json;
///
/// let req = JsonRpcRequest::new("sum", Some(Params::Positional(vec![json!(2), json!(3)])), 1);
/// assert!(!req.is_notification());
///
/// let notif = JsonRpcRequest::notification("log", None);
/// assert!(notif.is_notification());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcRequest {
    /// Protocol version, always "2.0" after validation
    pub jsonrpc: String,
    /// Name of the method to invoke
    pub method: String,
    /// Parameters, `None` when the member was absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    /// Request id, `None` when the member was absent (a notification)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
}

impl JsonRpcRequest {
    /// Create a request that expects a response
    pub fn new(method: impl Into<String>, params: Option<Params>, id: impl Into<Id>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: Some(id.into()),
        }
    }

    /// Create a notification (no `id`, no response)
    pub fn notification(method: impl Into<String>, params: Option<Params>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: None,
        }
    }

    /// Whether this request is a notification
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// The request as a raw envelope, as if freshly decoded
    ///
    /// `Some(Id::Null)` becomes an explicit `"id": null`; `None` omits the member.
    pub fn into_value(self) -> Value {
        let mut envelope = Map::new();
        envelope.insert("jsonrpc".into(), Value::String(self.jsonrpc));
        envelope.insert("method".into(), Value::String(self.method));
        match self.params {
            Some(Params::Positional(items)) => {
                envelope.insert("params".into(), Value::Array(items));
            }
            Some(Params::Named(map)) => {
                envelope.insert("params".into(), Value::Object(map));
            }
            None => {}
        }
        if let Some(id) = self.id {
            let id = match id {
                Id::String(s) => Value::String(s),
                Id::Number(n) => Value::from(n),
                Id::Unsigned(n) => Value::from(n),
                Id::Null => Value::Null,
            };
            envelope.insert("id".into(), id);
        }
        Value::Object(envelope)
    }
}

/// Outcome carried by a response: `result` or `error`, never both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponseOutcome {
    /// Successful invocation result
    #[serde(rename = "result")]
    Result(Value),
    /// Failure description
    #[serde(rename = "error")]
    Error(JsonRpcErrorData),
}

/// JSON-RPC 2.0 response
///
/// The outcome is flattened into the object, so the encoded form carries
/// exactly one of `result` or `error`.
///
/// ```rust
/// use jrpc_core::{Id, JsonRpcErrorData, JsonRpcResponse};
/// use serde_json::json;
///
/// let ok = JsonRpcResponse::success(json!(5), Id::Number(1));
/// assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"jsonrpc": "2.0", "result": 5, "id": 1}));
///
/// let err = JsonRpcResponse::error(JsonRpcErrorData::method_not_found("x"), Id::Null);
/// assert!(err.is_error());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version, always "2.0"
    pub jsonrpc: String,
    /// Result or error
    #[serde(flatten)]
    pub outcome: ResponseOutcome,
    /// Echo of the request id, `Id::Null` if it could not be determined
    pub id: Id,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(result: Value, id: Id) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            outcome: ResponseOutcome::Result(result),
            id,
        }
    }

    /// Create an error response
    pub fn error(error: JsonRpcErrorData, id: Id) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            outcome: ResponseOutcome::Error(error),
            id,
        }
    }

    /// Whether the response carries a result
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ResponseOutcome::Result(_))
    }

    /// Whether the response carries an error
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ResponseOutcome::Error(_))
    }

    /// The result value, if successful
    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            ResponseOutcome::Result(value) => Some(value),
            ResponseOutcome::Error(_) => None,
        }
    }

    /// The error object, if failed
    pub fn error_data(&self) -> Option<&JsonRpcErrorData> {
        match &self.outcome {
            ResponseOutcome::Result(_) => None,
            ResponseOutcome::Error(error) => Some(error),
        }
    }
}

/// A decoded incoming payload: one envelope or a batch of them
///
/// Envelopes stay raw `Value`s so each one is validated on its own and a
/// malformed batch element cannot poison its siblings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestMessage {
    /// A single top-level request object (or other non-array value)
    Single(Value),
    /// A top-level array
    Batch(Vec<Value>),
}

impl RequestMessage {
    /// Whether this message is a batch
    pub fn is_batch(&self) -> bool {
        matches!(self, RequestMessage::Batch(_))
    }
}

impl From<Value> for RequestMessage {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => RequestMessage::Batch(items),
            other => RequestMessage::Single(other),
        }
    }
}

impl From<JsonRpcRequest> for RequestMessage {
    fn from(request: JsonRpcRequest) -> Self {
        RequestMessage::Single(request.into_value())
    }
}

/// Outgoing payload: one response or an array of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseMessage {
    /// Response to a single request
    Single(JsonRpcResponse),
    /// Responses to the non-notification members of a batch, in input order
    Batch(Vec<JsonRpcResponse>),
}

impl ResponseMessage {
    /// The single response, if this is not a batch
    pub fn as_single(&self) -> Option<&JsonRpcResponse> {
        match self {
            ResponseMessage::Single(response) => Some(response),
            ResponseMessage::Batch(_) => None,
        }
    }

    /// The batch responses, if this is a batch
    pub fn as_batch(&self) -> Option<&[JsonRpcResponse]> {
        match self {
            ResponseMessage::Single(_) => None,
            ResponseMessage::Batch(responses) => Some(responses),
        }
    }
}
