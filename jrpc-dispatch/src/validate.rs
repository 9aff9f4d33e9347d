//! Request envelope validation
//!
//! Turns one decoded JSON value into a [`JsonRpcRequest`] or a
//! [`Rejection`]. Checks run in a fixed order, each short-circuiting:
//!
//! 1. the value is an object
//! 2. `id`, if present, is a string, an integer or null
//! 3. `jsonrpc` is exactly `"2.0"`
//! 4. `method` is a non-empty string
//! 5. `params`, if present, is an array or an object
//!
//! Members outside these four are ignored. Whether a method name is
//! registered (including reserved `rpc.*` names) is decided later by the
//! registry lookup, so an unknown but well-formed name is Method not found
//! rather than Invalid Request.
//!
//! A rejection always carries the id to answer with. An envelope that fails
//! validation is never treated as a notification, even without an `id`.

use jrpc_core::{Error, Id, JsonRpcErrorData, JsonRpcRequest, Params, JSONRPC_VERSION};
use serde_json::Value;

/// An envelope that failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// The request id when its shape was valid, otherwise `Id::Null`
    pub id: Id,
    /// Invalid Request (-32600) error object
    pub error: JsonRpcErrorData,
}

impl Rejection {
    fn new(id: Id, message: &str) -> Self {
        Self {
            id,
            error: Error::InvalidRequest(message.to_string()).into(),
        }
    }
}

/// Validate one request envelope
pub fn validate(envelope: Value) -> Result<JsonRpcRequest, Rejection> {
    let Value::Object(mut envelope) = envelope else {
        return Err(Rejection::new(Id::Null, "Request must be a JSON object"));
    };

    let id = match envelope.remove("id") {
        None => None,
        Some(raw) => match Id::from_value(&raw) {
            Some(id) => Some(id),
            None => {
                return Err(Rejection::new(
                    Id::Null,
                    "Request id must be a string, an integer or null",
                ))
            }
        },
    };
    let reply_id = || id.clone().unwrap_or(Id::Null);

    match envelope.get("jsonrpc") {
        Some(Value::String(version)) if version == JSONRPC_VERSION => {}
        _ => {
            return Err(Rejection::new(
                reply_id(),
                "Member 'jsonrpc' must be exactly \"2.0\"",
            ))
        }
    }

    let method = match envelope.remove("method") {
        Some(Value::String(method)) if !method.is_empty() => method,
        _ => {
            return Err(Rejection::new(
                reply_id(),
                "Member 'method' must be a non-empty string",
            ))
        }
    };

    let params = match envelope.remove("params") {
        None => None,
        Some(raw) => match Params::from_value(raw) {
            Some(params) => Some(params),
            None => {
                return Err(Rejection::new(
                    reply_id(),
                    "Member 'params' must be an array or an object",
                ))
            }
        },
    };

    Ok(JsonRpcRequest {
        jsonrpc: JSONRPC_VERSION.to_string(),
        method,
        params,
        id,
    })
}
