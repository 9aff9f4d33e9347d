//! Core JSON-RPC 2.0 types, errors and codec for jrpc
//!
//! This crate is the transport-independent foundation the dispatcher builds
//! on:
//!
//! - **Types**: ids, params, requests, responses, single/batch messages
//! - **Error handling**: the crate `Error` and the wire error object
//! - **Codec**: raw decode of incoming payloads and encode of responses
//! - **Observability**: tracing subscriber and OpenTelemetry setup
//!
//! # Example
//!
//! ```rust
//! use jrpc_core::{codec, Id, JsonRpcResponse, RequestMessage};
//! use serde_json::json;
//!
//! let msg = codec::decode_str(r#"{"jsonrpc":"2.0","method":"sum","params":[2,3],"id":1}"#).unwrap();
//! assert!(matches!(msg, RequestMessage::Single(_)));
//!
//! let reply = JsonRpcResponse::success(json!(5), Id::Number(1));
//! assert_eq!(codec::encode_response(&reply).unwrap(), r#"{"jsonrpc":"2.0","result":5,"id":1}"#);
//! ```

pub mod codec;
pub mod error;
pub mod observability;
pub mod types;

pub use error::{codes, Error, JsonRpcErrorData, Result};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use types::{
    Id, JsonRpcRequest, JsonRpcResponse, Params, RequestMessage, ResponseMessage,
    ResponseOutcome, JSONRPC_VERSION,
};
