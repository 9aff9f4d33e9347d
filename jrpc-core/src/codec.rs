//! Codec for JSON-RPC message serialization and deserialization
//!
//! The codec is the raw parse/serialize capability that transports sit on.
//! Decoding only answers two questions: is this valid JSON, and is the top
//! level an array? Everything else (envelope validation, notification
//! detection) happens in the dispatcher so that each batch element is judged
//! on its own.
//!
//! # Error Handling
//!
//! - Invalid JSON → `Error::JsonRpc` carrying a Parse error (-32700)
//! - Serialization failures → `Error::Serialization`
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{codec, RequestMessage};
//!
//! let msg = codec::decode_str(r#"{"jsonrpc":"2.0","method":"ping","id":1}"#).unwrap();
//! assert!(matches!(msg, RequestMessage::Single(_)));
//!
//! let batch = codec::decode_str(r#"[{"jsonrpc":"2.0","method":"ping"}]"#).unwrap();
//! assert!(batch.is_batch());
//! ```

use crate::error::{Error, JsonRpcErrorData, Result};
use crate::types::{JsonRpcResponse, RequestMessage, ResponseMessage};
use serde::Serialize;
use serde_json::Value;

/// Encode any serializable message to a JSON string
///
/// # Errors
///
/// Returns `Error::Serialization` if the message cannot be serialized.
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode raw bytes into a request message (single envelope or batch)
///
/// An empty array decodes successfully to an empty batch; rejecting it is
/// the dispatcher's job since the error belongs to the batch as a whole.
///
/// # Errors
///
/// `Error::JsonRpc(parse_error)` if the bytes are not valid JSON.
pub fn decode(data: &[u8]) -> Result<RequestMessage> {
    let value: Value = serde_json::from_slice(data)
        .map_err(|_e| Error::JsonRpc(JsonRpcErrorData::parse_error()))?;
    Ok(RequestMessage::from(value))
}

/// Decode a JSON string into a request message
///
/// Same as [`decode`] for text transports.
pub fn decode_str(data: &str) -> Result<RequestMessage> {
    decode(data.as_bytes())
}

/// Encode a JSON-RPC response to JSON
///
/// ```rust
/// use jrpc_core::{codec, JsonRpcResponse, Id};
/// use serde_json::json;
///
/// let response = JsonRpcResponse::success(json!(5), Id::Number(1));
/// let json = codec::encode_response(&response).unwrap();
/// assert_eq!(json, r#"{"jsonrpc":"2.0","result":5,"id":1}"#);
/// ```
pub fn encode_response(resp: &JsonRpcResponse) -> Result<String> {
    encode(resp)
}

/// Encode a batch of responses to a JSON array
pub fn encode_batch_responses(responses: &[JsonRpcResponse]) -> Result<String> {
    encode(&responses)
}

/// Encode a response message, single object or array
pub fn encode_message(msg: &ResponseMessage) -> Result<String> {
    match msg {
        ResponseMessage::Single(response) => encode_response(response),
        ResponseMessage::Batch(responses) => encode_batch_responses(responses),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes;
    use crate::types::{Id, JsonRpcRequest, Params};
    use serde_json::json;

    #[test]
    fn test_decode_single_object() {
        let msg = decode_str(r#"{"jsonrpc":"2.0","method":"test","id":1}"#).unwrap();
        match msg {
            RequestMessage::Single(value) => assert_eq!(value["method"], "test"),
            other => panic!("expected single message, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_keeps_malformed_batch_elements() {
        let msg = decode_str(r#"[{"jsonrpc":"2.0","method":"notify"}, 1, "x", []]"#).unwrap();
        match msg {
            RequestMessage::Batch(items) => {
                assert_eq!(items.len(), 4);
                assert_eq!(items[1], json!(1));
                assert_eq!(items[3], json!([]));
            }
            other => panic!("expected batch message, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_empty_array_is_empty_batch() {
        assert_eq!(decode(b"[]").unwrap(), RequestMessage::Batch(vec![]));
    }

    #[test]
    fn test_decode_invalid_json_is_parse_error() {
        for input in ["", "not valid json", r#"{"jsonrpc":"2.0","method":"foo""#] {
            match decode_str(input) {
                Err(Error::JsonRpc(data)) => assert_eq!(data.code, codes::PARSE_ERROR),
                other => panic!("expected parse error for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_decode_scalar_is_single() {
        assert_eq!(decode(b"42").unwrap(), RequestMessage::Single(json!(42)));
    }

    #[test]
    fn test_encode_request_omits_absent_members() {
        let req = JsonRpcRequest::notification("notify", None);
        assert_eq!(encode(&req).unwrap(), r#"{"jsonrpc":"2.0","method":"notify"}"#);

        let req = JsonRpcRequest::new(
            "sum",
            Some(Params::Positional(vec![json!(2), json!(3)])),
            Id::Number(1),
        );
        assert_eq!(
            encode(&req).unwrap(),
            r#"{"jsonrpc":"2.0","method":"sum","params":[2,3],"id":1}"#
        );
    }

    #[test]
    fn test_encode_message_batch_order() {
        let msg = ResponseMessage::Batch(vec![
            JsonRpcResponse::success(json!(1), Id::Number(1)),
            JsonRpcResponse::error(JsonRpcErrorData::invalid_request("bad"), Id::Null),
            JsonRpcResponse::success(json!(3), Id::String("c".into())),
        ]);
        let encoded = encode_message(&msg).unwrap();
        let value: Value = serde_json::from_str(&encoded).unwrap();

        assert_eq!(value[0]["id"], json!(1));
        assert_eq!(value[1]["error"]["code"], json!(-32600));
        assert_eq!(value[1]["id"], Value::Null);
        assert_eq!(value[2]["id"], json!("c"));
    }

    #[test]
    fn test_response_with_null_id_deserializes() {
        let resp: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","error":{"code":-32700,"message":"Parse error"},"id":null}"#,
        )
        .unwrap();

        assert!(resp.is_error());
        assert_eq!(resp.id, Id::Null);
        assert_eq!(resp.error_data().map(|e| e.code), Some(codes::PARSE_ERROR));
    }

    #[test]
    fn test_response_message_batch_deserializes() {
        let msg: ResponseMessage = serde_json::from_str(
            r#"[{"jsonrpc":"2.0","result":5,"id":1},{"jsonrpc":"2.0","result":null,"id":2}]"#,
        )
        .unwrap();
        let batch = msg.as_batch().unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].result(), Some(&Value::Null));
    }
}
