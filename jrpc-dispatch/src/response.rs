//! Response construction
//!
//! Turns dispatch outcomes into response objects. Notification outcomes are
//! dropped here and nowhere else, which keeps the suppression rule uniform
//! for successes and failures alike.

use crate::dispatcher::{Completion, Outcome};
use jrpc_core::{Id, JsonRpcErrorData, JsonRpcResponse, ResponseMessage};

/// Build the response for one outcome, `None` for a notification
pub fn build(outcome: Outcome) -> Option<JsonRpcResponse> {
    let id = outcome.id?;
    Some(match outcome.completion {
        Completion::Completed(result) => JsonRpcResponse::success(result, id),
        Completion::Errored { error, .. } => JsonRpcResponse::error(error, id),
    })
}

/// Error response for a failure detected before any request id was known
pub fn reject(error: JsonRpcErrorData) -> JsonRpcResponse {
    JsonRpcResponse::error(error, Id::Null)
}

/// Wrap batch element responses, in order, into a batch response
///
/// Returns `None` when no element produced a response (an all-notification
/// batch).
pub fn assemble<I>(responses: I) -> Option<ResponseMessage>
where
    I: IntoIterator<Item = Option<JsonRpcResponse>>,
{
    let responses: Vec<JsonRpcResponse> = responses.into_iter().flatten().collect();
    if responses.is_empty() {
        None
    } else {
        Some(ResponseMessage::Batch(responses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Stage;
    use serde_json::json;

    #[test]
    fn test_build_success_and_error() {
        let ok = build(Outcome::completed(Some(Id::Number(1)), json!(5))).unwrap();
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"jsonrpc": "2.0", "result": 5, "id": 1}));

        let err = build(Outcome::errored(
            Some(Id::String("a".into())),
            Stage::Validated,
            JsonRpcErrorData::method_not_found("missing"),
        ))
        .unwrap();
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["error"]["code"], json!(-32601));
        assert_eq!(value["id"], json!("a"));
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_build_suppresses_notifications() {
        assert!(build(Outcome::completed(None, json!(1))).is_none());
        assert!(build(Outcome::errored(
            None,
            Stage::Bound,
            JsonRpcErrorData::internal_error("boom")
        ))
        .is_none());
    }

    #[test]
    fn test_assemble_keeps_order_and_skips_none() {
        let message = assemble(vec![
            None,
            Some(JsonRpcResponse::success(json!(2), Id::Number(2))),
            None,
            Some(JsonRpcResponse::success(json!(4), Id::Number(4))),
        ])
        .unwrap();

        let ids: Vec<_> = message.as_batch().unwrap().iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![Id::Number(2), Id::Number(4)]);
    }

    #[test]
    fn test_assemble_all_notifications_is_no_content() {
        assert!(assemble(vec![None, None]).is_none());
    }

    #[test]
    fn test_reject_uses_null_id() {
        let response = reject(JsonRpcErrorData::parse_error());
        assert_eq!(response.id, Id::Null);
        assert!(response.is_error());
    }
}
