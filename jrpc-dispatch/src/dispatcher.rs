//! Request dispatch
//!
//! The dispatcher drives every envelope through the same state machine:
//!
//! ```text
//! Received → Validated → Resolved → Bound → Invoked → Completed
//!     └──────────┴──────────┴─────────┴────────┴──→ Errored
//! ```
//!
//! | Transition             | Failure                             |
//! |------------------------|-------------------------------------|
//! | Received → Validated   | Invalid Request (-32600)            |
//! | Validated → Resolved   | Method not found (-32601)           |
//! | Resolved → Bound       | Invalid params (-32602)             |
//! | Bound → Invoked        | method error, panic or deadline     |
//!
//! Each dispatch yields one [`Outcome`]. Notifications run the full state
//! machine so side effects happen, but their outcome is never turned into a
//! response.
//!
//! # Thread Safety
//!
//! `Dispatcher` is a cheap `Arc` handle. Clone it into every transport task;
//! concurrent dispatches share the registry but nothing else.
//!
//! # Examples
//!
//! ```rust
//! use jrpc_dispatch::{from_fn, Dispatcher, MethodDescriptor, MethodRegistry, ParamType};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> jrpc_core::Result<()> {
//! let registry = MethodRegistry::new();
//! registry.add(
//!     MethodDescriptor::new("sum", from_fn(|p| async move {
//!         Ok(serde_json::json!(p.get_as::<i64>("a")? + p.get_as::<i64>("b")?))
//!     }))
//!     .required("a", ParamType::Integer)
//!     .required("b", ParamType::Integer),
//! )?;
//!
//! let dispatcher = Dispatcher::new(registry);
//! let reply = dispatcher
//!     .handle_text(r#"{"jsonrpc":"2.0","method":"sum","params":[2,3],"id":1}"#)
//!     .await?;
//! assert_eq!(reply.as_deref(), Some(r#"{"jsonrpc":"2.0","result":5,"id":1}"#));
//! # Ok(())
//! # }
//! ```

use crate::batch::BatchProcessor;
use crate::binder;
use crate::builder::DispatcherBuilder;
use crate::descriptor::MethodDescriptor;
use crate::metrics::DispatchMetrics;
use crate::middleware::{MiddlewareChain, MiddlewareContext};
use crate::params::BoundParams;
use crate::registry::MethodRegistry;
use crate::response;
use crate::validate::validate;
use futures::FutureExt;
use jrpc_core::{
    codec, Error, Id, JsonRpcErrorData, JsonRpcRequest, JsonRpcResponse, RequestMessage,
    ResponseMessage, Result,
};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// States of the dispatch state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Envelope decoded, nothing checked yet
    Received,
    /// Envelope passed validation
    Validated,
    /// Method found in the registry
    Resolved,
    /// Params bound to the declared parameters
    Bound,
    /// Method running (middleware included)
    Invoked,
    /// Method produced a result
    Completed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::Resolved => "resolved",
            Stage::Bound => "bound",
            Stage::Invoked => "invoked",
            Stage::Completed => "completed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of one dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The method returned a result
    Completed(Value),
    /// The dispatch failed; `from` is the last state reached
    Errored {
        from: Stage,
        error: JsonRpcErrorData,
    },
}

/// Result of dispatching one envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Id to answer with, `None` when the response is suppressed
    pub id: Option<Id>,
    pub completion: Completion,
}

impl Outcome {
    pub fn completed(id: Option<Id>, result: Value) -> Self {
        Self {
            id,
            completion: Completion::Completed(result),
        }
    }

    pub fn errored(id: Option<Id>, from: Stage, error: JsonRpcErrorData) -> Self {
        Self {
            id,
            completion: Completion::Errored { from, error },
        }
    }

    /// Whether the outcome will be discarded
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    pub fn is_success(&self) -> bool {
        matches!(self.completion, Completion::Completed(_))
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.completion {
            Completion::Completed(value) => Some(value),
            Completion::Errored { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&JsonRpcErrorData> {
        match &self.completion {
            Completion::Completed(_) => None,
            Completion::Errored { error, .. } => Some(error),
        }
    }

    /// The stage an error outcome failed from
    pub fn failed_from(&self) -> Option<Stage> {
        match &self.completion {
            Completion::Completed(_) => None,
            Completion::Errored { from, .. } => Some(*from),
        }
    }
}

struct DispatcherInner {
    registry: MethodRegistry,
    batch: BatchProcessor,
    middleware: MiddlewareChain,
    metrics: Option<Arc<DispatchMetrics>>,
    default_deadline: Option<Duration>,
}

/// Dispatches request envelopes against a method registry
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    /// Dispatcher with parallel batches, no batch limit, no middleware and
    /// no deadline
    pub fn new(registry: MethodRegistry) -> Self {
        Self::from_parts(
            registry,
            BatchProcessor::default(),
            MiddlewareChain::new(),
            None,
            None,
        )
    }

    /// Start building a configured dispatcher
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub(crate) fn from_parts(
        registry: MethodRegistry,
        batch: BatchProcessor,
        middleware: MiddlewareChain,
        metrics: Option<Arc<DispatchMetrics>>,
        default_deadline: Option<Duration>,
    ) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                registry,
                batch,
                middleware,
                metrics,
                default_deadline,
            }),
        }
    }

    /// The registry this dispatcher resolves methods against
    pub fn registry(&self) -> &MethodRegistry {
        &self.inner.registry
    }

    pub fn batch_processor(&self) -> &BatchProcessor {
        &self.inner.batch
    }

    pub fn default_deadline(&self) -> Option<Duration> {
        self.inner.default_deadline
    }

    /// Dispatch a decoded message
    ///
    /// Returns `None` when there is nothing to send: a single notification,
    /// or a batch made only of notifications.
    pub async fn dispatch(&self, message: RequestMessage) -> Option<ResponseMessage> {
        match message {
            RequestMessage::Single(envelope) => self
                .dispatch_value(envelope)
                .await
                .map(ResponseMessage::Single),
            RequestMessage::Batch(elements) => self.dispatch_batch(elements).await,
        }
    }

    /// Dispatch one raw envelope
    pub async fn dispatch_value(&self, envelope: Value) -> Option<JsonRpcResponse> {
        response::build(self.dispatch_one(envelope).await)
    }

    /// Dispatch a request built in code
    ///
    /// The request is re-validated, so a hand-built request with a wrong
    /// version or an empty method name is answered like a decoded one.
    pub async fn dispatch_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        self.dispatch_value(request.into_value()).await
    }

    /// Dispatch the elements of a batch and assemble the response array
    pub async fn dispatch_batch(&self, elements: Vec<Value>) -> Option<ResponseMessage> {
        if let Some(metrics) = &self.inner.metrics {
            metrics.record_batch(elements.len() as u64, self.inner.batch.mode().as_str());
        }

        match self.inner.batch.process(elements, self).await {
            Ok(outcomes) => response::assemble(outcomes.into_iter().map(response::build)),
            Err(error) => {
                if let Some(metrics) = &self.inner.metrics {
                    metrics.record_error(error.code);
                }
                Some(ResponseMessage::Single(response::reject(error)))
            }
        }
    }

    /// Decode, dispatch and encode a text payload
    ///
    /// Undecodable input is answered with a Parse error and a null id.
    /// `Ok(None)` means no response should be written.
    pub async fn handle_text(&self, payload: &str) -> Result<Option<String>> {
        self.handle_bytes(payload.as_bytes()).await
    }

    /// Decode, dispatch and encode a binary payload
    pub async fn handle_bytes(&self, payload: &[u8]) -> Result<Option<String>> {
        let message = match codec::decode(payload) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(error = %err, "Undecodable payload");
                if let Some(metrics) = &self.inner.metrics {
                    metrics.record_error(jrpc_core::codes::PARSE_ERROR);
                }
                return codec::encode_response(&response::reject(err.into())).map(Some);
            }
        };

        match self.dispatch(message).await {
            Some(reply) => codec::encode_message(&reply).map(Some),
            None => Ok(None),
        }
    }

    /// Run one envelope through the state machine
    #[tracing::instrument(
        name = "jsonrpc.dispatch",
        skip_all,
        fields(method = tracing::field::Empty, id = tracing::field::Empty)
    )]
    pub async fn dispatch_one(&self, envelope: Value) -> Outcome {
        let started = Instant::now();

        let (method, outcome) = match validate(envelope) {
            Err(rejection) => {
                tracing::warn!(id = %rejection.id, error = %rejection.error, "Invalid request envelope");
                let outcome =
                    Outcome::errored(Some(rejection.id), Stage::Received, rejection.error);
                (None, outcome)
            }
            Ok(request) => {
                let span = tracing::Span::current();
                span.record("method", request.method.as_str());
                if let Some(id) = &request.id {
                    span.record("id", tracing::field::display(id));
                }
                let method = request.method.clone();
                (Some(method), self.run(request).await)
            }
        };

        self.record(method.as_deref(), &outcome, started.elapsed());
        outcome
    }

    async fn run(&self, request: JsonRpcRequest) -> Outcome {
        let JsonRpcRequest {
            method, params, id, ..
        } = request;

        let Some(descriptor) = self.inner.registry.lookup(&method) else {
            tracing::debug!(method = %method, "Method not found");
            return Outcome::errored(
                id,
                Stage::Validated,
                Error::MethodNotFound(method).into(),
            );
        };

        let bound = match binder::bind(&descriptor, params) {
            Ok(bound) => bound,
            Err(e) => {
                tracing::debug!(method = %method, error = %e, "Parameter binding failed");
                return Outcome::errored(id, Stage::Resolved, e.into());
            }
        };

        tracing::debug!(method = %method, args = bound.len(), "Parameters bound");
        self.invoke(descriptor, bound, id).await
    }

    async fn invoke(
        &self,
        descriptor: Arc<MethodDescriptor>,
        params: BoundParams,
        id: Option<Id>,
    ) -> Outcome {
        let deadline = descriptor
            .invocation_deadline()
            .or(self.inner.default_deadline);
        let ctx = MiddlewareContext::new(descriptor.name(), params, id.clone());

        let target = Arc::clone(&descriptor);
        let call = self
            .inner
            .middleware
            .execute(ctx, move |ctx| async move { target.invoke(ctx.params).await });
        let guarded = AssertUnwindSafe(call).catch_unwind();

        let result = match deadline {
            None => guarded.await,
            Some(limit) => match tokio::time::timeout(limit, guarded).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(method = %descriptor.name(), deadline = ?limit, "Invocation deadline exceeded");
                    return Outcome::errored(
                        id,
                        Stage::Invoked,
                        Error::DeadlineExceeded(limit).into(),
                    );
                }
            },
        };

        match result {
            Ok(Ok(value)) => Outcome::completed(id, value),
            Ok(Err(err)) => {
                tracing::debug!(method = %descriptor.name(), error = %err, "Method returned an error");
                Outcome::errored(id, Stage::Invoked, err.into())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(method = %descriptor.name(), panic = %message, "Method panicked");
                Outcome::errored(
                    id,
                    Stage::Invoked,
                    JsonRpcErrorData::internal_error(format!(
                        "Method '{}' panicked: {}",
                        descriptor.name(),
                        message
                    )),
                )
            }
        }
    }

    fn record(&self, method: Option<&str>, outcome: &Outcome, elapsed: Duration) {
        if outcome.is_notification() {
            tracing::debug!(method = ?method, success = outcome.is_success(), "Notification outcome discarded");
        }

        let Some(metrics) = &self.inner.metrics else {
            return;
        };
        let method = method.unwrap_or("<invalid>");
        let status = if outcome.is_success() { "success" } else { "error" };

        metrics.record_request(method, status, elapsed.as_secs_f64());
        if let Some(error) = outcome.error() {
            metrics.record_error(error.code);
        }
        if outcome.is_notification() {
            metrics.record_notification(method);
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.inner.registry)
            .field("batch", &self.inner.batch)
            .field("middleware", &self.inner.middleware.len())
            .field("metrics", &self.inner.metrics.is_some())
            .field("default_deadline", &self.inner.default_deadline)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
