//! Transport-independent JSON-RPC 2.0 dispatch
//!
//! This crate takes decoded JSON-RPC messages from any transport, runs each
//! envelope through validation, method resolution, parameter binding and
//! invocation, and hands back the response message to write (if any).
//!
//! # Core Features
//!
//! - **Method Registry**: Described methods with declared parameters,
//!   shareable and mutable at runtime
//! - **Parameter Binding**: Positional and named params bound to the same
//!   view, with optional type enforcement and strict or lenient unknown keys
//! - **Batch Processing**: Parallel or sequential, order preserving, with an
//!   optional size limit
//! - **Failure Isolation**: Method errors, panics and deadline overruns
//!   become error responses and never take down the dispatcher
//! - **Middleware**: Hooks around invocation for auth, caching or logging
//! - **Observability**: `tracing` spans per dispatch and OpenTelemetry metrics
//!
//! # Quick Start
//!
//! ```rust
//! use jrpc_dispatch::{from_typed_fn, Dispatcher, MethodDescriptor, ParamType};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct AddParams { a: i64, b: i64 }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> jrpc_core::Result<()> {
//! let dispatcher = Dispatcher::builder()
//!     .method(
//!         MethodDescriptor::new("add", from_typed_fn(|p: AddParams| async move { Ok(p.a + p.b) }))
//!             .required("a", ParamType::Integer)
//!             .required("b", ParamType::Integer),
//!     )
//!     .build()?;
//!
//! let reply = dispatcher
//!     .handle_text(r#"{"jsonrpc":"2.0","method":"add","params":{"a":1,"b":2},"id":"q"}"#)
//!     .await?;
//! assert_eq!(reply.as_deref(), Some(r#"{"jsonrpc":"2.0","result":3,"id":"q"}"#));
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency Model
//!
//! Dispatch is reentrant. A [`Dispatcher`] is a cheap handle around shared
//! state, and the registry it reads from is behind a read/write lock that is
//! never held while a method runs. Registering or removing a method while
//! requests are in flight affects only dispatches that resolve afterwards.
//!
//! Parallel batches spawn one task per element on the current Tokio runtime.

mod batch;
mod binder;
mod builder;
mod descriptor;
mod dispatcher;
mod handler;
mod metrics;
mod middleware;
mod params;
mod registry;
pub mod response;
mod validate;

pub use batch::{BatchMode, BatchProcessor};
pub use binder::{bind, BindError};
pub use builder::DispatcherBuilder;
pub use descriptor::MethodDescriptor;
pub use dispatcher::{Completion, Dispatcher, Outcome, Stage};
pub use handler::{from_fn, from_sync_fn, from_typed_fn, AsyncHandler, Handler, HandlerResult};
pub use metrics::DispatchMetrics;
pub use middleware::{
    Middleware, MiddlewareAction, MiddlewareChain, MiddlewareContext, SyncMiddleware,
    TracingMiddleware,
};
pub use params::{BoundParams, ParamSpec, ParamType, UnknownParamPolicy};
pub use registry::{MethodRegistry, RESERVED_PREFIX};
pub use validate::{validate, Rejection};
