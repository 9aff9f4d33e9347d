//! JRPC - transport-agnostic JSON-RPC 2.0 dispatch
//!
//! This is the convenience crate that re-exports the JRPC sub-crates. Use it
//! when you want a single dependency for wire types and dispatch.
//!
//! # Architecture
//!
//! - **jrpc-core**: Wire types, codec, error taxonomy, observability
//! - **jrpc-dispatch**: Method registry, parameter binding, validation,
//!   dispatch, batching and middleware
//!
//! Transports (HTTP, sockets, stdio) live outside these crates. They hand the
//! dispatcher a payload and write back whatever it returns.
//!
//! # Quick Start
//!
//! ```rust
//! use jrpc::{from_fn, Dispatcher, MethodDescriptor, ParamType};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> jrpc::Result<()> {
//! let dispatcher = Dispatcher::builder()
//!     .method(
//!         MethodDescriptor::new("sum", from_fn(|p| async move {
//!             Ok(serde_json::json!(p.get_as::<i64>("a")? + p.get_as::<i64>("b")?))
//!         }))
//!         .required("a", ParamType::Integer)
//!         .required("b", ParamType::Integer),
//!     )
//!     .build()?;
//!
//! let reply = dispatcher
//!     .handle_text(r#"{"jsonrpc":"2.0","method":"sum","params":[2,3],"id":1}"#)
//!     .await?;
//! assert_eq!(reply.as_deref(), Some(r#"{"jsonrpc":"2.0","result":5,"id":1}"#));
//! # Ok(())
//! # }
//! ```

pub use jrpc_core as core;
pub use jrpc_dispatch as dispatch;

pub use jrpc_core::{
    codes, Error, Id, JsonRpcErrorData, JsonRpcRequest, JsonRpcResponse, ObservabilityConfig,
    Params, RequestMessage, ResponseMessage, Result,
};
pub use jrpc_dispatch::{
    from_fn, from_sync_fn, from_typed_fn, BatchMode, BoundParams, Dispatcher, DispatcherBuilder,
    MethodDescriptor, MethodRegistry, Middleware, MiddlewareAction, ParamType, SyncMiddleware,
    TracingMiddleware,
};
