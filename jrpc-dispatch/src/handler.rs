//! Invocation functions for registered methods
//!
//! A [`Handler`] is the invocation half of a method descriptor: it receives
//! the bound, name-keyed arguments and resolves to a result value or an
//! error. How the mapping was produced (positional or named) is invisible
//! to it.
//!
//! # Creating Handlers
//!
//! 1. **from_fn**: async closure over raw [`BoundParams`]
//! 2. **from_typed_fn**: async closure over a deserialized parameter struct
//! 3. **from_sync_fn**: plain closure for methods that never await
//!
//! # Errors
//!
//! What a handler returns decides the error object sent back:
//!
//! - `Error::JsonRpc(data)` → `data` verbatim (application-defined codes)
//! - `Error::InvalidParams(_)` → -32602
//! - anything else → -32603 Internal error
//!
//! ```rust
//! use jrpc_dispatch::{from_fn, from_typed_fn};
//! use serde::Deserialize;
//!
//! let echo = from_fn(|params| async move { Ok(params.to_value()) });
//!
//! #[derive(Deserialize)]
//! struct AddParams { a: i64, b: i64 }
//!
//! let add = from_typed_fn(|p: AddParams| async move { Ok(p.a + p.b) });
//! ```

use crate::params::BoundParams;
use jrpc_core::{Error, Result};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by every handler
pub type HandlerResult = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// Trait for method invocation functions
///
/// Handlers are shared across concurrently running dispatches, hence
/// `Send + Sync`. State lives behind interior mutability in the handler
/// itself; the dispatcher never serializes calls.
pub trait Handler: Send + Sync {
    /// Invoke the method with its bound arguments
    fn handle(&self, params: BoundParams) -> HandlerResult;
}

/// Adapts an async function into a [`Handler`]
pub struct AsyncHandler<F, Fut>
where
    F: Fn(BoundParams) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    func: F,
}

impl<F, Fut> AsyncHandler<F, Fut>
where
    F: Fn(BoundParams) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, Fut> Handler for AsyncHandler<F, Fut>
where
    F: Fn(BoundParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn handle(&self, params: BoundParams) -> HandlerResult {
        Box::pin((self.func)(params))
    }
}

/// Create a handler from an async function over raw bound arguments
///
/// ```rust
/// use jrpc_dispatch::from_fn;
///
/// let sum = from_fn(|params| async move {
///     let a: i64 = params.get_as("a")?;
///     let b: i64 = params.get_as("b")?;
///     Ok(serde_json::json!(a + b))
/// });
/// ```
pub fn from_fn<F, Fut>(func: F) -> Box<dyn Handler>
where
    F: Fn(BoundParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Box::new(AsyncHandler::new(func))
}

/// Create a handler from an async function with typed parameters
///
/// The bound mapping is deserialized into `P` (a deserialization failure
/// becomes Invalid params) and the returned `R` is serialized back to JSON.
/// A method bound with no arguments first tries `P` from `null`, so `()` and
/// `Option<_>` parameter types work.
pub fn from_typed_fn<P, R, F, Fut>(func: F) -> Box<dyn Handler>
where
    P: serde::de::DeserializeOwned + Send + 'static,
    R: serde::Serialize + Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let func = Arc::new(func);

    from_fn(move |params: BoundParams| {
        let func = Arc::clone(&func);
        async move {
            let params: P = if params.is_empty() {
                serde_json::from_value(Value::Null).or_else(|_| params.deserialize())?
            } else {
                params.deserialize()?
            };

            let result = func(params).await?;
            serde_json::to_value(result).map_err(|e| Error::Serialization(e.to_string()))
        }
    })
}

/// Create a handler from a synchronous function
///
/// The function runs inside the returned future, so a panic surfaces while
/// the dispatcher is polling it and is reported like any other panic.
pub fn from_sync_fn<F>(func: F) -> Box<dyn Handler>
where
    F: Fn(BoundParams) -> Result<Value> + Send + Sync + 'static,
{
    let func = Arc::new(func);

    from_fn(move |params: BoundParams| {
        let func = Arc::clone(&func);
        async move { func(params) }
    })
}
