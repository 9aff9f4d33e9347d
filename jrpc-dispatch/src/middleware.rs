//! Invocation middleware
//!
//! Middleware wraps the `Bound → Invoked` step of a dispatch. It sees the
//! method name, the bound arguments and the request id, and can:
//!
//! - let the call proceed ([`MiddlewareAction::Continue`])
//! - answer in place of the method ([`MiddlewareAction::ShortCircuit`])
//! - fail the call with a chosen error object ([`MiddlewareAction::Reject`])
//!
//! `pre_handle` runs in registration order, `post_handle` in reverse order
//! once the method has produced its result. This is the place to layer
//! authentication or rate limiting above the dispatch core.
//!
//! ```rust
//! use jrpc_dispatch::{MiddlewareChain, TracingMiddleware};
//! use std::sync::Arc;
//!
//! let mut chain = MiddlewareChain::new();
//! chain.add(Arc::new(TracingMiddleware::new()));
//! assert_eq!(chain.len(), 1);
//! ```

use crate::params::BoundParams;
use async_trait::async_trait;
use jrpc_core::{Error, Id, JsonRpcErrorData, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Action to take after middleware pre-processing
#[derive(Debug, Clone)]
pub enum MiddlewareAction {
    /// Continue to next middleware/handler
    Continue,
    /// Skip the method and succeed with this value
    ShortCircuit(Value),
    /// Skip the method and fail with this error object
    Reject(JsonRpcErrorData),
}

/// Context passed to middleware
#[derive(Debug, Clone)]
pub struct MiddlewareContext {
    /// The method being called
    pub method: String,
    /// Bound arguments; middleware may rewrite them before the method runs
    pub params: BoundParams,
    /// Request id, `None` for notifications
    pub request_id: Option<Id>,
    /// Metadata for passing data between middleware
    pub metadata: HashMap<String, Value>,
}

impl MiddlewareContext {
    pub fn new(method: impl Into<String>, params: BoundParams, request_id: Option<Id>) -> Self {
        Self {
            method: method.into(),
            params,
            request_id,
            metadata: HashMap::new(),
        }
    }

    /// Whether the call being wrapped is a notification
    pub fn is_notification(&self) -> bool {
        self.request_id.is_none()
    }

    /// Insert metadata that can be accessed by subsequent middleware
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    /// Get metadata by key
    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

/// Trait for async middleware
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Called before the method runs
    async fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction>;

    /// Called after the method ran, with its result
    async fn post_handle(&self, ctx: &mut MiddlewareContext, result: &Result<Value>) -> Result<()>;
}

/// Trait for synchronous middleware
pub trait SyncMiddleware: Send + Sync {
    fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction>;

    fn post_handle(&self, ctx: &mut MiddlewareContext, result: &Result<Value>) -> Result<()>;
}

struct SyncMiddlewareAdapter<T: SyncMiddleware> {
    inner: T,
}

#[async_trait]
impl<T: SyncMiddleware + 'static> Middleware for SyncMiddlewareAdapter<T> {
    async fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction> {
        self.inner.pre_handle(ctx)
    }

    async fn post_handle(&self, ctx: &mut MiddlewareContext, result: &Result<Value>) -> Result<()> {
        self.inner.post_handle(ctx, result)
    }
}

/// Ordered chain of middleware
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware
    pub fn add(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    /// Append a synchronous middleware
    pub fn add_sync<T: SyncMiddleware + 'static>(&mut self, middleware: T) {
        self.middlewares.push(Arc::new(SyncMiddlewareAdapter { inner: middleware }));
    }

    /// Run the chain around `handler`
    ///
    /// An error from `pre_handle` fails the call like a rejection. Errors
    /// from `post_handle` are logged and do not change the result.
    pub async fn execute<F, Fut>(&self, mut ctx: MiddlewareContext, handler: F) -> Result<Value>
    where
        F: FnOnce(MiddlewareContext) -> Fut + Send,
        Fut: std::future::Future<Output = Result<Value>> + Send,
    {
        if self.middlewares.is_empty() {
            return handler(ctx).await;
        }

        for middleware in &self.middlewares {
            match middleware.pre_handle(&mut ctx).await? {
                MiddlewareAction::Continue => continue,
                MiddlewareAction::ShortCircuit(value) => return Ok(value),
                MiddlewareAction::Reject(error) => return Err(Error::JsonRpc(error)),
            }
        }

        let result = handler(ctx.clone()).await;

        for middleware in self.middlewares.iter().rev() {
            if let Err(e) = middleware.post_handle(&mut ctx, &result).await {
                tracing::warn!(method = %ctx.method, error = %e, "post_handle failed");
            }
        }

        result
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

/// Logs each invocation with its method, request id and outcome
#[derive(Debug, Default)]
pub struct TracingMiddleware;

impl TracingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Middleware for TracingMiddleware {
    async fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction> {
        tracing::debug!(
            method = %ctx.method,
            request_id = ?ctx.request_id,
            args = ctx.params.len(),
            "Invocation started"
        );
        Ok(MiddlewareAction::Continue)
    }

    async fn post_handle(&self, ctx: &mut MiddlewareContext, result: &Result<Value>) -> Result<()> {
        match result {
            Ok(_) => tracing::info!(
                method = %ctx.method,
                request_id = ?ctx.request_id,
                "Invocation completed"
            ),
            Err(e) => tracing::warn!(
                method = %ctx.method,
                request_id = ?ctx.request_id,
                error = %e,
                "Invocation failed"
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl SyncMiddleware for Recorder {
        fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction> {
            ctx.insert_metadata(format!("{}_pre", self.name), Value::Bool(true));
            self.log.lock().unwrap().push(format!("{}:pre", self.name));
            Ok(MiddlewareAction::Continue)
        }

        fn post_handle(&self, _ctx: &mut MiddlewareContext, _result: &Result<Value>) -> Result<()> {
            self.log.lock().unwrap().push(format!("{}:post", self.name));
            Ok(())
        }
    }

    struct Fixed(MiddlewareAction);

    impl SyncMiddleware for Fixed {
        fn pre_handle(&self, _ctx: &mut MiddlewareContext) -> Result<MiddlewareAction> {
            Ok(self.0.clone())
        }

        fn post_handle(&self, _ctx: &mut MiddlewareContext, _result: &Result<Value>) -> Result<()> {
            Ok(())
        }
    }

    fn ctx() -> MiddlewareContext {
        MiddlewareContext::new("test_method", BoundParams::new(), Some(Id::Number(1)))
    }

    #[tokio::test]
    async fn test_execution_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.add_sync(Recorder { name: "first", log: log.clone() });
        chain.add_sync(Recorder { name: "second", log: log.clone() });

        let handler_log = log.clone();
        let result = chain
            .execute(ctx(), |ctx| async move {
                assert!(ctx.get_metadata("first_pre").is_some());
                assert!(ctx.get_metadata("second_pre").is_some());
                handler_log.lock().unwrap().push("handler".into());
                Ok(json!("handler result"))
            })
            .await;

        assert_eq!(result.unwrap(), json!("handler result"));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:pre", "second:pre", "handler", "second:post", "first:post"]
        );
    }

    #[tokio::test]
    async fn test_short_circuit_skips_handler() {
        let mut chain = MiddlewareChain::new();
        chain.add_sync(Fixed(MiddlewareAction::ShortCircuit(json!("cached"))));

        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();
        let result = chain
            .execute(ctx(), |_ctx| async move {
                flag.store(true, Ordering::SeqCst);
                Ok(Value::Null)
            })
            .await;

        assert_eq!(result.unwrap(), json!("cached"));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_reject_carries_error_object() {
        let mut chain = MiddlewareChain::new();
        chain.add_sync(Fixed(MiddlewareAction::Reject(JsonRpcErrorData::new(
            -32001,
            "Unauthorized",
        ))));

        let result = chain
            .execute(ctx(), |_ctx| async move { Ok(Value::Null) })
            .await;

        let error = result.unwrap_err().to_error_data();
        assert_eq!(error.code, -32001);
        assert_eq!(error.message, "Unauthorized");
    }

    #[tokio::test]
    async fn test_empty_chain_runs_handler() {
        let chain = MiddlewareChain::new();
        let result = chain
            .execute(ctx(), |ctx| async move { Ok(json!(ctx.method)) })
            .await;
        assert_eq!(result.unwrap(), json!("test_method"));
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let mut chain = MiddlewareChain::new();
        chain.add(Arc::new(TracingMiddleware::new()));

        let result = chain
            .execute(ctx(), |_ctx| async move { Err(Error::Internal("boom".into())) })
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_tracing_middleware_continues() {
        let middleware = TracingMiddleware::new();
        let mut ctx = ctx();

        let action = middleware.pre_handle(&mut ctx).await.unwrap();
        assert!(matches!(action, MiddlewareAction::Continue));

        middleware.post_handle(&mut ctx, &Ok(json!(1))).await.unwrap();
    }
}
