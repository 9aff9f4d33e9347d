//! Dispatcher builder
//!
//! Fluent configuration for a [`Dispatcher`]:
//! - Share an existing registry or register methods inline
//! - Configure batch processing and the batch size limit
//! - Set a default invocation deadline
//! - Add middleware
//! - Enable observability
//!
//! # Examples
//!
//! ```rust
//! use jrpc_dispatch::{from_fn, BatchMode, Dispatcher, MethodDescriptor};
//! use std::time::Duration;
//!
//! # fn example() -> jrpc_core::Result<()> {
//! let dispatcher = Dispatcher::builder()
//!     .handler("ping", from_fn(|_| async { Ok(serde_json::json!({"pong": true})) }))
//!     .method(MethodDescriptor::new("status", from_fn(|_| async { Ok(serde_json::json!("up")) })))
//!     .batch_mode(BatchMode::Sequential)
//!     .max_batch_size(100)
//!     .default_deadline(Duration::from_secs(5))
//!     .build()?;
//! assert!(dispatcher.registry().contains("ping"));
//! # Ok(())
//! # }
//! ```

use crate::{
    BatchMode, BatchProcessor, DispatchMetrics, Dispatcher, Handler, MethodDescriptor,
    MethodRegistry, Middleware, MiddlewareChain, SyncMiddleware,
};
use jrpc_core::{Error, ObservabilityConfig, Result};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_SERVICE_NAME: &str = "jrpc";

/// Builder for constructing a dispatcher
pub struct DispatcherBuilder {
    registry: Option<MethodRegistry>,
    methods: Vec<MethodDescriptor>,
    extensions: Vec<MethodDescriptor>,
    batch_mode: BatchMode,
    max_batch_size: Option<usize>,
    default_deadline: Option<Duration>,
    middleware_chain: MiddlewareChain,
    observability_config: Option<ObservabilityConfig>,
    metrics: bool,
    service_name: Option<String>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            methods: Vec::new(),
            extensions: Vec::new(),
            batch_mode: BatchMode::default(),
            max_batch_size: None,
            default_deadline: None,
            middleware_chain: MiddlewareChain::new(),
            observability_config: None,
            metrics: false,
            service_name: None,
        }
    }

    /// Dispatch against a shared registry instead of a fresh one
    ///
    /// Methods added through the builder are registered into it on build.
    pub fn registry(mut self, registry: MethodRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Register a described method on build
    pub fn method(mut self, descriptor: MethodDescriptor) -> Self {
        self.methods.push(descriptor);
        self
    }

    /// Register a method with no declared parameters
    pub fn handler(self, method: impl Into<String>, handler: Box<dyn Handler>) -> Self {
        self.method(MethodDescriptor::new(method, handler))
    }

    /// Register an `rpc.`-prefixed extension method on build
    pub fn extension(mut self, descriptor: MethodDescriptor) -> Self {
        self.extensions.push(descriptor);
        self
    }

    pub fn batch_mode(mut self, mode: BatchMode) -> Self {
        self.batch_mode = mode;
        self
    }

    /// Set the maximum batch size limit (unlimited by default)
    pub fn max_batch_size(mut self, max_size: usize) -> Self {
        self.max_batch_size = Some(max_size);
        self
    }

    /// Deadline for methods that do not declare their own
    pub fn default_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = Some(deadline);
        self
    }

    pub fn use_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware_chain.add(middleware);
        self
    }

    pub fn use_sync_middleware<T: SyncMiddleware + 'static>(mut self, middleware: T) -> Self {
        self.middleware_chain.add_sync(middleware);
        self
    }

    /// Install tracing and OpenTelemetry with a custom configuration on build
    ///
    /// Also enables dispatch metrics.
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self.metrics = true;
        self
    }

    pub fn with_default_observability(self) -> Self {
        self.with_observability(ObservabilityConfig::default())
    }

    /// Record dispatch metrics on the global meter provider without
    /// installing any exporter or subscriber
    pub fn with_metrics(mut self) -> Self {
        self.metrics = true;
        self
    }

    /// Service name for observability and the metrics scope
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Build the dispatcher
    ///
    /// # Errors
    ///
    /// Fails when a method cannot be registered (bad name, duplicate
    /// parameter) or when observability fails to initialize.
    pub fn build(self) -> Result<Dispatcher> {
        let registry = self.registry.unwrap_or_default();
        for descriptor in self.methods {
            registry.add(descriptor)?;
        }
        for descriptor in self.extensions {
            registry.add_extension(descriptor)?;
        }

        let service_name = match (&self.service_name, &self.observability_config) {
            (Some(name), _) => name.clone(),
            (None, Some(config)) => config.service_name.clone(),
            (None, None) => DEFAULT_SERVICE_NAME.to_string(),
        };

        if let Some(mut config) = self.observability_config {
            config.service_name = service_name.clone();
            jrpc_core::init_observability(config).map_err(|e| {
                Error::Internal(format!("Failed to initialize observability: {}", e))
            })?;
        }

        let metrics = self
            .metrics
            .then(|| Arc::new(DispatchMetrics::new(service_name.clone())));

        tracing::info!(
            service = %service_name,
            methods = registry.len(),
            batch_mode = self.batch_mode.as_str(),
            max_batch_size = ?self.max_batch_size,
            "Dispatcher ready"
        );

        Ok(Dispatcher::from_parts(
            registry,
            BatchProcessor::with_limit(self.batch_mode, self.max_batch_size),
            self.middleware_chain,
            metrics,
            self.default_deadline,
        ))
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{from_fn, from_sync_fn};
    use crate::TracingMiddleware;
    use serde_json::{json, Value};

    #[test]
    fn test_builder_default() {
        let builder = DispatcherBuilder::default();
        assert!(builder.registry.is_none());
        assert_eq!(builder.batch_mode, BatchMode::Parallel);
        assert!(builder.max_batch_size.is_none());
    }

    #[test]
    fn test_builder_registers_methods() {
        let dispatcher = DispatcherBuilder::new()
            .handler("ping", from_sync_fn(|_| Ok(json!("pong"))))
            .extension(MethodDescriptor::new("rpc.discover", from_sync_fn(|_| Ok(json!([])))))
            .build()
            .unwrap();

        assert!(dispatcher.registry().contains("ping"));
        assert!(dispatcher.registry().contains("rpc.discover"));
    }

    #[test]
    fn test_builder_rejects_reserved_name() {
        let result = DispatcherBuilder::new()
            .handler("rpc.ping", from_sync_fn(|_| Ok(Value::Null)))
            .build();
        assert!(matches!(result, Err(Error::InvalidMethodName(_))));
    }

    #[test]
    fn test_builder_shares_registry() {
        let registry = MethodRegistry::new();
        let dispatcher = DispatcherBuilder::new()
            .registry(registry.clone())
            .handler("late", from_sync_fn(|_| Ok(Value::Null)))
            .build()
            .unwrap();

        assert!(registry.contains("late"));
        registry.remove("late");
        assert!(!dispatcher.registry().contains("late"));
    }

    #[test]
    fn test_builder_batch_settings() {
        let dispatcher = DispatcherBuilder::new()
            .batch_mode(BatchMode::Sequential)
            .max_batch_size(10)
            .default_deadline(Duration::from_millis(250))
            .build()
            .unwrap();

        assert_eq!(dispatcher.batch_processor().mode(), BatchMode::Sequential);
        assert_eq!(dispatcher.batch_processor().max_size(), Some(10));
        assert_eq!(dispatcher.default_deadline(), Some(Duration::from_millis(250)));
    }

    #[tokio::test]
    async fn test_builder_with_middleware_and_metrics() {
        let dispatcher = DispatcherBuilder::new()
            .handler("echo", from_fn(|p| async move { Ok(p.to_value()) }))
            .use_middleware(Arc::new(TracingMiddleware::new()))
            .with_metrics()
            .service_name("builder-test")
            .build()
            .unwrap();

        let reply = dispatcher
            .handle_text(r#"{"jsonrpc":"2.0","method":"echo","id":1}"#)
            .await
            .unwrap();
        assert_eq!(reply.as_deref(), Some(r#"{"jsonrpc":"2.0","result":{},"id":1}"#));
    }
}
