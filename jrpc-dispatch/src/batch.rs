//! Batch processing
//!
//! A batch is a top-level array of envelopes. Each element is dispatched on
//! its own, so a malformed or failing element never affects its siblings.
//! Outcomes come back in input order regardless of completion order.
//!
//! # Batch Modes
//!
//! - **Parallel**: every element is spawned as a task and the tasks are
//!   joined in input order
//! - **Sequential**: elements run one after another in input order, for
//!   batches whose later calls depend on earlier side effects
//!
//! # Whole-batch Rejection
//!
//! An empty batch, or one larger than the configured limit, is rejected as a
//! whole with a single Invalid Request error instead of per-element outcomes.
//!
//! ```rust
//! use jrpc_dispatch::{BatchMode, BatchProcessor};
//!
//! let processor = BatchProcessor::with_limit(BatchMode::Parallel, Some(100));
//! let sequential = BatchProcessor::new(BatchMode::Sequential);
//! assert_eq!(sequential.mode(), BatchMode::Sequential);
//! ```

use crate::dispatcher::{Dispatcher, Outcome, Stage};
use jrpc_core::{Error, Id, JsonRpcErrorData};
use serde_json::Value;

/// Mode for processing batch elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// Dispatch all elements concurrently
    #[default]
    Parallel,
    /// Dispatch elements one at a time, in order
    Sequential,
}

impl BatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchMode::Parallel => "parallel",
            BatchMode::Sequential => "sequential",
        }
    }
}

/// Processor for batch requests
#[derive(Debug, Clone, Default)]
pub struct BatchProcessor {
    mode: BatchMode,
    max_size: Option<usize>,
}

impl BatchProcessor {
    /// Create a batch processor with no size limit
    pub fn new(mode: BatchMode) -> Self {
        Self {
            mode,
            max_size: None,
        }
    }

    /// Create a batch processor with an optional maximum batch size
    pub fn with_limit(mode: BatchMode, max_size: Option<usize>) -> Self {
        Self { mode, max_size }
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    /// Dispatch every element of a batch
    ///
    /// # Errors
    ///
    /// The whole-batch Invalid Request error for an empty or oversized batch.
    #[tracing::instrument(
        name = "jsonrpc.batch",
        skip(self, elements, dispatcher),
        fields(batch_size = elements.len(), mode = self.mode.as_str())
    )]
    pub async fn process(
        &self,
        elements: Vec<Value>,
        dispatcher: &Dispatcher,
    ) -> Result<Vec<Outcome>, JsonRpcErrorData> {
        if elements.is_empty() {
            tracing::warn!("Empty batch rejected");
            return Err(Error::InvalidRequest("Batch cannot be empty".into()).into());
        }

        if let Some(max_size) = self.max_size {
            if elements.len() > max_size {
                tracing::warn!(
                    batch_size = elements.len(),
                    max_size = max_size,
                    "Batch size exceeded"
                );
                return Err(Error::BatchSizeExceeded {
                    limit: max_size,
                    actual: elements.len(),
                }
                .into());
            }
        }

        let outcomes = match self.mode {
            BatchMode::Parallel => process_parallel(elements, dispatcher).await,
            BatchMode::Sequential => process_sequential(elements, dispatcher).await,
        };

        tracing::debug!(outcome_count = outcomes.len(), "Batch processing completed");
        Ok(outcomes)
    }
}

async fn process_parallel(elements: Vec<Value>, dispatcher: &Dispatcher) -> Vec<Outcome> {
    let tasks: Vec<_> = elements
        .into_iter()
        .map(|element| {
            let reply_to = reply_target(&element);
            let dispatcher = dispatcher.clone();
            let task = tokio::spawn(async move { dispatcher.dispatch_one(element).await });
            (reply_to, task)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(tasks.len());
    for (reply_to, task) in tasks {
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Batch element task failed");
                Outcome::errored(
                    reply_to,
                    Stage::Received,
                    JsonRpcErrorData::internal_error(format!("Batch element task failed: {}", e)),
                )
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

async fn process_sequential(elements: Vec<Value>, dispatcher: &Dispatcher) -> Vec<Outcome> {
    let mut outcomes = Vec::with_capacity(elements.len());
    for element in elements {
        outcomes.push(dispatcher.dispatch_one(element).await);
    }
    outcomes
}

/// Best-effort reply target read before the element is dispatched
///
/// Used only when the element's task dies without producing an outcome.
fn reply_target(element: &Value) -> Option<Id> {
    match element {
        Value::Object(map) => map
            .get("id")
            .map(|raw| Id::from_value(raw).unwrap_or(Id::Null)),
        _ => Some(Id::Null),
    }
}
