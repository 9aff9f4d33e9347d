//! Newline-delimited JSON-RPC over stdin/stdout
//!
//! Each input line is one request message (single or batch). Each reply is
//! written as one line on stdout; notifications produce no line. Logs go to
//! stderr so they never interleave with protocol output.
//!
//! ```text
//! $ echo '{"jsonrpc":"2.0","method":"sum","params":[2,3],"id":1}' | jrpc-stdio
//! {"jsonrpc":"2.0","result":5,"id":1}
//! ```

use jrpc::{
    from_fn, from_sync_fn, BatchMode, Dispatcher, MethodDescriptor, ObservabilityConfig,
    ParamType, TracingMiddleware,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

fn dispatcher() -> jrpc::Result<Dispatcher> {
    let dispatcher = Dispatcher::builder()
        .with_observability(ObservabilityConfig::new("jrpc-stdio").with_stderr(true))
        .batch_mode(BatchMode::Parallel)
        .max_batch_size(256)
        .default_deadline(Duration::from_secs(30))
        .use_middleware(Arc::new(TracingMiddleware::new()))
        .method(
            MethodDescriptor::new(
                "sum",
                from_sync_fn(|p| Ok(json!(p.get_as::<f64>("a")? + p.get_as::<f64>("b")?))),
            )
            .required("a", ParamType::Number)
            .required("b", ParamType::Number)
            .enforce_types(),
        )
        .method(
            MethodDescriptor::new("echo", from_sync_fn(|p| Ok(p.to_value())))
                .optional("message", ParamType::Any)
                .lenient(),
        )
        .method(
            MethodDescriptor::new(
                "sleep",
                from_fn(|p| async move {
                    let ms: u64 = p.get_as("ms")?;
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok(json!(ms))
                }),
            )
            .required("ms", ParamType::Integer)
            .deadline(Duration::from_secs(5)),
        )
        .build()?;

    let registry = dispatcher.registry().clone();
    dispatcher.registry().add_extension(MethodDescriptor::new(
        "rpc.methods",
        from_sync_fn(move |_| Ok(json!(registry.method_names()))),
    ))?;

    Ok(dispatcher)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = dispatcher()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    tracing::info!(methods = ?dispatcher.registry().method_names(), "Reading requests from stdin");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(reply) = dispatcher.handle_text(line).await? {
            stdout.write_all(reply.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    tracing::info!("stdin closed, shutting down");
    jrpc::core::shutdown_observability();
    Ok(())
}
