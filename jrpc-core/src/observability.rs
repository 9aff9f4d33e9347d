//! OpenTelemetry observability configuration and initialization
//!
//! Sets up the `tracing` subscriber used by the dispatcher and, when enabled,
//! bridges spans and metrics to an OTLP collector.
//!
//! - **Traces**: dispatch spans exported through `tracing-opentelemetry`
//! - **Metrics**: `DispatchMetrics` instruments exported every 30 seconds
//! - **Logs**: structured JSON lines written locally
//!
//! Stream transports that use stdout for responses (such as a stdio loop)
//! must route logs to stderr with [`ObservabilityConfig::with_stderr`].
//!
//! ```rust,no_run
//! use jrpc_core::ObservabilityConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ObservabilityConfig::new("calculator")
//!         .with_endpoint("http://localhost:4317")
//!         .with_log_level("debug");
//!
//!     jrpc_core::init_observability(config).expect("Failed to init observability");
//!
//!     // ... serve requests ...
//!
//!     jrpc_core::shutdown_observability();
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: Collector endpoint
//! - `RUST_LOG`: Log filter directives (e.g., "info", "jrpc_dispatch=debug")

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use std::time::Duration;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Interval between metric exports
const METRICS_EXPORT_INTERVAL: Duration = Duration::from_secs(30);

/// Observability configuration
///
/// # Defaults
///
/// - Service name: "jrpc"
/// - Service version: the crate version
/// - OTLP endpoint: `$OTEL_EXPORTER_OTLP_ENDPOINT` or "http://localhost:4317"
/// - Traces and metrics disabled, local logs enabled
/// - Log level: `$RUST_LOG` or "info"
/// - Logs written to stdout
///
/// ```rust
/// use jrpc_core::ObservabilityConfig;
///
/// let config = ObservabilityConfig::new("calculator")
///     .with_traces(true)
///     .with_stderr(true);
/// assert!(config.enable_traces);
/// ```
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name attached to every span and metric
    pub service_name: String,

    /// Service version attached to every span and metric
    pub service_version: String,

    /// gRPC endpoint of the OpenTelemetry collector
    pub otlp_endpoint: String,

    /// Export dispatch spans over OTLP
    pub enable_traces: bool,

    /// Export dispatch metrics over OTLP
    pub enable_metrics: bool,

    /// Write structured JSON log lines locally
    pub enable_logs: bool,

    /// Fallback filter used when `RUST_LOG` is unset or invalid
    pub log_level: String,

    /// Write local logs to stderr instead of stdout
    pub log_to_stderr: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "jrpc".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
            enable_traces: false,
            enable_metrics: false,
            enable_logs: true,
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_to_stderr: false,
        }
    }
}

impl ObservabilityConfig {
    /// Create a configuration with a custom service name
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Set the OTLP collector endpoint (e.g., "http://collector:4317")
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    /// Set the fallback log filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the service version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Enable or disable span export
    pub fn with_traces(mut self, enable: bool) -> Self {
        self.enable_traces = enable;
        self
    }

    /// Enable or disable metric export
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Enable or disable local log output
    pub fn with_logs(mut self, enable: bool) -> Self {
        self.enable_logs = enable;
        self
    }

    /// Route local log output to stderr
    pub fn with_stderr(mut self, enable: bool) -> Self {
        self.log_to_stderr = enable;
        self
    }

    fn resource(&self) -> Resource {
        Resource::builder_empty()
            .with_attributes(vec![
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                    self.service_name.clone(),
                ),
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                    self.service_version.clone(),
                ),
            ])
            .build()
    }
}

/// Initialize observability with the given configuration
///
/// Installs the global `tracing` subscriber and, for the enabled pillars,
/// the global OpenTelemetry tracer and meter providers.
///
/// # Errors
///
/// - the OTLP exporters cannot be built
/// - the log filter is invalid
/// - a global subscriber is already installed (e.g. on a second call)
///
/// On error no global provider is replaced: providers are only installed
/// once the subscriber is in place.
pub fn init_observability(config: ObservabilityConfig) -> Result<(), BoxError> {
    if tracing::dispatcher::has_been_set() {
        return Err("a global tracing subscriber is already installed".into());
    }

    let (tracer_provider, tracer) = if config.enable_traces {
        let (provider, tracer) = build_tracer(&config)?;
        (Some(provider), Some(tracer))
    } else {
        (None, None)
    };

    let meter_provider = if config.enable_metrics {
        Some(build_meter_provider(&config)?)
    } else {
        None
    };

    init_tracing_subscriber(&config, tracer)?;

    if let Some(provider) = tracer_provider {
        global::set_tracer_provider(provider);
    }
    if let Some(provider) = meter_provider {
        global::set_meter_provider(provider);
    }

    tracing::info!(
        service_name = %config.service_name,
        otlp_endpoint = %config.otlp_endpoint,
        traces = config.enable_traces,
        metrics = config.enable_metrics,
        logs = config.enable_logs,
        "Observability initialized"
    );

    Ok(())
}

fn build_tracer(
    config: &ObservabilityConfig,
) -> Result<(opentelemetry_sdk::trace::SdkTracerProvider, opentelemetry_sdk::trace::Tracer), BoxError>
{
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, SdkTracerProvider};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(config.resource())
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .build();

    let tracer = provider.tracer(config.service_name.clone());
    Ok((provider, tracer))
}

fn build_meter_provider(
    config: &ObservabilityConfig,
) -> Result<opentelemetry_sdk::metrics::SdkMeterProvider, BoxError> {
    use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};

    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(METRICS_EXPORT_INTERVAL)
        .build();

    Ok(SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(config.resource())
        .build())
}

fn init_tracing_subscriber(
    config: &ObservabilityConfig,
    tracer: Option<opentelemetry_sdk::trace::Tracer>,
) -> Result<(), BoxError> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let telemetry_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    let fmt_layer = config.enable_logs.then(|| {
        let writer = if config.log_to_stderr {
            BoxMakeWriter::new(std::io::stderr)
        } else {
            BoxMakeWriter::new(std::io::stdout)
        };
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_writer(writer)
            .json()
    });

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Log the end of the telemetry lifecycle
///
/// OpenTelemetry 0.30 providers flush on drop; this marks the shutdown in
/// the log stream so the last exported batch is easy to find.
pub fn shutdown_observability() {
    tracing::info!("Shutting down observability");
}
