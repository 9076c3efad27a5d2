use anyhow::{Context, Result};
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, Resource};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static OTLP_EXPORT_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Telemetry configuration structure
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
    pub otlp_endpoint: Option<String>,
    pub enable_tracing: bool,
    pub export_timeout: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: env!("CARGO_PKG_NAME").to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: std::env::var("APP_ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
            enable_tracing: std::env::var("OTEL_TRACES_ENABLED")
                .map(|v| v.parse().unwrap_or(true))
                .unwrap_or(true),
            export_timeout: Duration::from_secs(30),
        }
    }
}

/// Telemetry handles for graceful shutdown
pub struct TelemetryHandles {
    _config: TelemetryConfig,
}

impl TelemetryHandles {
    /// Flush and shut down the global tracer provider
    pub async fn shutdown(self) -> Result<()> {
        info!("Shutting down telemetry providers...");
        global::shutdown_tracer_provider();
        Ok(())
    }
}

/// Install the tracing subscriber and, when an endpoint is configured, the
/// OTLP trace exporter.
pub async fn init_telemetry(config: Option<TelemetryConfig>) -> Result<TelemetryHandles> {
    let config = config.unwrap_or_default();

    setup_tracing_subscriber()?;

    info!(
        "Initializing telemetry for service: {} v{} in environment: {}",
        config.service_name, config.service_version, config.environment
    );

    if config.enable_tracing {
        init_tracing(&config)?;
    }

    Ok(TelemetryHandles { _config: config })
}

fn init_tracing(config: &TelemetryConfig) -> Result<()> {
    let Some(endpoint) = &config.otlp_endpoint else {
        info!("No OTLP endpoint configured, using console-only tracing");
        return Ok(());
    };

    let resource = Resource::new(vec![
        KeyValue::new("service.name", config.service_name.clone()),
        KeyValue::new("service.version", config.service_version.clone()),
        KeyValue::new("deployment.environment", config.environment.clone()),
    ]);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint)
                .with_timeout(config.export_timeout),
        )
        .with_trace_config(
            opentelemetry_sdk::trace::config()
                .with_resource(resource)
                .with_sampler(opentelemetry_sdk::trace::Sampler::AlwaysOn),
        )
        .install_batch(runtime::Tokio)
        .context("Failed to initialize OTLP tracer")?;

    OTLP_EXPORT_ACTIVE.store(true, Ordering::Relaxed);
    info!(%endpoint, "Distributed tracing initialized with OTLP exporter");
    Ok(())
}

fn setup_tracing_subscriber() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{}=debug,tower_http=info", env!("CARGO_CRATE_NAME")).into());

    Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}

/// Get a tracer instance for the current service
pub fn get_tracer(name: &'static str) -> opentelemetry::global::BoxedTracer {
    global::tracer(name)
}

/// Process-wide counters, emitted as structured `tracing` events and
/// readable for the health endpoint.
pub mod counters {
    use super::*;

    #[derive(Debug)]
    pub struct Counter {
        name: &'static str,
        value: AtomicU64,
    }

    impl Counter {
        pub const fn new(name: &'static str) -> Self {
            Self {
                name,
                value: AtomicU64::new(0),
            }
        }

        pub fn add(&self, value: u64) {
            let total = self.value.fetch_add(value, Ordering::Relaxed) + value;
            tracing::debug!(counter = self.name, value, total, "Counter incremented");
        }

        pub fn name(&self) -> &'static str {
            self.name
        }

        pub fn get(&self) -> u64 {
            self.value.load(Ordering::Relaxed)
        }
    }

    pub static HTTP_REQUESTS: Counter = Counter::new("http_requests_total");
    pub static BOOKINGS_CREATED: Counter = Counter::new("bookings_created_total");
    pub static BOOKINGS_REJECTED: Counter = Counter::new("bookings_rejected_total");
    pub static ACCOUNTING_FAILURES: Counter = Counter::new("slot_accounting_failures_total");

    pub fn snapshot() -> HashMap<&'static str, u64> {
        [
            &HTTP_REQUESTS,
            &BOOKINGS_CREATED,
            &BOOKINGS_REJECTED,
            &ACCOUNTING_FAILURES,
        ]
        .into_iter()
        .map(|counter| (counter.name(), counter.get()))
        .collect()
    }
}

/// Health check for telemetry components
pub fn telemetry_health_check() -> HashMap<String, bool> {
    let mut health = HashMap::new();
    health.insert("tracing_subscriber".to_string(), true);
    health.insert(
        "otlp_exporter".to_string(),
        OTLP_EXPORT_ACTIVE.load(Ordering::Relaxed),
    );
    health
}
