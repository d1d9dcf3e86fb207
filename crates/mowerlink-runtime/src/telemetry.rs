//! Tracing pipeline initialisation for the MowerLink client.
//!
//! Call [`init_tracing`] once at process startup, before any other
//! component runs.
//!
//! # Environment variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `RUST_LOG` | Log filter (default `"info"`). |
//! | `MOWERLINK_LOG_FORMAT=json` | Emit newline-delimited JSON logs. |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | When set, spans are exported to this OTLP/HTTP collector. |

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise the global `tracing` subscriber.
///
/// The returned [`TracingGuard`] must be held for the lifetime of the
/// process; dropping it flushes any pending OTLP span batches.
pub fn init_tracing(service_name: &str) -> TracingGuard {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = std::env::var("MOWERLINK_LOG_FORMAT").as_deref() == Ok("json");

    let provider = otlp_provider(service_name);
    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("mowerlink")));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(otel_layer);

    if use_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    }

    TracingGuard(provider)
}

/// RAII guard that shuts down the OTel provider on drop, flushing pending
/// spans before the process exits.
pub struct TracingGuard(Option<SdkTracerProvider>);

impl Drop for TracingGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.0.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("[mowerlink] OpenTelemetry provider shutdown error: {e}");
            }
        }
    }
}

/// Build the OTLP tracer provider when `OTEL_EXPORTER_OTLP_ENDPOINT` is
/// set; `None` (plain console logging) otherwise. An exporter that fails to
/// initialise is reported on stderr and treated as absent.
fn otlp_provider(service_name: &str) -> Option<SdkTracerProvider> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok()?;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| eprintln!("[mowerlink] OTLP exporter init failed: {e}"))
        .ok()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            // Simple exporter: works with or without a Tokio runtime at
            // init time, unlike the batch exporter which spawns tasks.
            .with_simple_exporter(exporter)
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_endpoint_means_no_provider() {
        // SAFETY: single-threaded test; no other thread reads this env-var.
        unsafe { std::env::remove_var("OTEL_EXPORTER_OTLP_ENDPOINT") };
        assert!(otlp_provider("mowerlink-test").is_none());
    }

    #[test]
    fn guard_without_provider_drops_cleanly() {
        let guard = TracingGuard(None);
        drop(guard);
    }
}
