//! Tracing setup for the binary entry point. Library code never touches the
//! subscriber — it only emits events; only `main` decides how they're
//! rendered.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_FILTER: &str = concat!(
    "info,",
    "doc_assembler=debug,",
    "handlebars=warn,",
    "pulldown_cmark=warn,",
    "ureq=warn,",
    "git2=warn",
);

/// Initialize the global tracing subscriber. Respects `RUST_LOG` if set,
/// otherwise falls back to a filter tuned for this crate's own modules.
pub fn init_tracing() {
    let fmt_layer = fmt::layer()
        .with_level(true)
        .with_target(true)
        .event_format(fmt::format().compact());

    let env_filter = EnvFilter::try_from_env("RUST_LOG")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();
}
