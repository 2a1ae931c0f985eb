//! Tracing initialization for embedding applications

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber: env-filtered, JSON console
/// output. The embedding binary calls this once before any database work;
/// the crate itself only emits through [tracing] and never installs a
/// subscriber on its own.
pub fn init() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stayfinder=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}
