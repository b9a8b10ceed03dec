pub mod config;
pub mod engine;
pub mod error;
pub mod knowledge;
pub mod models;
pub mod pipeline;

pub use engine::{Analysis, ClinicalEngine};
pub use error::AppError;

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Logs go to stderr so stdout stays JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}
