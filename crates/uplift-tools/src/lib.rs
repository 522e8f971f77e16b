//! Command line tools for the uplift predictor
//!
//! - `uplift-choose`: point the model settings file at one of the two
//!   trained artifacts
//! - `uplift-train`: run the offline training pipeline

pub mod cli;

pub use cli::*;

/// Initialize tracing/logging for the command line tools
pub fn init_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose { "uplift=debug" } else { "uplift=info" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
