//! Uplift server
//!
//! Inference host for the uplift predictor. It reads the model settings
//! file, builds the runtime named by its `implementation` locator, loads
//! the artifact, and serves the Open Inference V2 REST routes.

pub mod cli;
pub mod config;
pub mod registry;
pub mod routes;
pub mod runtime;
pub mod state;
pub mod uri;

pub use cli::Cli;
pub use config::ServerConfig;
pub use registry::{RuntimeFactory, RuntimeRegistry};
pub use routes::create_router;
pub use runtime::{ModelRuntime, UpliftRuntime, PREDICTION_OUTPUT, PREDICT_INPUT};
pub use state::AppState;
