//! Parley runtime - orchestration layer for the parley framework.
//!
//! This crate provides:
//! - Per-conversation lane scheduling (`ParleyRuntime`)
//! - Layered configuration loading (`ConfigLoader`, `ParleyConfig`)
//! - Logging setup (`LoggingBuilder`)
//!
//! ```ignore
//! use parley_runtime::{ParleyRuntime, config, logging};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = config::load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let runtime = ParleyRuntime::with_config(dispatcher, &config.dispatch);
//!     runtime.run().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, DispatchConfig, ParleyConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use runtime::ParleyRuntime;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
