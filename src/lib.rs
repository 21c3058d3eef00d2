pub mod artifacts;
pub mod components;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;

pub use config::ConfigRegistry;
pub use error::{PipelineError, Result};
pub use pipeline::{PipelineRunner, Stage};
