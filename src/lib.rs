pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{OllamaClient, SystemCommandRunner};
pub use config::toml_config::TomlConfig;
pub use core::report::{ConsoleSink, SilentSink};
pub use core::verifier::Verifier;
pub use domain::model::{Stage, VerificationReport};
pub use utils::error::{VerifyError, Result};
