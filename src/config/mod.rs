pub mod toml_config;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_crate_names, validate_non_empty_string, validate_path, validate_positive_number,
    validate_regex, validate_url, Validate,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "gemma3:12b";
pub const DEFAULT_PREFERRED_FAMILY: &str = "gemma";
pub const DEFAULT_PROMPT: &str = "What is 2+2? Answer only with the number.";
pub const DEFAULT_EXPECTED_ANSWER: &str = "4";
pub const DEFAULT_PROJECT_DIR: &str = "src-tauri";
pub const DEFAULT_REQUIRED_CRATES: [&str; 2] = ["reqwest", "nodespace-nlp-engine"];
pub const DEFAULT_LEGACY_PATTERN: &str = "^(ort|ort-sys|.*onnx.*)$";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub fn default_required_crates() -> Vec<String> {
    DEFAULT_REQUIRED_CRATES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Checks shared by every configuration source.
pub fn validate_provider(config: &dyn ConfigProvider) -> Result<()> {
    validate_url("base_url", config.base_url())?;
    validate_non_empty_string("model", config.model())?;
    validate_non_empty_string("preferred_family", config.preferred_family())?;
    validate_non_empty_string("prompt", config.prompt())?;
    validate_non_empty_string("expected_answer", config.expected_answer())?;
    validate_path("project_dir", config.project_dir())?;
    validate_crate_names("required_crates", config.required_crates())?;
    validate_regex("legacy_pattern", config.legacy_pattern())?;
    validate_positive_number("timeout_secs", config.timeout_secs(), 1)?;
    Ok(())
}

#[cfg(feature = "cli")]
pub use cli::CliConfig;

#[cfg(feature = "cli")]
mod cli {
    use super::*;
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "ollama-verify")]
    #[command(about = "Smoke test for a local Ollama server and a project that talks to it")]
    pub struct CliConfig {
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        pub base_url: String,

        #[arg(long, default_value = DEFAULT_MODEL)]
        pub model: String,

        #[arg(long, default_value = DEFAULT_PREFERRED_FAMILY)]
        pub preferred_family: String,

        #[arg(long, default_value = DEFAULT_PROMPT)]
        pub prompt: String,

        #[arg(long, default_value = DEFAULT_EXPECTED_ANSWER)]
        pub expected_answer: String,

        #[arg(long, default_value = DEFAULT_PROJECT_DIR)]
        pub project_dir: String,

        #[arg(long, value_delimiter = ',', default_values_t = default_required_crates())]
        pub required_crates: Vec<String>,

        #[arg(long, default_value = DEFAULT_LEGACY_PATTERN)]
        pub legacy_pattern: String,

        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        pub timeout_secs: u64,

        #[arg(long, help = "Load settings from a TOML file instead of flags")]
        pub config: Option<String>,

        #[arg(long, help = "Print the report as JSON")]
        pub json: bool,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,
    }

    impl ConfigProvider for CliConfig {
        fn base_url(&self) -> &str {
            &self.base_url
        }

        fn model(&self) -> &str {
            &self.model
        }

        fn preferred_family(&self) -> &str {
            &self.preferred_family
        }

        fn prompt(&self) -> &str {
            &self.prompt
        }

        fn expected_answer(&self) -> &str {
            &self.expected_answer
        }

        fn project_dir(&self) -> &str {
            &self.project_dir
        }

        fn required_crates(&self) -> &[String] {
            &self.required_crates
        }

        fn legacy_pattern(&self) -> &str {
            &self.legacy_pattern
        }

        fn timeout_secs(&self) -> u64 {
            self.timeout_secs
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_provider(self)
        }
    }

}
