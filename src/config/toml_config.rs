use crate::config::{
    default_required_crates, validate_provider, DEFAULT_BASE_URL, DEFAULT_EXPECTED_ANSWER,
    DEFAULT_LEGACY_PATTERN, DEFAULT_MODEL, DEFAULT_PREFERRED_FAMILY, DEFAULT_PROJECT_DIR,
    DEFAULT_PROMPT, DEFAULT_TIMEOUT_SECS,
};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{VerifyError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File form of the settings. Every section and key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub generation: GenerationConfig,
    pub project: ProjectConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub preferred_family: String,
    pub prompt: String,
    pub expected_answer: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            preferred_family: DEFAULT_PREFERRED_FAMILY.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            expected_answer: DEFAULT_EXPECTED_ANSWER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub path: String,
    pub required_crates: Vec<String>,
    pub legacy_pattern: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_PROJECT_DIR.to_string(),
            required_crates: default_required_crates(),
            legacy_pattern: DEFAULT_LEGACY_PATTERN.to_string(),
        }
    }
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| VerifyError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| VerifyError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| VerifyError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url(&self) -> &str {
        &self.server.base_url
    }

    fn model(&self) -> &str {
        &self.generation.model
    }

    fn preferred_family(&self) -> &str {
        &self.generation.preferred_family
    }

    fn prompt(&self) -> &str {
        &self.generation.prompt
    }

    fn expected_answer(&self) -> &str {
        &self.generation.expected_answer
    }

    fn project_dir(&self) -> &str {
        &self.project.path
    }

    fn required_crates(&self) -> &[String] {
        &self.project.required_crates
    }

    fn legacy_pattern(&self) -> &str {
        &self.project.legacy_pattern
    }

    fn timeout_secs(&self) -> u64 {
        self.server.timeout_seconds
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}
