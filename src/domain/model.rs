use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerVersion {
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

impl ModelInfo {
    pub fn size_mb(&self) -> u64 {
        self.size / 1024 / 1024
    }

    pub fn is_family(&self, family: &str) -> bool {
        self.name.to_lowercase().contains(&family.to_lowercase())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: String,
}

/// A completed generation call.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Pass,
    Warn,
    Fail,
    Info,
    /// Continuation line printed under the previous finding.
    Detail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub level: Level,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Server,
    Models,
    Generation,
    Dependencies,
    Source,
}

impl Stage {
    pub fn title(&self) -> &'static str {
        match self {
            Stage::Server => "Checking Ollama server",
            Stage::Models => "Checking Ollama models",
            Stage::Generation => "Testing Ollama AI generation",
            Stage::Dependencies => "Checking project dependencies",
            Stage::Source => "Checking source code for AI backend indicators",
        }
    }

    /// Line used in the issue list when this stage did not pass.
    pub fn issue(&self) -> &'static str {
        match self {
            Stage::Server => "Ollama server not running",
            Stage::Models => "No Ollama models available",
            Stage::Generation => "Ollama API not working correctly",
            Stage::Dependencies => "Missing required dependencies",
            Stage::Source => "Source scan reported problems",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Stage::Server | Stage::Models | Stage::Generation)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub stage: Stage,
    pub passed: bool,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub model: String,
    pub checks: Vec<CheckReport>,
    /// First fatal stage that failed, if the run was cut short.
    pub aborted: Option<Stage>,
    pub success: bool,
}

impl VerificationReport {
    pub fn check(&self, stage: Stage) -> Option<&CheckReport> {
        self.checks.iter().find(|c| c.stage == stage)
    }

    pub fn passed(&self, stage: Stage) -> bool {
        self.check(stage).map(|c| c.passed).unwrap_or(false)
    }

    /// Gating stages that did not pass, in run order. Skipped stages are not listed.
    pub fn issues(&self) -> Vec<Stage> {
        self.checks
            .iter()
            .filter(|c| !c.passed && c.stage != Stage::Source)
            .map(|c| c.stage)
            .collect()
    }
}
