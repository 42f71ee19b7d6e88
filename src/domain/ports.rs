use crate::domain::model::{CommandOutput, Finding, Generation, ModelInfo, ServerVersion, Stage};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

#[async_trait]
pub trait InferenceServer: Send + Sync {
    async fn version(&self) -> Result<ServerVersion>;
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;
    async fn generate(&self, model: &str, prompt: &str) -> Result<Generation>;
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` to completion. A non-zero exit is not an error; spawn failures and
    /// timeouts are.
    async fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<CommandOutput>;
}

pub trait ReportSink: Send {
    fn section(&mut self, stage: Stage);
    fn finding(&mut self, finding: &Finding);
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn model(&self) -> &str;
    fn preferred_family(&self) -> &str;
    fn prompt(&self) -> &str;
    fn expected_answer(&self) -> &str;
    fn project_dir(&self) -> &str;
    fn required_crates(&self) -> &[String];
    fn legacy_pattern(&self) -> &str;
    fn timeout_secs(&self) -> u64;

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs())
    }
}
