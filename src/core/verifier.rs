use crate::core::checks::{
    check_dependencies, check_generation, check_models, check_server, check_source,
};
use crate::domain::model::{Stage, VerificationReport};
use crate::domain::ports::{CommandRunner, ConfigProvider, InferenceServer, ReportSink};
use crate::utils::error::Result;
use chrono::Utc;

/// Runs the checks in order. A failed server, models or generation check ends the run;
/// dependency and source checks always run once those three pass.
pub struct Verifier<S: InferenceServer, R: CommandRunner, C: ConfigProvider> {
    server: S,
    runner: R,
    config: C,
}

impl<S: InferenceServer, R: CommandRunner, C: ConfigProvider> Verifier<S, R, C> {
    pub fn new(server: S, runner: R, config: C) -> Self {
        Self {
            server,
            runner,
            config,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub async fn run(&self, sink: &mut dyn ReportSink) -> Result<VerificationReport> {
        let started_at = Utc::now();
        tracing::info!(
            "Verifying {} with model {}",
            self.config.base_url(),
            self.config.model()
        );

        let mut checks = Vec::new();
        let mut aborted = None;

        for stage in [Stage::Server, Stage::Models, Stage::Generation] {
            let report = match stage {
                Stage::Server => check_server(&self.server, sink).await,
                Stage::Models => check_models(&self.server, &self.config, sink).await,
                _ => check_generation(&self.server, &self.config, sink).await,
            };
            let passed = report.passed;
            checks.push(report);

            if !passed {
                tracing::info!("{:?} check failed, skipping the remaining checks", stage);
                aborted = Some(stage);
                break;
            }
        }

        if aborted.is_none() {
            checks.push(check_dependencies(&self.runner, &self.config, sink).await?);
            checks.push(check_source(&self.runner, &self.config, sink).await);
        }

        let success = aborted.is_none()
            && checks
                .iter()
                .filter(|c| c.stage != Stage::Source)
                .all(|c| c.passed);

        Ok(VerificationReport {
            started_at,
            finished_at: Utc::now(),
            model: self.config.model().to_string(),
            checks,
            aborted,
            success,
        })
    }
}
