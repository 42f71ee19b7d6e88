use crate::core::inspect::{canned_reply, crate_names, manifest_dependencies, BackendIndicators};
use crate::domain::model::{CheckReport, Finding, Level, Stage};
use crate::domain::ports::{CommandRunner, ConfigProvider, InferenceServer, ReportSink};
use crate::utils::error::{VerifyError, Result};
use regex::Regex;
use std::path::Path;
use std::time::Duration;

/// Answers quicker than this are unlikely to come from a real model.
pub const FAST_RESPONSE_THRESHOLD: Duration = Duration::from_millis(100);

const SOURCE_PATTERN: &str = "test_onnx|ollama|ONNX";

/// Collects the findings of one check while forwarding them to the sink.
pub struct Step<'a> {
    stage: Stage,
    findings: Vec<Finding>,
    sink: &'a mut dyn ReportSink,
}

impl<'a> Step<'a> {
    pub fn begin(stage: Stage, sink: &'a mut dyn ReportSink) -> Self {
        sink.section(stage);
        Self {
            stage,
            findings: Vec::new(),
            sink,
        }
    }

    fn record(&mut self, level: Level, message: String) {
        let finding = Finding { level, message };
        self.sink.finding(&finding);
        self.findings.push(finding);
    }

    pub fn pass(&mut self, message: impl Into<String>) {
        self.record(Level::Pass, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.record(Level::Warn, message.into());
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.record(Level::Fail, message.into());
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(Level::Info, message.into());
    }

    pub fn detail(&mut self, message: impl Into<String>) {
        self.record(Level::Detail, message.into());
    }

    pub fn finish(self, passed: bool) -> CheckReport {
        tracing::debug!("{:?} check finished: passed={}", self.stage, passed);
        CheckReport {
            stage: self.stage,
            passed,
            findings: self.findings,
        }
    }
}

pub async fn check_server<S: InferenceServer + ?Sized>(
    server: &S,
    sink: &mut dyn ReportSink,
) -> CheckReport {
    let mut step = Step::begin(Stage::Server, sink);

    match server.version().await {
        Ok(version) => {
            step.pass(format!(
                "Ollama server running: version {}",
                version.version.as_deref().unwrap_or("unknown")
            ));
            step.finish(true)
        }
        Err(VerifyError::InvalidResponse { body, .. }) => {
            step.fail(format!("Invalid response from Ollama server: {}", body));
            step.finish(false)
        }
        Err(e) => {
            tracing::debug!("Version request failed: {:?}", e);
            step.fail(format!("Ollama server not accessible: {}", e));
            step.finish(false)
        }
    }
}

pub async fn check_models<S, C>(server: &S, config: &C, sink: &mut dyn ReportSink) -> CheckReport
where
    S: InferenceServer + ?Sized,
    C: ConfigProvider + ?Sized,
{
    let mut step = Step::begin(Stage::Models, sink);

    let models = match server.list_models().await {
        Ok(models) => models,
        Err(VerifyError::InvalidResponse { body, .. }) => {
            step.fail(format!("Invalid models response: {}", body));
            return step.finish(false);
        }
        Err(e) => {
            step.fail(format!("Cannot get models list: {}", e));
            return step.finish(false);
        }
    };

    if models.is_empty() {
        step.warn("Found 0 Ollama models");
    } else {
        step.pass(format!("Found {} Ollama models:", models.len()));
        for model in &models {
            let name = if model.name.is_empty() {
                "unknown"
            } else {
                model.name.as_str()
            };
            step.detail(format!("- {} ({} MB)", name, model.size_mb()));
        }
    }

    let family = config.preferred_family();
    let passed = if models.iter().any(|m| m.is_family(family)) {
        step.pass(format!("{} model available for testing", capitalize(family)));
        true
    } else {
        step.warn(format!("No {} models found", capitalize(family)));
        !models.is_empty()
    };

    if !models.is_empty() && !models.iter().any(|m| m.name == config.model()) {
        step.warn(format!(
            "Generation model {} is not installed; the generation check may fail",
            config.model()
        ));
        step.detail(format!("Install it with: ollama pull {}", config.model()));
    }

    step.finish(passed)
}

pub async fn check_generation<S, C>(
    server: &S,
    config: &C,
    sink: &mut dyn ReportSink,
) -> CheckReport
where
    S: InferenceServer + ?Sized,
    C: ConfigProvider + ?Sized,
{
    let mut step = Step::begin(Stage::Generation, sink);

    let generation = match server.generate(config.model(), config.prompt()).await {
        Ok(generation) => generation,
        Err(VerifyError::InvalidResponse { body, .. }) => {
            step.fail(format!("Invalid AI response: {}", body));
            return step.finish(false);
        }
        Err(e) => {
            step.fail(format!("Ollama AI generation failed: {}", e));
            return step.finish(false);
        }
    };

    let answer = generation.text.trim();
    step.pass(format!("Ollama AI response: '{}'", answer));

    let millis = generation.elapsed.as_millis();
    if generation.elapsed < FAST_RESPONSE_THRESHOLD {
        step.warn(format!(
            "Very fast response ({}ms), might be cached or mock",
            millis
        ));
    } else {
        step.info(format!("Response time: {}ms", millis));
    }

    if let Some(phrase) = canned_reply(answer) {
        step.fail(format!("Response looks canned (matched \"{}\")", phrase));
        step.detail("The server or a proxy in front of it is returning mock output");
        return step.finish(false);
    }

    if answer.contains(config.expected_answer()) {
        step.pass("AI is providing intelligent responses!");
        step.finish(true)
    } else {
        step.warn(format!(
            "Response does not contain the expected answer '{}'",
            config.expected_answer()
        ));
        step.finish(false)
    }
}

/// Crate names from `cargo tree`, or the manifest's direct dependencies when cargo is
/// unavailable. `None` when neither source could be read.
async fn dependency_listing<R, C>(runner: &R, config: &C, step: &mut Step<'_>) -> Option<Vec<String>>
where
    R: CommandRunner + ?Sized,
    C: ConfigProvider + ?Sized,
{
    let project = Path::new(config.project_dir());

    match runner.run("cargo", &["tree"], Some(project)).await {
        Ok(output) if output.success() => {
            return Some(crate_names(&output.stdout).map(str::to_string).collect());
        }
        Ok(output) => {
            let reason = output.stderr.lines().last().unwrap_or("").trim().to_string();
            step.warn(format!(
                "cargo tree failed (exit code {:?}): {}",
                output.code, reason
            ));
        }
        Err(e) => step.warn(format!("cargo tree unavailable: {}", e)),
    }

    let manifest_path = project.join("Cargo.toml");
    let read = tokio::fs::read_to_string(&manifest_path)
        .await
        .map_err(VerifyError::from)
        .and_then(|content| manifest_dependencies(&content));

    match read {
        Ok(names) => {
            step.info(format!(
                "Falling back to the {} direct dependencies in {}",
                names.len(),
                manifest_path.display()
            ));
            Some(names)
        }
        Err(e) => {
            step.fail(format!("Cannot read {}: {}", manifest_path.display(), e));
            None
        }
    }
}

pub async fn check_dependencies<R, C>(
    runner: &R,
    config: &C,
    sink: &mut dyn ReportSink,
) -> Result<CheckReport>
where
    R: CommandRunner + ?Sized,
    C: ConfigProvider + ?Sized,
{
    let legacy = Regex::new(config.legacy_pattern()).map_err(|e| VerifyError::InvalidConfigValueError {
        field: "legacy_pattern".to_string(),
        value: config.legacy_pattern().to_string(),
        reason: e.to_string(),
    })?;

    let mut step = Step::begin(Stage::Dependencies, sink);

    let Some(names) = dependency_listing(runner, config, &mut step).await else {
        for krate in config.required_crates() {
            step.fail(format!("No {} found in dependencies", krate));
        }
        return Ok(step.finish(false));
    };

    let mut all_present = true;
    for krate in config.required_crates() {
        let count = names.iter().filter(|name| *name == krate).count();
        if count > 0 {
            step.pass(format!("{} found: {} occurrences", krate, count));
        } else {
            step.fail(format!("No {} found in dependencies", krate));
            all_present = false;
        }
    }

    let legacy_count = names.iter().filter(|name| legacy.is_match(name)).count();
    if legacy_count > 0 {
        step.warn(format!(
            "ONNX dependencies still present: {} occurrences",
            legacy_count
        ));
        step.detail("This might indicate a hybrid ONNX/Ollama setup (embeddings vs text generation)");
    } else {
        step.pass("No ONNX dependencies found");
    }

    Ok(step.finish(all_present))
}

/// Informational only; the returned report always passes.
pub async fn check_source<R, C>(runner: &R, config: &C, sink: &mut dyn ReportSink) -> CheckReport
where
    R: CommandRunner + ?Sized,
    C: ConfigProvider + ?Sized,
{
    let mut step = Step::begin(Stage::Source, sink);

    let source_dir = Path::new(config.project_dir()).join("src");
    let source_arg = source_dir.to_string_lossy();
    let output = match runner
        .run("grep", &["-rE", SOURCE_PATTERN, source_arg.as_ref()], None)
        .await
    {
        Ok(output) => output,
        Err(e) => {
            step.warn(format!("Source scan unavailable: {}", e));
            return step.finish(true);
        }
    };

    // grep exits 1 when nothing matched and 2 on unreadable files, which may still
    // come with matches on stdout
    if output.code != Some(0) && output.code != Some(1) {
        step.warn(format!(
            "Source scan of {} incomplete: {}",
            source_dir.display(),
            output.stderr.trim()
        ));
        if output.stdout.trim().is_empty() {
            return step.finish(true);
        }
    }

    let found = BackendIndicators::scan(&output.stdout);
    tracing::debug!(
        "{} matching lines in {} files",
        found.matching_lines,
        found.matching_files
    );

    if found.onnx_tests {
        step.warn("Found ONNX test functions in source code");
        step.detail("This might be leftover code from a previous implementation");
    }

    if found.ollama {
        step.pass("Found Ollama references in source code");
    } else if found.onnx {
        step.warn("Found ONNX references in source code");
    } else {
        step.info("No explicit AI backend references in app source");
        step.detail("This is expected when the AI backend is abstracted in a separate engine crate");
    }

    if found.matching_lines > 0 {
        step.detail(format!(
            "{} matching lines across {} files",
            found.matching_lines, found.matching_files
        ));
    }

    step.finish(true)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
