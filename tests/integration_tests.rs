use anyhow::Result;
use async_trait::async_trait;
use httpmock::prelude::*;
use ollama_verify::core::{CommandRunner, Finding, InferenceServer, Level, ReportSink};
use ollama_verify::domain::model::{CommandOutput, Generation, ModelInfo, ServerVersion};
use ollama_verify::{
    OllamaClient, VerifyError, SilentSink, Stage, TomlConfig, VerificationReport, Verifier,
};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

const CARGO_TREE: &str = "\
desktop v0.1.0 (/work/desktop/src-tauri)
├── nodespace-nlp-engine v0.1.0
│   ├── ort v2.0.0-rc.9
│   └── reqwest v0.12.9
│       └── hyper v1.5.1
├── reqwest v0.12.9 (*)
└── serde v1.0.215
";

const GREP_HITS: &str = "\
src-tauri/src/test_onnx.rs:pub async fn test_onnx_inference() {
src-tauri/src/lib.rs:    // generation goes through ollama
";

/// Stands in for cargo and grep. Programs without a canned output fail to spawn.
#[derive(Default)]
struct FakeRunner {
    cargo: Option<CommandOutput>,
    grep: Option<CommandOutput>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    fn healthy() -> Self {
        Self {
            cargo: Some(exited(0, CARGO_TREE)),
            grep: Some(exited(0, GREP_HITS)),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn exited(code: i32, stdout: &str) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        _cwd: Option<&Path>,
    ) -> ollama_verify::Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", program, args.join(" ")));

        let canned = match program {
            "cargo" => self.cargo.clone(),
            "grep" => self.grep.clone(),
            _ => None,
        };
        canned.ok_or_else(|| {
            VerifyError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", program),
            ))
        })
    }
}

#[derive(Default)]
struct RecordingSink {
    sections: Vec<Stage>,
    findings: Vec<Finding>,
}

impl ReportSink for RecordingSink {
    fn section(&mut self, stage: Stage) {
        self.sections.push(stage);
    }

    fn finding(&mut self, finding: &Finding) {
        self.findings.push(finding.clone());
    }
}

fn config_for(base_url: &str, project: &str) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.server.base_url = base_url.to_string();
    config.server.timeout_seconds = 5;
    config.project.path = project.to_string();
    config
}

fn client(base_url: &str) -> OllamaClient {
    OllamaClient::new(base_url, Duration::from_secs(5)).unwrap()
}

fn has_finding(report: &VerificationReport, stage: Stage, level: Level, text: &str) -> bool {
    report
        .check(stage)
        .map(|c| {
            c.findings
                .iter()
                .any(|f| f.level == level && f.message.contains(text))
        })
        .unwrap_or(false)
}

async fn mock_version(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/version");
            then.status(200).json_body(serde_json::json!({"version": "0.6.2"}));
        })
        .await;
}

async fn mock_models(server: &MockServer, names: &[&str]) {
    let models: Vec<_> = names
        .iter()
        .map(|name| serde_json::json!({"name": name, "size": 8_149_190_253u64}))
        .collect();
    server
        .mock_async(move |when, then| {
            when.method(GET).path("/api/tags");
            then.status(200)
                .json_body(serde_json::json!({ "models": models }));
        })
        .await;
}

async fn mock_answer<'a>(server: &'a MockServer, answer: &str) -> httpmock::Mock<'a> {
    let answer = answer.to_string();
    server
        .mock_async(move |when, then| {
            when.method(POST).path("/api/generate");
            then.status(200)
                .delay(Duration::from_millis(150))
                .json_body(serde_json::json!({ "response": answer, "done": true }));
        })
        .await
}

#[tokio::test]
async fn test_healthy_setup_passes() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_version(&server).await;
    mock_models(&server, &["gemma3:12b", "nomic-embed-text:latest"]).await;
    let generate = mock_answer(&server, " 4\n").await;

    let runner = FakeRunner::healthy();
    let verifier = Verifier::new(
        client(&server.base_url()),
        runner,
        config_for(&server.base_url(), "src-tauri"),
    );

    let mut sink = RecordingSink::default();
    let report = verifier.run(&mut sink).await?;

    generate.assert_async().await;
    assert!(report.success);
    assert!(report.aborted.is_none());
    assert_eq!(
        sink.sections,
        vec![
            Stage::Server,
            Stage::Models,
            Stage::Generation,
            Stage::Dependencies,
            Stage::Source
        ]
    );
    assert_eq!(sink.findings.len(), report.checks.iter().map(|c| c.findings.len()).sum::<usize>());

    assert!(has_finding(&report, Stage::Server, Level::Pass, "version 0.6.2"));
    assert!(has_finding(&report, Stage::Models, Level::Pass, "Found 2 Ollama models"));
    assert!(has_finding(&report, Stage::Models, Level::Detail, "- gemma3:12b (7771 MB)"));
    assert!(has_finding(&report, Stage::Generation, Level::Pass, "'4'"));
    assert!(has_finding(&report, Stage::Generation, Level::Info, "Response time"));
    assert!(has_finding(&report, Stage::Dependencies, Level::Pass, "reqwest found: 2 occurrences"));
    assert!(has_finding(&report, Stage::Dependencies, Level::Warn, "ONNX dependencies still present: 1"));
    assert!(has_finding(&report, Stage::Source, Level::Warn, "ONNX test functions"));
    assert!(has_finding(&report, Stage::Source, Level::Pass, "Found Ollama references"));

    assert_eq!(
        verifier.runner().calls(),
        vec!["cargo tree", "grep -rE test_onnx|ollama|ONNX src-tauri/src"]
    );
    Ok(())
}

#[tokio::test]
async fn test_server_down_stops_the_run() -> Result<()> {
    let runner = FakeRunner::healthy();
    let verifier = Verifier::new(
        client("http://127.0.0.1:1"),
        runner,
        config_for("http://127.0.0.1:1", "src-tauri"),
    );

    let report = verifier.run(&mut SilentSink).await?;

    assert!(!report.success);
    assert_eq!(report.aborted, Some(Stage::Server));
    assert_eq!(report.checks.len(), 1);
    assert!(has_finding(&report, Stage::Server, Level::Fail, "not accessible"));
    assert!(verifier.runner().calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_non_json_version_is_reported() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/version");
            then.status(200).body("<html>proxy login</html>");
        })
        .await;

    let verifier = Verifier::new(
        client(&server.base_url()),
        FakeRunner::healthy(),
        config_for(&server.base_url(), "src-tauri"),
    );
    let report = verifier.run(&mut SilentSink).await?;

    assert_eq!(report.aborted, Some(Stage::Server));
    assert!(has_finding(
        &report,
        Stage::Server,
        Level::Fail,
        "Invalid response from Ollama server: <html>proxy login</html>"
    ));
    Ok(())
}

#[tokio::test]
async fn test_no_models_stops_before_generation() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_version(&server).await;
    mock_models(&server, &[]).await;
    let generate = mock_answer(&server, "4").await;

    let verifier = Verifier::new(
        client(&server.base_url()),
        FakeRunner::healthy(),
        config_for(&server.base_url(), "src-tauri"),
    );
    let report = verifier.run(&mut SilentSink).await?;

    generate.assert_hits_async(0).await;
    assert_eq!(report.aborted, Some(Stage::Models));
    assert!(has_finding(&report, Stage::Models, Level::Warn, "No Gemma models found"));
    assert_eq!(report.issues(), vec![Stage::Models]);
    Ok(())
}

#[tokio::test]
async fn test_other_family_passes_with_warning() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_version(&server).await;
    mock_models(&server, &["llama3.1:8b"]).await;
    mock_answer(&server, "4").await;

    let verifier = Verifier::new(
        client(&server.base_url()),
        FakeRunner::healthy(),
        config_for(&server.base_url(), "src-tauri"),
    );
    let report = verifier.run(&mut SilentSink).await?;

    assert!(report.passed(Stage::Models));
    assert!(has_finding(&report, Stage::Models, Level::Warn, "No Gemma models found"));
    assert!(has_finding(&report, Stage::Models, Level::Detail, "ollama pull gemma3:12b"));
    assert!(report.success);
    Ok(())
}

#[tokio::test]
async fn test_wrong_answer_is_fatal() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_version(&server).await;
    mock_models(&server, &["gemma3:12b"]).await;
    mock_answer(&server, "The answer is five.").await;

    let verifier = Verifier::new(
        client(&server.base_url()),
        FakeRunner::healthy(),
        config_for(&server.base_url(), "src-tauri"),
    );
    let report = verifier.run(&mut SilentSink).await?;

    assert_eq!(report.aborted, Some(Stage::Generation));
    assert!(has_finding(&report, Stage::Generation, Level::Warn, "expected answer '4'"));
    assert!(report.check(Stage::Dependencies).is_none());
    Ok(())
}

#[tokio::test]
async fn test_canned_reply_is_fatal() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_version(&server).await;
    mock_models(&server, &["gemma3:12b"]).await;
    mock_answer(&server, "This is a generated response from the NodeSpace engine: 4").await;

    let verifier = Verifier::new(
        client(&server.base_url()),
        FakeRunner::healthy(),
        config_for(&server.base_url(), "src-tauri"),
    );
    let report = verifier.run(&mut SilentSink).await?;

    assert_eq!(report.aborted, Some(Stage::Generation));
    assert!(has_finding(&report, Stage::Generation, Level::Fail, "looks canned"));
    Ok(())
}

#[tokio::test]
async fn test_missing_engine_fails_but_scans_source() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_version(&server).await;
    mock_models(&server, &["gemma3:12b"]).await;
    mock_answer(&server, "4").await;

    let runner = FakeRunner {
        cargo: Some(exited(0, "desktop v0.1.0\n└── reqwest v0.12.9\n")),
        grep: Some(exited(1, "")),
        ..FakeRunner::default()
    };
    let verifier = Verifier::new(
        client(&server.base_url()),
        runner,
        config_for(&server.base_url(), "src-tauri"),
    );
    let report = verifier.run(&mut SilentSink).await?;

    assert!(!report.success);
    assert!(report.aborted.is_none());
    assert_eq!(report.issues(), vec![Stage::Dependencies]);
    assert!(has_finding(
        &report,
        Stage::Dependencies,
        Level::Fail,
        "No nodespace-nlp-engine found"
    ));
    assert!(has_finding(&report, Stage::Dependencies, Level::Pass, "No ONNX dependencies found"));
    assert!(report.passed(Stage::Source));
    assert!(has_finding(
        &report,
        Stage::Source,
        Level::Info,
        "No explicit AI backend references"
    ));
    Ok(())
}

#[tokio::test]
async fn test_manifest_fallback_without_cargo() -> Result<()> {
    let project = TempDir::new()?;
    std::fs::write(
        project.path().join("Cargo.toml"),
        r#"
[package]
name = "desktop"
version = "0.1.0"

[dependencies]
reqwest = { version = "0.12", features = ["json"] }
nodespace-nlp-engine = { git = "https://example.com/nlp" }
"#,
    )?;
    let project_dir = project.path().to_string_lossy().to_string();

    let server = MockServer::start_async().await;
    mock_version(&server).await;
    mock_models(&server, &["gemma3:12b"]).await;
    mock_answer(&server, "4").await;

    let runner = FakeRunner {
        grep: Some(exited(2, "")),
        ..FakeRunner::default()
    };
    let verifier = Verifier::new(
        client(&server.base_url()),
        runner,
        config_for(&server.base_url(), &project_dir),
    );
    let report = verifier.run(&mut SilentSink).await?;

    assert!(report.success);
    assert!(has_finding(&report, Stage::Dependencies, Level::Warn, "cargo tree unavailable"));
    assert!(has_finding(&report, Stage::Dependencies, Level::Info, "Falling back to the 2 direct dependencies"));
    assert!(has_finding(&report, Stage::Dependencies, Level::Pass, "reqwest found: 1 occurrences"));
    assert!(has_finding(&report, Stage::Source, Level::Warn, "Source scan of"));
    Ok(())
}

#[tokio::test]
async fn test_no_cargo_and_no_manifest_fails_dependencies() -> Result<()> {
    let project = TempDir::new()?;
    let project_dir = project.path().to_string_lossy().to_string();

    let server = MockServer::start_async().await;
    mock_version(&server).await;
    mock_models(&server, &["gemma3:12b"]).await;
    mock_answer(&server, "4").await;

    let verifier = Verifier::new(
        client(&server.base_url()),
        FakeRunner::default(),
        config_for(&server.base_url(), &project_dir),
    );
    let report = verifier.run(&mut SilentSink).await?;

    assert!(!report.success);
    assert!(!report.passed(Stage::Dependencies));
    assert!(has_finding(&report, Stage::Dependencies, Level::Fail, "No reqwest found"));
    assert!(has_finding(&report, Stage::Source, Level::Warn, "Source scan unavailable"));
    Ok(())
}

#[tokio::test]
async fn test_report_serializes_to_json() -> Result<()> {
    let verifier = Verifier::new(
        client("http://127.0.0.1:1"),
        FakeRunner::healthy(),
        config_for("http://127.0.0.1:1", "src-tauri"),
    );
    let report = verifier.run(&mut SilentSink).await?;

    let json = serde_json::to_value(&report)?;
    assert_eq!(json["success"], false);
    assert_eq!(json["aborted"], "server");
    assert_eq!(json["checks"][0]["findings"][0]["level"], "fail");
    Ok(())
}

#[tokio::test]
async fn test_unreadable_source_files_still_report_hits() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_version(&server).await;
    mock_models(&server, &["gemma3:12b"]).await;
    mock_answer(&server, "4").await;

    let mut grep = exited(2, GREP_HITS);
    grep.stderr = "grep: src-tauri/src/secret.rs: Permission denied\n".to_string();
    let runner = FakeRunner {
        grep: Some(grep),
        ..FakeRunner::healthy()
    };
    let verifier = Verifier::new(
        client(&server.base_url()),
        runner,
        config_for(&server.base_url(), "src-tauri"),
    );
    let report = verifier.run(&mut SilentSink).await?;

    assert!(report.success);
    assert!(report.passed(Stage::Source));
    assert!(has_finding(&report, Stage::Source, Level::Warn, "Permission denied"));
    assert!(has_finding(&report, Stage::Source, Level::Warn, "ONNX test functions"));
    assert!(has_finding(&report, Stage::Source, Level::Pass, "Found Ollama references"));
    Ok(())
}

/// Answers immediately, well under any network round trip.
struct InstantServer;

#[async_trait]
impl InferenceServer for InstantServer {
    async fn version(&self) -> ollama_verify::Result<ServerVersion> {
        Ok(ServerVersion {
            version: Some("0.6.2".to_string()),
        })
    }

    async fn list_models(&self) -> ollama_verify::Result<Vec<ModelInfo>> {
        Ok(vec![ModelInfo {
            name: "gemma3:12b".to_string(),
            size: 8_149_190_253,
        }])
    }

    async fn generate(&self, _model: &str, _prompt: &str) -> ollama_verify::Result<Generation> {
        Ok(Generation {
            text: "4".to_string(),
            elapsed: Duration::from_millis(5),
        })
    }
}

#[tokio::test]
async fn test_very_fast_answer_warns_but_passes() -> Result<()> {
    let verifier = Verifier::new(
        InstantServer,
        FakeRunner::healthy(),
        config_for("http://localhost:11434", "src-tauri"),
    );
    let report = verifier.run(&mut SilentSink).await?;

    assert!(report.success);
    assert!(report.passed(Stage::Generation));
    assert!(has_finding(
        &report,
        Stage::Generation,
        Level::Warn,
        "Very fast response (5ms)"
    ));
    assert!(!has_finding(&report, Stage::Generation, Level::Info, "Response time"));
    assert!(has_finding(
        &report,
        Stage::Generation,
        Level::Pass,
        "AI is providing intelligent responses"
    ));
    Ok(())
}
