use crate::domain::model::{Finding, Level, Stage, VerificationReport};
use crate::domain::ports::ReportSink;

const BANNER_RULE: usize = 60;
const SECTION_RULE: usize = 50;

/// Prints each section and finding to stdout as soon as it is produced.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ReportSink for ConsoleSink {
    fn section(&mut self, stage: Stage) {
        if stage == Stage::Dependencies {
            println!("\n{}", "=".repeat(SECTION_RULE));
        }
        println!("🔍 {}...", stage.title());
    }

    fn finding(&mut self, finding: &Finding) {
        println!("{}", format_finding(finding));
    }
}

/// Discards everything; used for `--json` runs.
#[derive(Debug, Default)]
pub struct SilentSink;

impl ReportSink for SilentSink {
    fn section(&mut self, _stage: Stage) {}

    fn finding(&mut self, _finding: &Finding) {}
}

pub fn icon(level: Level) -> &'static str {
    match level {
        Level::Pass => "✅",
        Level::Warn => "⚠️ ",
        Level::Fail => "❌",
        Level::Info => "ℹ️ ",
        Level::Detail => "  ",
    }
}

pub fn format_finding(finding: &Finding) -> String {
    format!("{} {}", icon(finding.level), finding.message)
}

pub fn render_banner() -> String {
    let rule = "=".repeat(BANNER_RULE);
    format!("{rule}\n🧪 Ollama Integration Verification\n{rule}\n")
}

pub fn render_summary(report: &VerificationReport) -> String {
    let mut lines = Vec::new();

    if let Some(stage) = report.aborted {
        lines.push(String::new());
        match stage {
            Stage::Server => {
                lines.push("❌ CRITICAL: Ollama server is not running".to_string());
                lines.push("   Please start Ollama with: ollama serve".to_string());
            }
            Stage::Models => {
                lines.push("❌ CRITICAL: No Ollama models available".to_string());
                lines.push(format!(
                    "   Please install a model with: ollama pull {}",
                    report.model
                ));
            }
            _ => lines.push("❌ CRITICAL: Ollama API not responding correctly".to_string()),
        }
        return lines.join("\n");
    }

    let rule = "=".repeat(SECTION_RULE);
    lines.push(format!("\n{}", rule));
    lines.push("📊 VERIFICATION SUMMARY".to_string());
    lines.push(rule);

    if report.success {
        lines.push("🎉 SUCCESS: All systems ready for Ollama integration!".to_string());
        lines.push("✅ Ollama server: Running and responding correctly".to_string());
        lines.push("✅ Dependencies: HTTP client and NLP engine present".to_string());
        lines.push("✅ Infrastructure: Ready for real AI responses".to_string());
        lines.push(String::new());
        lines.push("🎯 RECOMMENDATION:".to_string());
        lines.push("   The AI chat interface should be working with real Ollama.".to_string());
        lines.push("   If you're still seeing mock responses, the issue might be:".to_string());
        lines.push(
            "   1. Need to update dependencies to get latest Ollama-enabled versions".to_string(),
        );
        lines.push("   2. Configuration needs to be updated to use Ollama backend".to_string());
        lines.push("   3. Need to restart the application to pick up new backend".to_string());
    } else {
        lines.push("❌ ISSUES FOUND:".to_string());
        for stage in report.issues() {
            lines.push(format!("   - {}", stage.issue()));
        }
    }

    lines.join("\n")
}
