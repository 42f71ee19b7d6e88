use clap::Parser;
use ollama_verify::core::report::{render_banner, render_summary};
use ollama_verify::core::ConfigProvider;
use ollama_verify::utils::{logger, validation::Validate};
use ollama_verify::{
    CliConfig, ConsoleSink, OllamaClient, VerifyError, SilentSink, SystemCommandRunner, TomlConfig,
    Verifier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let json = cli.json;
    let success = match cli.config.as_deref() {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(file_config) => verify(file_config, json).await?,
            Err(e) => {
                report_config_error(&e);
                false
            }
        },
        None => verify(cli, json).await?,
    };

    std::process::exit(if success { 0 } else { 1 });
}

async fn verify<C: ConfigProvider + Validate>(config: C, json: bool) -> anyhow::Result<bool> {
    if let Err(e) = config.validate() {
        report_config_error(&e);
        return Ok(false);
    }

    let server = OllamaClient::new(config.base_url(), config.timeout())?;
    let runner = SystemCommandRunner::new(config.timeout());
    let verifier = Verifier::new(server, runner, config);

    let report = if json {
        let report = verifier.run(&mut SilentSink).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        report
    } else {
        println!("{}", render_banner());
        let report = verifier.run(&mut ConsoleSink).await?;
        println!("{}", render_summary(&report));
        report
    };

    tracing::info!(
        "Verification finished in {}ms: success={}",
        (report.finished_at - report.started_at).num_milliseconds(),
        report.success
    );
    Ok(report.success)
}

fn report_config_error(e: &VerifyError) {
    tracing::error!("Configuration validation failed: {}", e);
    eprintln!("❌ {}", e);
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
}
