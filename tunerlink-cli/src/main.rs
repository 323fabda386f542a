use clap::Parser;
use colored::Colorize;

use tunerlink_cli::cli::{Cli, Commands};
use tunerlink_cli::commands;
use tunerlink_cli::error::CliError;
use tunerlink_cli::logging::{effective_general, init_tracing};
use tunerlink_cli::output::OutputWriter;
use tunerlink_core::config::TunerTestConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli.config_path();

    // 로깅 설정은 best-effort: 설정 파일이 없거나 깨져도 명령 자체가 오류를 보고합니다.
    let general = TunerTestConfig::load(&config_path)
        .await
        .map(|config| config.general)
        .unwrap_or_default();
    let general = effective_general(general, cli.log_level.as_deref(), cli.log_format.as_deref());
    if let Err(e) = init_tracing(&general) {
        eprintln!("{} {}", "warning:".yellow().bold(), e);
    }
    tunerlink_core::metrics::describe_all();

    tracing::debug!(config = %config_path.display(), "tunerlink starting");

    let writer = OutputWriter::new(cli.output);
    if let Err(e) = run(cli.command, &config_path, &writer).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

async fn run(
    command: Commands,
    config_path: &std::path::Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match command {
        Commands::Validate => commands::validate::execute(config_path, writer).await,
        Commands::Dataflows(args) => commands::dataflows::execute(args, config_path, writer).await,
        Commands::FilterType(args) => commands::filter_type::execute(args, writer),
        Commands::Config(args) => commands::config::execute(args, config_path, writer).await,
    }
}
