mod cli;
mod session;
mod shutdown;

use std::process::ExitCode;

use casement_common::ConfigError;
use casement_config::schema::LogLevel;
use casement_config::CasementConfig;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_DIRECTIVE: &str = "casement=info";

/// Pick the log filter: `--log-level` first, then `RUST_LOG`, then the
/// config's `logging.level`.
fn log_filter(cli_directive: Option<&str>, config_level: Option<LogLevel>) -> EnvFilter {
    if let Some(directive) = cli_directive {
        match EnvFilter::try_new(directive) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("ignoring invalid --log-level {directive:?}: {e}"),
        }
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| match config_level {
        Some(level) => EnvFilter::new(format!("casement={}", level.as_directive())),
        None => EnvFilter::new(DEFAULT_LOG_DIRECTIVE),
    })
}

fn load_config(args: &cli::Args) -> Result<CasementConfig, ConfigError> {
    match &args.config {
        Some(path) => casement_config::load_config_from(path),
        None => casement_config::load_config(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    // Config is read before logging so its level can seed the filter.
    let loaded = load_config(&args);
    let config_level = loaded.as_ref().ok().map(|c| c.logging.level);
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(args.log_level.as_deref(), config_level))
        .init();

    tracing::info!("Casement v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {}", path.display());
    }
    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        CasementConfig::default()
    });

    match session::run(&args, &config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
