use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches, Parser};

use azion_api_client::Config;

mod commands;
mod context;
mod logger;
mod telemetry;
#[cfg(test)]
mod test_utils;

#[derive(Debug, Parser)]
#[command(name = "azion", about, author, version)]
struct Options {
    /// Saves a given personal token locally to authorize CLI commands
    #[arg(short, long, env = "AZIONCLI_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Sets the Azion configuration folder for the current command only
    #[arg(short = 'c', long = "config", env = "AZIONCLI_CONFIG", global = true)]
    config_dir: Option<PathBuf>,

    #[arg(long, env = "AZIONCLI_AUTH_URL", global = true, hide = true)]
    auth_url: Option<String>,

    #[arg(long, env = "AZIONCLI_LOG_FORMAT", value_enum, default_value_t, global = true)]
    log_format: logger::LogFormat,

    /// Displays logs at debug level
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Options::command().get_matches();
    let event = telemetry::event_name(&matches);
    let options = Options::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());

    logger::init(options.log_format, options.debug);

    let config = Config::builder()
        .maybe_dir(options.config_dir)
        .maybe_auth_url(options.auth_url)
        .build();

    let command = options.command;
    let token = options.token;
    telemetry::process_cli_command(&config, &event, async {
        let ctx = context::Context::init(config.clone(), token).await?;
        command.run(&ctx).await
    })
    .await
}
