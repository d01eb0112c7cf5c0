use std::path::PathBuf;

use anyhow::{Context as _, Result};
use colored::Colorize;

use azion_api_client::{
    auth::{self, Settings, Token},
    Config, HttpClient,
};

use crate::context::Context;

setup_command! {
    /// Your Azion account email
    #[arg(short, long)]
    username: Option<String>,

    /// Your Azion account password
    #[arg(short, long)]
    password: Option<String>,
}

pub async fn run(opts: Options, ctx: &Context) -> Result<()> {
    use inquire::{Password, Text};

    let username = match opts.username {
        Some(username) => username,
        None => Text::new("Email:").prompt()?,
    };
    let password = match opts.password {
        Some(password) => password,
        None => Password::new("Password:")
            .without_confirmation()
            .prompt()?,
    };

    let session = login(&ctx.config, &ctx.client, &username, &password).await?;

    println!(
        "{} Logged in, token valid until {}",
        "✔".green(),
        session.expires_at.bold()
    );
    println!("  Settings saved in {}", session.path.display());

    crate::telemetry::flush(&ctx.config, &session.settings).await;

    Ok(())
}

#[derive(Debug)]
struct Session {
    settings: Settings,
    expires_at: String,
    path: PathBuf,
}

/// Exchanges account credentials for a token, validates it, then saves it
/// along with the identity of its owner
async fn login<C: HttpClient>(
    config: &Config,
    client: C,
    username: &str,
    password: &str,
) -> Result<Session> {
    let mut token = Token::new(config, client)?;
    let response = token
        .create(&auth::basic_auth(username, password))
        .await
        .context("Could not log in")?;

    if response.token.is_empty() {
        anyhow::bail!("Could not log in, check your credentials");
    }
    if !token.validate(&response.token).await? {
        anyhow::bail!("Could not log in, the issued token was refused");
    }

    let mut settings = auth::read_settings(config).unwrap_or_default();
    settings.token = response.token;
    settings.email = Some(username.to_string());
    if let Some(user) = token.user() {
        settings.client_id = user.client_id.clone().or(settings.client_id);
    }
    settings.ensure_uuid();

    let path = token.save(settings.to_toml()?.as_bytes())?;

    Ok(Session {
        settings,
        expires_at: response.expires_at,
        path,
    })
}
