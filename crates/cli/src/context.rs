use anyhow::{Context as _, Result};

use azion_api_client::{
    auth::{self, Token},
    Config, HttpClient,
};

/// State shared by every command of a single invocation
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub client: reqwest::Client,
    pub token: Option<String>,
}

impl Context {
    pub async fn init(config: Config, token: Option<String>) -> Result<Self> {
        let client = azion_api_client::client()?;
        let token = resolve_token(&config, &client, token).await?;

        Ok(Self {
            config,
            client,
            token,
        })
    }
}

/// Picks the token to use for this invocation
///
/// A token given on the command line is validated and persisted, otherwise
/// the one saved on disk is used when there is one.
async fn resolve_token<C: HttpClient>(
    config: &Config,
    client: C,
    token: Option<String>,
) -> Result<Option<String>> {
    match token {
        Some(token) => {
            persist_token(config, client, &token).await?;
            Ok(Some(token))
        }
        None => Ok(auth::read_from_disk(config)
            .inspect_err(|err| tracing::debug!("No token loaded: {err:#}"))
            .ok()
            .filter(|token| !token.is_empty())),
    }
}

async fn persist_token<C: HttpClient>(config: &Config, client: C, value: &str) -> Result<()> {
    let mut token = Token::new(config, client)?;

    let valid = token
        .validate(value)
        .await
        .context("Could not validate token")?;
    if !valid {
        anyhow::bail!("Invalid token, check it and try again");
    }

    let mut settings = auth::read_settings(config).unwrap_or_default();
    settings.token = value.to_string();
    if let Some(user) = token.user() {
        settings.client_id = user.client_id.clone().or(settings.client_id);
        settings.email = user.email.clone().or(settings.email);
    }
    settings.ensure_uuid();

    let path = token.save(settings.to_toml()?.as_bytes())?;
    tracing::debug!(path = %path.display(), "token saved");

    Ok(())
}
