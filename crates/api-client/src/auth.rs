use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{transport::HttpClient, Config};

const ACCEPT_VERSION: &str = "application/json; version=3";

/// Content of the settings file
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(rename = "Token", default)]
    pub token: String,
    #[serde(rename = "UUID", default)]
    pub uuid: String,
    #[serde(rename = "ClientId", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(rename = "Email", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Settings {
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Could not serialize settings")
    }

    /// Keeps the client identifier stable across logins
    pub fn ensure_uuid(&mut self) {
        if self.uuid.is_empty() {
            self.uuid = uuid::Uuid::new_v4().to_string();
        }
    }
}

/// Answer of the token creation endpoint
///
/// Missing fields decode as empty strings.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Response {
    pub token: String,
    pub created_at: String,
    pub expires_at: String,
}

/// Account owning a token, as described by the "who am I" endpoint
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct User {
    pub client_id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    results: User,
}

/// Encodes `username:password` for the basic-auth exchange
pub fn basic_auth(username: &str, password: &str) -> String {
    use base64::Engine;

    base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"))
}

#[derive(Debug)]
pub struct Token<C> {
    endpoint: String,
    client: C,
    dir: PathBuf,
    file_path: PathBuf,
    valid: bool,
    user: Option<User>,
}

impl<C: HttpClient> Token<C> {
    pub fn new(config: &Config, client: C) -> Result<Self> {
        let dir = config.dir()?;
        Ok(Self {
            endpoint: config.auth_url().trim_end_matches('/').to_string(),
            client,
            file_path: config.settings_path()?,
            dir,
            valid: false,
            user: None,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Account behind the last token accepted by [`Token::validate`]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Probes the "who am I" endpoint with the given token
    ///
    /// Only a `200 OK` marks the token valid; any other status is reported as
    /// `Ok(false)`, transport failures as errors. The account described in the
    /// answer is kept when it can be decoded.
    pub async fn validate(&mut self, token: &str) -> Result<bool> {
        tracing::debug!("validating token");

        let request = http::Request::get(format!("{}/user/me", self.endpoint))
            .header(http::header::ACCEPT, ACCEPT_VERSION)
            .header(http::header::AUTHORIZATION, format!("token {token}"))
            .body(Vec::new())?;

        let response = self.client.execute(request).await?;
        if response.status() != http::StatusCode::OK {
            tracing::debug!(status = %response.status(), "token refused");
            return Ok(false);
        }

        self.user = serde_json::from_slice::<UserEnvelope>(response.body())
            .inspect_err(|err| tracing::debug!("could not decode user: {err}"))
            .ok()
            .map(|envelope| envelope.results);
        self.valid = true;
        Ok(true)
    }

    /// Exchanges base64 encoded basic-auth credentials for a new token
    pub async fn create(&self, basic_auth_b64: &str) -> Result<Response> {
        tracing::debug!("creating token");

        let request = http::Request::post(format!("{}/tokens", self.endpoint))
            .header(http::header::ACCEPT, ACCEPT_VERSION)
            .header(http::header::CONTENT_TYPE, "application/json")
            .header(http::header::AUTHORIZATION, format!("Basic {basic_auth_b64}"))
            .body(Vec::new())?;

        let response = self.client.execute(request).await?;
        let result = serde_json::from_slice(response.body())?;

        Ok(result)
    }

    /// Overwrites the settings file with `content`, returning its path
    pub fn save(&self, content: &[u8]) -> Result<PathBuf> {
        use std::io::Write;

        tracing::debug!(path = %self.file_path.display(), "saving settings");

        std::fs::create_dir_all(&self.dir).context("Could not create Azion config dir")?;

        let mut file = {
            use std::fs::OpenOptions;

            let mut options = OpenOptions::new();
            options.write(true).create(true).truncate(true);

            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;

                options.mode(0o777);
            }

            options
                .open(&self.file_path)
                .context("Could not open settings file")?
        };

        file.write_all(content)
            .context("Could not write settings data")?;

        Ok(self.file_path.clone())
    }
}

fn parse(content: &str) -> Result<Settings> {
    toml::from_str(content).context("failed to parse settings")
}

/// Loads the whole settings document
pub fn read_settings(config: &Config) -> Result<Settings> {
    let path = config
        .settings_path()
        .context("failed to get token dir")?;
    let content = std::fs::read_to_string(path).context("failed to read settings file")?;
    parse(&content)
}

/// Loads the persisted token, failing when no settings file exists yet
pub fn read_from_disk(config: &Config) -> Result<String> {
    read_settings(config).map(|settings| settings.token)
}
