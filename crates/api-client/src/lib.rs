pub mod auth;
pub mod config;
pub mod transport;

pub use config::Config;
pub use transport::HttpClient;

pub const PROD_AUTH_URL: &str = "https://api.azionapi.net";

/// Builds the HTTP client used to talk with Azion APIs
pub fn client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("azion/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .map_err(Into::into)
}
