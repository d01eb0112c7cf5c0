use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use azion_api_client::{auth::Settings, Config};

mod segment;

pub use segment::{AnalyticsClient, SegmentClient, Track};

const METRICS_FILENAME: &str = "metrics.json";
const SEGMENT_WRITE_KEY: Option<&str> = option_env!("AZION_SEGMENT_WRITE_KEY");

/// Usage counters accumulated for a single command
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MetricRecord {
    #[serde(rename = "VersionCLI")]
    pub version_cli: String,
    pub total_success: u64,
    pub total_failed: u64,
    pub shell: String,
    /// Nanoseconds
    pub execution_time: u64,
}

/// Local metrics file, batching usage counters between two flushes
#[derive(Debug)]
pub struct Metrics {
    path: PathBuf,
}

impl Metrics {
    pub fn new(config: &Config) -> Self {
        let path = config.metrics_path().unwrap_or_else(|err| {
            tracing::debug!("Failed to get metrics file path: {err:#}");
            PathBuf::from(METRICS_FILENAME)
        });

        Self { path }
    }

    fn open(&self) -> std::io::Result<std::fs::File> {
        use std::fs::OpenOptions;

        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;

            options.mode(0o666);
        }

        options.open(&self.path)
    }

    /// Never fails: a missing, empty or corrupted file reads as no metrics
    pub fn read_local_metrics(&self) -> BTreeMap<String, MetricRecord> {
        use std::io::Read;

        let mut content = String::new();
        if let Err(err) = self
            .open()
            .and_then(|mut file| file.read_to_string(&mut content))
        {
            tracing::debug!("Failed to read metrics file: {err}");
            return BTreeMap::new();
        }

        if content.trim().is_empty() {
            return BTreeMap::new();
        }

        serde_json::from_str(&content).unwrap_or_else(|err| {
            tracing::debug!("Discarding malformed metrics file: {err}");
            BTreeMap::new()
        })
    }

    /// Adds one execution of `event` to the local counters
    pub fn record(&self, event: &str, success: bool, elapsed: Duration) -> Result<()> {
        let mut metrics = self.read_local_metrics();

        let record = metrics.entry(event.to_string()).or_default();
        record.version_cli = env!("CARGO_PKG_VERSION").to_string();
        record.shell = current_shell();
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        record.execution_time = record.execution_time.saturating_add(nanos);
        if success {
            record.total_success += 1;
        } else {
            record.total_failed += 1;
        }

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).context("Could not create metrics dir")?;
        }
        let content = serde_json::to_vec(&metrics).context("Could not serialize metrics")?;
        std::fs::write(&self.path, content).context("Could not write metrics file")
    }

    /// Forwards every local record to `client`, then empties the file
    ///
    /// Stops enqueuing at the first failure. The file is truncated in every
    /// case, so records that were not sent are lost.
    pub async fn send<A: AnalyticsClient>(&self, client: &mut A, settings: &Settings) {
        let metrics = self.read_local_metrics();

        let os = std::env::consts::OS;
        let arch = std::env::consts::ARCH;
        let os_version = os_info::get().version().to_string();

        let user_id = settings.client_id.clone().filter(|id| !id.is_empty());
        let anonymous_id = Some(settings.uuid.clone()).filter(|id| !id.is_empty());
        let email = settings.email.clone().unwrap_or_default();

        for (event, record) in metrics {
            let track = Track::builder()
                .event(event)
                .maybe_user_id(user_id.clone())
                .maybe_anonymous_id(anonymous_id.clone())
                .with_properties(|properties| {
                    properties.insert("email".to_string(), json!(email));
                    properties.insert("version cli".to_string(), json!(record.version_cli));
                    properties.insert("version vulcan".to_string(), json!(record.version_cli));
                    properties.insert(
                        "total successful".to_string(),
                        json!(record.total_success),
                    );
                    properties.insert("total failed".to_string(), json!(record.total_failed));
                    properties.insert(
                        "total".to_string(),
                        json!(record.total_success + record.total_failed),
                    );
                    properties.insert("shell".to_string(), json!(record.shell));
                    properties.insert(
                        "execution time".to_string(),
                        json!(record.execution_time),
                    );
                    properties.insert("operational system".to_string(), json!(os));
                    properties.insert("architecture".to_string(), json!(arch));
                    properties.insert("os version".to_string(), json!(os_version));
                })
                .build();

            if let Err(err) = client.enqueue(track) {
                tracing::debug!("Failed to send metrics: {err:#}");
                break;
            }
        }

        if let Err(err) = client.close().await {
            tracing::debug!("Failed to flush metrics: {err:#}");
        }

        self.clean();
    }

    /// Empties the metrics file
    pub fn clean(&self) {
        if let Err(err) = std::fs::write(&self.path, b"") {
            tracing::debug!("Failed to clean metrics file: {err}");
        }
    }
}

fn current_shell() -> String {
    std::env::var("SHELL")
        .ok()
        .as_deref()
        .and_then(|shell| std::path::Path::new(shell).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn is_telemetry_enabled() -> bool {
    let Ok(value) = std::env::var("AZIONCLI_TELEMETRY_OPTOUT") else {
        return true;
    };
    value != "1" && value != "true"
}

fn write_key() -> Option<String> {
    std::env::var("AZIONCLI_SEGMENT_WRITE_KEY")
        .ok()
        .or_else(|| SEGMENT_WRITE_KEY.map(ToString::to_string))
        .filter(|key| !key.is_empty())
}

/// Sends pending metrics on behalf of the user described by `settings`
pub async fn flush(config: &Config, settings: &Settings) {
    if !is_telemetry_enabled() {
        return;
    }

    let Some(write_key) = write_key() else {
        tracing::debug!("No analytics write key configured, keeping metrics locally");
        return;
    };

    let mut client = match SegmentClient::new(write_key) {
        Ok(client) => client,
        Err(err) => {
            tracing::debug!("Telemetry error: {err:#}");
            return;
        }
    };

    Metrics::new(config).send(&mut client, settings).await;
}

/// Event name of a command line, built from its subcommand path
pub fn event_name(matches: &clap::ArgMatches) -> String {
    let mut names = Vec::new();
    let mut current = matches;
    while let Some((name, sub_matches)) = current.subcommand() {
        names.push(name.replace('-', "_"));
        current = sub_matches;
    }

    names.join("_")
}

/// Runs a command and records its outcome in the local metrics file
pub async fn process_cli_command<F, T, E>(config: &Config, event: &str, f: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    let start = Instant::now();
    let res = f.await;
    let elapsed = start.elapsed();

    if is_telemetry_enabled() && !event.is_empty() {
        if let Err(err) = Metrics::new(config).record(event, res.is_ok(), elapsed) {
            tracing::debug!("Telemetry error: {err:#}");
        }
    }

    res
}
