use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use track_builder::{IsUnset, SetProperties, State};

const SEGMENT_BASE_URL: &str = "https://api.segment.io";
const SEGMENT_TIMEOUT: Duration = Duration::from_millis(1000);
const MAX_MESSAGE_SIZE: usize = 32 * 1024;

/// Sink receiving usage events
pub trait AnalyticsClient {
    fn enqueue(&mut self, track: Track) -> Result<()>;

    /// Flushes pending events, the client can't be used afterwards
    fn close(&mut self) -> impl Future<Output = Result<()>>;
}

/// A Segment `track` message
#[derive(Debug, Clone, Serialize, bon::Builder)]
#[serde(tag = "type", rename = "track", rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct Track {
    event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    anonymous_id: Option<String>,
    #[builder(default)]
    properties: Map<String, Value>,
    #[builder(default = Utc::now())]
    timestamp: DateTime<Utc>,
}

impl Track {
    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn anonymous_id(&self) -> Option<&str> {
        self.anonymous_id.as_deref()
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    fn check(&self) -> Result<()> {
        if self.event.is_empty() {
            anyhow::bail!("track event name is empty");
        }
        if self.user_id.is_none() && self.anonymous_id.is_none() {
            anyhow::bail!("track has neither user id nor anonymous id");
        }

        let size = serde_json::to_vec(self)?.len();
        if size > MAX_MESSAGE_SIZE {
            anyhow::bail!("track message is too large ({size} bytes)");
        }

        Ok(())
    }
}

impl<S: State> TrackBuilder<S> {
    pub fn with_properties(
        self,
        f: impl FnOnce(&mut Map<String, Value>),
    ) -> TrackBuilder<SetProperties<S>>
    where
        S::Properties: IsUnset,
    {
        let mut properties = Map::new();
        f(&mut properties);
        self.properties(properties)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Batch<'a> {
    batch: &'a [Track],
    sent_at: DateTime<Utc>,
}

/// Buffers tracks and posts them to Segment's batch API on close
#[derive(Debug)]
pub struct SegmentClient {
    base_url: String,
    write_key: String,
    client: reqwest::Client,
    queue: Vec<Track>,
    closed: bool,
}

impl SegmentClient {
    pub fn new(write_key: impl Into<String>) -> Result<Self> {
        let base_url = std::env::var("AZIONCLI_SEGMENT_BASEURL")
            .unwrap_or_else(|_| SEGMENT_BASE_URL.to_string());

        let client = reqwest::Client::builder()
            .user_agent(concat!("azion/", env!("CARGO_PKG_VERSION")))
            .timeout(SEGMENT_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url,
            write_key: write_key.into(),
            client,
            queue: Vec::new(),
            closed: false,
        })
    }
}

impl AnalyticsClient for SegmentClient {
    fn enqueue(&mut self, track: Track) -> Result<()> {
        if self.closed {
            anyhow::bail!("analytics client is closed");
        }
        track.check()?;

        self.queue.push(track);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            anyhow::bail!("analytics client is already closed");
        }
        self.closed = true;

        if self.queue.is_empty() {
            return Ok(());
        }

        let batch = Batch {
            batch: &self.queue,
            sent_at: Utc::now(),
        };

        self.client
            .post(format!("{}/v1/batch", self.base_url.trim_end_matches('/')))
            .basic_auth(&self.write_key, None::<&str>)
            .json(&batch)
            .send()
            .await?
            .error_for_status()?;

        tracing::debug!(count = self.queue.len(), "telemetry batch sent");
        self.queue.clear();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn track_serializes_as_segment_message() {
        let track = Track::builder()
            .event("create_function")
            .user_id("client-1")
            .with_properties(|properties| {
                properties.insert("shell".to_string(), "bash".into());
            })
            .build();

        let value = serde_json::to_value(&track).unwrap();
        assert_eq!(value["type"], "track");
        assert_eq!(value["event"], "create_function");
        assert_eq!(value["userId"], "client-1");
        assert_eq!(value["properties"]["shell"], "bash");
        assert!(value.get("anonymousId").is_none());
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn enqueue_requires_identity() {
        let mut client = SegmentClient::new("key").unwrap();

        let track = Track::builder().event("login").build();
        assert!(client.enqueue(track).is_err());

        let track = Track::builder().event("login").anonymous_id("u1").build();
        assert!(client.enqueue(track).is_ok());
        assert_eq!(client.queue.len(), 1);
    }

    #[test]
    fn enqueue_rejects_unnamed_and_oversized_tracks() {
        let mut client = SegmentClient::new("key").unwrap();

        let track = Track::builder().event("").anonymous_id("u1").build();
        assert!(client.enqueue(track).is_err());

        let track = Track::builder()
            .event("login")
            .anonymous_id("u1")
            .with_properties(|properties| {
                properties.insert("blob".to_string(), "x".repeat(MAX_MESSAGE_SIZE).into());
            })
            .build();
        assert!(client.enqueue(track).is_err());
        assert!(client.queue.is_empty());
    }

    #[tokio::test]
    async fn closed_client_refuses_events() {
        let mut client = SegmentClient::new("key").unwrap();

        // nothing queued, so nothing is posted
        client.close().await.unwrap();

        let track = Track::builder().event("login").anonymous_id("u1").build();
        assert!(client.enqueue(track).is_err());
        assert!(client.close().await.is_err());
    }
}
