use std::time::Duration;

use time::Date;

use crate::{UpstreamDay, UpstreamWeek};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("upstream request failed: {0}")]
    Transport(String),

    #[error("upstream responded with status {0}")]
    Status(u16),

    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed upstream payload: {0}")]
    Decode(String),
}

/// Upstream menu provider, queried one week at a time.
#[async_trait::async_trait]
pub trait MenuSource: Send + Sync {
    /// Fetch the day records of the week starting at `monday`.
    async fn fetch_week(&self, monday: Date) -> Result<Vec<UpstreamDay>, FetchError>;
}

/// Nutrislice weeks API client.
///
/// Nutrislice returns the whole week when addressed with that week's Monday.
#[derive(Debug, Clone)]
pub struct NutrisliceClient {
    http: reqwest::Client,
    root_url: String,
    timeout: Duration,
}

impl NutrisliceClient {
    pub fn new(root_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lunchmenu/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            root_url: format!("{}/", root_url.trim_end_matches('/')),
            timeout,
        })
    }

    /// `{root}/{year}/{month}/{day}/`, without zero padding.
    pub fn week_url(&self, monday: Date) -> String {
        format!(
            "{}{}/{}/{}/",
            self.root_url,
            monday.year(),
            u8::from(monday.month()),
            monday.day()
        )
    }

    fn transport_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[async_trait::async_trait]
impl MenuSource for NutrisliceClient {
    #[tracing::instrument(skip(self), fields(monday = %monday))]
    async fn fetch_week(&self, monday: Date) -> Result<Vec<UpstreamDay>, FetchError> {
        let url = self.week_url(monday);
        tracing::debug!(url = %url, "Fetching Nutrislice week");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let week: UpstreamWeek =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(week.days.unwrap_or_default())
    }
}
