use chrono::{Local, NaiveDate};
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use super::{Endpoint, EndpointClass, FetchError, RateLimiter, ResponseCache};

pub const DEFAULT_BASE_URL: &str = "https://www.sumo-api.com/api";
const USER_AGENT: &str = concat!("sumo-history-import/", env!("CARGO_PKG_VERSION"));

/// Tournaments younger than this may still change upstream and are not cached
const SETTLED_AFTER_DAYS: i64 = 60;

/// Anything that can turn an [`Endpoint`] into a decoded JSON payload.
///
/// Implemented by the network fetcher and by wrappers such as
/// [`Retrying`](super::Retrying), so call sites never change when retry
/// behavior does.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Value, FetchError>;
}

/// Minimum delay between two requests of the same class
#[derive(Debug, Clone)]
pub struct ClassIntervals {
    pub tournament: Duration,
    pub banzuke: Duration,
    pub torikumi: Duration,
    pub roster: Duration,
}

impl ClassIntervals {
    pub fn get(&self, class: EndpointClass) -> Duration {
        match class {
            EndpointClass::TournamentMetadata => self.tournament,
            EndpointClass::Banzuke => self.banzuke,
            EndpointClass::DailyTorikumi => self.torikumi,
            EndpointClass::CompetitorRoster => self.roster,
        }
    }

    /// No pacing at all; for tests against a local mock server
    pub fn zero() -> Self {
        Self {
            tournament: Duration::ZERO,
            banzuke: Duration::ZERO,
            torikumi: Duration::ZERO,
            roster: Duration::ZERO,
        }
    }
}

impl Default for ClassIntervals {
    fn default() -> Self {
        Self {
            tournament: Duration::from_secs(1),
            banzuke: Duration::from_secs(1),
            torikumi: Duration::from_millis(500),
            roster: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub base_url: String,
    /// Applies to each request individually
    pub timeout: Duration,
    pub intervals: ClassIntervals,
    pub cache: Option<ResponseCache>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            intervals: ClassIntervals::default(),
            cache: None,
        }
    }
}

/// HTTP fetcher that paces each endpoint class independently.
///
/// Performs no business logic: a payload is returned as decoded JSON or the
/// request fails with a [`FetchError`].
pub struct RateLimitedFetcher {
    client: Client,
    base_url: String,
    limiters: HashMap<EndpointClass, RateLimiter>,
    cache: Option<ResponseCache>,
}

impl RateLimitedFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self::with_client(client, config))
    }

    /// Use an already configured client; `config.timeout` is ignored
    pub fn with_client(client: Client, config: FetchConfig) -> Self {
        let limiters = EndpointClass::ALL
            .into_iter()
            .map(|class| (class, RateLimiter::new(config.intervals.get(class))))
            .collect();

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limiters,
            cache: config.cache,
        }
    }

    pub fn limiter(&self, class: EndpointClass) -> &RateLimiter {
        // Every class gets a limiter in with_client
        &self.limiters[&class]
    }

    async fn dispatch(&self, endpoint: &Endpoint) -> Result<Value, FetchError> {
        self.limiter(endpoint.class()).acquire().await;

        let url = format!("{}{}", self.base_url, endpoint.path());
        tracing::debug!(endpoint = %endpoint, class = %endpoint.class(), "GET");

        let response = self
            .client
            .get(&url)
            .query(&endpoint.query())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::MalformedPayload(e.to_string()))
    }
}

impl Fetch for RateLimitedFetcher {
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Value, FetchError> {
        let cacheable = self.cache.is_some() && is_settled(endpoint, Local::now().date_naive());

        if cacheable {
            if let Some(payload) = self.cache.as_ref().and_then(|c| c.get(endpoint)) {
                tracing::debug!(endpoint = %endpoint, "cache hit");
                return Ok(payload);
            }
        }

        let payload = self.dispatch(endpoint).await?;

        if let (true, Some(cache)) = (cacheable, &self.cache) {
            if let Err(e) = cache.put(endpoint, &payload) {
                tracing::warn!(endpoint = %endpoint, "failed to cache response: {:#}", e);
            }
        }

        Ok(payload)
    }
}

/// Whether an endpoint's data is final. Rosters change continuously; a
/// tournament is final once it is comfortably in the past.
fn is_settled(endpoint: &Endpoint, today: NaiveDate) -> bool {
    let tournament = match endpoint {
        Endpoint::Basho(id) | Endpoint::Banzuke(id) | Endpoint::Torikumi(id, _) => id,
        Endpoint::Rikishi { .. } => return false,
    };
    (today - tournament.month_start()).num_days() > SETTLED_AFTER_DAYS
}
