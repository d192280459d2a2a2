use reqwest::{Client, Method, RequestBuilder, Response, Url};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, trace};

use crate::shared::user_agent::UserAgent;
use crate::system::config::NetworkConfig;

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("HTTP client construction failed: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Request queue closed")]
    QueueClosed,
}

/// Shared HTTP dispatch queue. One connection pool for the whole process,
/// with a cap on requests in flight.
#[derive(Debug)]
pub struct RequestQueue {
    client: Client,
    permits: Semaphore,
    max_in_flight: usize,
    dispatched: AtomicU64,
}

impl RequestQueue {
    pub fn new(config: &NetworkConfig, user_agent: &UserAgent) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .user_agent(user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(NetworkError::ClientBuild)?;

        let max_in_flight = config.max_in_flight_requests.max(1);
        debug!("Request queue ready ({} requests in flight max)", max_in_flight);

        Ok(Self {
            client,
            permits: Semaphore::new(max_in_flight),
            max_in_flight,
            dispatched: AtomicU64::new(0),
        })
    }

    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Waits for a free slot, sends the request and rejects non-2xx responses.
    pub async fn dispatch(&self, request: RequestBuilder) -> Result<Response, NetworkError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| NetworkError::QueueClosed)?;

        self.dispatched.fetch_add(1, Ordering::Relaxed);

        let response = request.send().await?;
        let status = response.status();
        trace!("{} {}", status, response.url());

        if !status.is_success() {
            return Err(NetworkError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        Ok(response)
    }

    pub fn in_flight(&self) -> usize {
        self.max_in_flight - self.permits.available_permits()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub fn dispatched_count(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Pending and future dispatches fail with `QueueClosed`.
    pub fn close(&self) {
        self.permits.close();
    }
}
