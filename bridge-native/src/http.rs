//! [`HttpClient`] on top of reqwest.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy},
};
use core_runtime::logging::redact_url;
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Sent unless the request sets its own `User-Agent`.
const USER_AGENT: &str = concat!("metalwall/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared, pooled client for page fetches and catalog calls.
///
/// Redirects are followed (short links, `open.spotify.com` hops) and bodies
/// are decompressed before they reach the extractors.
pub struct ReqwestHttpClient {
    client: Client,
    default_policy: RetryPolicy,
}

/// What one attempt produced, before deciding whether to try again.
enum Attempt {
    Done(HttpResponse),
    Retryable(HttpResponse),
    Failed(BridgeError),
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()
            .map(Self::with_client)
            .map_err(|e| BridgeError::NotAvailable(e.to_string()))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            default_policy: RetryPolicy::default(),
        }
    }

    /// Policy applied by plain [`HttpClient::execute`] calls.
    pub fn with_default_policy(mut self, policy: RetryPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    fn to_reqwest(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }

    fn map_error(error: reqwest::Error) -> BridgeError {
        if error.is_timeout() {
            BridgeError::Timeout(error.to_string())
        } else if error.is_connect() {
            BridgeError::Connection(error.to_string())
        } else {
            BridgeError::OperationFailed(error.to_string())
        }
    }

    async fn attempt(&self, request: &HttpRequest) -> Attempt {
        let response = match self.to_reqwest(request).send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Failed(Self::map_error(e)),
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        match response.bytes().await {
            Ok(body) => {
                let response = HttpResponse {
                    status,
                    headers,
                    body,
                };
                if response.is_retryable() {
                    Attempt::Retryable(response)
                } else {
                    Attempt::Done(response)
                }
            }
            Err(e) => Attempt::Failed(Self::map_error(e)),
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.execute_with_retry(request, self.default_policy.clone())
            .await
    }

    /// The last throttled or 5xx response is returned as-is once attempts
    /// run out, so providers can still read its status and `Retry-After`.
    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let attempts = policy.max_attempts.max(1);
        let url = redact_url(&request.url);
        let mut attempt = 1;

        loop {
            debug!(url = %url, attempt, "HTTP request");

            let outcome = self.attempt(&request).await;
            let wait = match outcome {
                Attempt::Done(response) => return Ok(response),
                Attempt::Retryable(response) if attempt >= attempts => return Ok(response),
                Attempt::Failed(error) if attempt >= attempts => return Err(error),
                Attempt::Retryable(response) => {
                    warn!(url = %url, status = response.status, attempt, "Retryable status");
                    policy.delay_after(attempt, Some(&response))
                }
                Attempt::Failed(error) => {
                    warn!(url = %url, error = %error, attempt, "Request failed");
                    policy.delay_after(attempt, None)
                }
            };

            sleep(wait).await;
            attempt += 1;
        }
    }
}
