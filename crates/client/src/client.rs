use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tiendanube_core::config::{AppConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use tiendanube_core::ErrorKind;
use tracing::{debug, warn};

use crate::error::{error_message, ApiError};
use crate::request::{ApiRequest, ApiResponse, ResponseMeta};

const MAX_BACKOFF: Duration = Duration::from_secs(8);
const AUTH_HEADER: &str = "Authentication";

#[derive(Clone, Debug)]
pub struct Credentials {
    pub store_id: String,
    pub access_token: SecretString,
}

impl Credentials {
    pub fn new(store_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self { store_id: store_id.into(), access_token: access_token.into().into() }
    }
}

/// Seam between tool handlers and the network.
#[async_trait]
pub trait StoreApi: Send + Sync {
    /// Sends `request` as `credentials`, leaving the installed credentials alone.
    async fn send_as(
        &self,
        request: ApiRequest,
        credentials: &Credentials,
    ) -> Result<ApiResponse, ApiError>;

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let credentials = self.credentials().ok_or(ApiError::MissingCredentials)?;
        self.send_as(request, &credentials).await
    }

    fn credentials(&self) -> Option<Credentials>;

    fn set_credentials(&self, credentials: Option<Credentials>);

    async fn get(&self, path: &str, query: Vec<(String, String)>) -> Result<Value, ApiError> {
        Ok(self.send(ApiRequest::get(path).with_query(query)).await?.body)
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        Ok(self.send(ApiRequest::post(path, body)).await?.body)
    }

    async fn put(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        Ok(self.send(ApiRequest::put(path, body)).await?.body)
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        Ok(self.send(ApiRequest::patch(path, body)).await?.body)
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        Ok(self.send(ApiRequest::delete(path)).await?.body)
    }
}

/// Tienda Nube REST client with bearer auth and retry on transient failures.
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
    credentials: RwLock<Option<Credentials>>,
    max_attempts: u32,
    base_backoff: Duration,
}

impl StoreClient {
    pub fn builder() -> StoreClientBuilder {
        StoreClientBuilder::default()
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        let credentials = match (config.store.id.as_ref(), config.store.access_token.as_ref()) {
            (Some(id), Some(token)) if config.store.has_credentials() => Some(Credentials {
                store_id: id.trim().to_string(),
                access_token: token.clone(),
            }),
            _ => None,
        };

        Self::builder()
            .base_url(config.api.base_url.clone())
            .user_agent(config.api.user_agent.clone())
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .max_retries(config.api.max_retries)
            .base_backoff(Duration::from_millis(config.api.retry_base_delay_ms))
            .credentials(credentials)
            .build()
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(8);
        self.base_backoff.saturating_mul(1u32 << shift).min(MAX_BACKOFF)
    }

    fn build(
        &self,
        request: &ApiRequest,
        credentials: &Credentials,
    ) -> Result<reqwest::RequestBuilder, ApiError> {
        let url = format!("{}/{}{}", self.base_url, credentials.store_id, request.path);
        let token = HeaderValue::from_str(&format!(
            "bearer {}",
            credentials.access_token.expose_secret()
        ))
        .map_err(|error| ApiError::InvalidHeader(error.to_string()))?;

        let mut builder =
            self.http.request(request.method.clone(), url).header(AUTH_HEADER, token);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        Ok(builder)
    }
}

#[async_trait]
impl StoreApi for StoreClient {
    async fn send_as(
        &self,
        request: ApiRequest,
        credentials: &Credentials,
    ) -> Result<ApiResponse, ApiError> {
        let attempts = self.max_attempts.max(1);
        let method = request.method.clone();

        for attempt in 1..=attempts {
            let builder = self.build(&request, credentials)?;
            debug!(attempt, %method, path = %request.path, "sending store API request");

            match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    let retryable = !status.is_success()
                        && ErrorKind::from_status(status.as_u16()).is_transient();
                    if retryable && attempt < attempts {
                        let delay =
                            retry_after(&response).unwrap_or_else(|| self.backoff_delay(attempt));
                        warn!(
                            event_name = "http.request.retry",
                            attempt,
                            %method,
                            path = %request.path,
                            status = status.as_u16(),
                            delay_ms = delay.as_millis() as u64,
                            "retrying store API request"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    return decode_response(&request.path, response).await;
                }
                Err(error) => {
                    let error = ApiError::Transport(error);
                    if attempt < attempts && error.kind().is_transient() {
                        let delay = self.backoff_delay(attempt);
                        warn!(
                            event_name = "http.request.retry",
                            attempt,
                            %method,
                            path = %request.path,
                            error = %error,
                            delay_ms = delay.as_millis() as u64,
                            "retrying store API request after transport failure"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(error);
                }
            }
        }

        Err(ApiError::Build("store client exhausted retries without producing a result".into()))
    }

    fn credentials(&self) -> Option<Credentials> {
        self.credentials.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_credentials(&self, credentials: Option<Credentials>) {
        *self.credentials.write().unwrap_or_else(PoisonError::into_inner) = credentials;
    }
}

async fn decode_response(path: &str, response: Response) -> Result<ApiResponse, ApiError> {
    let status = response.status();
    let meta = response_meta(response.headers());
    let text = response.text().await?;

    let body = if text.trim().is_empty() {
        None
    } else {
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Some(value),
            Err(_) if !status.is_success() => Some(Value::String(text)),
            Err(error) => {
                return Err(ApiError::Decode {
                    path: path.to_string(),
                    message: error.to_string(),
                })
            }
        }
    };

    if !status.is_success() {
        let fallback = status.canonical_reason().unwrap_or("request failed");
        return Err(ApiError::Status {
            status: status.as_u16(),
            path: path.to_string(),
            message: error_message(body.as_ref(), fallback),
            body: body.filter(|value| !value.is_string()),
        });
    }

    Ok(ApiResponse { status: status.as_u16(), meta, body: body.unwrap_or(Value::Null) })
}

fn response_meta(headers: &HeaderMap) -> ResponseMeta {
    let total_count = headers
        .get("x-total-count")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());
    let link = headers
        .get(reqwest::header::LINK)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    ResponseMeta { total_count, link }
}

fn retry_after(response: &Response) -> Option<Duration> {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_BACKOFF))
}

#[derive(Debug)]
pub struct StoreClientBuilder {
    base_url: String,
    user_agent: String,
    timeout: Duration,
    max_retries: u32,
    base_backoff: Duration,
    credentials: Option<Credentials>,
}

impl Default for StoreClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 2,
            base_backoff: Duration::from_millis(250),
            credentials: None,
        }
    }
}

impl StoreClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Additional attempts after the first one.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn build(self) -> Result<StoreClient, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .default_headers(headers)
            .build()
            .map_err(|error| ApiError::Build(error.to_string()))?;

        Ok(StoreClient {
            http,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            credentials: RwLock::new(self.credentials),
            max_attempts: self.max_retries.saturating_add(1),
            base_backoff: self.base_backoff,
        })
    }
}
