//! In-memory [`StoreApi`] used by the tool tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use tiendanube_client::{ApiError, ApiRequest, ApiResponse, Credentials, StoreApi};

/// Records every request and answers from a script, falling back to `{}`.
#[derive(Default)]
pub struct RecordingApi {
    requests: Mutex<Vec<ApiRequest>>,
    script: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
    credentials: Mutex<Option<Credentials>>,
    senders: Mutex<Vec<Option<String>>>,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, body: Value) -> Self {
        self.script.lock().unwrap().push_back(Ok(ApiResponse::ok(body)));
        self
    }

    pub fn respond_with(self, response: ApiResponse) -> Self {
        self.script.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn fail(self, status: u16) -> Self {
        self.script.lock().unwrap().push_back(Err(ApiError::Status {
            status,
            path: "/scripted".to_string(),
            message: format!("scripted failure {status}"),
            body: Some(json!({"code": status})),
        }));
        self
    }

    pub fn with_credentials(self, credentials: Credentials) -> Self {
        *self.credentials.lock().unwrap() = Some(credentials);
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> ApiRequest {
        self.requests.lock().unwrap().last().cloned().expect("at least one request")
    }

    /// Store id each request was sent as; `None` for the installed credentials.
    pub fn senders(&self) -> Vec<Option<String>> {
        self.senders.lock().unwrap().clone()
    }

    /// Query value for `key` on the last request.
    pub fn query(&self, key: &str) -> Option<String> {
        self.last().query.into_iter().find(|(name, _)| name == key).map(|(_, value)| value)
    }
}

impl RecordingApi {
    fn record(
        &self,
        request: ApiRequest,
        sender: Option<String>,
    ) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        self.senders.lock().unwrap().push(sender);
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| Ok(ApiResponse::ok(json!({}))))
    }
}

#[async_trait]
impl StoreApi for RecordingApi {
    async fn send_as(
        &self,
        request: ApiRequest,
        credentials: &Credentials,
    ) -> Result<ApiResponse, ApiError> {
        self.record(request, Some(credentials.store_id.clone()))
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.record(request, None)
    }

    fn credentials(&self) -> Option<Credentials> {
        self.credentials.lock().unwrap().clone()
    }

    fn set_credentials(&self, credentials: Option<Credentials>) {
        *self.credentials.lock().unwrap() = credentials;
    }
}
