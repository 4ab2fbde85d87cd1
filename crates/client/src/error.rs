use serde_json::Value;
use thiserror::Error;
use tiendanube_core::ErrorKind;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(
        "store credentials are not configured; call tiendanube_authenticate or set TIENDANUBE_STORE_ID and TIENDANUBE_ACCESS_TOKEN"
    )]
    MissingCredentials,

    #[error("access token cannot be sent as a header: {0}")]
    InvalidHeader(String),

    #[error("Tienda Nube API error ({status}) on {path}: {message}")]
    Status { status: u16, path: String, message: String, body: Option<Value> },

    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not decode response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("http client could not be built: {0}")]
    Build(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// JSON error body returned by the store, when there was one.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredentials | Self::InvalidHeader(_) => ErrorKind::Unauthorized,
            Self::Status { status, .. } => ErrorKind::from_status(*status),
            Self::Transport(error) if error.is_timeout() || error.is_connect() => {
                ErrorKind::Transport
            }
            Self::Transport(_) => ErrorKind::Internal,
            Self::Decode { .. } | Self::Build(_) => ErrorKind::Internal,
        }
    }
}

/// Picks the most descriptive message out of a Tienda Nube error body.
pub(crate) fn error_message(body: Option<&Value>, fallback: &str) -> String {
    let Some(body) = body else {
        return fallback.to_string();
    };

    for key in ["description", "message", "error"] {
        match body.get(key) {
            Some(Value::String(text)) if !text.trim().is_empty() => return text.clone(),
            Some(Value::Object(_)) | Some(Value::Array(_)) => {
                if let Some(value) = body.get(key) {
                    return value.to_string();
                }
            }
            _ => {}
        }
    }

    if let Value::String(text) = body {
        if !text.trim().is_empty() {
            return text.clone();
        }
    }

    fallback.to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{error_message, ApiError};
    use tiendanube_core::ErrorKind;

    #[test]
    fn message_prefers_description_over_other_fields() {
        let body = json!({"code": 422, "message": "Unprocessable Entity", "description": "name is required"});
        assert_eq!(error_message(Some(&body), "fallback"), "name is required");
    }

    #[test]
    fn message_serializes_structured_errors() {
        let body = json!({"error": {"email": ["is invalid"]}});
        assert_eq!(error_message(Some(&body), "fallback"), r#"{"email":["is invalid"]}"#);
    }

    #[test]
    fn message_falls_back_without_body() {
        assert_eq!(error_message(None, "Not Found"), "Not Found");
        assert_eq!(error_message(Some(&json!({"code": 1})), "Bad Request"), "Bad Request");
    }

    #[test]
    fn status_errors_expose_kind_and_not_found() {
        let error = ApiError::Status {
            status: 404,
            path: "/products/1".to_string(),
            message: "Not Found".to_string(),
            body: None,
        };
        assert!(error.is_not_found());
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.to_string(), "Tienda Nube API error (404) on /products/1: Not Found");
        assert_eq!(ApiError::MissingCredentials.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn only_connect_and_timeout_failures_count_as_transport() {
        let malformed = reqwest::Client::new().get("not a url").build().expect_err("bad url");
        let error = ApiError::Transport(malformed);

        assert_eq!(error.kind(), ErrorKind::Internal);
        assert!(!error.kind().is_transient());
        assert!(ErrorKind::from_status(503).is_transient());
        assert!(!ErrorKind::from_status(422).is_transient());
    }
}
