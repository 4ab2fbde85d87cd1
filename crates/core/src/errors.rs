use std::fmt;

use serde::Serialize;

/// Coarse classification shared by the client, the tool layer and the CLI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthorized,
    RateLimited,
    Upstream,
    Transport,
    Policy,
    Internal,
}

impl ErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 409 | 422 => Self::Validation,
            401 | 403 => Self::Unauthorized,
            404 | 410 => Self::NotFound,
            429 => Self::RateLimited,
            500..=599 => Self::Upstream,
            _ => Self::Internal,
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::RateLimited | Self::Upstream | Self::Transport)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate_limited",
            Self::Upstream => "upstream",
            Self::Transport => "transport",
            Self::Policy => "policy",
            Self::Internal => "internal",
        }
    }

    pub fn user_message(self) -> &'static str {
        match self {
            Self::Validation => "The request could not be processed. Check inputs and try again.",
            Self::NotFound => "The requested resource does not exist in this store.",
            Self::Unauthorized => {
                "The store rejected the credentials. Re-authenticate and try again."
            }
            Self::RateLimited => "The store API is rate limiting requests. Please retry shortly.",
            Self::Upstream | Self::Transport => {
                "The store API is temporarily unavailable. Please retry shortly."
            }
            Self::Policy => "This operation is disabled for this server.",
            Self::Internal => "An unexpected internal error occurred.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorKind;

    #[test]
    fn status_codes_map_to_kinds() {
        assert_eq!(ErrorKind::from_status(422), ErrorKind::Validation);
        assert_eq!(ErrorKind::from_status(401), ErrorKind::Unauthorized);
        assert_eq!(ErrorKind::from_status(404), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_status(429), ErrorKind::RateLimited);
        assert_eq!(ErrorKind::from_status(503), ErrorKind::Upstream);
        assert_eq!(ErrorKind::from_status(302), ErrorKind::Internal);
    }

    #[test]
    fn only_rate_limits_and_outages_are_transient() {
        assert!(ErrorKind::RateLimited.is_transient());
        assert!(ErrorKind::Upstream.is_transient());
        assert!(ErrorKind::Transport.is_transient());
        assert!(!ErrorKind::Validation.is_transient());
        assert!(!ErrorKind::NotFound.is_transient());
        assert!(!ErrorKind::Policy.is_transient());
    }

    #[test]
    fn kinds_have_user_safe_messages() {
        assert_eq!(
            ErrorKind::Validation.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
        assert_eq!(ErrorKind::Transport.user_message(), ErrorKind::Upstream.user_message());
        assert_eq!(ErrorKind::RateLimited.to_string(), "rate_limited");
    }
}
