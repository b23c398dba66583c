use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VenueError {
    #[error("API key cannot be empty")]
    MissingApiKey,
    #[error("API secret cannot be empty")]
    MissingApiSecret,
    #[error("invalid base64 API secret: {0}. Use the base64 encoded secret issued by the venue")]
    InvalidSecret(#[from] base64::DecodeError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("internal logic error: path '{0}' is not a private endpoint")]
    InvalidPath(String),
    #[error("HTTP request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP request to {path} timed out after {timeout:?}")]
    Timeout { path: String, timeout: Duration },
    #[error("received non-2xx HTTP status {status} from {path}: {body}")]
    HttpStatus {
        path: String,
        status: u16,
        body: String,
    },
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("venue response for {path} reported success without a result")]
    EmptyResult { path: String },
    #[error("failed to decode response from {path}: {source}. Body: {body}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

impl VenueError {
    /// Network failure, timeout or non-2xx status.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::HttpStatus { .. }
        )
    }

    /// True when the request may have reached the venue and been executed anyway.
    ///
    /// An unreadable or empty 2xx answer counts: the venue accepted the request
    /// but did not tell us what it did.
    pub fn outcome_unknown(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::EmptyResult { .. } | Self::Decode { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            Self::Transport { source, .. } => !(source.is_connect() || source.is_builder()),
            _ => false,
        }
    }
}

/// Messages from a non-empty `error` list, in the order the venue sent them.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("venue API error(s): {}", .messages.join("; "))]
pub struct ApiError {
    pub messages: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_keeps_every_message() {
        let err = VenueError::from(ApiError {
            messages: vec![
                "EOrder:Insufficient funds".to_string(),
                "EGeneral:Invalid arguments".to_string(),
            ],
        });
        assert_eq!(
            err.to_string(),
            "venue API error(s): EOrder:Insufficient funds; EGeneral:Invalid arguments"
        );
        assert!(!err.is_transport());
        assert!(!err.outcome_unknown());
    }

    #[test]
    fn classifies_transport_failures() {
        let timeout = VenueError::Timeout {
            path: "/0/private/AddOrder".to_string(),
            timeout: Duration::from_secs(20),
        };
        assert!(timeout.is_transport());
        assert!(timeout.outcome_unknown());

        let gateway = VenueError::HttpStatus {
            path: "/0/private/AddOrder".to_string(),
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert!(gateway.is_transport());
        assert!(gateway.outcome_unknown());

        let forbidden = VenueError::HttpStatus {
            path: "/0/private/AddOrder".to_string(),
            status: 403,
            body: String::new(),
        };
        assert!(forbidden.is_transport());
        assert!(!forbidden.outcome_unknown());
    }

    #[test]
    fn unreadable_success_leaves_outcome_unknown() {
        let empty = VenueError::EmptyResult {
            path: "/0/private/AddOrder".to_string(),
        };
        assert!(!empty.is_transport());
        assert!(empty.outcome_unknown());

        let decode = VenueError::Decode {
            path: "/0/private/AddOrder".to_string(),
            source: serde_json::from_str::<serde_json::Value>("<html>cf</html>").unwrap_err(),
            body: "<html>cf</html>".to_string(),
        };
        assert!(!decode.is_transport());
        assert!(decode.outcome_unknown());

        assert!(!VenueError::InvalidPath("/0/public/Time".to_string()).outcome_unknown());
        assert!(!VenueError::MissingApiKey.outcome_unknown());
    }
}
