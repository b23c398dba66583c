use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, VenueError};

/// `{"error": [...], "result": {...}}`, the shape of every private endpoint response.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    /// `null` and a missing key both mean no errors.
    #[serde(default)]
    pub error: Option<Vec<String>>,
    #[serde(default)]
    pub result: Option<Value>,
}

impl Envelope {
    pub fn into_result<T: DeserializeOwned>(self, path: &str) -> Result<T, VenueError> {
        let errors = self.error.unwrap_or_default();
        if !errors.is_empty() {
            return Err(ApiError { messages: errors }.into());
        }

        let result = self.result.ok_or_else(|| VenueError::EmptyResult {
            path: path.to_string(),
        })?;

        T::deserialize(&result).map_err(|source| VenueError::Decode {
            path: path.to_string(),
            source,
            body: result.to_string(),
        })
    }
}

pub fn decode<T: DeserializeOwned>(path: &str, body: &[u8]) -> Result<T, VenueError> {
    let envelope: Envelope = serde_json::from_slice(body).map_err(|source| VenueError::Decode {
        path: path.to_string(),
        source,
        body: String::from_utf8_lossy(body).into_owned(),
    })?;
    envelope.into_result(path)
}
