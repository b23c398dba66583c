use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Alert body posted to the webhook.
///
/// Every field is optional on the wire. Unknown keys are kept in `extra` so the
/// persisted payload stays a faithful copy of what was received, minus the token.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct InboundSignal {
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    #[serde(default, rename = "ordertype", skip_serializing_if = "Option::is_none")]
    pub order_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price2: Option<String>,
    #[serde(default, rename = "close_ordertype", skip_serializing_if = "Option::is_none")]
    pub close_order_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_price2: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InboundSignal {
    /// Serialized copy stored alongside the signal row. The token is never part of it.
    pub fn payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn pair(&self) -> &str {
        non_empty(&self.pair).unwrap_or_default()
    }

    pub fn side(&self) -> &str {
        non_empty(&self.side).unwrap_or_default()
    }

    pub fn volume(&self) -> &str {
        non_empty(&self.volume).unwrap_or_default()
    }
}

impl std::fmt::Debug for InboundSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundSignal")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("text", &self.text)
            .field("pair", &self.pair)
            .field("side", &self.side)
            .field("order_type", &self.order_type)
            .field("volume", &self.volume)
            .field("price", &self.price)
            .field("close_order_type", &self.close_order_type)
            .finish_non_exhaustive()
    }
}

/// Treats `Some("")` the same as `None`.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Serialize)]
pub struct Signal {
    pub id: i64,
    pub received_at: DateTime<Utc>,
    pub pair: String,
    #[serde(rename = "type")]
    pub side: String,
    pub payload: String,
}

#[derive(Debug, Clone)]
pub struct SignalInsert {
    pub pair: String,
    pub side: String,
    pub payload: String,
}

impl SignalInsert {
    pub fn from_inbound(signal: &InboundSignal) -> Result<Self, serde_json::Error> {
        Ok(Self {
            pair: signal.pair().to_string(),
            side: signal.side().to_string(),
            payload: signal.payload()?,
        })
    }
}
