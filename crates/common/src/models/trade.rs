use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DEFAULT_TRADE_STATUS: &str = "open";

#[derive(Debug, Clone, Serialize)]
pub struct Trade {
    pub id: i64,
    /// Zero when the trade has no causal signal.
    pub signal_id: i64,
    pub pair: String,
    #[serde(rename = "type")]
    pub side: String,
    #[serde(rename = "ordertype")]
    pub order_type: String,
    pub volume: String,
    pub price: String,
    #[serde(rename = "txid")]
    pub tx_id: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
    // Never computed here; reserved for a later reconciliation job.
    pub pnl: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeInsert {
    pub signal_id: i64,
    pub pair: String,
    pub side: String,
    pub order_type: String,
    pub volume: String,
    pub price: String,
    pub tx_id: String,
}
