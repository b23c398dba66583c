use async_trait::async_trait;
use common::models::{Signal, SignalInsert, Trade, TradeInsert};

use crate::error::StorageError;

/// Narrow store contract consumed by the order workflow and the read endpoints.
///
/// Implementations must tolerate concurrent callers.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Returns the id assigned to the new row.
    async fn save_signal(&self, signal: &SignalInsert) -> Result<i64, StorageError>;

    async fn save_trade(&self, trade: &TradeInsert) -> Result<i64, StorageError>;

    /// Newest first, at most `limit` rows.
    async fn recent_signals(&self, limit: u32) -> Result<Vec<Signal>, StorageError>;

    /// Newest first, at most `limit` rows.
    async fn recent_trades(&self, limit: u32) -> Result<Vec<Trade>, StorageError>;
}
