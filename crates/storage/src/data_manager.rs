use async_trait::async_trait;
use common::models::{Signal, SignalInsert, Trade, TradeInsert};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::db;
use crate::error::StorageError;
use crate::repositories::{SignalsRepository, TradesRepository};
use crate::traits::Persistence;

pub struct DataManager {
    pool: SqlitePool,
}

impl DataManager {
    pub async fn new(database_url: &str) -> Result<Arc<Self>, sqlx::Error> {
        let pool = db::connect(database_url).await?;
        Ok(Arc::new(Self { pool }))
    }

    pub async fn in_memory() -> Result<Arc<Self>, sqlx::Error> {
        let pool = db::connect_in_memory().await?;
        Ok(Arc::new(Self { pool }))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Persistence for DataManager {
    async fn save_signal(&self, signal: &SignalInsert) -> Result<i64, StorageError> {
        Ok(SignalsRepository::insert(self, signal).await?)
    }

    async fn save_trade(&self, trade: &TradeInsert) -> Result<i64, StorageError> {
        Ok(TradesRepository::insert(self, trade).await?)
    }

    async fn recent_signals(&self, limit: u32) -> Result<Vec<Signal>, StorageError> {
        Ok(SignalsRepository::recent(self, limit).await?)
    }

    async fn recent_trades(&self, limit: u32) -> Result<Vec<Trade>, StorageError> {
        Ok(TradesRepository::recent(self, limit).await?)
    }
}
