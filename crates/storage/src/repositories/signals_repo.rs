use chrono::NaiveDateTime;
use common::models::{Signal, SignalInsert};

use crate::data_manager::DataManager;

pub struct SignalsRepository;

impl SignalsRepository {
    pub async fn insert(
        data_manager: &DataManager,
        signal: &SignalInsert,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
                INSERT INTO signals (pair, type, payload) VALUES (?, ?, ?)
            "#,
        )
        .bind(&signal.pair)
        .bind(&signal.side)
        .bind(&signal.payload)
        .execute(data_manager.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn recent(data_manager: &DataManager, limit: u32) -> Result<Vec<Signal>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (i64, NaiveDateTime, String, String, String)>(
            r#"
                SELECT id, received_at, pair, type, payload
                FROM signals
                ORDER BY received_at DESC, id DESC
                LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(data_manager.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, received_at, pair, side, payload)| Signal {
                id,
                received_at: received_at.and_utc(),
                pair,
                side,
                payload,
            })
            .collect())
    }
}
