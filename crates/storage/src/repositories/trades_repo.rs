use chrono::NaiveDateTime;
use common::models::{Trade, TradeInsert};

use crate::data_manager::DataManager;

type TradeRow = (
    i64,
    Option<i64>,
    String,
    String,
    String,
    String,
    String,
    String,
    NaiveDateTime,
    String,
    f64,
);

pub struct TradesRepository;

impl TradesRepository {
    /// A zero `signal_id` is written as NULL.
    pub async fn insert(data_manager: &DataManager, trade: &TradeInsert) -> Result<i64, sqlx::Error> {
        let signal_id = (trade.signal_id != 0).then_some(trade.signal_id);

        let result = sqlx::query(
            r#"
                INSERT INTO trades (
                    signal_id, pair, type, ordertype, volume, price, txid
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(signal_id)
        .bind(&trade.pair)
        .bind(&trade.side)
        .bind(&trade.order_type)
        .bind(&trade.volume)
        .bind(&trade.price)
        .bind(&trade.tx_id)
        .execute(data_manager.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn recent(data_manager: &DataManager, limit: u32) -> Result<Vec<Trade>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TradeRow>(
            r#"
                SELECT id, signal_id, pair, type, ordertype, volume, price, txid,
                       created_at, status, pnl
                FROM trades
                ORDER BY created_at DESC, id DESC
                LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(data_manager.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, signal_id, pair, side, order_type, volume, price, tx_id, created_at, status, pnl)| {
                    Trade {
                        id,
                        signal_id: signal_id.unwrap_or(0),
                        pair,
                        side,
                        order_type,
                        volume,
                        price,
                        tx_id,
                        created_at: created_at.and_utc(),
                        status,
                        pnl,
                    }
                },
            )
            .collect())
    }
}
