//! Per-signal workflow: authenticate, persist the signal, notify, optionally
//! place an order, persist the resulting trade, notify the outcome.
//!
//! Only authentication can abort a run. Every later step is attempted even when
//! an earlier one failed, and its failure is logged and relayed in the final
//! notification instead of being returned.

use std::sync::Arc;

use common::config::ExecutionMode;
use common::models::{InboundSignal, SignalInsert, TradeInsert, non_empty};
use serde::Serialize;
use storage::Persistence;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;
use venue::{AddOrderResponse, CloseOrder, OrderInput, OrderVenue, VenueError};

use crate::error::AuthError;
use crate::traits::Notifier;

const DEFAULT_ORDER_TYPE: &str = "market";

#[derive(Debug, Serialize)]
pub struct WorkflowReport {
    pub request_id: Uuid,
    /// Zero when the signal could not be persisted.
    pub signal_id: i64,
    pub order: OrderOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderOutcome {
    Skipped {
        reason: String,
    },
    Placed {
        receipt: AddOrderResponse,
        validate_only: bool,
    },
    /// The venue answered with a non-empty error list.
    Rejected {
        messages: Vec<String>,
    },
    /// The request is known not to have been executed.
    Failed {
        error: String,
    },
    /// The request may or may not have reached the venue.
    Unknown {
        error: String,
    },
}

pub struct OrderOrchestrator {
    webhook_token: String,
    execution_mode: ExecutionMode,
    store: Option<Arc<dyn Persistence>>,
    venue: Option<Arc<dyn OrderVenue>>,
    notifier: Option<Arc<dyn Notifier>>,
    chat_id: i64,
}

impl OrderOrchestrator {
    pub fn new(webhook_token: impl Into<String>, execution_mode: ExecutionMode) -> Self {
        Self {
            webhook_token: webhook_token.into(),
            execution_mode,
            store: None,
            venue: None,
            notifier: None,
            chat_id: 0,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn Persistence>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_venue(mut self, venue: Arc<dyn OrderVenue>) -> Self {
        self.venue = Some(venue);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>, chat_id: i64) -> Self {
        self.notifier = Some(notifier);
        self.chat_id = chat_id;
        self
    }

    pub async fn handle(&self, signal: InboundSignal) -> Result<WorkflowReport, AuthError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("signal", %request_id);
        self.run(request_id, signal).instrument(span).await
    }

    async fn run(
        &self,
        request_id: Uuid,
        signal: InboundSignal,
    ) -> Result<WorkflowReport, AuthError> {
        if let Err(e) = self.authenticate(&signal) {
            warn!("Rejected signal: {}", e);
            return Err(e);
        }
        info!(pair = signal.pair(), side = signal.side(), "Signal accepted");

        let signal_id = self.persist_signal(&signal).await;
        self.notify(&received_message(&signal)).await;

        let mut trade_id = None;
        let order = match self.prepare_order(&signal) {
            Err(reason) => {
                info!("No order executed: {}", reason);
                OrderOutcome::Skipped { reason }
            }
            Ok((venue, input)) => {
                let outcome = execute(&**venue, &input).await;
                if let OrderOutcome::Placed { receipt, .. } = &outcome {
                    trade_id = self.persist_trade(signal_id, &input, receipt).await;
                }
                outcome
            }
        };

        self.notify(&result_message(&order)).await;

        Ok(WorkflowReport {
            request_id,
            signal_id,
            order,
            trade_id,
        })
    }

    fn authenticate(&self, signal: &InboundSignal) -> Result<(), AuthError> {
        let supplied = signal
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        if constant_time_eq(supplied.as_bytes(), self.webhook_token.as_bytes()) {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }

    async fn persist_signal(&self, signal: &InboundSignal) -> i64 {
        let Some(store) = &self.store else {
            return 0;
        };
        let insert = match SignalInsert::from_inbound(signal) {
            Ok(insert) => insert,
            Err(e) => {
                error!("Failed to encode signal payload: {}", e);
                return 0;
            }
        };
        match store.save_signal(&insert).await {
            Ok(id) => {
                info!(signal_id = id, "Signal stored");
                id
            }
            Err(e) => {
                error!("Failed to store signal: {}", e);
                0
            }
        }
    }

    fn prepare_order<'a>(
        &'a self,
        signal: &InboundSignal,
    ) -> Result<(&'a Arc<dyn OrderVenue>, OrderInput), String> {
        let venue = self
            .venue
            .as_ref()
            .ok_or_else(|| "order execution is disabled".to_string())?;

        let missing: Vec<&str> = [
            ("pair", signal.pair()),
            ("type", signal.side()),
            ("volume", signal.volume()),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return Err(format!("missing {}", missing.join(", ")));
        }

        let close = non_empty(&signal.close_order_type).map(|order_type| CloseOrder {
            order_type: Some(order_type.to_string()),
            price: signal.close_price.clone(),
            price2: signal.close_price2.clone(),
        });

        let input = OrderInput {
            pair: signal.pair().to_string(),
            side: signal.side().to_string(),
            order_type: non_empty(&signal.order_type)
                .unwrap_or(DEFAULT_ORDER_TYPE)
                .to_string(),
            volume: signal.volume().to_string(),
            price: signal.price.clone(),
            price2: signal.price2.clone(),
            validate: self.execution_mode.is_dry_run(),
            close,
            ..Default::default()
        };
        Ok((venue, input))
    }

    async fn persist_trade(
        &self,
        signal_id: i64,
        input: &OrderInput,
        receipt: &AddOrderResponse,
    ) -> Option<i64> {
        let tx_id = receipt.first_tx_id()?;
        if signal_id == 0 {
            warn!(tx_id, "Order has no stored signal; trade not recorded");
            return None;
        }
        let store = self.store.as_ref()?;

        let trade = TradeInsert {
            signal_id,
            pair: input.pair.clone(),
            side: input.side.clone(),
            order_type: input.order_type.clone(),
            volume: input.volume.clone(),
            price: non_empty(&input.price).unwrap_or_default().to_string(),
            tx_id: tx_id.to_string(),
        };
        match store.save_trade(&trade).await {
            Ok(id) => {
                info!(trade_id = id, tx_id, "Trade stored");
                Some(id)
            }
            Err(e) => {
                error!(tx_id, "Failed to store trade: {}", e);
                None
            }
        }
    }

    async fn notify(&self, text: &str) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        if let Err(e) = notifier.send(text, self.chat_id).await {
            error!("Failed to send notification: {}", e);
        }
    }
}

async fn execute(venue: &dyn OrderVenue, input: &OrderInput) -> OrderOutcome {
    match venue.add_order(input).await {
        Ok(receipt) => {
            if !input.validate && receipt.first_tx_id().is_none() {
                warn!("Venue accepted the order without a transaction id");
            }
            OrderOutcome::Placed {
                receipt,
                validate_only: input.validate,
            }
        }
        Err(VenueError::Api(api)) => {
            warn!("Order rejected: {}", api);
            OrderOutcome::Rejected {
                messages: api.messages,
            }
        }
        Err(e) if e.outcome_unknown() => {
            error!(transport = e.is_transport(), "Order outcome unknown: {}", e);
            OrderOutcome::Unknown {
                error: e.to_string(),
            }
        }
        Err(e) => {
            error!(transport = e.is_transport(), "Order failed: {}", e);
            OrderOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

fn received_message(signal: &InboundSignal) -> String {
    let mut msg = String::from("Signal received");
    if let Some(text) = non_empty(&signal.text) {
        msg.push_str(&format!(": {text}"));
    }
    let fields = [
        ("pair", non_empty(&signal.pair)),
        ("type", non_empty(&signal.side)),
        ("ordertype", non_empty(&signal.order_type)),
        ("volume", non_empty(&signal.volume)),
        ("price", non_empty(&signal.price)),
        ("close", non_empty(&signal.close_order_type)),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            msg.push_str(&format!("\n{name}: {value}"));
        }
    }
    msg
}

fn result_message(order: &OrderOutcome) -> String {
    match order {
        OrderOutcome::Skipped { reason } => format!("No order executed: {reason}"),
        OrderOutcome::Placed {
            receipt,
            validate_only,
        } => {
            let mut msg = if *validate_only {
                format!(
                    "Order validated (validation only, not placed): {}",
                    receipt.description.order
                )
            } else {
                format!("Order placed: {}", receipt.description.order)
            };
            if let Some(close) = receipt.description.close.as_deref() {
                msg.push_str(&format!("\nClose: {close}"));
            }
            if let Some(tx_id) = receipt.first_tx_id() {
                msg.push_str(&format!("\ntxid: {tx_id}"));
            }
            msg
        }
        OrderOutcome::Rejected { messages } => {
            format!("Order rejected by venue: {}", messages.join("; "))
        }
        OrderOutcome::Failed { error } => format!("Order failed: {error}"),
        OrderOutcome::Unknown { error } => format!(
            "Order outcome unknown: {error}\nCheck open orders on the venue before re-sending."
        ),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
