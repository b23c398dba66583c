pub mod signal;
pub mod trade;

pub use signal::{InboundSignal, Signal, SignalInsert, non_empty};
pub use trade::{DEFAULT_TRADE_STATUS, Trade, TradeInsert};
