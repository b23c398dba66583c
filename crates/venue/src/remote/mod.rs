pub mod balance_response;
pub mod envelope;
pub mod kraken_client;
pub mod order_request;
pub mod order_response;

pub use balance_response::{BalanceResponse, TradeBalanceResponse};
pub use kraken_client::{KrakenClient, PRIVATE_PATH_PREFIX};
pub use order_request::{CloseOrder, OrderInput};
pub use order_response::{AddOrderResponse, CancelOrderResponse, OrderDescription};
