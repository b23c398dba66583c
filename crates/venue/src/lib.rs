//! Signed client for the venue's private REST API.

pub mod error;
pub mod nonce;
pub mod remote;
pub mod signature;
pub mod traits;

pub use error::{ApiError, VenueError};
pub use nonce::{MonotonicNonce, NonceSource};
pub use remote::{AddOrderResponse, CloseOrder, KrakenClient, OrderDescription, OrderInput};
pub use signature::Signer;
pub use traits::OrderVenue;
