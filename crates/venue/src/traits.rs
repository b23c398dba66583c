use async_trait::async_trait;

use crate::error::VenueError;
use crate::remote::{AddOrderResponse, OrderInput};

#[async_trait]
pub trait OrderVenue: Send + Sync {
    async fn add_order(&self, order: &OrderInput) -> Result<AddOrderResponse, VenueError>;
}
