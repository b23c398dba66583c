use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderDescription {
    #[serde(default)]
    pub order: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<String>,
}

/// Result of `AddOrder`. `tx_ids` is empty when the order was only validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddOrderResponse {
    #[serde(rename = "descr", default)]
    pub description: OrderDescription,
    #[serde(rename = "txid", default)]
    pub tx_ids: Vec<String>,
}

impl AddOrderResponse {
    pub fn first_tx_id(&self) -> Option<&str> {
        self.tx_ids
            .iter()
            .map(String::as_str)
            .find(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CancelOrderResponse {
    pub count: u32,
    #[serde(default)]
    pub pending: bool,
}
