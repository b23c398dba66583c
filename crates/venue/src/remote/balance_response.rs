use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Asset code to balance, as decimal strings.
pub type BalanceResponse = BTreeMap<String, String>;

/// Margin summary from `TradeBalance`. Fields absent for spot-only accounts stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeBalanceResponse {
    #[serde(rename = "eb", default)]
    pub equivalent_balance: Option<String>,
    #[serde(rename = "tb", default)]
    pub trade_balance: Option<String>,
    #[serde(rename = "m", default)]
    pub margin: Option<String>,
    #[serde(rename = "n", default)]
    pub unrealized_pnl: Option<String>,
    #[serde(rename = "c", default)]
    pub cost_basis: Option<String>,
    #[serde(rename = "v", default)]
    pub valuation: Option<String>,
    #[serde(rename = "e", default)]
    pub equity: Option<String>,
    #[serde(rename = "mf", default)]
    pub free_margin: Option<String>,
    #[serde(rename = "ml", default)]
    pub margin_level: Option<String>,
}
