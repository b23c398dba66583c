use std::collections::BTreeMap;

use common::models::non_empty;

/// Parameters for `AddOrder`. Optional fields that are `None` or blank are omitted from the form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderInput {
    pub pair: String,
    /// `buy` or `sell`.
    pub side: String,
    /// `market`, `limit`, `stop-loss`, ...
    pub order_type: String,
    pub volume: String,
    pub price: Option<String>,
    pub price2: Option<String>,
    pub user_ref: Option<String>,
    pub flags: Option<String>,
    pub time_in_force: Option<String>,
    /// Ask the venue to validate the order without placing it.
    pub validate: bool,
    pub close: Option<CloseOrder>,
}

/// Conditional close leg attached to an order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloseOrder {
    pub order_type: Option<String>,
    pub price: Option<String>,
    pub price2: Option<String>,
}

impl OrderInput {
    pub fn form_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("pair".to_string(), self.pair.clone());
        params.insert("type".to_string(), self.side.clone());
        params.insert("ordertype".to_string(), self.order_type.clone());
        params.insert("volume".to_string(), self.volume.clone());

        insert_optional(&mut params, "price", &self.price);
        insert_optional(&mut params, "price2", &self.price2);
        insert_optional(&mut params, "userref", &self.user_ref);
        insert_optional(&mut params, "oflags", &self.flags);
        insert_optional(&mut params, "timeinforce", &self.time_in_force);

        if self.validate {
            params.insert("validate".to_string(), "true".to_string());
        }

        if let Some(close) = &self.close {
            insert_optional(&mut params, "close[ordertype]", &close.order_type);
            insert_optional(&mut params, "close[price]", &close.price);
            insert_optional(&mut params, "close[price2]", &close.price2);
        }

        params
    }
}

fn insert_optional(params: &mut BTreeMap<String, String>, key: &str, value: &Option<String>) {
    if let Some(v) = non_empty(value) {
        params.insert(key.to_string(), v.to_string());
    }
}
