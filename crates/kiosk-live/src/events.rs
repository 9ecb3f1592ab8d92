//! Typed envelopes written to the two event streams.
//!
//! Serialized form is `{"type": "...", "data": ...}`; variants without a
//! payload carry only `type`.

use kiosk_schemas::{CartState, Order};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum CartEvent {
    Connected,
    CartUpdate(CartState),
    Heartbeat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OrderEvent {
    /// Every order still in `pending` or `cooking`, oldest first.
    Init(Vec<Order>),
    OrderUpdate(Order),
    Heartbeat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unit_envelopes_carry_only_type() {
        assert_eq!(
            serde_json::to_value(CartEvent::Connected).unwrap(),
            json!({"type": "connected"})
        );
        assert_eq!(
            serde_json::to_value(OrderEvent::Heartbeat).unwrap(),
            json!({"type": "heartbeat"})
        );
    }

    #[test]
    fn cart_update_wraps_state_in_data() {
        let v = serde_json::to_value(CartEvent::CartUpdate(CartState::empty(5))).unwrap();
        assert_eq!(v["type"], "cart_update");
        assert_eq!(v["data"]["totalPrice"], 0);
        assert_eq!(v["data"]["lastUpdated"], 5);
    }

    #[test]
    fn init_carries_order_list() {
        let v = serde_json::to_value(OrderEvent::Init(Vec::new())).unwrap();
        assert_eq!(v, json!({"type": "init", "data": []}));
    }
}
