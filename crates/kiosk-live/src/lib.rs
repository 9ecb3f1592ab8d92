//! Live-state hub: the shared cart and the two broadcast channels.
//!
//! A [`LiveHub`] is constructed once by the daemon and handed to request
//! handlers by reference. It owns:
//!
//! - the single current [`CartState`], replaced wholesale on every update;
//! - the **cart** channel, whose subscribers are primed with the current
//!   cart on subscribe;
//! - the **orders** channel, which relays order snapshots without replay.
//!
//! Every mutation fans out synchronously before returning. Callbacks must be
//! non-blocking (enqueue and return) and must not call mutating hub methods
//! from inside a notification; `get_cart` is safe.

use std::sync::{Arc, Mutex};

use kiosk_schemas::{CartLine, CartState, Order};
use tracing::debug;

mod channel;
mod events;

pub use channel::{Channel, DeliveryError, Subscription};
pub use events::{CartEvent, OrderEvent};

use channel::lock;

pub struct LiveHub {
    cart: Mutex<CartState>,
    /// Serializes cart replace-and-fan-out against cart subscribe-and-prime.
    cart_turn: Mutex<()>,
    cart_channel: Arc<Channel<CartState>>,
    order_channel: Arc<Channel<Order>>,
}

impl Default for LiveHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveHub {
    pub fn new() -> Self {
        Self {
            cart: Mutex::new(CartState::empty(now_millis())),
            cart_turn: Mutex::new(()),
            cart_channel: Arc::new(Channel::new("cart")),
            order_channel: Arc::new(Channel::new("orders")),
        }
    }

    /// Current cart snapshot.
    pub fn get_cart(&self) -> CartState {
        lock(&self.cart).clone()
    }

    /// Replace every line, recompute totals, stamp `lastUpdated` and notify
    /// all cart subscribers. Line contents are not validated here.
    pub fn update_cart(&self, lines: Vec<CartLine>) -> CartState {
        let _turn = lock(&self.cart_turn);
        let snapshot = {
            let mut cart = lock(&self.cart);
            *cart = CartState::from_lines(lines, now_millis());
            cart.clone()
        };
        let delivered = self.cart_channel.publish(&snapshot);
        debug!(
            lines = snapshot.items.len(),
            total_price = snapshot.total_price,
            delivered,
            "cart replaced"
        );
        snapshot
    }

    pub fn clear_cart(&self) -> CartState {
        self.update_cart(Vec::new())
    }

    /// Register a cart observer. It receives the current cart exactly once
    /// before this returns, ahead of any later mutation.
    pub fn subscribe_cart<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&CartState) -> Result<(), DeliveryError> + Send + Sync + 'static,
    {
        let _turn = lock(&self.cart_turn);
        let current = self.get_cart();
        self.cart_channel.subscribe_primed(callback, &current)
    }

    /// Register an order observer. Only events emitted after this call are seen.
    pub fn subscribe_orders<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Order) -> Result<(), DeliveryError> + Send + Sync + 'static,
    {
        self.order_channel.subscribe(callback)
    }

    pub fn notify_new_order(&self, order: &Order) -> usize {
        let delivered = self.order_channel.publish(order);
        debug!(order_id = order.id, order_number = order.order_number, delivered, "new order relayed");
        delivered
    }

    pub fn notify_order_update(&self, order: &Order) -> usize {
        let delivered = self.order_channel.publish(order);
        debug!(order_id = order.id, status = %order.status, delivered, "order update relayed");
        delivered
    }

    pub fn cart_subscribers(&self) -> usize {
        self.cart_channel.len()
    }

    pub fn order_subscribers(&self) -> usize {
        self.order_channel.len()
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
