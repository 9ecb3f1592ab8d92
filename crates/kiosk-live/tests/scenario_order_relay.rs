//! Scenario: order-channel relay.
//!
//! The hub relays order snapshots as-is: no replay on subscribe, no dedup,
//! nothing raised when nobody listens.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use kiosk_live::LiveHub;
use kiosk_schemas::{Order, OrderStatus};

fn order(id: i64, status: OrderStatus) -> Order {
    Order {
        id,
        order_number: id,
        status,
        total_price: 2000,
        created_at: Utc::now(),
        completed_at: (status == OrderStatus::Completed).then(Utc::now),
        items: Some(Vec::new()),
    }
}

#[test]
fn notify_without_subscribers_is_a_no_op() {
    let hub = LiveHub::new();
    assert_eq!(hub.notify_new_order(&order(1, OrderStatus::Pending)), 0);
    assert_eq!(hub.notify_order_update(&order(1, OrderStatus::Cooking)), 0);
}

#[test]
fn order_subscriber_sees_only_later_events() {
    let hub = LiveHub::new();
    hub.notify_new_order(&order(1, OrderStatus::Pending));

    let seen: Arc<Mutex<Vec<Order>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = hub.subscribe_orders(move |o| {
        sink.lock().unwrap().push(o.clone());
        Ok(())
    });
    assert!(seen.lock().unwrap().is_empty(), "no replay on subscribe");

    hub.notify_new_order(&order(2, OrderStatus::Pending));
    hub.notify_order_update(&order(2, OrderStatus::Cooking));
    hub.notify_order_update(&order(2, OrderStatus::Completed));

    let seen = seen.lock().unwrap();
    let statuses: Vec<OrderStatus> = seen.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![OrderStatus::Pending, OrderStatus::Cooking, OrderStatus::Completed]
    );
    assert!(seen[2].completed_at.is_some());
}

#[test]
fn cart_and_order_channels_are_independent() {
    let hub = LiveHub::new();
    let cart_hits = Arc::new(Mutex::new(0));
    let hits = Arc::clone(&cart_hits);
    let _cart = hub.subscribe_cart(move |_| {
        *hits.lock().unwrap() += 1;
        Ok(())
    });

    hub.notify_new_order(&order(1, OrderStatus::Pending));
    assert_eq!(*cart_hits.lock().unwrap(), 1, "only the priming delivery");
    assert_eq!(hub.order_subscribers(), 0);
    assert_eq!(hub.cart_subscribers(), 1);
}
