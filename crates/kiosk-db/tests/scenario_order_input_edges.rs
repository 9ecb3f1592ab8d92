//! Scenario: order creation with awkward cart lines.
//!
//! # Invariant under test
//! - A line pointing at a menu item that no longer exists is still ordered,
//!   stored with a null reference.
//! - Totals that do not fit `i64` are a validation error and nothing is
//!   written, including the daily number.

use chrono::{NaiveDate, Utc};
use kiosk_db::{NewCategory, NewMenuItem, StoreError};
use kiosk_schemas::CartLine;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn line(menu_item_id: Option<i64>, name: &str, price: i64, quantity: i64) -> CartLine {
    CartLine {
        menu_item_id,
        name: name.to_string(),
        price,
        quantity,
        options: Vec::new(),
        total_price: 0,
    }
}

#[tokio::test]
async fn stale_menu_reference_is_stored_as_null() -> anyhow::Result<()> {
    let pool = kiosk_db::connect_in_memory().await?;
    let cat = kiosk_db::create_category(
        &pool,
        &NewCategory {
            name: "Snacks".into(),
            sort_order: 1,
        },
    )
    .await?;
    let kept = kiosk_db::create_menu_item(
        &pool,
        &NewMenuItem {
            category_id: cat.id,
            name: "Gimbap".into(),
            price: 3000,
            description: None,
            image_url: None,
            is_available: true,
        },
    )
    .await?;

    let order = kiosk_db::create_order(
        &pool,
        &[
            line(Some(9999), "Odeng", 1500, 2),
            line(Some(kept.id), "Gimbap", 3000, 1),
        ],
        day(),
        Utc::now(),
    )
    .await?;

    assert_eq!(order.total_price, 6000);
    let items = order.items.expect("created order carries its items");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "Odeng");
    assert_eq!(items[0].menu_item_id, None);
    assert_eq!(items[1].menu_item_id, Some(kept.id));
    Ok(())
}

#[tokio::test]
async fn overflowing_totals_are_rejected_before_numbering() -> anyhow::Result<()> {
    let pool = kiosk_db::connect_in_memory().await?;
    let now = Utc::now();

    let huge_line =
        kiosk_db::create_order(&pool, &[line(None, "Huge", i64::MAX / 2, 3)], day(), now).await;
    assert!(matches!(huge_line, Err(StoreError::Validation(_))));

    let huge_sum = kiosk_db::create_order(
        &pool,
        &[
            line(None, "Half", i64::MAX / 2, 2),
            line(None, "More", i64::MAX / 2, 1),
        ],
        day(),
        now,
    )
    .await;
    assert!(matches!(huge_sum, Err(StoreError::Validation(_))));

    assert!(kiosk_db::list_orders(&pool, None).await?.is_empty());
    let first = kiosk_db::create_order(&pool, &[line(None, "Tea", 2000, 1)], day(), now).await?;
    assert_eq!(first.order_number, 1);
    Ok(())
}
