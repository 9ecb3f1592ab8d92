//! Orders: creation with daily numbering, listing, lifecycle transitions.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;

use kiosk_schemas::{CartLine, CartState, Order, OrderItem, OrderStatus, SelectedOption};

use crate::{date_key, StoreError, StoreResult};

fn order_from_row(row: &SqliteRow) -> StoreResult<Order> {
    let status: String = row.try_get("status")?;
    Ok(Order {
        id: row.try_get("id")?,
        order_number: row.try_get("order_number")?,
        status: status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::Decode(e.to_string()))?,
        total_price: row.try_get("total_price")?,
        created_at: row.try_get("created_at")?,
        completed_at: row.try_get("completed_at")?,
        items: None,
    })
}

fn order_item_from_row(row: &SqliteRow) -> StoreResult<OrderItem> {
    let options_json: String = row.try_get("options_json")?;
    let options: Vec<SelectedOption> = serde_json::from_str(&options_json)
        .map_err(|e| StoreError::Decode(format!("order_items.options_json: {e}")))?;
    Ok(OrderItem {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        menu_item_id: row.try_get("menu_item_id")?,
        name: row.try_get("name")?,
        quantity: row.try_get("quantity")?,
        unit_price: row.try_get("unit_price")?,
        options,
    })
}

async fn load_items(conn: &mut SqliteConnection, order_id: i64) -> StoreResult<Vec<OrderItem>> {
    let rows = sqlx::query("select * from order_items where order_id = ? order by id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    rows.iter().map(order_item_from_row).collect()
}

async fn fetch_order_with_items(conn: &mut SqliteConnection, id: i64) -> StoreResult<Order> {
    let row = sqlx::query("select * from orders where id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(StoreError::NotFound("order"))?;
    let mut order = order_from_row(&row)?;
    order.items = Some(load_items(conn, id).await?);
    Ok(order)
}

fn validate_lines(lines: &[CartLine]) -> StoreResult<()> {
    if lines.is_empty() {
        return Err(StoreError::Validation("order has no items".into()));
    }
    for (i, line) in lines.iter().enumerate() {
        if line.name.trim().is_empty() {
            return Err(StoreError::Validation(format!("items[{i}].name is required")));
        }
        if line.quantity <= 0 {
            return Err(StoreError::Validation(format!(
                "items[{i}].quantity must be > 0"
            )));
        }
        if line.price < 0 {
            return Err(StoreError::Validation(format!("items[{i}].price must be >= 0")));
        }
    }
    Ok(())
}

/// Order total from validated lines; refuses totals that do not fit `i64`.
fn order_total(lines: &[CartLine]) -> StoreResult<i64> {
    CartState::checked_total(lines)
        .ok_or_else(|| StoreError::Validation("order total is out of range".into()))
}

/// Insert an order built from cart lines.
///
/// Unit prices include option modifiers; the order total is recomputed from
/// the lines rather than trusted from the caller. The daily number is taken
/// from `order_sequence` inside the same transaction, restarting at 1 when
/// `business_date` differs from the last one seen.
///
/// A line whose `menu_item_id` no longer names a menu item is stored with a
/// null reference, the same as history rows for deleted items.
pub async fn create_order(
    pool: &SqlitePool,
    lines: &[CartLine],
    business_date: NaiveDate,
    now: DateTime<Utc>,
) -> StoreResult<Order> {
    validate_lines(lines)?;
    let total = order_total(lines)?;
    let date = date_key(business_date);

    let mut tx = pool.begin().await?;

    let (order_number,): (i64,) = sqlx::query_as(
        r#"
        update order_sequence
           set current_number = case when last_reset_date = ?1 then current_number + 1 else 1 end,
               last_reset_date = ?1
         where id = 1
        returning current_number
        "#,
    )
    .bind(&date)
    .fetch_one(&mut *tx)
    .await?;

    let (order_id,): (i64,) = sqlx::query_as(
        r#"
        insert into orders (order_number, business_date, status, total_price, created_at)
        values (?, ?, 'pending', ?, ?)
        returning id
        "#,
    )
    .bind(order_number)
    .bind(&date)
    .bind(total)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    for line in lines {
        let options_json = serde_json::to_string(&line.options)
            .map_err(|e| StoreError::Validation(format!("unencodable options: {e}")))?;
        sqlx::query(
            r#"
            insert into order_items (order_id, menu_item_id, name, quantity, unit_price, options_json)
            values (?, (select id from menu_items where id = ?), ?, ?, ?, ?)
            "#,
        )
        .bind(order_id)
        .bind(line.menu_item_id)
        .bind(line.name.trim())
        .bind(line.quantity)
        .bind(line.unit_price())
        .bind(options_json)
        .execute(&mut *tx)
        .await?;
    }

    let order = fetch_order_with_items(&mut tx, order_id).await?;
    tx.commit().await?;

    debug!(order_id, order_number, total, "order created");
    Ok(order)
}

/// Newest first, without items. `status` filters when given.
pub async fn list_orders(
    pool: &SqlitePool,
    status: Option<OrderStatus>,
) -> StoreResult<Vec<Order>> {
    let rows = match status {
        Some(s) => {
            sqlx::query("select * from orders where status = ? order by created_at desc, id desc")
                .bind(s.as_str())
                .fetch_all(pool)
                .await?
        }
        None => {
            sqlx::query("select * from orders order by created_at desc, id desc")
                .fetch_all(pool)
                .await?
        }
    };
    rows.iter().map(order_from_row).collect()
}

/// Pending and cooking orders, oldest first, with items.
pub async fn list_active_orders(pool: &SqlitePool) -> StoreResult<Vec<Order>> {
    let mut conn = pool.acquire().await?;
    let rows = sqlx::query(
        "select * from orders where status in ('pending', 'cooking') order by created_at asc, id asc",
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut orders = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut order = order_from_row(row)?;
        order.items = Some(load_items(&mut conn, order.id).await?);
        orders.push(order);
    }
    Ok(orders)
}

pub async fn count_active_orders(pool: &SqlitePool) -> StoreResult<i64> {
    let (n,): (i64,) =
        sqlx::query_as("select count(*) from orders where status in ('pending', 'cooking')")
            .fetch_one(pool)
            .await?;
    Ok(n)
}

pub async fn get_order(pool: &SqlitePool, id: i64) -> StoreResult<Order> {
    let mut conn = pool.acquire().await?;
    fetch_order_with_items(&mut conn, id).await
}

/// Apply one lifecycle step. Entering `completed` stamps `completed_at`.
pub async fn update_order_status(
    pool: &SqlitePool,
    id: i64,
    next: OrderStatus,
    now: DateTime<Utc>,
) -> StoreResult<Order> {
    let mut tx = pool.begin().await?;

    let current = {
        let row = sqlx::query("select status from orders where id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound("order"))?;
        let s: String = row.try_get("status")?;
        s.parse::<OrderStatus>()
            .map_err(|e| StoreError::Decode(e.to_string()))?
    };

    if !current.can_transition_to(next) {
        return Err(StoreError::InvalidTransition {
            from: current,
            to: next,
        });
    }

    let completed_at = (next == OrderStatus::Completed).then_some(now);
    let res = sqlx::query(
        "update orders set status = ?, completed_at = coalesce(?, completed_at) where id = ? and status = ?",
    )
    .bind(next.as_str())
    .bind(completed_at)
    .bind(id)
    .bind(current.as_str())
    .execute(&mut *tx)
    .await?;
    if res.rows_affected() == 0 {
        return Err(StoreError::Conflict(format!(
            "order {id} changed concurrently"
        )));
    }

    let order = fetch_order_with_items(&mut tx, id).await?;
    tx.commit().await?;
    Ok(order)
}

/// Delete every order (items cascade) and restart numbering for `business_date`.
/// Returns the number of orders removed.
pub async fn clear_all_orders(pool: &SqlitePool, business_date: NaiveDate) -> StoreResult<u64> {
    let mut tx = pool.begin().await?;

    let res = sqlx::query("delete from orders").execute(&mut *tx).await?;
    sqlx::query("update order_sequence set current_number = 0, last_reset_date = ? where id = 1")
        .bind(date_key(business_date))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(res.rows_affected())
}
