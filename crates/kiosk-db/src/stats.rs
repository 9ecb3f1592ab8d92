use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};

use kiosk_schemas::{MenuRanking, StatsReport, TodayStats};

use crate::{date_key, StoreResult};

/// Totals and per-item ranking for one business day. Cancelled orders are
/// excluded from both.
pub async fn daily_stats(pool: &SqlitePool, business_date: NaiveDate) -> StoreResult<StatsReport> {
    let date = date_key(business_date);

    let row = sqlx::query(
        r#"
        select count(*)                                                   as total_orders,
               coalesce(sum(total_price), 0)                              as total_revenue,
               coalesce(sum(case when status = 'completed' then 1 else 0 end), 0) as completed_orders
          from orders
         where business_date = ? and status != 'cancelled'
        "#,
    )
    .bind(&date)
    .fetch_one(pool)
    .await?;

    let today = TodayStats {
        total_orders: row.try_get("total_orders")?,
        total_revenue: row.try_get("total_revenue")?,
        completed_orders: row.try_get("completed_orders")?,
    };

    let rows = sqlx::query(
        r#"
        select oi.name                          as name,
               sum(oi.quantity)                 as total_quantity,
               sum(oi.unit_price * oi.quantity) as total_revenue
          from order_items oi
          join orders o on o.id = oi.order_id
         where o.business_date = ? and o.status != 'cancelled'
         group by oi.name
         order by total_quantity desc, oi.name
        "#,
    )
    .bind(&date)
    .fetch_all(pool)
    .await?;

    let menu_ranking = rows
        .iter()
        .map(|r| -> StoreResult<MenuRanking> {
            Ok(MenuRanking {
                name: r.try_get("name")?,
                total_quantity: r.try_get("total_quantity")?,
                total_revenue: r.try_get("total_revenue")?,
            })
        })
        .collect::<StoreResult<Vec<_>>>()?;

    Ok(StatsReport {
        today,
        menu_ranking,
    })
}
