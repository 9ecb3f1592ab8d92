//! Categories, menu items, and their option trees.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use kiosk_schemas::{Category, MenuItem, OptionChoice, OptionGroup};

use crate::{StoreError, StoreResult};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub sort_order: Option<i64>,
}

fn category_from_row(row: &SqliteRow) -> StoreResult<Category> {
    Ok(Category {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        sort_order: row.try_get("sort_order")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn list_categories(pool: &SqlitePool) -> StoreResult<Vec<Category>> {
    let rows = sqlx::query("select * from categories order by sort_order, id")
        .fetch_all(pool)
        .await?;
    rows.iter().map(category_from_row).collect()
}

pub async fn get_category(pool: &SqlitePool, id: i64) -> StoreResult<Category> {
    let row = sqlx::query("select * from categories where id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound("category"))?;
    category_from_row(&row)
}

pub async fn create_category(pool: &SqlitePool, new: &NewCategory) -> StoreResult<Category> {
    let name = required_text(&new.name, "name")?;
    let row = sqlx::query(
        "insert into categories (name, sort_order, created_at) values (?, ?, ?) returning *",
    )
    .bind(name)
    .bind(new.sort_order)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    category_from_row(&row)
}

pub async fn update_category(
    pool: &SqlitePool,
    id: i64,
    patch: &CategoryPatch,
) -> StoreResult<Category> {
    let name = patch
        .name
        .as_deref()
        .map(|n| required_text(n, "name"))
        .transpose()?;
    let row = sqlx::query(
        r#"
        update categories
           set name = coalesce(?, name),
               sort_order = coalesce(?, sort_order)
         where id = ?
        returning *
        "#,
    )
    .bind(name)
    .bind(patch.sort_order)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound("category"))?;
    category_from_row(&row)
}

/// Refuses while any menu item still belongs to the category.
pub async fn delete_category(pool: &SqlitePool, id: i64) -> StoreResult<()> {
    let mut tx = pool.begin().await?;

    let (items,): (i64,) = sqlx::query_as("select count(*) from menu_items where category_id = ?")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    if items > 0 {
        return Err(StoreError::Conflict(format!(
            "category {id} still has {items} menu item(s)"
        )));
    }

    let res = sqlx::query("delete from categories where id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if res.rows_affected() == 0 {
        return Err(StoreError::NotFound("category"));
    }

    tx.commit().await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Menu items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub category_id: i64,
    pub name: String,
    pub price: i64,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_available: bool,
}

/// `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct MenuItemPatch {
    pub category_id: Option<i64>,
    pub name: Option<String>,
    pub price: Option<i64>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}

fn menu_item_from_row(row: &SqliteRow) -> StoreResult<MenuItem> {
    Ok(MenuItem {
        id: row.try_get("id")?,
        category_id: row.try_get("category_id")?,
        name: row.try_get("name")?,
        price: row.try_get("price")?,
        description: row.try_get("description")?,
        image_url: row.try_get("image_url")?,
        is_available: row.try_get("is_available")?,
        created_at: row.try_get("created_at")?,
        option_groups: None,
    })
}

pub async fn list_menu_items(
    pool: &SqlitePool,
    category_id: Option<i64>,
) -> StoreResult<Vec<MenuItem>> {
    let rows = match category_id {
        Some(cid) => {
            sqlx::query("select * from menu_items where category_id = ? order by id")
                .bind(cid)
                .fetch_all(pool)
                .await?
        }
        None => {
            sqlx::query("select * from menu_items order by category_id, id")
                .fetch_all(pool)
                .await?
        }
    };
    rows.iter().map(menu_item_from_row).collect()
}

pub async fn get_menu_item(pool: &SqlitePool, id: i64) -> StoreResult<MenuItem> {
    let row = sqlx::query("select * from menu_items where id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound("menu item"))?;
    menu_item_from_row(&row)
}

pub async fn create_menu_item(pool: &SqlitePool, new: &NewMenuItem) -> StoreResult<MenuItem> {
    let name = required_text(&new.name, "name")?;
    if new.price < 0 {
        return Err(StoreError::Validation("price must be >= 0".into()));
    }
    ensure_category_exists(pool, new.category_id).await?;

    let row = sqlx::query(
        r#"
        insert into menu_items (category_id, name, price, description, image_url, is_available, created_at)
        values (?, ?, ?, ?, ?, ?, ?)
        returning *
        "#,
    )
    .bind(new.category_id)
    .bind(name)
    .bind(new.price)
    .bind(&new.description)
    .bind(&new.image_url)
    .bind(new.is_available)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    menu_item_from_row(&row)
}

pub async fn update_menu_item(
    pool: &SqlitePool,
    id: i64,
    patch: &MenuItemPatch,
) -> StoreResult<MenuItem> {
    let name = patch
        .name
        .as_deref()
        .map(|n| required_text(n, "name"))
        .transpose()?;
    if matches!(patch.price, Some(p) if p < 0) {
        return Err(StoreError::Validation("price must be >= 0".into()));
    }
    if let Some(cid) = patch.category_id {
        ensure_category_exists(pool, cid).await?;
    }

    let row = sqlx::query(
        r#"
        update menu_items
           set category_id  = coalesce(?, category_id),
               name         = coalesce(?, name),
               price        = coalesce(?, price),
               description  = coalesce(?, description),
               image_url    = coalesce(?, image_url),
               is_available = coalesce(?, is_available)
         where id = ?
        returning *
        "#,
    )
    .bind(patch.category_id)
    .bind(name)
    .bind(patch.price)
    .bind(&patch.description)
    .bind(&patch.image_url)
    .bind(patch.is_available)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound("menu item"))?;
    menu_item_from_row(&row)
}

/// Deletes the item and its option tree. Past order lines keep their name and
/// price but lose the reference.
pub async fn delete_menu_item(pool: &SqlitePool, id: i64) -> StoreResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("update order_items set menu_item_id = null where menu_item_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let res = sqlx::query("delete from menu_items where id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if res.rows_affected() == 0 {
        return Err(StoreError::NotFound("menu item"));
    }

    tx.commit().await?;
    Ok(())
}

async fn ensure_category_exists(pool: &SqlitePool, id: i64) -> StoreResult<()> {
    let found: Option<(i64,)> = sqlx::query_as("select id from categories where id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    if found.is_none() {
        return Err(StoreError::Validation(format!("category {id} does not exist")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Option groups / choices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewOptionGroup {
    pub menu_item_id: i64,
    pub name: String,
    pub is_required: bool,
    pub max_select: i64,
}

#[derive(Debug, Clone)]
pub struct NewOptionChoice {
    pub option_group_id: i64,
    pub name: String,
    pub price_modifier: i64,
    pub is_default: bool,
}

fn option_group_from_row(row: &SqliteRow) -> StoreResult<OptionGroup> {
    Ok(OptionGroup {
        id: row.try_get("id")?,
        menu_item_id: row.try_get("menu_item_id")?,
        name: row.try_get("name")?,
        is_required: row.try_get("is_required")?,
        max_select: row.try_get("max_select")?,
        created_at: row.try_get("created_at")?,
        choices: Vec::new(),
    })
}

fn option_choice_from_row(row: &SqliteRow) -> StoreResult<OptionChoice> {
    Ok(OptionChoice {
        id: row.try_get("id")?,
        option_group_id: row.try_get("option_group_id")?,
        name: row.try_get("name")?,
        price_modifier: row.try_get("price_modifier")?,
        is_default: row.try_get("is_default")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Groups of one menu item, each with its choices, both ordered by id.
pub async fn load_option_groups(
    pool: &SqlitePool,
    menu_item_id: i64,
) -> StoreResult<Vec<OptionGroup>> {
    let group_rows = sqlx::query("select * from option_groups where menu_item_id = ? order by id")
        .bind(menu_item_id)
        .fetch_all(pool)
        .await?;
    let mut groups = group_rows
        .iter()
        .map(option_group_from_row)
        .collect::<StoreResult<Vec<_>>>()?;

    let choice_rows = sqlx::query(
        r#"
        select c.*
          from option_choices c
          join option_groups g on g.id = c.option_group_id
         where g.menu_item_id = ?
         order by c.id
        "#,
    )
    .bind(menu_item_id)
    .fetch_all(pool)
    .await?;

    for row in &choice_rows {
        let choice = option_choice_from_row(row)?;
        if let Some(g) = groups.iter_mut().find(|g| g.id == choice.option_group_id) {
            g.choices.push(choice);
        }
    }
    Ok(groups)
}

pub async fn create_option_group(
    pool: &SqlitePool,
    new: &NewOptionGroup,
) -> StoreResult<OptionGroup> {
    let name = required_text(&new.name, "name")?;
    if new.max_select < 1 {
        return Err(StoreError::Validation("max_select must be >= 1".into()));
    }
    get_menu_item(pool, new.menu_item_id)
        .await
        .map_err(|e| match e {
            StoreError::NotFound(_) => {
                StoreError::Validation(format!("menu item {} does not exist", new.menu_item_id))
            }
            other => other,
        })?;

    let row = sqlx::query(
        r#"
        insert into option_groups (menu_item_id, name, is_required, max_select, created_at)
        values (?, ?, ?, ?, ?)
        returning *
        "#,
    )
    .bind(new.menu_item_id)
    .bind(name)
    .bind(new.is_required)
    .bind(new.max_select)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    option_group_from_row(&row)
}

pub async fn create_option_choice(
    pool: &SqlitePool,
    new: &NewOptionChoice,
) -> StoreResult<OptionChoice> {
    let name = required_text(&new.name, "name")?;
    let group: Option<(i64,)> = sqlx::query_as("select id from option_groups where id = ?")
        .bind(new.option_group_id)
        .fetch_optional(pool)
        .await?;
    if group.is_none() {
        return Err(StoreError::Validation(format!(
            "option group {} does not exist",
            new.option_group_id
        )));
    }

    let row = sqlx::query(
        r#"
        insert into option_choices (option_group_id, name, price_modifier, is_default, created_at)
        values (?, ?, ?, ?, ?)
        returning *
        "#,
    )
    .bind(new.option_group_id)
    .bind(name)
    .bind(new.price_modifier)
    .bind(new.is_default)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    option_choice_from_row(&row)
}

/// Choices go with the group.
pub async fn delete_option_group(pool: &SqlitePool, id: i64) -> StoreResult<()> {
    let res = sqlx::query("delete from option_groups where id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if res.rows_affected() == 0 {
        return Err(StoreError::NotFound("option group"));
    }
    Ok(())
}

pub async fn delete_option_choice(pool: &SqlitePool, id: i64) -> StoreResult<()> {
    let res = sqlx::query("delete from option_choices where id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if res.rows_affected() == 0 {
        return Err(StoreError::NotFound("option choice"));
    }
    Ok(())
}

fn required_text<'a>(value: &'a str, field: &str) -> StoreResult<&'a str> {
    let t = value.trim();
    if t.is_empty() {
        return Err(StoreError::Validation(format!("{field} is required")));
    }
    Ok(t)
}
