//! Wire and data types shared by every kiosk crate.
//!
//! Persistent rows keep the snake_case field names the admin screens expect;
//! cart types use camelCase because the order-entry and customer displays
//! exchange them verbatim.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod cart;
mod order;

pub use cart::{CartLine, CartState, SelectedOption};
pub use order::{Order, OrderItem, OrderStatus, ParseStatusError};

// ---------------------------------------------------------------------------
// Menu
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub price: i64,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    /// Only populated when the caller asked for the option tree.
    #[serde(
        rename = "optionGroups",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub option_groups: Option<Vec<OptionGroup>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub id: i64,
    pub menu_item_id: i64,
    pub name: String,
    pub is_required: bool,
    pub max_select: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub choices: Vec<OptionChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChoice {
    pub id: i64,
    pub option_group_id: i64,
    pub name: String,
    pub price_modifier: i64,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// A login account. The password hash never leaves the store crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
    pub can_access_cooking: bool,
    pub can_access_order: bool,
    pub created_at: DateTime<Utc>,
}

/// Screen permissions attached to a client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub can_access_cooking: bool,
    pub can_access_order: bool,
}

impl Permissions {
    pub const ALL: Permissions = Permissions {
        can_access_cooking: true,
        can_access_order: true,
    };
    pub const NONE: Permissions = Permissions {
        can_access_cooking: false,
        can_access_order: false,
    };
}

impl From<&Account> for Permissions {
    fn from(a: &Account) -> Self {
        if a.is_admin {
            return Permissions::ALL;
        }
        Permissions {
            can_access_cooking: a.can_access_cooking,
            can_access_order: a.can_access_order,
        }
    }
}

/// Which staff screen a request is acting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Order,
    Cooking,
}

impl Permissions {
    pub fn allows(&self, screen: Screen) -> bool {
        match screen {
            Screen::Order => self.can_access_order,
            Screen::Cooking => self.can_access_cooking,
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::Order => f.write_str("order"),
            Screen::Cooking => f.write_str("cooking"),
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayStats {
    /// Orders of the day excluding cancelled ones.
    pub total_orders: i64,
    pub total_revenue: i64,
    pub completed_orders: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuRanking {
    pub name: String,
    pub total_quantity: i64,
    pub total_revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsReport {
    pub today: TodayStats,
    #[serde(rename = "menuRanking")]
    pub menu_ranking: Vec<MenuRanking>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_account_has_every_permission() {
        let admin = Account {
            id: 1,
            username: "admin".into(),
            is_admin: true,
            can_access_cooking: false,
            can_access_order: false,
            created_at: Utc::now(),
        };
        let perms = Permissions::from(&admin);
        assert!(perms.allows(Screen::Order));
        assert!(perms.allows(Screen::Cooking));
    }

    #[test]
    fn menu_item_omits_option_tree_unless_loaded() {
        let item = MenuItem {
            id: 3,
            category_id: 1,
            name: "Tteokbokki".into(),
            price: 4000,
            description: None,
            image_url: None,
            is_available: true,
            created_at: Utc::now(),
            option_groups: None,
        };
        let v = serde_json::to_value(&item).unwrap();
        assert!(v.get("optionGroups").is_none());
        assert_eq!(v["price"], 4000);
    }
}
