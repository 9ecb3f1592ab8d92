//! Request and response types for the kiosk HTTP API.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded
//! by Axum and decoded by tests. No business logic lives here.

use kiosk_schemas::{CartLine, Order, Permissions};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Common
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub const OK: SuccessResponse = SuccessResponse { success: true };
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdQuery {
    pub id: Option<i64>,
}

// ---------------------------------------------------------------------------
// /api/cart, /api/orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartRequest {
    #[serde(default)]
    pub items: Vec<CartLine>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub success: bool,
    pub order_id: i64,
    pub order_number: i64,
    pub total_price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusResponse {
    pub success: bool,
    pub order: Order,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearOrdersRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearOrdersResponse {
    pub success: bool,
    pub removed: u64,
}

// ---------------------------------------------------------------------------
// /api/categories, /api/menu, /api/options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRequest {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuQuery {
    pub id: Option<i64>,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub with_options: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuItemRequest {
    pub id: Option<i64>,
    pub category_id: Option<i64>,
    pub name: Option<String>,
    pub price: Option<i64>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionsQuery {
    pub menu_item_id: Option<i64>,
}

/// Body of `POST /api/options`, discriminated by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OptionCreateRequest {
    Group {
        menu_item_id: Option<i64>,
        name: Option<String>,
        #[serde(default)]
        is_required: bool,
        #[serde(default = "one")]
        max_select: i64,
    },
    Choice {
        option_group_id: Option<i64>,
        name: Option<String>,
        #[serde(default)]
        price_modifier: i64,
        #[serde(default)]
        is_default: bool,
    },
}

fn one() -> i64 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionDeleteQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: Option<i64>,
}

// ---------------------------------------------------------------------------
// /api/users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreateRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub can_access_cooking: Option<bool>,
    pub can_access_order: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserUpdateRequest {
    pub id: Option<i64>,
    pub can_access_cooking: Option<bool>,
    pub can_access_order: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreatedResponse {
    pub success: bool,
    pub id: i64,
}

// ---------------------------------------------------------------------------
// /api/auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: SessionUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
