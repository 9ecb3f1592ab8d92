//! Axum router and all HTTP handlers for kiosk-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Tests compose the bare router directly.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{sse::Sse, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use kiosk_auth::{clear_cookie, session_cookie, TokenKind, ADMIN_COOKIE, CLIENT_COOKIE};
use kiosk_db::{
    CategoryPatch, MenuItemPatch, NewAccount, NewCategory, NewMenuItem, NewOptionChoice,
    NewOptionGroup,
};
use kiosk_schemas::{CartLine, CartState, MenuItem, OrderStatus, Permissions};
use tracing::{info, warn};

use crate::{
    api_types::{
        CartRequest, CategoryRequest, ClearOrdersRequest, ClearOrdersResponse,
        CreateOrderResponse, HealthResponse, IdQuery, LoginRequest, LoginResponse,
        MenuItemRequest, MenuQuery, OptionCreateRequest, OptionDeleteQuery, OptionsQuery,
        OrderStatusResponse, OrdersQuery, SessionUser, SuccessResponse, UpdateStatusRequest,
        UserCreateRequest, UserCreatedResponse, UserUpdateRequest, VerifyResponse,
    },
    error::{ApiError, ApiJson, ApiPath, ApiQuery},
    session::{AdminSession, ClientSession, CookingStaff, OrderStaff},
    state::AppState,
    stream::{self, StreamTiming},
};

type ApiResult<T> = Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/cart", get(cart_get).post(cart_replace).delete(cart_clear))
        .route("/api/orders", get(orders_list).post(orders_create))
        .route("/api/orders/clear", post(orders_clear))
        .route("/api/orders/:id", get(order_get).patch(order_update_status))
        .route(
            "/api/categories",
            get(categories_list)
                .post(category_create)
                .put(category_update)
                .delete(category_delete),
        )
        .route(
            "/api/menu",
            get(menu_get)
                .post(menu_create)
                .put(menu_update)
                .delete(menu_delete),
        )
        .route(
            "/api/options",
            get(options_list).post(option_create).delete(option_delete),
        )
        .route(
            "/api/users",
            get(users_list)
                .post(user_create)
                .put(user_update)
                .delete(user_delete),
        )
        .route("/api/stats", get(stats))
        .route("/api/auth/login", post(auth_login))
        .route("/api/auth/logout", post(auth_logout))
        .route("/api/auth/verify-admin", get(auth_verify_admin))
        .route("/api/auth/jwt-login", post(auth_jwt_login))
        .route("/api/auth/jwt-logout", post(auth_jwt_logout))
        .route("/api/auth/verify-jwt", get(auth_verify_jwt))
        .route("/api/sse/cart", get(sse_cart))
        .route("/api/sse/orders", get(sse_orders))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// /api/cart
// ---------------------------------------------------------------------------

pub(crate) async fn cart_get(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    Json(st.live.get_cart())
}

pub(crate) async fn cart_replace(
    State(st): State<Arc<AppState>>,
    OrderStaff(staff): OrderStaff,
    ApiJson(body): ApiJson<CartRequest>,
) -> ApiResult<Response> {
    validate_cart_lines(&body.items)?;
    let cart = st.live.update_cart(body.items);
    info!(
        by = %staff.username,
        lines = cart.items.len(),
        total = cart.total_price,
        "cart/replace"
    );
    Ok(Json(cart).into_response())
}

pub(crate) async fn cart_clear(
    State(st): State<Arc<AppState>>,
    OrderStaff(staff): OrderStaff,
) -> impl IntoResponse {
    let cart = st.live.clear_cart();
    info!(by = %staff.username, "cart/clear");
    Json(cart)
}

fn validate_cart_lines(lines: &[CartLine]) -> ApiResult<()> {
    for (i, line) in lines.iter().enumerate() {
        if line.quantity <= 0 {
            return Err(ApiError::bad_request(format!(
                "items[{i}].quantity must be > 0"
            )));
        }
        if line.price < 0 {
            return Err(ApiError::bad_request(format!("items[{i}].price must be >= 0")));
        }
        if line.checked_line_total().is_none() {
            return Err(ApiError::bad_request(format!(
                "items[{i}] total is out of range"
            )));
        }
    }
    if CartState::checked_total(lines).is_none() {
        return Err(ApiError::bad_request("cart total is out of range"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// /api/orders
// ---------------------------------------------------------------------------

pub(crate) async fn orders_list(
    State(st): State<Arc<AppState>>,
    ApiQuery(q): ApiQuery<OrdersQuery>,
) -> ApiResult<Response> {
    if q.active {
        let orders = kiosk_db::list_active_orders(&st.pool).await?;
        return Ok(Json(orders).into_response());
    }
    let status = q
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let orders = kiosk_db::list_orders(&st.pool, status).await?;
    Ok(Json(orders).into_response())
}

/// Persist the order, clear the shared cart, then announce the new order.
pub(crate) async fn orders_create(
    State(st): State<Arc<AppState>>,
    OrderStaff(staff): OrderStaff,
    ApiJson(body): ApiJson<CartRequest>,
) -> ApiResult<Json<CreateOrderResponse>> {
    if body.items.is_empty() {
        return Err(ApiError::bad_request("order has no items"));
    }
    validate_cart_lines(&body.items)?;

    let now = Utc::now();
    let order = kiosk_db::create_order(&st.pool, &body.items, st.business_date(now), now).await?;

    st.live.clear_cart();
    let delivered = st.live.notify_new_order(&order);

    info!(
        by = %staff.username,
        order_id = order.id,
        order_number = order.order_number,
        total = order.total_price,
        delivered,
        "orders/create"
    );

    Ok(Json(CreateOrderResponse {
        success: true,
        order_id: order.id,
        order_number: order.order_number,
        total_price: order.total_price,
    }))
}

pub(crate) async fn order_get(
    State(st): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Response> {
    let order = kiosk_db::get_order(&st.pool, id).await?;
    Ok(Json(order).into_response())
}

pub(crate) async fn order_update_status(
    State(st): State<Arc<AppState>>,
    CookingStaff(staff): CookingStaff,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> ApiResult<Json<OrderStatusResponse>> {
    let raw = body
        .status
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("status is required"))?;
    let next: OrderStatus = raw
        .parse()
        .map_err(|e: kiosk_schemas::ParseStatusError| ApiError::bad_request(e.to_string()))?;

    let order = kiosk_db::update_order_status(&st.pool, id, next, Utc::now()).await?;
    let delivered = st.live.notify_order_update(&order);

    info!(
        by = %staff.username,
        order_id = id,
        status = %order.status,
        delivered,
        "orders/status"
    );

    Ok(Json(OrderStatusResponse {
        success: true,
        order,
    }))
}

/// Wipe every order. Guarded by the master password, not by a session.
pub(crate) async fn orders_clear(
    State(st): State<Arc<AppState>>,
    ApiJson(body): ApiJson<ClearOrdersRequest>,
) -> ApiResult<Json<ClearOrdersResponse>> {
    let Some(expected) = st.clear_password.as_deref() else {
        return Err(ApiError::Forbidden("clearing orders is disabled".into()));
    };
    if body.password != expected {
        warn!("orders/clear refused: wrong master password");
        return Err(ApiError::Unauthorized("wrong master password".into()));
    }

    let removed = kiosk_db::clear_all_orders(&st.pool, st.business_date(Utc::now())).await?;
    info!(removed, "orders/clear");

    Ok(Json(ClearOrdersResponse {
        success: true,
        removed,
    }))
}

// ---------------------------------------------------------------------------
// /api/categories
// ---------------------------------------------------------------------------

pub(crate) async fn categories_list(State(st): State<Arc<AppState>>) -> ApiResult<Response> {
    let categories = kiosk_db::list_categories(&st.pool).await?;
    Ok(Json(categories).into_response())
}

pub(crate) async fn category_create(
    State(st): State<Arc<AppState>>,
    _admin: AdminSession,
    ApiJson(body): ApiJson<CategoryRequest>,
) -> ApiResult<Response> {
    let name = body
        .name
        .ok_or_else(|| ApiError::bad_request("name is required"))?;
    let category = kiosk_db::create_category(
        &st.pool,
        &NewCategory {
            name,
            sort_order: body.sort_order.unwrap_or(0),
        },
    )
    .await?;
    info!(category_id = category.id, name = %category.name, "categories/create");
    Ok(Json(category).into_response())
}

pub(crate) async fn category_update(
    State(st): State<Arc<AppState>>,
    _admin: AdminSession,
    ApiJson(body): ApiJson<CategoryRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let (Some(id), Some(name)) = (body.id, body.name) else {
        return Err(ApiError::bad_request("id and name are required"));
    };
    kiosk_db::update_category(
        &st.pool,
        id,
        &CategoryPatch {
            name: Some(name),
            sort_order: body.sort_order,
        },
    )
    .await?;
    info!(category_id = id, "categories/update");
    Ok(Json(SuccessResponse::OK))
}

pub(crate) async fn category_delete(
    State(st): State<Arc<AppState>>,
    _admin: AdminSession,
    ApiQuery(q): ApiQuery<IdQuery>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = q.id.ok_or_else(|| ApiError::bad_request("id is required"))?;
    kiosk_db::delete_category(&st.pool, id).await?;
    info!(category_id = id, "categories/delete");
    Ok(Json(SuccessResponse::OK))
}

// ---------------------------------------------------------------------------
// /api/menu
// ---------------------------------------------------------------------------

pub(crate) async fn menu_get(
    State(st): State<Arc<AppState>>,
    ApiQuery(q): ApiQuery<MenuQuery>,
) -> ApiResult<Response> {
    if let Some(id) = q.id {
        let mut item = kiosk_db::get_menu_item(&st.pool, id).await?;
        if q.with_options {
            attach_options(&st, &mut item).await?;
        }
        return Ok(Json(item).into_response());
    }

    let mut items = kiosk_db::list_menu_items(&st.pool, q.category_id).await?;
    if q.with_options {
        for item in items.iter_mut() {
            attach_options(&st, item).await?;
        }
    }
    Ok(Json(items).into_response())
}

async fn attach_options(st: &AppState, item: &mut MenuItem) -> ApiResult<()> {
    item.option_groups = Some(kiosk_db::load_option_groups(&st.pool, item.id).await?);
    Ok(())
}

pub(crate) async fn menu_create(
    State(st): State<Arc<AppState>>,
    _admin: AdminSession,
    ApiJson(body): ApiJson<MenuItemRequest>,
) -> ApiResult<Response> {
    let (Some(category_id), Some(name), Some(price)) = (body.category_id, body.name, body.price)
    else {
        return Err(ApiError::bad_request(
            "category_id, name and price are required",
        ));
    };
    let item = kiosk_db::create_menu_item(
        &st.pool,
        &NewMenuItem {
            category_id,
            name,
            price,
            description: body.description,
            image_url: body.image_url,
            is_available: body.is_available.unwrap_or(true),
        },
    )
    .await?;
    info!(menu_item_id = item.id, name = %item.name, price = item.price, "menu/create");
    Ok(Json(item).into_response())
}

pub(crate) async fn menu_update(
    State(st): State<Arc<AppState>>,
    _admin: AdminSession,
    ApiJson(body): ApiJson<MenuItemRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = body.id.ok_or_else(|| ApiError::bad_request("id is required"))?;
    kiosk_db::update_menu_item(
        &st.pool,
        id,
        &MenuItemPatch {
            category_id: body.category_id,
            name: body.name,
            price: body.price,
            description: body.description,
            image_url: body.image_url,
            is_available: body.is_available,
        },
    )
    .await?;
    info!(menu_item_id = id, "menu/update");
    Ok(Json(SuccessResponse::OK))
}

pub(crate) async fn menu_delete(
    State(st): State<Arc<AppState>>,
    _admin: AdminSession,
    ApiQuery(q): ApiQuery<IdQuery>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = q.id.ok_or_else(|| ApiError::bad_request("id is required"))?;
    kiosk_db::delete_menu_item(&st.pool, id).await?;
    info!(menu_item_id = id, "menu/delete");
    Ok(Json(SuccessResponse::OK))
}

// ---------------------------------------------------------------------------
// /api/options
// ---------------------------------------------------------------------------

pub(crate) async fn options_list(
    State(st): State<Arc<AppState>>,
    ApiQuery(q): ApiQuery<OptionsQuery>,
) -> ApiResult<Response> {
    let menu_item_id = q
        .menu_item_id
        .ok_or_else(|| ApiError::bad_request("menu_item_id is required"))?;
    let groups = kiosk_db::load_option_groups(&st.pool, menu_item_id).await?;
    Ok(Json(groups).into_response())
}

pub(crate) async fn option_create(
    State(st): State<Arc<AppState>>,
    _admin: AdminSession,
    ApiJson(body): ApiJson<OptionCreateRequest>,
) -> ApiResult<Response> {
    match body {
        OptionCreateRequest::Group {
            menu_item_id,
            name,
            is_required,
            max_select,
        } => {
            let (Some(menu_item_id), Some(name)) = (menu_item_id, name) else {
                return Err(ApiError::bad_request("menu_item_id and name are required"));
            };
            let group = kiosk_db::create_option_group(
                &st.pool,
                &NewOptionGroup {
                    menu_item_id,
                    name,
                    is_required,
                    max_select,
                },
            )
            .await?;
            info!(option_group_id = group.id, menu_item_id, "options/create_group");
            Ok(Json(group).into_response())
        }
        OptionCreateRequest::Choice {
            option_group_id,
            name,
            price_modifier,
            is_default,
        } => {
            let (Some(option_group_id), Some(name)) = (option_group_id, name) else {
                return Err(ApiError::bad_request(
                    "option_group_id and name are required",
                ));
            };
            let choice = kiosk_db::create_option_choice(
                &st.pool,
                &NewOptionChoice {
                    option_group_id,
                    name,
                    price_modifier,
                    is_default,
                },
            )
            .await?;
            info!(option_choice_id = choice.id, option_group_id, "options/create_choice");
            Ok(Json(choice).into_response())
        }
    }
}

pub(crate) async fn option_delete(
    State(st): State<Arc<AppState>>,
    _admin: AdminSession,
    ApiQuery(q): ApiQuery<OptionDeleteQuery>,
) -> ApiResult<Json<SuccessResponse>> {
    let (Some(kind), Some(id)) = (q.kind, q.id) else {
        return Err(ApiError::bad_request("type and id are required"));
    };
    match kind.as_str() {
        "group" => kiosk_db::delete_option_group(&st.pool, id).await?,
        "choice" => kiosk_db::delete_option_choice(&st.pool, id).await?,
        other => {
            return Err(ApiError::bad_request(format!(
                "unknown option type '{other}'"
            )))
        }
    }
    info!(kind = %kind, id, "options/delete");
    Ok(Json(SuccessResponse::OK))
}

// ---------------------------------------------------------------------------
// /api/users
// ---------------------------------------------------------------------------

const MIN_USERNAME_CHARS: usize = 2;
const MIN_PASSWORD_CHARS: usize = 4;

pub(crate) async fn users_list(
    State(st): State<Arc<AppState>>,
    _admin: AdminSession,
) -> ApiResult<Response> {
    let users = kiosk_db::list_client_accounts(&st.pool).await?;
    Ok(Json(users).into_response())
}

pub(crate) async fn user_create(
    State(st): State<Arc<AppState>>,
    _admin: AdminSession,
    ApiJson(body): ApiJson<UserCreateRequest>,
) -> ApiResult<Json<UserCreatedResponse>> {
    let username = body.username.trim().to_string();
    if username.is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("username and password are required"));
    }
    if username.chars().count() < MIN_USERNAME_CHARS {
        return Err(ApiError::bad_request(format!(
            "username needs at least {MIN_USERNAME_CHARS} characters"
        )));
    }
    if body.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::bad_request(format!(
            "password needs at least {MIN_PASSWORD_CHARS} characters"
        )));
    }

    let account = kiosk_db::create_account(
        &st.pool,
        &NewAccount {
            username,
            password: body.password,
            is_admin: false,
            permissions: Permissions {
                can_access_cooking: body.can_access_cooking.unwrap_or(true),
                can_access_order: body.can_access_order.unwrap_or(true),
            },
        },
    )
    .await?;
    info!(account_id = account.id, username = %account.username, "users/create");

    Ok(Json(UserCreatedResponse {
        success: true,
        id: account.id,
    }))
}

pub(crate) async fn user_update(
    State(st): State<Arc<AppState>>,
    _admin: AdminSession,
    ApiJson(body): ApiJson<UserUpdateRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = body.id.ok_or_else(|| ApiError::bad_request("id is required"))?;
    let permissions = Permissions {
        can_access_cooking: body.can_access_cooking.unwrap_or(true),
        can_access_order: body.can_access_order.unwrap_or(true),
    };
    kiosk_db::update_client_permissions(&st.pool, id, permissions).await?;
    info!(
        account_id = id,
        cooking = permissions.can_access_cooking,
        order = permissions.can_access_order,
        "users/update"
    );
    Ok(Json(SuccessResponse::OK))
}

pub(crate) async fn user_delete(
    State(st): State<Arc<AppState>>,
    _admin: AdminSession,
    ApiQuery(q): ApiQuery<IdQuery>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = q.id.ok_or_else(|| ApiError::bad_request("id is required"))?;
    kiosk_db::delete_client_account(&st.pool, id).await?;
    info!(account_id = id, "users/delete");
    Ok(Json(SuccessResponse::OK))
}

// ---------------------------------------------------------------------------
// GET /api/stats
// ---------------------------------------------------------------------------

pub(crate) async fn stats(
    State(st): State<Arc<AppState>>,
    _admin: AdminSession,
) -> ApiResult<Response> {
    let report = kiosk_db::daily_stats(&st.pool, st.business_date(Utc::now())).await?;
    Ok(Json(report).into_response())
}

// ---------------------------------------------------------------------------
// /api/auth
// ---------------------------------------------------------------------------

fn set_cookie_headers(cookie: String) -> ApiResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::Internal(format!("unencodable cookie: {e}")))?;
    headers.insert(SET_COOKIE, value);
    Ok(headers)
}

fn require_credentials(body: &LoginRequest) -> ApiResult<()> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("username and password are required"));
    }
    Ok(())
}

/// Admin accounts only; issues the `admin_token` cookie.
pub(crate) async fn auth_login(
    State(st): State<Arc<AppState>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<Response> {
    require_credentials(&body)?;
    let account = kiosk_db::verify_credentials(&st.pool, body.username.trim(), &body.password)
        .await?
        .filter(|a| a.is_admin)
        .ok_or_else(|| {
            warn!(username = %body.username, "auth/login refused");
            ApiError::Unauthorized("invalid username or password".into())
        })?;

    let token = st.signer.issue(TokenKind::Admin, account.id, &account.username);
    let cookie = session_cookie(
        ADMIN_COOKIE,
        &token,
        st.signer.ttl(TokenKind::Admin).num_seconds(),
        st.config.auth.secure_cookies,
    );
    info!(username = %account.username, "auth/login");

    let body = LoginResponse {
        success: true,
        user: SessionUser {
            id: account.id,
            username: account.username,
        },
    };
    Ok((set_cookie_headers(cookie)?, Json(body)).into_response())
}

pub(crate) async fn auth_logout(State(st): State<Arc<AppState>>) -> ApiResult<Response> {
    let cookie = clear_cookie(ADMIN_COOKIE, st.config.auth.secure_cookies);
    Ok((set_cookie_headers(cookie)?, Json(SuccessResponse::OK)).into_response())
}

pub(crate) async fn auth_verify_admin(session: Result<AdminSession, ApiError>) -> Response {
    match session {
        Ok(AdminSession { claims }) => Json(VerifyResponse {
            authenticated: true,
            user: Some(SessionUser {
                id: claims.sub,
                username: claims.username,
            }),
            permissions: Some(Permissions::ALL),
            error: None,
        })
        .into_response(),
        Err(e) => unauthenticated(e),
    }
}

/// Any account; issues the `user_token` cookie used by staff screens.
pub(crate) async fn auth_jwt_login(
    State(st): State<Arc<AppState>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<Response> {
    require_credentials(&body)?;
    let account = kiosk_db::verify_credentials(&st.pool, body.username.trim(), &body.password)
        .await?
        .ok_or_else(|| {
            warn!(username = %body.username, "auth/jwt-login refused");
            ApiError::Unauthorized("invalid username or password".into())
        })?;

    let token = st.signer.issue(TokenKind::Client, account.id, &account.username);
    let cookie = session_cookie(
        CLIENT_COOKIE,
        &token,
        st.signer.ttl(TokenKind::Client).num_seconds(),
        st.config.auth.secure_cookies,
    );
    info!(username = %account.username, "auth/jwt-login");

    let body = LoginResponse {
        success: true,
        user: SessionUser {
            id: account.id,
            username: account.username,
        },
    };
    Ok((set_cookie_headers(cookie)?, Json(body)).into_response())
}

pub(crate) async fn auth_jwt_logout(State(st): State<Arc<AppState>>) -> ApiResult<Response> {
    let cookie = clear_cookie(CLIENT_COOKIE, st.config.auth.secure_cookies);
    Ok((set_cookie_headers(cookie)?, Json(SuccessResponse::OK)).into_response())
}

pub(crate) async fn auth_verify_jwt(session: Result<ClientSession, ApiError>) -> Response {
    match session {
        Ok(ClientSession {
            claims,
            permissions,
        }) => Json(VerifyResponse {
            authenticated: true,
            user: Some(SessionUser {
                id: claims.sub,
                username: claims.username,
            }),
            permissions: Some(permissions),
            error: None,
        })
        .into_response(),
        Err(e) => unauthenticated(e),
    }
}

/// 401 with `{"authenticated": false, "error": ...}`; other failures keep
/// their own status.
fn unauthenticated(err: ApiError) -> Response {
    match err {
        ApiError::Unauthorized(msg) => (
            StatusCode::UNAUTHORIZED,
            Json(VerifyResponse {
                authenticated: false,
                user: None,
                permissions: None,
                error: Some(msg),
            }),
        )
            .into_response(),
        other => other.into_response(),
    }
}

// ---------------------------------------------------------------------------
// GET /api/sse/cart, GET /api/sse/orders
// ---------------------------------------------------------------------------

fn stream_timing(st: &AppState) -> StreamTiming {
    StreamTiming {
        heartbeat: Duration::from_secs(st.config.stream.heartbeat_secs),
        retry: Duration::from_millis(st.config.stream.retry_ms),
    }
}

fn sse_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));
    headers
}

pub(crate) async fn sse_cart(State(st): State<Arc<AppState>>) -> Response {
    let timing = stream_timing(&st);
    let events = stream::cart_events(&st.live, timing, st.shutdown_watch());
    info!(subscribers = st.live.cart_subscribers(), "sse/cart open");
    (sse_headers(), Sse::new(stream::into_sse(events, timing.retry))).into_response()
}

pub(crate) async fn sse_orders(State(st): State<Arc<AppState>>) -> ApiResult<Response> {
    let timing = stream_timing(&st);
    let events =
        stream::order_events(&st.live, &st.pool, timing, st.shutdown_watch()).await?;
    info!(subscribers = st.live.order_subscribers(), "sse/orders open");
    Ok((sse_headers(), Sse::new(stream::into_sse(events, timing.retry))).into_response())
}
