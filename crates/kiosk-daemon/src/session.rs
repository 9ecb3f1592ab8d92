//! Session extractors.
//!
//! - [`AdminSession`]: valid `admin_token` cookie.
//! - [`ClientSession`]: valid `user_token` cookie; permissions read from the
//!   accounts table on every request so revocations apply immediately.
//! - [`OrderStaff`] / [`CookingStaff`]: either session, plus the matching
//!   screen permission. Admin sessions pass every permission check.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts},
};
use kiosk_auth::{read_cookie, Claims, TokenKind, ADMIN_COOKIE, CLIENT_COOKIE};
use kiosk_db::StoreError;
use kiosk_schemas::{Permissions, Screen};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Clone)]
pub struct AdminSession {
    pub claims: Claims,
}

#[derive(Debug, Clone)]
pub struct ClientSession {
    pub claims: Claims,
    pub permissions: Permissions,
}

/// Either session kind, resolved to one permission set.
#[derive(Debug, Clone)]
pub struct StaffSession {
    pub account_id: i64,
    pub username: String,
    pub is_admin: bool,
    pub permissions: Permissions,
}

#[derive(Debug, Clone)]
pub struct OrderStaff(pub StaffSession);

#[derive(Debug, Clone)]
pub struct CookingStaff(pub StaffSession);

fn cookie_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|h| read_cookie(h, name).map(str::to_string))
}

fn admin_claims(parts: &Parts, st: &AppState) -> Result<Claims, ApiError> {
    let token = cookie_value(parts, ADMIN_COOKIE)
        .ok_or_else(|| ApiError::Unauthorized("admin login required".into()))?;
    st.signer
        .verify(&token, TokenKind::Admin)
        .map_err(|e| ApiError::Unauthorized(format!("admin session rejected: {e}")))
}

async fn client_session(parts: &Parts, st: &AppState) -> Result<ClientSession, ApiError> {
    let token = cookie_value(parts, CLIENT_COOKIE)
        .ok_or_else(|| ApiError::Unauthorized("login required".into()))?;
    let claims = st
        .signer
        .verify(&token, TokenKind::Client)
        .map_err(|e| ApiError::Unauthorized(format!("session rejected: {e}")))?;

    let permissions = match kiosk_db::permissions_for(&st.pool, claims.sub).await {
        Ok(p) => p,
        Err(StoreError::NotFound(_)) => {
            return Err(ApiError::Unauthorized("account no longer exists".into()))
        }
        Err(e) => return Err(e.into()),
    };
    Ok(ClientSession {
        claims,
        permissions,
    })
}

async fn staff_session(parts: &Parts, st: &AppState) -> Result<StaffSession, ApiError> {
    if let Ok(claims) = admin_claims(parts, st) {
        return Ok(StaffSession {
            account_id: claims.sub,
            username: claims.username,
            is_admin: true,
            permissions: Permissions::ALL,
        });
    }
    let client = client_session(parts, st).await?;
    Ok(StaffSession {
        account_id: client.claims.sub,
        username: client.claims.username,
        is_admin: false,
        permissions: client.permissions,
    })
}

async fn staff_for(parts: &Parts, st: &AppState, screen: Screen) -> Result<StaffSession, ApiError> {
    let staff = staff_session(parts, st).await?;
    if !staff.permissions.allows(screen) {
        return Err(ApiError::Forbidden(format!(
            "account '{}' has no access to the {screen} screen",
            staff.username
        )));
    }
    Ok(staff)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, st: &Arc<AppState>) -> Result<Self, ApiError> {
        admin_claims(parts, st).map(|claims| AdminSession { claims })
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for ClientSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, st: &Arc<AppState>) -> Result<Self, ApiError> {
        client_session(parts, st).await
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for OrderStaff {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, st: &Arc<AppState>) -> Result<Self, ApiError> {
        staff_for(parts, st, Screen::Order).await.map(OrderStaff)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CookingStaff {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, st: &Arc<AppState>) -> Result<Self, ApiError> {
        staff_for(parts, st, Screen::Cooking).await.map(CookingStaff)
    }
}
