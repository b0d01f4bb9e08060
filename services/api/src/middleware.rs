//! Session-cookie authentication middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{error::ApiError, models::TelegramProfile, session::SESSION_COOKIE, state::AppState};

/// Authenticated user context resolved from the session cookie.
///
/// Placed into request extensions by [`auth_middleware`]; handlers pick
/// it up with `Extension<CurrentUser>` and thread `user_id` into every
/// repository call.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Internal user id, the owner key for all task operations
    pub user_id: i32,
    /// External Telegram identity
    pub telegram_id: i64,
    /// Display fields cached at login
    pub profile: TelegramProfile,
}

/// Authentication middleware for the task routes
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(ApiError::Unauthorized)?;

    let session = state
        .sessions
        .resolve(&token)
        .await
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(CurrentUser {
        user_id: session.user_id,
        telegram_id: session.telegram_id,
        profile: session.profile,
    });

    Ok(next.run(req).await)
}
