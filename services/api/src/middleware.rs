//! Session middleware for protected routes

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use common::identity::UserId;

use crate::{error::ApiError, state::AppState};

/// The authenticated actor of the current request
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

/// Resolve the session cookie and attach the actor to the request.
///
/// Requests without a live session never reach the handler.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let jar = CookieJar::from_headers(req.headers());
    let token = jar
        .get(&state.session_config.cookie_name)
        .map(|cookie| cookie.value().to_string());

    let actor = state.gate.authenticate(token.as_deref()).await?;
    req.extensions_mut().insert(CurrentUser(actor));

    Ok(next.run(req).await)
}
