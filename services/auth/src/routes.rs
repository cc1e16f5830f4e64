//! Authentication service routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use common::session::SessionConfig;
use serde_json::json;

use crate::{
    AppState,
    accounts::Credentials,
    error::{ApiError, ApiResult},
};

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/guest-login", post(guest_login))
        .route("/logout", post(logout))
        .route("/me", get(current_user))
        .with_state(state)
}

fn session_cookie(config: &SessionConfig, token: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .build()
}

fn session_token(jar: &CookieJar, config: &SessionConfig) -> Option<String> {
    jar.get(&config.cookie_name)
        .map(|cookie| cookie.value().to_string())
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// User registration endpoint
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> ApiResult<impl IntoResponse> {
    let user = state.accounts.signup(&payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<Credentials>,
) -> ApiResult<impl IntoResponse> {
    let token = state
        .accounts
        .login(&payload)
        .await
        .map_err(ApiError::login)?;
    let jar = jar.add(session_cookie(&state.session_config, token));

    Ok((jar, Json(json!({"message": "Logged in successfully"}))))
}

/// Guest login endpoint
pub async fn guest_login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    let token = state.accounts.guest_login().await?;
    let jar = jar.add(session_cookie(&state.session_config, token));

    Ok((jar, Json(json!({"message": "Logged in as guest"}))))
}

/// Logout endpoint
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> ApiResult<impl IntoResponse> {
    let token = session_token(&jar, &state.session_config);
    state.accounts.logout(token.as_deref()).await?;

    let removal = Cookie::build((state.session_config.cookie_name.clone(), "")).path("/");
    Ok((jar.remove(removal), Json(json!({"message": "Logged out"}))))
}

/// Current user endpoint
pub async fn current_user(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    let token = session_token(&jar, &state.session_config);
    let user = state.accounts.current_user(token.as_deref()).await?;
    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountService;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, header},
    };
    use common::testing::{MemorySessionStore, MemoryUserStore};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let state = AppState {
            accounts: AccountService::new(
                Arc::new(MemoryUserStore::default()),
                Arc::new(MemorySessionStore::default()),
            ),
            session_config: SessionConfig::default(),
        };
        create_router(state)
    }

    fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn session_cookie_header(response: &axum::response::Response) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn signup_login_me_logout_flow() {
        let app = app();

        let response = app
            .clone()
            .oneshot(json_post(
                "/signup",
                json!({"username": " Bob ", "password": "pw"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["username"], "bob");
        assert!(body.get("password_hash").is_none());

        let response = app
            .clone()
            .oneshot(json_post(
                "/login",
                json!({"username": "BOB", "password": "pw"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie_header(&response);
        assert!(cookie.starts_with("filoti_session="));

        let response = app
            .clone()
            .oneshot(
                Request::get("/me")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["username"], "bob");
        assert_eq!(body["is_admin"], false);

        let response = app
            .clone()
            .oneshot(
                Request::post("/logout")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::get("/me")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn failed_login_uses_one_message() {
        let app = app();
        app.clone()
            .oneshot(json_post(
                "/signup",
                json!({"username": "carol", "password": "pw"}),
            ))
            .await
            .unwrap();

        let wrong = app
            .clone()
            .oneshot(json_post(
                "/login",
                json!({"username": "carol", "password": "nope"}),
            ))
            .await
            .unwrap();
        let missing = app
            .oneshot(json_post(
                "/login",
                json!({"username": "nobody", "password": "pw"}),
            ))
            .await
            .unwrap();

        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        let wrong = body_json(wrong).await;
        assert_eq!(wrong, body_json(missing).await);
        assert_eq!(wrong["error"], "Invalid username or password");
    }

    #[tokio::test]
    async fn duplicate_signup_is_a_conflict() {
        let app = app();
        let body = json!({"username": "dave", "password": "pw"});

        let first = app.clone().oneshot(json_post("/signup", body.clone())).await.unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app.oneshot(json_post("/signup", body)).await.unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn guest_login_sets_a_session_cookie() {
        let app = app();

        let response = app
            .clone()
            .oneshot(Request::post("/guest-login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie_header(&response);

        let response = app
            .oneshot(
                Request::get("/me")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(body_json(response).await["username"], "guest");
    }

    #[tokio::test]
    async fn blank_login_is_a_bad_request() {
        let response = app()
            .oneshot(json_post("/login", json!({"username": " ", "password": "pw"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn me_without_cookie_is_unauthorized() {
        let response = app()
            .oneshot(Request::get("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
