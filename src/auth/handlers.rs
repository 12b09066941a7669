use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            LoginRequest, LoginResponse, MessageResponse, RegisterRequest, RegisterResponse,
            SessionResponse,
        },
        extractors::AuthUser,
        services,
    },
    config::AuthConfig,
    error::AppError,
    json::ApiJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/getUser", get(get_user))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let user = services::register(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
            user,
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let outcome = services::login(&state, payload).await?;
    let cookie = auth_cookie(&state.config.auth, outcome.token.clone());
    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: "Login successful",
            token: outcome.token,
            user: outcome.user,
        }),
    ))
}

#[instrument(skip_all, fields(user_id = auth.user.id))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    auth: AuthUser,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    services::logout(&state, auth.token.id).await?;
    let mut removal = Cookie::build((state.config.auth.cookie_name.clone(), ""))
        .path("/")
        .build();
    // Sent even when the token came from the header and the jar is empty.
    removal.make_removal();
    Ok((
        jar.add(removal),
        Json(MessageResponse {
            message: "Logout successful",
        }),
    ))
}

#[instrument(skip_all, fields(user_id = auth.user.id))]
pub async fn get_user(auth: AuthUser) -> Json<SessionResponse> {
    Json(SessionResponse { user: auth.user })
}

/// Http-only, cross-site cookie carrying the token for as long as it lives.
fn auth_cookie(cfg: &AuthConfig, token: String) -> Cookie<'static> {
    Cookie::build((cfg.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(cfg.cookie_secure)
        .same_site(SameSite::None)
        .max_age(Duration::days(cfg.token_ttl_days))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn auth_cookie_attributes() {
        let cfg = AppConfig::in_memory().auth;
        let cookie = auth_cookie(&cfg, "secret".into());
        assert_eq!(cookie.name(), "auth_token");
        assert_eq!(cookie.value(), "secret");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::days(7)));
    }

    #[test]
    fn response_bodies_never_carry_the_password_hash() {
        let user = crate::users::repo_types::User {
            id: 1,
            name: "John".into(),
            surname: "Doe".into(),
            username: "johndoe".into(),
            email: "johndoe@example.com".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            created_at: time::OffsetDateTime::UNIX_EPOCH,
            updated_at: time::OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&LoginResponse {
            message: "Login successful",
            token: "tok".into(),
            user,
        })
        .unwrap();
        assert!(json.contains("johndoe@example.com"));
        assert!(!json.contains("argon2"));
    }
}
