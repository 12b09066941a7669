use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;

use super::{repo_types::AccessToken, services::validate_token};
use crate::{error::AppError, state::AppState, users::repo_types::User};

/// Authenticated caller: the token's owner plus the token itself.
///
/// The token is read from `Authorization: Bearer <token>` first and from
/// the auth cookie otherwise; both go through the same validation.
pub struct AuthUser {
    pub user: User,
    pub token: AccessToken,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = raw_token(&parts.headers, &state.config.auth.cookie_name)
            .ok_or(AppError::Unauthenticated)?;
        let (user, token) = validate_token(state, &raw).await?;
        Ok(AuthUser { user, token })
    }
}

pub(crate) fn raw_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    bearer_token(headers).or_else(|| {
        CookieJar::from_headers(headers)
            .get(cookie_name)
            .map(|c| c.value().trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use axum::http::{header::COOKIE, HeaderValue};

    use super::*;

    fn headers(pairs: &[(axum::http::HeaderName, &'static str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.insert(k.clone(), HeaderValue::from_static(v));
        }
        h
    }

    #[test]
    fn reads_bearer_header_case_insensitively() {
        let h = headers(&[(AUTHORIZATION, "bearer abc123")]);
        assert_eq!(raw_token(&h, "auth_token").as_deref(), Some("abc123"));
    }

    #[test]
    fn falls_back_to_cookie() {
        let h = headers(&[(COOKIE, "theme=dark; auth_token=fromcookie")]);
        assert_eq!(raw_token(&h, "auth_token").as_deref(), Some("fromcookie"));
    }

    #[test]
    fn header_wins_over_cookie() {
        let h = headers(&[
            (AUTHORIZATION, "Bearer fromheader"),
            (COOKIE, "auth_token=fromcookie"),
        ]);
        assert_eq!(raw_token(&h, "auth_token").as_deref(), Some("fromheader"));
    }

    #[test]
    fn ignores_other_schemes_and_empty_values() {
        assert_eq!(raw_token(&headers(&[(AUTHORIZATION, "Basic dXNlcjpwYXNz")]), "auth_token"), None);
        assert_eq!(raw_token(&headers(&[(AUTHORIZATION, "Bearer ")]), "auth_token"), None);
        assert_eq!(raw_token(&headers(&[(COOKIE, "auth_token=")]), "auth_token"), None);
    }
}
