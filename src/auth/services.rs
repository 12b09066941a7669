use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        password::{hash_password, verify_password},
        repo_types::{AccessToken, NewAccessToken},
        token::{generate_token, hash_token},
    },
    error::AppError,
    state::AppState,
    users::repo_types::{NewUser, User},
    validation::{escape_markup, normalize_email, FieldErrors, Rule, Validator},
};

/// Name recorded on every token minted by `login`.
pub const TOKEN_NAME: &str = "auth_token";

/// Result of a successful login. `token` is the only copy of the secret.
#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
    pub expires_at: OffsetDateTime,
}

pub async fn register(st: &AppState, req: RegisterRequest) -> Result<User, AppError> {
    let email = req.email.as_deref().map(normalize_email);
    let username = req.username.as_deref().map(str::trim);

    let mut v = Validator::new();
    v.check("name", req.name.as_deref(), &[Rule::Required, Rule::MaxLen(255)])
        .check("surname", req.surname.as_deref(), &[Rule::Required, Rule::MaxLen(255)])
        .check(
            "username",
            username,
            &[Rule::Required, Rule::MaxLen(255), Rule::Username],
        )
        .check(
            "email",
            email.as_deref(),
            &[Rule::Required, Rule::MaxLen(255), Rule::Email],
        )
        .check("password", req.password.as_deref(), &[Rule::Required, Rule::MinLen(6)]);
    if !v.has_error("password") && req.password != req.password_confirmation {
        v.add("password", "The password field confirmation does not match.");
    }
    let errors = v.into_errors();

    let mut taken = FieldErrors::default();
    if let (Some(username), false) = (username, errors.contains("username")) {
        if st.users.find_by_username(username).await?.is_some() {
            taken.push("username", "The username has already been taken.");
        }
    }
    if let (Some(email), false) = (email.as_deref(), errors.contains("email")) {
        if st.users.find_by_email(email).await?.is_some() {
            taken.push("email", "The email has already been taken.");
        }
    }

    if !errors.is_empty() {
        warn!(fields = ?errors, "registration rejected");
        return Err(AppError::Validation(errors));
    }
    if !taken.is_empty() {
        warn!(fields = ?taken, "registration conflicts with an existing user");
        return Err(AppError::Conflict(taken));
    }

    // All required fields are present past this point.
    let (Some(name), Some(surname), Some(username), Some(email), Some(password)) =
        (req.name, req.surname, username, email, req.password)
    else {
        return Err(AppError::Validation(FieldErrors::single(
            "body",
            "The given data was invalid.",
        )));
    };

    let password_hash = hash_password(&password)?;
    let user = st
        .users
        .create(NewUser {
            name: escape_markup(name.trim()),
            surname: escape_markup(surname.trim()),
            username: username.to_string(),
            email,
            password_hash,
        })
        .await?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

pub async fn login(st: &AppState, req: LoginRequest) -> Result<LoginOutcome, AppError> {
    let email = req.email.as_deref().map(normalize_email);

    let mut v = Validator::new();
    v.check("email", email.as_deref(), &[Rule::Required, Rule::Email])
        .check("password", req.password.as_deref(), &[Rule::Required]);
    v.finish()?;

    let (Some(email), Some(password)) = (email, req.password) else {
        return Err(AppError::InvalidCredentials);
    };

    let Some(user) = st.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&password, &user.password_hash) {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let now = st.clock.now();
    let expires_at = now + Duration::days(st.config.auth.token_ttl_days);
    let token = generate_token();
    let record = st
        .tokens
        .create(NewAccessToken {
            user_id: user.id,
            name: TOKEN_NAME.into(),
            token_hash: hash_token(&token),
            expires_at: Some(expires_at),
        })
        .await?;

    info!(user_id = user.id, token_id = record.id, "user logged in");
    Ok(LoginOutcome {
        token,
        user,
        expires_at,
    })
}

/// Resolve a raw token, however it arrived, to its owner.
///
/// Unknown, expired and orphaned tokens all fail closed with
/// `AppError::Unauthenticated`. Expiry is checked here on every lookup;
/// nothing sweeps expired rows in the background.
pub async fn validate_token(st: &AppState, raw: &str) -> Result<(User, AccessToken), AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::Unauthenticated);
    }

    let Some(mut token) = st.tokens.find_by_hash(&hash_token(raw)).await? else {
        warn!("token not found or invalid");
        return Err(AppError::Unauthenticated);
    };

    let now = st.clock.now();
    if token.is_expired(now) {
        info!(token_id = token.id, "token is expired");
        return Err(AppError::Unauthenticated);
    }

    let Some(user) = st.users.find_by_id(token.user_id).await? else {
        warn!(token_id = token.id, "token owner no longer exists");
        return Err(AppError::Unauthenticated);
    };

    st.tokens.touch(token.id, now).await?;
    token.last_used_at = Some(now);
    debug!(user_id = user.id, token_id = token.id, "token validated");
    Ok((user, token))
}

/// Invalidate the caller's token. A token that is already gone is only
/// logged; the caller still sees a successful logout.
pub async fn logout(st: &AppState, token_id: i64) -> Result<(), AppError> {
    if st.tokens.delete(token_id).await? {
        info!(token_id, "token invalidated");
    } else {
        warn!(token_id, "logout found no token to invalidate");
    }
    Ok(())
}
