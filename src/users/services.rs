use tracing::{info, warn};

use crate::{
    auth::hash_password,
    error::AppError,
    state::AppState,
    users::{
        dto::UpdateUserRequest,
        repo_types::{User, UserChanges},
    },
    validation::{escape_markup, normalize_email, FieldErrors, Rule, Validator},
};

pub async fn list(st: &AppState) -> Result<Vec<User>, AppError> {
    Ok(st.users.list().await?)
}

pub async fn get(st: &AppState, id: i64) -> Result<User, AppError> {
    st.users.find_by_id(id).await?.ok_or(AppError::NotFound("User"))
}

/// Validate and persist only the supplied fields. Username and email stay
/// unique across users, ignoring the user being updated.
pub async fn update(st: &AppState, id: i64, req: UpdateUserRequest) -> Result<User, AppError> {
    if st.users.find_by_id(id).await?.is_none() {
        return Err(AppError::NotFound("User"));
    }

    let email = req.email.as_deref().map(normalize_email);
    let username = req.username.as_deref().map(str::trim);

    let mut v = Validator::new();
    v.check("name", req.name.as_deref(), &[Rule::Filled, Rule::MaxLen(255)])
        .check("surname", req.surname.as_deref(), &[Rule::Filled, Rule::MaxLen(255)])
        .check(
            "username",
            username,
            &[Rule::Filled, Rule::MaxLen(255), Rule::Username],
        )
        .check(
            "email",
            email.as_deref(),
            &[Rule::Filled, Rule::MaxLen(255), Rule::Email],
        )
        .check("password", req.password.as_deref(), &[Rule::Filled, Rule::MinLen(6)]);
    v.finish()?;

    let mut taken = FieldErrors::default();
    if let Some(username) = username {
        if matches!(st.users.find_by_username(username).await?, Some(u) if u.id != id) {
            taken.push("username", "The username has already been taken.");
        }
    }
    if let Some(email) = email.as_deref() {
        if matches!(st.users.find_by_email(email).await?, Some(u) if u.id != id) {
            taken.push("email", "The email has already been taken.");
        }
    }
    if !taken.is_empty() {
        return Err(AppError::Conflict(taken));
    }

    let changes = UserChanges {
        name: req.name.as_deref().map(|s| escape_markup(s.trim())),
        surname: req.surname.as_deref().map(|s| escape_markup(s.trim())),
        username: username.map(str::to_string),
        email,
        password_hash: req.password.as_deref().map(hash_password).transpose()?,
    };
    if changes.is_empty() {
        return get(st, id).await;
    }

    let user = st
        .users
        .update(id, changes)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    info!(user_id = user.id, "user updated");
    Ok(user)
}

/// Remove the user; their jobs and tokens go with them.
pub async fn delete(st: &AppState, id: i64) -> Result<bool, AppError> {
    let removed = st.users.delete(id).await?;
    if removed {
        info!(user_id = id, "user deleted with their jobs and tokens");
    } else {
        warn!(user_id = id, "delete of missing user");
    }
    Ok(removed)
}
