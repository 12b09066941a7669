use std::{num::NonZeroU32, sync::Arc};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use tracing::warn;

use crate::error::AppError;

/// One bucket shared by every client.
pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const DEFAULT_PER_MINUTE: NonZeroU32 = match NonZeroU32::new(20) {
    Some(n) => n,
    None => unreachable!(),
};

/// A zero quota falls back to the default instead of blocking everything.
pub fn create_rate_limiter(per_minute: u32) -> Arc<GlobalRateLimiter> {
    let per_minute = NonZeroU32::new(per_minute).unwrap_or(DEFAULT_PER_MINUTE);
    Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)))
}

pub async fn rate_limit(
    State(limiter): State<Arc<GlobalRateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if limiter.check().is_err() {
        warn!(method = %req.method(), path = %req.uri().path(), "rate limit exceeded");
        return Err(AppError::RateLimited);
    }
    Ok(next.run(req).await)
}
