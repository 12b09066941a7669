use std::net::SocketAddr;

use axum::{
    http::{header, request::Parts, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    auth,
    config::AppConfig,
    jobs,
    rate_limit::{create_rate_limiter, rate_limit},
    state::AppState,
    users,
};

pub fn build_app(state: AppState) -> anyhow::Result<Router> {
    let cors = cors_layer(&state.config)?;
    let limiter = create_rate_limiter(state.config.rate_limit_per_minute);

    Ok(Router::new()
        .merge(auth::router())
        .merge(jobs::router())
        .merge(users::router())
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(middleware::from_fn_with_state(limiter, rate_limit))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        ))
}

/// Only the configured front end may call with credentials. Other origins
/// get no `Access-Control-Allow-Origin` header at all.
fn cors_layer(config: &AppConfig) -> anyhow::Result<CorsLayer> {
    let origin: HeaderValue = config
        .frontend_origin
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid FRONTEND_ORIGIN {:?}: {e}", config.frontend_origin))?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |requested: &HeaderValue, _: &Parts| *requested == origin,
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]))
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
