use anyhow::Result;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post, put},
};
use greenlight::{
    admin, ai::EngineClient, analysis, app_state::AppState, auth, config::Config, favorites,
    health, inquiries, listings, middleware::{RateLimit, rate_limit_middleware}, users,
};
use std::net::SocketAddr;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(config.database_url())
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let engine = EngineClient::from_config(&config)?;
    let state = AppState::new(pool, engine);

    // The AI endpoints fan out to the analysis queue and the generation
    // engine; keep them behind a per-IP budget.
    let ai_rate_limit = RateLimit::new(30, 60);
    let ai_routes = Router::new()
        .route(
            "/api/ai/listings/{id}/analyze",
            post(analysis::handlers::trigger_analysis),
        )
        .route(
            "/api/ai/listings/{id}/analysis",
            get(analysis::handlers::get_analysis),
        )
        .route(
            "/api/ai/listings/{id}/one-pager",
            post(analysis::handlers::request_one_pager),
        )
        .route(
            "/api/ai/listings/{id}/one-pager",
            get(analysis::handlers::get_one_pager),
        )
        .route_layer(from_fn_with_state(ai_rate_limit, rate_limit_middleware));

    let app = Router::new()
        .route("/healthz", get(health::health_check))
        .route("/api/auth/signup", post(auth::handlers::signup))
        .route("/api/auth/login", post(auth::handlers::login))
        .route("/api/auth/me", get(auth::handlers::me))
        // The profile surface: /users/me mirrors /auth/me for reads.
        .route("/api/users/me", get(auth::handlers::me))
        .route("/api/users/me", put(users::handlers::update_my_profile))
        .route("/api/users/{id}", get(users::handlers::public_profile))
        .route("/api/listings", post(listings::handlers::create_listing))
        .route("/api/listings", get(listings::handlers::list_listings))
        .route(
            "/api/listings/featured",
            get(listings::handlers::featured_listings),
        )
        .route("/api/listings/mine", get(listings::handlers::my_listings))
        .route(
            "/api/listings/by-slug/{slug}",
            get(listings::handlers::get_listing_by_slug),
        )
        .route("/api/listings/{id}", get(listings::handlers::get_listing))
        .route(
            "/api/listings/{id}",
            patch(listings::handlers::update_listing),
        )
        .route(
            "/api/listings/{id}",
            delete(listings::handlers::delete_listing),
        )
        .route(
            "/api/listings/{id}/submit",
            post(listings::handlers::submit_listing),
        )
        .merge(ai_routes)
        .route("/api/favorites", get(favorites::handlers::list_favorites))
        .route("/api/favorites/ids", get(favorites::handlers::favorite_ids))
        .route(
            "/api/favorites/{listing_id}",
            put(favorites::handlers::save_favorite),
        )
        .route(
            "/api/favorites/{listing_id}",
            delete(favorites::handlers::remove_favorite),
        )
        .route("/api/inquiries", post(inquiries::handlers::create_inquiry))
        .route(
            "/api/inquiries/sent",
            get(inquiries::handlers::sent_inquiries),
        )
        .route(
            "/api/inquiries/received",
            get(inquiries::handlers::received_inquiries),
        )
        .route(
            "/api/admin/listings/pending",
            get(admin::handlers::pending_listings),
        )
        .route(
            "/api/admin/listings/{id}/approve",
            post(admin::handlers::approve_listing),
        )
        .route(
            "/api/admin/listings/{id}/reject",
            post(admin::handlers::reject_listing),
        )
        .route(
            "/api/admin/listings/{id}/feature",
            put(admin::handlers::feature_listing),
        )
        .route("/api/admin/users", get(admin::handlers::list_users))
        .route("/api/admin/inquiries", get(admin::handlers::list_inquiries))
        .route("/api/admin/stats", get(admin::handlers::stats))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state);

    info!("listening on {}", config.bind_addr());
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
