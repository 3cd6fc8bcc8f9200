use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;
use uuid::Uuid;

use crate::{
    app_state::AppState,
    auth::{dtos::ErrorResponse, middleware::AuthenticatedUser},
    entities::Listing,
};

fn error_json(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Ids of the caller's saved listings, for cheap client-side "saved" badges.
#[utoipa::path(
    get,
    path = "/api/favorites/ids",
    responses((status = 200, description = "Saved listing ids", body = [Uuid])),
    security(("bearer_auth" = [])),
    tag = "favorites"
)]
pub async fn favorite_ids(auth_user: AuthenticatedUser, State(state): State<AppState>) -> Response {
    match state.favorite_repo.ids_for_user(auth_user.user_id).await {
        Ok(ids) => (StatusCode::OK, Json(ids)).into_response(),
        Err(e) => {
            error!("failed to list favorite ids: {}", e);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/favorites",
    responses((status = 200, description = "Saved listings", body = [Listing])),
    security(("bearer_auth" = [])),
    tag = "favorites"
)]
pub async fn list_favorites(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Response {
    match state
        .favorite_repo
        .listings_for_user(auth_user.user_id)
        .await
    {
        Ok(listings) => (StatusCode::OK, Json(listings)).into_response(),
        Err(e) => {
            error!("failed to list favorites: {}", e);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

/// Save a listing. Saving one that is already saved changes nothing, and the
/// listing's save counter only moves on the first save.
#[utoipa::path(
    put,
    path = "/api/favorites/{listing_id}",
    params(("listing_id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 204, description = "Listing saved"),
        (status = 404, description = "Listing not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "favorites"
)]
pub async fn save_favorite(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
) -> Response {
    match state.listing_repo.find_by_id(listing_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_json(StatusCode::NOT_FOUND, "Listing not found"),
        Err(e) => {
            error!("failed to load listing {}: {}", listing_id, e);
            return error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    }

    match state.favorite_repo.save(auth_user.user_id, listing_id).await {
        Ok(true) => {
            if let Err(e) = state.listing_repo.adjust_save_count(listing_id, 1).await {
                error!("failed to bump save count for {}: {}", listing_id, e);
            }
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("failed to save favorite: {}", e);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/favorites/{listing_id}",
    params(("listing_id" = Uuid, Path, description = "Listing id")),
    responses((status = 204, description = "Listing unsaved")),
    security(("bearer_auth" = [])),
    tag = "favorites"
)]
pub async fn remove_favorite(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
) -> Response {
    match state
        .favorite_repo
        .unsave(auth_user.user_id, listing_id)
        .await
    {
        Ok(true) => {
            if let Err(e) = state.listing_repo.adjust_save_count(listing_id, -1).await {
                error!("failed to drop save count for {}: {}", listing_id, e);
            }
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("failed to remove favorite: {}", e);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ai::EngineClient,
        auth::jwt::JwtService,
        config::Config,
        entities::{AnalysisStatus, ListingStatus, UserRole},
        jobs::MockJobQueueTrait,
        repositories::{
            MockFavoriteRepositoryTrait, MockInquiryRepositoryTrait, MockListingRepositoryTrait,
            MockMaterialRepositoryTrait, MockUserRepositoryTrait,
        },
    };
    use axum::{
        Router,
        body::Body,
        http::{Request, header::AUTHORIZATION},
        routing::{delete, put},
    };
    use chrono::Utc;
    use sqlx::{Pool, Postgres};
    use std::sync::Arc;
    use tower::ServiceExt;
    use url::Url;

    fn listing_fixture() -> Listing {
        Listing {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            title: "Orbital Decay".to_string(),
            tagline: None,
            description: "A stranded salvage crew races a collapsing orbit.".to_string(),
            slug: "orbital-decay-a1b2c3".to_string(),
            genre: "sci-fi".to_string(),
            format: "feature".to_string(),
            logline: None,
            themes: vec![],
            target_audience: None,
            comparables: vec![],
            rights_holder: None,
            available_rights: vec![],
            script_url: None,
            poster_url: None,
            status: ListingStatus::Published,
            ai_analysis_status: AnalysisStatus::NotStarted,
            ai_score: None,
            ai_strengths: vec![],
            ai_improvements: vec![],
            featured: false,
            view_count: 0,
            save_count: 0,
            inquiry_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn create_test_app(
        favorites: MockFavoriteRepositoryTrait,
        listings: MockListingRepositoryTrait,
    ) -> Router {
        let pool =
            Pool::<Postgres>::connect_lazy("postgresql://dummy").expect("Failed to create pool");
        let engine = EngineClient::from_parts(
            Url::parse("http://localhost:9").unwrap(),
            "test-key",
            "test-model",
        )
        .expect("Failed to build engine client");

        let state = AppState {
            user_repo: Arc::new(MockUserRepositoryTrait::new()),
            listing_repo: Arc::new(listings),
            favorite_repo: Arc::new(favorites),
            inquiry_repo: Arc::new(MockInquiryRepositoryTrait::new()),
            material_repo: Arc::new(MockMaterialRepositoryTrait::new()),
            job_queue: Arc::new(MockJobQueueTrait::new()),
            engine: Arc::new(engine),
            db_pool: pool,
        };

        Router::new()
            .route("/api/favorites/{listing_id}", put(save_favorite))
            .route("/api/favorites/{listing_id}", delete(remove_favorite))
            .with_state(state)
    }

    fn bearer(user_id: Uuid) -> String {
        let config = Config::from_env().expect("Failed to load config");
        let token = JwtService::new(config.jwt_secret())
            .generate_token(user_id, UserRole::Buyer)
            .expect("Failed to generate token");
        format!("Bearer {}", token)
    }

    #[tokio::test]
    async fn first_save_bumps_the_counter() {
        let listing = listing_fixture();
        let listing_id = listing.id;

        let mut favorites = MockFavoriteRepositoryTrait::new();
        favorites.expect_save().times(1).returning(|_, _| Ok(true));
        let mut listings = MockListingRepositoryTrait::new();
        listings
            .expect_find_by_id()
            .returning(move |_| Ok(Some(listing.clone())));
        listings
            .expect_adjust_save_count()
            .withf(move |id, delta| *id == listing_id && *delta == 1)
            .times(1)
            .returning(|_, _| Ok(()));
        let app = create_test_app(favorites, listings);

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/api/favorites/{}", listing_id))
            .header(AUTHORIZATION, bearer(Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn repeated_save_leaves_the_counter_alone() {
        let listing = listing_fixture();
        let listing_id = listing.id;

        let mut favorites = MockFavoriteRepositoryTrait::new();
        favorites.expect_save().times(1).returning(|_, _| Ok(false));
        let mut listings = MockListingRepositoryTrait::new();
        listings
            .expect_find_by_id()
            .returning(move |_| Ok(Some(listing.clone())));
        listings.expect_adjust_save_count().never();
        let app = create_test_app(favorites, listings);

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/api/favorites/{}", listing_id))
            .header(AUTHORIZATION, bearer(Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn saving_a_missing_listing_is_not_found() {
        let mut favorites = MockFavoriteRepositoryTrait::new();
        favorites.expect_save().never();
        let mut listings = MockListingRepositoryTrait::new();
        listings.expect_find_by_id().returning(|_| Ok(None));
        let app = create_test_app(favorites, listings);

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/api/favorites/{}", Uuid::new_v4()))
            .header(AUTHORIZATION, bearer(Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unsave_only_decrements_when_something_was_removed() {
        let listing_id = Uuid::new_v4();

        let mut favorites = MockFavoriteRepositoryTrait::new();
        favorites
            .expect_unsave()
            .times(1)
            .returning(|_, _| Ok(false));
        let mut listings = MockListingRepositoryTrait::new();
        listings.expect_adjust_save_count().never();
        let app = create_test_app(favorites, listings);

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/api/favorites/{}", listing_id))
            .header(AUTHORIZATION, bearer(Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
