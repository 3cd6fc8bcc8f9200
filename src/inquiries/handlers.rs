use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::{
    app_state::AppState,
    auth::{dtos::ErrorResponse, middleware::AuthenticatedUser},
    entities::{Inquiry, ListingStatus},
    inquiries::dtos::CreateInquiryRequest,
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

/// Send an inquiry about a published listing. Bumps the listing's inquiry
/// counter.
#[utoipa::path(
    post,
    path = "/api/inquiries",
    request_body = CreateInquiryRequest,
    responses(
        (status = 201, description = "Inquiry sent", body = Inquiry),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "inquiries"
)]
pub async fn create_inquiry(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateInquiryRequest>,
) -> Response {
    if let Err(error) = payload.validate() {
        return error_json(StatusCode::BAD_REQUEST, &error);
    }

    let listing = match state.listing_repo.find_by_id(payload.listing_id).await {
        Ok(Some(listing)) if listing.status == ListingStatus::Published => listing,
        Ok(_) => return error_json(StatusCode::NOT_FOUND, "Listing not found"),
        Err(e) => {
            error!("failed to load listing: {}", e);
            return error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    match state
        .inquiry_repo
        .create(payload.into_new_inquiry(auth_user.user_id))
        .await
    {
        Ok(inquiry) => {
            if let Err(e) = state.listing_repo.bump_inquiry_count(listing.id).await {
                error!("failed to bump inquiry count for {}: {}", listing.id, e);
            }
            (StatusCode::CREATED, Json(inquiry)).into_response()
        }
        Err(e) => {
            error!("failed to create inquiry: {}", e);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/inquiries/sent",
    responses((status = 200, description = "Inquiries the caller sent", body = [Inquiry])),
    security(("bearer_auth" = [])),
    tag = "inquiries"
)]
pub async fn sent_inquiries(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Response {
    match state.inquiry_repo.sent_by(auth_user.user_id).await {
        Ok(inquiries) => (StatusCode::OK, Json(inquiries)).into_response(),
        Err(e) => {
            error!("failed to list sent inquiries: {}", e);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

/// Inquiries against any of the caller's listings.
#[utoipa::path(
    get,
    path = "/api/inquiries/received",
    responses((status = 200, description = "Inquiries received", body = [Inquiry])),
    security(("bearer_auth" = [])),
    tag = "inquiries"
)]
pub async fn received_inquiries(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Response {
    match state.inquiry_repo.received_by(auth_user.user_id).await {
        Ok(inquiries) => (StatusCode::OK, Json(inquiries)).into_response(),
        Err(e) => {
            error!("failed to list received inquiries: {}", e);
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
        entities::{AnalysisStatus, InquiryStatus, Listing, UserRole},
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
        routing::post,
    };
    use chrono::Utc;
    use sqlx::{Pool, Postgres};
    use std::sync::Arc;
    use tower::ServiceExt;
    use url::Url;
    use uuid::Uuid;

    fn listing_fixture(status: ListingStatus) -> Listing {
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
            status,
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
        inquiries: MockInquiryRepositoryTrait,
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
            favorite_repo: Arc::new(MockFavoriteRepositoryTrait::new()),
            inquiry_repo: Arc::new(inquiries),
            material_repo: Arc::new(MockMaterialRepositoryTrait::new()),
            job_queue: Arc::new(MockJobQueueTrait::new()),
            engine: Arc::new(engine),
            db_pool: pool,
        };

        Router::new()
            .route("/api/inquiries", post(create_inquiry))
            .with_state(state)
    }

    fn bearer(user_id: Uuid) -> String {
        let config = Config::from_env().expect("Failed to load config");
        let token = JwtService::new(config.jwt_secret())
            .generate_token(user_id, UserRole::Buyer)
            .expect("Failed to generate token");
        format!("Bearer {}", token)
    }

    fn inquiry_request(listing_id: Uuid) -> serde_json::Value {
        serde_json::json!({
            "listing_id": listing_id,
            "contact_email": "buyer@example.com",
            "message": "Interested in optioning this script for a limited series."
        })
    }

    #[tokio::test]
    async fn inquiry_bumps_the_listing_counter() {
        let listing = listing_fixture(ListingStatus::Published);
        let listing_id = listing.id;
        let buyer_id = Uuid::new_v4();

        let mut listings = MockListingRepositoryTrait::new();
        listings
            .expect_find_by_id()
            .returning(move |_| Ok(Some(listing.clone())));
        listings
            .expect_bump_inquiry_count()
            .withf(move |id| *id == listing_id)
            .times(1)
            .returning(|_| Ok(()));

        let mut inquiries = MockInquiryRepositoryTrait::new();
        inquiries
            .expect_create()
            .withf(move |new| new.listing_id == listing_id && new.buyer_id == Some(buyer_id))
            .times(1)
            .returning(|new| {
                Ok(Inquiry {
                    id: Uuid::new_v4(),
                    listing_id: new.listing_id,
                    buyer_id: new.buyer_id,
                    buyer_name: new.buyer_name,
                    buyer_contact_email: new.buyer_contact_email,
                    company_name: new.company_name,
                    message: new.message,
                    status: InquiryStatus::New,
                    created_at: Utc::now(),
                })
            });

        let app = create_test_app(inquiries, listings);
        let request = Request::builder()
            .method("POST")
            .uri("/api/inquiries")
            .header("content-type", "application/json")
            .header(AUTHORIZATION, bearer(buyer_id))
            .body(Body::from(inquiry_request(listing_id).to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn unpublished_listing_cannot_be_inquired_about() {
        let listing = listing_fixture(ListingStatus::Draft);
        let listing_id = listing.id;

        let mut listings = MockListingRepositoryTrait::new();
        listings
            .expect_find_by_id()
            .returning(move |_| Ok(Some(listing.clone())));
        let mut inquiries = MockInquiryRepositoryTrait::new();
        inquiries.expect_create().never();

        let app = create_test_app(inquiries, listings);
        let request = Request::builder()
            .method("POST")
            .uri("/api/inquiries")
            .header("content-type", "application/json")
            .header(AUTHORIZATION, bearer(Uuid::new_v4()))
            .body(Body::from(inquiry_request(listing_id).to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_message_is_rejected_before_any_lookup() {
        let mut listings = MockListingRepositoryTrait::new();
        listings.expect_find_by_id().never();
        let mut inquiries = MockInquiryRepositoryTrait::new();
        inquiries.expect_create().never();

        let app = create_test_app(inquiries, listings);
        let body = serde_json::json!({
            "listing_id": Uuid::new_v4(),
            "contact_email": "buyer@example.com",
            "message": "hi"
        });
        let request = Request::builder()
            .method("POST")
            .uri("/api/inquiries")
            .header("content-type", "application/json")
            .header(AUTHORIZATION, bearer(Uuid::new_v4()))
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
