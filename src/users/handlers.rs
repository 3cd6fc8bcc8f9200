use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    app_state::AppState,
    auth::{
        dtos::{ErrorResponse, ProfileResponse},
        middleware::AuthenticatedUser,
    },
    users::dtos::{PublicProfileResponse, UpdateProfileRequest},
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

#[utoipa::path(
    put,
    path = "/api/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 404, description = "Account no longer exists", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_my_profile(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Response {
    if let Err(error) = payload.validate() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }

    match state
        .user_repo
        .update(auth_user.user_id, payload.into_patch())
        .await
    {
        Ok(Some(user)) => {
            info!(user_id = %user.id, "profile updated");
            (StatusCode::OK, Json(ProfileResponse::from(user))).into_response()
        }
        Ok(None) => error_json(StatusCode::NOT_FOUND, "User not found"),
        Err(e) => {
            error!("profile update failed: {}", e);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

/// Public-facing profile; contact details stay private.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Public profile", body = PublicProfileResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    tag = "users"
)]
pub async fn public_profile(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.user_repo.find_by_id(id).await {
        Ok(Some(user)) => {
            (StatusCode::OK, Json(PublicProfileResponse::from(user))).into_response()
        }
        Ok(None) => error_json(StatusCode::NOT_FOUND, "User profile not found"),
        Err(e) => {
            error!("public profile lookup failed: {}", e);
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
        entities::{User, UserRole},
        jobs::MockJobQueueTrait,
        passwords,
        repositories::{
            MockFavoriteRepositoryTrait, MockInquiryRepositoryTrait, MockListingRepositoryTrait,
            MockMaterialRepositoryTrait, MockUserRepositoryTrait,
        },
    };
    use axum::{
        Router,
        body::Body,
        http::{Request, header::AUTHORIZATION},
        routing::{get, put},
    };
    use chrono::Utc;
    use sqlx::{Pool, Postgres};
    use std::sync::Arc;
    use tower::ServiceExt;
    use url::Url;

    fn create_test_app(users: MockUserRepositoryTrait) -> Router {
        let pool =
            Pool::<Postgres>::connect_lazy("postgresql://dummy").expect("Failed to create pool");
        let engine = EngineClient::from_parts(
            Url::parse("http://localhost:9").unwrap(),
            "test-key",
            "test-model",
        )
        .expect("Failed to build engine client");

        let state = AppState {
            user_repo: Arc::new(users),
            listing_repo: Arc::new(MockListingRepositoryTrait::new()),
            favorite_repo: Arc::new(MockFavoriteRepositoryTrait::new()),
            inquiry_repo: Arc::new(MockInquiryRepositoryTrait::new()),
            material_repo: Arc::new(MockMaterialRepositoryTrait::new()),
            job_queue: Arc::new(MockJobQueueTrait::new()),
            engine: Arc::new(engine),
            db_pool: pool,
        };

        Router::new()
            .route("/api/users/me", put(update_my_profile))
            .route("/api/users/{id}", get(public_profile))
            .with_state(state)
    }

    fn user_fixture() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            pw_hash: passwords::hash_password("correct-password").unwrap(),
            display_name: "Ada".to_string(),
            bio: None,
            company_name: None,
            role: UserRole::Creator,
            created_at: Utc::now(),
        }
    }

    fn bearer(user_id: Uuid, role: UserRole) -> String {
        let config = Config::from_env().expect("Failed to load config");
        let token = JwtService::new(config.jwt_secret())
            .generate_token(user_id, role)
            .expect("Failed to generate token");
        format!("Bearer {}", token)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn update_applies_only_the_provided_fields() {
        let user = user_fixture();
        let user_id = user.id;

        let mut users = MockUserRepositoryTrait::new();
        users
            .expect_update()
            .withf(move |id, patch| {
                *id == user_id
                    && patch.display_name.as_deref() == Some("Countess")
                    && patch.bio.as_deref() == Some("Writes thrillers.")
                    && patch.company_name.is_none()
            })
            .times(1)
            .returning(move |_, patch| {
                let mut updated = user.clone();
                updated.display_name = patch.display_name.unwrap();
                updated.bio = patch.bio;
                Ok(Some(updated))
            });

        let app = create_test_app(users);
        let request = Request::builder()
            .method("PUT")
            .uri("/api/users/me")
            .header(AUTHORIZATION, bearer(user_id, UserRole::Creator))
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "display_name": "Countess",
                    "bio": "Writes thrillers."
                })
                .to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["display_name"], "Countess");
        assert_eq!(body["bio"], "Writes thrillers.");
    }

    #[tokio::test]
    async fn update_with_no_fields_is_a_bad_request() {
        let mut users = MockUserRepositoryTrait::new();
        users.expect_update().never();

        let app = create_test_app(users);
        let request = Request::builder()
            .method("PUT")
            .uri("/api/users/me")
            .header(AUTHORIZATION, bearer(Uuid::new_v4(), UserRole::Creator))
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn public_profile_never_exposes_the_email() {
        let mut user = user_fixture();
        user.bio = Some("Writes thrillers.".to_string());
        let user_id = user.id;

        let mut users = MockUserRepositoryTrait::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));

        let app = create_test_app(users);
        let request = Request::builder()
            .method("GET")
            .uri(format!("/api/users/{}", user_id))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["display_name"], "Ada");
        assert_eq!(body["bio"], "Writes thrillers.");
        assert!(body.get("email").is_none());
        assert!(body.get("pw_hash").is_none());
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let mut users = MockUserRepositoryTrait::new();
        users.expect_find_by_id().returning(|_| Ok(None));

        let app = create_test_app(users);
        let request = Request::builder()
            .method("GET")
            .uri(format!("/api/users/{}", Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
