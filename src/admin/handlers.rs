use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    app_state::AppState,
    auth::{
        dtos::{ErrorResponse, ProfileResponse},
        middleware::AuthenticatedUser,
    },
    entities::{Inquiry, Listing, ListingStatus, UserRole},
    repositories::ListingFilter,
};

const REVIEW_PAGE_SIZE: i64 = 50;
const REPORT_PAGE_SIZE: i64 = 100;

fn error_json(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn require_admin(auth_user: &AuthenticatedUser) -> Result<(), Response> {
    if auth_user.is_admin() {
        Ok(())
    } else {
        Err(error_json(StatusCode::FORBIDDEN, "Admin access required"))
    }
}

/// Listings waiting for review.
#[utoipa::path(
    get,
    path = "/api/admin/listings/pending",
    responses(
        (status = 200, description = "Listings awaiting review", body = [Listing]),
        (status = 403, description = "Admin access required", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn pending_listings(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Response {
    if let Err(response) = require_admin(&auth_user) {
        return response;
    }

    let filter = ListingFilter {
        genre: None,
        status: Some(ListingStatus::Pending),
        featured: None,
        limit: REVIEW_PAGE_SIZE,
        offset: 0,
    };

    match state.listing_repo.list(filter).await {
        Ok(listings) => (StatusCode::OK, Json(listings)).into_response(),
        Err(e) => {
            error!("failed to list pending listings: {}", e);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/listings/{id}/approve",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing published"),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn approve_listing(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    if let Err(response) = require_admin(&auth_user) {
        return response;
    }

    match state
        .listing_repo
        .set_status(id, ListingStatus::Published)
        .await
    {
        Ok(true) => {
            info!(listing_id = %id, "listing approved");
            StatusCode::OK.into_response()
        }
        Ok(false) => error_json(StatusCode::NOT_FOUND, "Listing not found"),
        Err(e) => {
            error!("failed to approve listing {}: {}", id, e);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

/// Send a listing back to draft for rework.
#[utoipa::path(
    post,
    path = "/api/admin/listings/{id}/reject",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing returned to draft"),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn reject_listing(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    if let Err(response) = require_admin(&auth_user) {
        return response;
    }

    match state.listing_repo.set_status(id, ListingStatus::Draft).await {
        Ok(true) => {
            info!(listing_id = %id, "listing rejected");
            StatusCode::OK.into_response()
        }
        Ok(false) => error_json(StatusCode::NOT_FOUND, "Listing not found"),
        Err(e) => {
            error!("failed to reject listing {}: {}", id, e);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FeatureRequest {
    pub featured: bool,
}

#[utoipa::path(
    put,
    path = "/api/admin/listings/{id}/feature",
    params(("id" = Uuid, Path, description = "Listing id")),
    request_body = FeatureRequest,
    responses(
        (status = 200, description = "Featured flag updated"),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn feature_listing(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FeatureRequest>,
) -> Response {
    if let Err(response) = require_admin(&auth_user) {
        return response;
    }

    match state.listing_repo.set_featured(id, payload.featured).await {
        Ok(true) => StatusCode::OK.into_response(),
        Ok(false) => error_json(StatusCode::NOT_FOUND, "Listing not found"),
        Err(e) => {
            error!("failed to set featured flag on {}: {}", id, e);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

/// Every account, newest first. Full profiles; this surface is admin-only.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "All users", body = [ProfileResponse]),
        (status = 403, description = "Admin access required", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_users(auth_user: AuthenticatedUser, State(state): State<AppState>) -> Response {
    if let Err(response) = require_admin(&auth_user) {
        return response;
    }

    match state.user_repo.list(REPORT_PAGE_SIZE, 0).await {
        Ok(users) => {
            let profiles: Vec<ProfileResponse> =
                users.into_iter().map(ProfileResponse::from).collect();
            (StatusCode::OK, Json(profiles)).into_response()
        }
        Err(e) => {
            error!("failed to list users: {}", e);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/inquiries",
    responses(
        (status = 200, description = "All inquiries", body = [Inquiry]),
        (status = 403, description = "Admin access required", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_inquiries(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Response {
    if let Err(response) = require_admin(&auth_user) {
        return response;
    }

    match state.inquiry_repo.list_all(REPORT_PAGE_SIZE, 0).await {
        Ok(inquiries) => (StatusCode::OK, Json(inquiries)).into_response(),
        Err(e) => {
            error!("failed to list inquiries: {}", e);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct ListingStatusCounts {
    pub draft: i64,
    pub pending: i64,
    pub published: i64,
    pub archived: i64,
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct UserRoleCounts {
    pub creators: i64,
    pub buyers: i64,
    pub admins: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminStatsResponse {
    pub total_listings: i64,
    pub listings: ListingStatusCounts,
    pub total_users: i64,
    pub users: UserRoleCounts,
    pub total_inquiries: i64,
}

/// Platform-wide counters for the admin dashboard.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Platform stats", body = AdminStatsResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn stats(auth_user: AuthenticatedUser, State(state): State<AppState>) -> Response {
    if let Err(response) = require_admin(&auth_user) {
        return response;
    }

    let listing_counts = match state.listing_repo.count_by_status().await {
        Ok(counts) => counts,
        Err(e) => {
            error!("failed to count listings: {}", e);
            return error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };
    let role_counts = match state.user_repo.count_by_role().await {
        Ok(counts) => counts,
        Err(e) => {
            error!("failed to count users: {}", e);
            return error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };
    let total_inquiries = match state.inquiry_repo.count().await {
        Ok(count) => count,
        Err(e) => {
            error!("failed to count inquiries: {}", e);
            return error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    let mut listings = ListingStatusCounts::default();
    for (status, count) in &listing_counts {
        match status {
            ListingStatus::Draft => listings.draft = *count,
            ListingStatus::Pending => listings.pending = *count,
            ListingStatus::Published => listings.published = *count,
            ListingStatus::Archived => listings.archived = *count,
        }
    }

    let mut users = UserRoleCounts::default();
    for (role, count) in &role_counts {
        match role {
            UserRole::Creator => users.creators = *count,
            UserRole::Buyer => users.buyers = *count,
            UserRole::Admin => users.admins = *count,
        }
    }

    let response = AdminStatsResponse {
        total_listings: listing_counts.iter().map(|(_, count)| count).sum(),
        listings,
        total_users: role_counts.iter().map(|(_, count)| count).sum(),
        users,
        total_inquiries,
    };
    (StatusCode::OK, Json(response)).into_response()
}
