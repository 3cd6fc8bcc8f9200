use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;
use uuid::Uuid;

use crate::{
    app_state::AppState,
    auth::{dtos::ErrorResponse, middleware::AuthenticatedUser},
    entities::{Listing, ListingStatus},
    listings::dtos::{CreateListingRequest, ListingQuery, UpdateListingRequest},
    repositories::ListingFilter,
};

const DEFAULT_PAGE_SIZE: i64 = 20;

fn error_json(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn db_error(context: &str, e: anyhow::Error) -> Response {
    error!("{}: {}", context, e);
    error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
}

/// URL slug from a title plus a short random suffix, so two listings with the
/// same title never collide.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
        if slug.len() >= 60 {
            break;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("listing");
    }
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", slug, &suffix[..6])
}

#[utoipa::path(
    post,
    path = "/api/listings",
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Listing created", body = Listing),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "listings"
)]
pub async fn create_listing(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateListingRequest>,
) -> Response {
    if let Err(error) = payload.validate() {
        return error_json(StatusCode::BAD_REQUEST, &error);
    }

    let slug = slugify(&payload.title);
    match state
        .listing_repo
        .create(auth_user.user_id, payload.into_new_listing(slug))
        .await
    {
        Ok(listing) => (StatusCode::CREATED, Json(listing)).into_response(),
        Err(e) => db_error("failed to create listing", e),
    }
}

/// Public catalog. Only published listings are visible here, whatever the
/// query says.
#[utoipa::path(
    get,
    path = "/api/listings",
    params(ListingQuery),
    responses((status = 200, description = "Published listings", body = [Listing])),
    tag = "listings"
)]
pub async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Response {
    let filter = ListingFilter {
        genre: query.genre,
        status: Some(ListingStatus::Published),
        featured: None,
        limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        offset: query.offset.unwrap_or(0),
    };

    match state.listing_repo.list(filter).await {
        Ok(listings) => (StatusCode::OK, Json(listings)).into_response(),
        Err(e) => db_error("failed to list listings", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/listings/featured",
    responses((status = 200, description = "Featured listings", body = [Listing])),
    tag = "listings"
)]
pub async fn featured_listings(State(state): State<AppState>) -> Response {
    let filter = ListingFilter {
        genre: None,
        status: Some(ListingStatus::Published),
        featured: Some(true),
        limit: DEFAULT_PAGE_SIZE,
        offset: 0,
    };

    match state.listing_repo.list(filter).await {
        Ok(listings) => (StatusCode::OK, Json(listings)).into_response(),
        Err(e) => db_error("failed to list featured listings", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/listings/mine",
    responses((status = 200, description = "Caller's listings", body = [Listing])),
    security(("bearer_auth" = [])),
    tag = "listings"
)]
pub async fn my_listings(auth_user: AuthenticatedUser, State(state): State<AppState>) -> Response {
    match state.listing_repo.list_by_creator(auth_user.user_id).await {
        Ok(listings) => (StatusCode::OK, Json(listings)).into_response(),
        Err(e) => db_error("failed to list own listings", e),
    }
}

/// Public detail page. Unpublished listings are indistinguishable from absent
/// ones. Each hit counts a view.
#[utoipa::path(
    get,
    path = "/api/listings/by-slug/{slug}",
    params(("slug" = String, Path, description = "Listing slug")),
    responses(
        (status = 200, description = "Listing detail", body = Listing),
        (status = 404, description = "Listing not found", body = ErrorResponse),
    ),
    tag = "listings"
)]
pub async fn get_listing_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Response {
    let listing = match state.listing_repo.find_by_slug(&slug).await {
        Ok(Some(listing)) if listing.status == ListingStatus::Published => listing,
        Ok(_) => return error_json(StatusCode::NOT_FOUND, "Listing not found"),
        Err(e) => return db_error("failed to load listing", e),
    };

    if let Err(e) = state.listing_repo.record_view(listing.id).await {
        error!("failed to record view for {}: {}", listing.id, e);
    }

    (StatusCode::OK, Json(listing)).into_response()
}

#[utoipa::path(
    get,
    path = "/api/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing detail", body = Listing),
        (status = 404, description = "Listing not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "listings"
)]
pub async fn get_listing(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.listing_repo.find_by_id(id).await {
        Ok(Some(listing))
            if listing.status == ListingStatus::Published
                || auth_user.may_manage(listing.creator_id) =>
        {
            (StatusCode::OK, Json(listing)).into_response()
        }
        Ok(_) => error_json(StatusCode::NOT_FOUND, "Listing not found"),
        Err(e) => db_error("failed to load listing", e),
    }
}

#[utoipa::path(
    patch,
    path = "/api/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing id")),
    request_body = UpdateListingRequest,
    responses(
        (status = 200, description = "Listing updated", body = Listing),
        (status = 403, description = "Not the listing owner", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "listings"
)]
pub async fn update_listing(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateListingRequest>,
) -> Response {
    if let Err(error) = payload.validate() {
        return error_json(StatusCode::BAD_REQUEST, &error);
    }

    let listing = match state.listing_repo.find_by_id(id).await {
        Ok(Some(listing)) => listing,
        Ok(None) => return error_json(StatusCode::NOT_FOUND, "Listing not found"),
        Err(e) => return db_error("failed to load listing", e),
    };

    if !auth_user.may_manage(listing.creator_id) {
        return error_json(StatusCode::FORBIDDEN, "Only the listing owner can edit it");
    }

    match state.listing_repo.update(id, payload.into_patch()).await {
        Ok(Some(updated)) => (StatusCode::OK, Json(updated)).into_response(),
        Ok(None) => error_json(StatusCode::NOT_FOUND, "Listing not found"),
        Err(e) => db_error("failed to update listing", e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 403, description = "Not the listing owner", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "listings"
)]
pub async fn delete_listing(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    let listing = match state.listing_repo.find_by_id(id).await {
        Ok(Some(listing)) => listing,
        Ok(None) => return error_json(StatusCode::NOT_FOUND, "Listing not found"),
        Err(e) => return db_error("failed to load listing", e),
    };

    if !auth_user.may_manage(listing.creator_id) {
        return error_json(StatusCode::FORBIDDEN, "Only the listing owner can delete it");
    }

    match state.listing_repo.delete(id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_json(StatusCode::NOT_FOUND, "Listing not found"),
        Err(e) => db_error("failed to delete listing", e),
    }
}

/// Submit a draft for review. Published and archived listings cannot be
/// resubmitted.
#[utoipa::path(
    post,
    path = "/api/listings/{id}/submit",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing submitted for review"),
        (status = 403, description = "Not the listing owner", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
        (status = 409, description = "Listing is not a draft", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "listings"
)]
pub async fn submit_listing(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    let listing = match state.listing_repo.find_by_id(id).await {
        Ok(Some(listing)) => listing,
        Ok(None) => return error_json(StatusCode::NOT_FOUND, "Listing not found"),
        Err(e) => return db_error("failed to load listing", e),
    };

    if !auth_user.may_manage(listing.creator_id) {
        return error_json(StatusCode::FORBIDDEN, "Only the listing owner can submit it");
    }

    if listing.status != ListingStatus::Draft {
        return error_json(StatusCode::CONFLICT, "Only drafts can be submitted");
    }

    match state
        .listing_repo
        .set_status(id, ListingStatus::Pending)
        .await
    {
        Ok(true) => StatusCode::OK.into_response(),
        Ok(false) => error_json(StatusCode::NOT_FOUND, "Listing not found"),
        Err(e) => db_error("failed to submit listing", e),
    }
}
