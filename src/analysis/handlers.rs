use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::{
    analysis::types::{AnalysisReport, AnalysisStatusResponse, OnePagerResponse},
    app_state::AppState,
    auth::{dtos::ErrorResponse, middleware::AuthenticatedUser},
    entities::{AnalysisStatus, Listing, MaterialKind},
    jobs::ANALYZE_LISTING_KIND,
};

fn status_message(status: AnalysisStatus) -> &'static str {
    match status {
        AnalysisStatus::NotStarted => "No analysis has been run",
        AnalysisStatus::Pending => "Analysis is queued",
        AnalysisStatus::Analyzing => "Analysis in progress",
        AnalysisStatus::Ready => "Analysis complete",
        AnalysisStatus::Failed => "Analysis failed",
    }
}

fn error_json(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

async fn load_listing(state: &AppState, id: Uuid) -> Result<Listing, Response> {
    match state.listing_repo.find_by_id(id).await {
        Ok(Some(listing)) => Ok(listing),
        Ok(None) => Err(error_json(StatusCode::NOT_FOUND, "Listing not found")),
        Err(e) => {
            error!("failed to load listing {}: {}", id, e);
            Err(error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error",
            ))
        }
    }
}

/// Kick off an analysis run for a listing. Queues a background job and flips
/// the listing to `pending`; a trigger while a run is already queued or
/// executing is a no-op that returns the current snapshot.
#[utoipa::path(
    post,
    path = "/api/ai/listings/{id}/analyze",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 202, description = "Analysis queued", body = AnalysisStatusResponse),
        (status = 200, description = "Analysis already in progress", body = AnalysisStatusResponse),
        (status = 403, description = "Not the listing owner", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "ai"
)]
pub async fn trigger_analysis(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    let listing = match load_listing(&state, id).await {
        Ok(listing) => listing,
        Err(response) => return response,
    };

    if !auth_user.may_manage(listing.creator_id) {
        return error_json(
            StatusCode::FORBIDDEN,
            "Only the listing owner can request analysis",
        );
    }

    if matches!(
        listing.ai_analysis_status,
        AnalysisStatus::Pending | AnalysisStatus::Analyzing
    ) {
        return (
            StatusCode::OK,
            Json(AnalysisStatusResponse {
                listing_id: listing.id,
                status: listing.ai_analysis_status,
                analysis: None,
                message: "Analysis already in progress".to_string(),
            }),
        )
            .into_response();
    }

    if let Err(e) = state
        .listing_repo
        .set_analysis_status(listing.id, AnalysisStatus::Pending)
        .await
    {
        error!("failed to mark listing {} pending: {}", listing.id, e);
        return error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error");
    }

    let payload = serde_json::json!({ "listing_id": listing.id });
    match state.job_queue.enqueue(ANALYZE_LISTING_KIND, payload).await {
        Ok(job_id) => {
            tracing::info!(%job_id, listing_id = %listing.id, "analysis job queued");
            (
                StatusCode::ACCEPTED,
                Json(AnalysisStatusResponse {
                    listing_id: listing.id,
                    status: AnalysisStatus::Pending,
                    analysis: None,
                    message: "Analysis started".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("failed to enqueue analysis for {}: {}", listing.id, e);
            // Roll the status back so a later trigger is not treated as a
            // duplicate of a job that never existed.
            if let Err(e) = state
                .listing_repo
                .set_analysis_status(listing.id, AnalysisStatus::NotStarted)
                .await
            {
                warn!("could not roll back analysis status: {}", e);
            }
            error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to queue analysis",
            )
        }
    }
}

/// Current analysis snapshot for a listing. The result payload is attached
/// only when the status is `ready`.
#[utoipa::path(
    get,
    path = "/api/ai/listings/{id}/analysis",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Current analysis state", body = AnalysisStatusResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "ai"
)]
pub async fn get_analysis(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    let listing = match load_listing(&state, id).await {
        Ok(listing) => listing,
        Err(response) => return response,
    };

    let status = listing.ai_analysis_status;
    let analysis = if status == AnalysisStatus::Ready {
        match load_report(&state, listing.id).await {
            Ok(report) => Some(report),
            Err(response) => return response,
        }
    } else {
        None
    };

    (
        StatusCode::OK,
        Json(AnalysisStatusResponse {
            listing_id: listing.id,
            status,
            analysis,
            message: status_message(status).to_string(),
        }),
    )
        .into_response()
}

/// Stored report for a listing whose status is `ready`. A ready listing with
/// no stored report is an internal inconsistency, not a client error.
async fn load_report(state: &AppState, listing_id: Uuid) -> Result<AnalysisReport, Response> {
    let material = match state
        .material_repo
        .latest(listing_id, MaterialKind::Analysis)
        .await
    {
        Ok(Some(material)) => material,
        Ok(None) => {
            error!("listing {} is ready but has no stored analysis", listing_id);
            return Err(error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Analysis result unavailable",
            ));
        }
        Err(e) => {
            error!("failed to load analysis for {}: {}", listing_id, e);
            return Err(error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error",
            ));
        }
    };

    serde_json::from_str::<AnalysisReport>(&material.content).map_err(|e| {
        error!("stored analysis for {} is corrupt: {}", listing_id, e);
        error_json(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Analysis result unavailable",
        )
    })
}

/// Generate a pitch one-pager for an analyzed listing. Synchronous: the
/// generation runs within the request.
#[utoipa::path(
    post,
    path = "/api/ai/listings/{id}/one-pager",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "One-pager generated", body = OnePagerResponse),
        (status = 403, description = "Not the listing owner", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
        (status = 409, description = "Listing has not been analyzed", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "ai"
)]
pub async fn request_one_pager(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    let listing = match load_listing(&state, id).await {
        Ok(listing) => listing,
        Err(response) => return response,
    };

    if !auth_user.may_manage(listing.creator_id) {
        return error_json(
            StatusCode::FORBIDDEN,
            "Only the listing owner can request a one-pager",
        );
    }

    if listing.ai_analysis_status != AnalysisStatus::Ready {
        return error_json(
            StatusCode::CONFLICT,
            "Run an analysis before generating a one-pager",
        );
    }

    let report = match load_report(&state, listing.id).await {
        Ok(report) => Some(report),
        Err(_) => {
            // Generate from listing metadata alone rather than failing.
            warn!("generating one-pager for {} without a report", listing.id);
            None
        }
    };

    let one_pager = match state
        .engine
        .generate_one_pager(&listing, report.as_ref())
        .await
    {
        Ok(text) => text,
        Err(e) => {
            error!("one-pager generation failed for {}: {}", listing.id, e);
            return error_json(StatusCode::BAD_GATEWAY, "Generation engine unavailable");
        }
    };

    if let Err(e) = state
        .material_repo
        .insert(listing.id, MaterialKind::OnePager, &one_pager)
        .await
    {
        error!("failed to store one-pager for {}: {}", listing.id, e);
        return error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error");
    }

    (
        StatusCode::OK,
        Json(OnePagerResponse {
            listing_id: listing.id,
            one_pager,
            message: "One-pager generated".to_string(),
        }),
    )
        .into_response()
}

/// Most recently generated one-pager for a listing.
#[utoipa::path(
    get,
    path = "/api/ai/listings/{id}/one-pager",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Latest one-pager", body = OnePagerResponse),
        (status = 404, description = "No one-pager found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "ai"
)]
pub async fn get_one_pager(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    let listing = match load_listing(&state, id).await {
        Ok(listing) => listing,
        Err(response) => return response,
    };

    match state
        .material_repo
        .latest(listing.id, MaterialKind::OnePager)
        .await
    {
        Ok(Some(material)) => (
            StatusCode::OK,
            Json(OnePagerResponse {
                listing_id: listing.id,
                one_pager: material.content,
                message: "One-pager retrieved".to_string(),
            }),
        )
            .into_response(),
        Ok(None) => error_json(StatusCode::NOT_FOUND, "No one-pager found"),
        Err(e) => {
            error!("failed to load one-pager for {}: {}", listing.id, e);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}
