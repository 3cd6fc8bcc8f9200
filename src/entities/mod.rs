use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// --- PostgreSQL Enums ---

#[derive(sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Creator,
    Buyer,
    Admin,
}

#[derive(sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[sqlx(type_name = "listing_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Draft,
    Pending,
    Published,
    Archived,
}

/// Lifecycle of the per-listing AI analysis job as observed through the store.
///
/// `Ready` and `Failed` are terminal; once either is observed a polling
/// session must stop. `NotStarted` is the implicit state of a fresh listing,
/// `Pending` means a job is enqueued, `Analyzing` means the worker picked it
/// up.
#[derive(sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[sqlx(type_name = "analysis_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    NotStarted,
    Pending,
    Analyzing,
    Ready,
    Failed,
}

impl AnalysisStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

#[derive(sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[sqlx(type_name = "material_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    Analysis,
    OnePager,
}

#[derive(sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

#[derive(sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[sqlx(type_name = "inquiry_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    New,
    Replied,
    Closed,
}

/// --- Tables ---

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub pw_hash: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub company_name: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Listing {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub tagline: Option<String>,
    pub description: String,
    pub slug: String,
    pub genre: String,
    pub format: String,
    pub logline: Option<String>,
    pub themes: Vec<String>,
    pub target_audience: Option<String>,
    pub comparables: Vec<String>,
    pub rights_holder: Option<String>,
    pub available_rights: Vec<String>,
    pub script_url: Option<String>,
    pub poster_url: Option<String>,
    pub status: ListingStatus,
    pub ai_analysis_status: AnalysisStatus,
    pub ai_score: Option<i32>,
    pub ai_strengths: Vec<String>,
    pub ai_improvements: Vec<String>,
    pub featured: bool,
    pub view_count: i32,
    pub save_count: i32,
    pub inquiry_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Generated artifacts (analysis reports, one-pagers) attached to a listing.
/// The newest row per kind is the current one.
#[derive(Debug, Clone, FromRow)]
pub struct Material {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub kind: MaterialKind,
    pub content: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Favorite {
    pub user_id: Uuid,
    pub listing_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Inquiry {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub buyer_id: Option<Uuid>,
    pub buyer_name: Option<String>,
    pub buyer_contact_email: String,
    pub company_name: Option<String>,
    pub message: String,
    pub status: InquiryStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub kind: String,               // logical job name
    pub payload: serde_json::Value, // job data as JSONB
    pub run_at: DateTime<Utc>,      // next time the job is eligible
    pub attempts: i32,              // execution attempts so far
    pub max_attempts: i32,          // maximum attempts before giving up
    pub backoff_seconds: i32,       // populated when job fails
    pub status: JobStatus,
    pub last_error: Option<String>,
    pub visibility_till: Option<DateTime<Utc>>, // set while "running"
    pub reserved_by: Option<Uuid>,              // worker instance id
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(AnalysisStatus::Ready.is_terminal());
        assert!(AnalysisStatus::Failed.is_terminal());
        assert!(!AnalysisStatus::NotStarted.is_terminal());
        assert!(!AnalysisStatus::Pending.is_terminal());
        assert!(!AnalysisStatus::Analyzing.is_terminal());
    }

    #[test]
    fn analysis_status_wire_names() {
        let s = serde_json::to_string(&AnalysisStatus::NotStarted).unwrap();
        assert_eq!(s, "\"not_started\"");
        let back: AnalysisStatus = serde_json::from_str("\"analyzing\"").unwrap();
        assert_eq!(back, AnalysisStatus::Analyzing);
    }
}
