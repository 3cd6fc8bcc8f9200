use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::AnalysisStatus;

/// Structured result of a completed analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisReport {
    pub commercial_score: i32,
    pub executive_summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub comparables: Vec<String>,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub budget_range: Option<String>,
}

/// Snapshot of a listing's analysis as the client sees it.
///
/// The result payload only exists on the `Ready` variant, so "result present
/// iff status is ready" holds by construction rather than by discipline.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisState {
    NotStarted,
    Pending,
    Analyzing,
    Ready(AnalysisReport),
    Failed,
}

impl AnalysisState {
    pub fn status(&self) -> AnalysisStatus {
        match self {
            Self::NotStarted => AnalysisStatus::NotStarted,
            Self::Pending => AnalysisStatus::Pending,
            Self::Analyzing => AnalysisStatus::Analyzing,
            Self::Ready(_) => AnalysisStatus::Ready,
            Self::Failed => AnalysisStatus::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            Self::Ready(report) => Some(report),
            _ => None,
        }
    }
}

/// Wire shape of the analysis snapshot, shared by the server handlers and the
/// HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalysisStatusResponse {
    pub listing_id: Uuid,
    pub status: AnalysisStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisReport>,
    pub message: String,
}

impl AnalysisStatusResponse {
    /// Decode the wire snapshot into a state, rejecting a `ready` status with
    /// no payload. A stray payload on a non-terminal status is dropped.
    pub fn into_state(self) -> Result<AnalysisState, String> {
        match (self.status, self.analysis) {
            (AnalysisStatus::Ready, Some(report)) => Ok(AnalysisState::Ready(report)),
            (AnalysisStatus::Ready, None) => {
                Err("analysis payload missing for ready status".to_string())
            }
            (AnalysisStatus::Failed, _) => Ok(AnalysisState::Failed),
            (AnalysisStatus::Analyzing, _) => Ok(AnalysisState::Analyzing),
            (AnalysisStatus::Pending, _) => Ok(AnalysisState::Pending),
            (AnalysisStatus::NotStarted, _) => Ok(AnalysisState::NotStarted),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OnePagerResponse {
    pub listing_id: Uuid,
    pub one_pager: String,
    pub message: String,
}
