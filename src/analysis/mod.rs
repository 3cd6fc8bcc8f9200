//! Client-observable lifecycle of the per-listing AI analysis job.
//!
//! `client` speaks to the listing store's REST boundary, `tracker` owns the
//! polling sessions that reconcile an in-flight job to a terminal outcome,
//! and `handlers` is the server side of the same boundary.

pub mod client;
pub mod errors;
pub mod handlers;
pub mod tracker;
pub mod types;

pub use client::{AnalysisApi, HttpAnalysisApi};
pub use errors::{ClientError, TriggerError};
pub use tracker::{AnalysisTracker, GiveUpReason, PollConfig, SessionHandle, SessionOutcome};
pub use types::{AnalysisReport, AnalysisState, AnalysisStatusResponse, OnePagerResponse};
