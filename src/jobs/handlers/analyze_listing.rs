use crate::entities::{AnalysisStatus, Listing, MaterialKind};
use crate::jobs::{JobContext, handler::JobHandler};
use crate::repositories::{
    ListingRepository, ListingRepositoryTrait, MaterialRepository, MaterialRepositoryTrait,
};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const ANALYZE_LISTING_KIND: &str = "analyze_listing";

/// Scripts beyond this size are truncated before prompting the engine.
const MAX_SCRIPT_CHARS: usize = 60_000;

static SCRIPT_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to build HTTP client")
});

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeListingPayload {
    pub listing_id: Uuid,
}

/// Runs the AI analysis for one listing: flips `ai_analysis_status` to
/// `analyzing`, prompts the engine with the script text (or listing metadata
/// when no script is available), stores the full report as a material, and
/// applies the summary fields with status `ready`. Any error marks the
/// listing `failed` and is returned so the queue can schedule a retry.
#[derive(Clone)]
pub struct AnalyzeListingHandler;

#[async_trait]
impl JobHandler for AnalyzeListingHandler {
    #[instrument(skip(self, ctx), fields(listing_id))]
    async fn run(&self, payload: serde_json::Value, ctx: &JobContext) -> anyhow::Result<()> {
        let payload: AnalyzeListingPayload = serde_json::from_value(payload)?;
        tracing::Span::current().record("listing_id", tracing::field::display(payload.listing_id));

        let listings = ListingRepository::new(ctx.pool.clone());
        let materials = MaterialRepository::new(ctx.pool.clone());

        let Some(listing) = listings.find_by_id(payload.listing_id).await? else {
            // Deleted between enqueue and pickup; nothing to retry.
            warn!("listing {} no longer exists, dropping job", payload.listing_id);
            return Ok(());
        };

        listings
            .set_analysis_status(listing.id, AnalysisStatus::Analyzing)
            .await?;

        let script_text = fetch_script_text(&listing).await;
        match &script_text {
            Some(text) => info!("using script text for analysis ({} chars)", text.len()),
            None => info!("no script available, analyzing listing metadata"),
        }

        let report = match ctx
            .engine
            .analyze_listing(&listing, script_text.as_deref())
            .await
        {
            Ok(report) => report,
            Err(e) => {
                warn!("analysis run failed: {}", e);
                listings
                    .set_analysis_status(listing.id, AnalysisStatus::Failed)
                    .await?;
                return Err(e.into());
            }
        };

        info!(score = report.commercial_score, "analysis complete");

        let content = serde_json::to_string(&report)?;
        materials
            .insert(listing.id, MaterialKind::Analysis, &content)
            .await?;

        listings
            .apply_analysis(
                listing.id,
                report.commercial_score,
                report.strengths.clone(),
                report.improvements.clone(),
            )
            .await?;

        Ok(())
    }

    fn kind(&self) -> &'static str {
        ANALYZE_LISTING_KIND
    }
}

/// Best-effort download of the listing's script. Failures fall back to
/// metadata-only analysis rather than failing the job.
async fn fetch_script_text(listing: &Listing) -> Option<String> {
    let url = listing.script_url.as_deref()?;

    let response = match SCRIPT_CLIENT.get(url).send().await {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            warn!("could not download script: status {}", r.status());
            return None;
        }
        Err(e) => {
            warn!("could not download script: {}", e);
            return None;
        }
    };

    match response.text().await {
        Ok(text) => {
            let mut text = text;
            if text.len() > MAX_SCRIPT_CHARS {
                let mut cut = MAX_SCRIPT_CHARS;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                text.truncate(cut);
            }
            Some(text)
        }
        Err(e) => {
            warn!("could not read script body: {}", e);
            None
        }
    }
}
