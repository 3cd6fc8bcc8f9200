use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder, header};
use std::time::Duration;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use crate::analysis::{
    errors::ClientError,
    types::{AnalysisState, AnalysisStatusResponse, OnePagerResponse},
};

const USER_AGENT: &str = "greenlight-client/0.1";

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .build()
        .expect("Failed to build HTTP client")
});

/// Boundary contract the tracker depends on: start a job, observe it, and the
/// one-pager trigger/fetch pair. `poll_once` never mutates remote state and is
/// safe to call repeatedly.
#[async_trait]
pub trait AnalysisApi: Send + Sync + 'static {
    async fn start_analysis(&self, listing_id: Uuid)
    -> Result<AnalysisStatusResponse, ClientError>;
    async fn poll_once(&self, listing_id: Uuid) -> Result<AnalysisState, ClientError>;
    async fn request_one_pager(&self, listing_id: Uuid) -> Result<OnePagerResponse, ClientError>;
    async fn fetch_one_pager(&self, listing_id: Uuid) -> Result<OnePagerResponse, ClientError>;
}

/// REST implementation against the listing store.
#[derive(Clone)]
pub struct HttpAnalysisApi {
    base: Url,
    bearer: Option<String>,
}

impl HttpAnalysisApi {
    pub fn new(base: Url) -> Self {
        Self { base, bearer: None }
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    fn endpoint(&self, listing_id: Uuid, tail: &str) -> Result<Url, ClientError> {
        let url = self
            .base
            .join(&format!("api/ai/listings/{}/{}", listing_id, tail))?;
        Ok(url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer {
            Some(token) => req.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => req,
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Http {
                status,
                retriable: status.is_server_error(),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AnalysisApi for HttpAnalysisApi {
    #[instrument(skip(self), fields(listing_id = %listing_id))]
    async fn start_analysis(
        &self,
        listing_id: Uuid,
    ) -> Result<AnalysisStatusResponse, ClientError> {
        let url = self.endpoint(listing_id, "analyze")?;
        let response = self
            .authorize(HTTP_CLIENT.post(url))
            .send()
            .await
            .map_err(ClientError::from_reqwest_error)?;
        Self::decode(response).await
    }

    #[instrument(skip(self), fields(listing_id = %listing_id))]
    async fn poll_once(&self, listing_id: Uuid) -> Result<AnalysisState, ClientError> {
        let url = self.endpoint(listing_id, "analysis")?;
        let response = self
            .authorize(HTTP_CLIENT.get(url))
            .send()
            .await
            .map_err(ClientError::from_reqwest_error)?;
        let snapshot: AnalysisStatusResponse = Self::decode(response).await?;
        snapshot.into_state().map_err(ClientError::Decode)
    }

    #[instrument(skip(self), fields(listing_id = %listing_id))]
    async fn request_one_pager(&self, listing_id: Uuid) -> Result<OnePagerResponse, ClientError> {
        let url = self.endpoint(listing_id, "one-pager")?;
        let response = self
            .authorize(HTTP_CLIENT.post(url))
            .send()
            .await
            .map_err(ClientError::from_reqwest_error)?;
        Self::decode(response).await
    }

    #[instrument(skip(self), fields(listing_id = %listing_id))]
    async fn fetch_one_pager(&self, listing_id: Uuid) -> Result<OnePagerResponse, ClientError> {
        let url = self.endpoint(listing_id, "one-pager")?;
        let response = self
            .authorize(HTTP_CLIENT.get(url))
            .send()
            .await
            .map_err(ClientError::from_reqwest_error)?;
        Self::decode(response).await
    }
}
