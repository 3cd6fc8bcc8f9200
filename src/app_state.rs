use crate::ai::EngineClient;
use crate::jobs::{JobQueueTrait, PgJobQueue};
use crate::repositories::{
    FavoriteRepository, FavoriteRepositoryTrait, InquiryRepository, InquiryRepositoryTrait,
    ListingRepository, ListingRepositoryTrait, MaterialRepository, MaterialRepositoryTrait,
    UserRepository, UserRepositoryTrait,
};
use sqlx::{Pool, Postgres};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub user_repo: Arc<dyn UserRepositoryTrait + Send + Sync>,
    pub listing_repo: Arc<dyn ListingRepositoryTrait + Send + Sync>,
    pub favorite_repo: Arc<dyn FavoriteRepositoryTrait + Send + Sync>,
    pub inquiry_repo: Arc<dyn InquiryRepositoryTrait + Send + Sync>,
    pub material_repo: Arc<dyn MaterialRepositoryTrait + Send + Sync>,
    pub job_queue: Arc<dyn JobQueueTrait + Send + Sync>,
    pub engine: Arc<EngineClient>,
    pub db_pool: Pool<Postgres>,
}

impl AppState {
    pub fn new(pool: Pool<Postgres>, engine: EngineClient) -> Self {
        Self {
            user_repo: Arc::new(UserRepository::new(pool.clone())),
            listing_repo: Arc::new(ListingRepository::new(pool.clone())),
            favorite_repo: Arc::new(FavoriteRepository::new(pool.clone())),
            inquiry_repo: Arc::new(InquiryRepository::new(pool.clone())),
            material_repo: Arc::new(MaterialRepository::new(pool.clone())),
            job_queue: Arc::new(PgJobQueue::new(pool.clone())),
            engine: Arc::new(engine),
            db_pool: pool,
        }
    }
}
