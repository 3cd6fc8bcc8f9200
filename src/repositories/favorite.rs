use crate::entities::Listing;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavoriteRepositoryTrait {
    async fn ids_for_user(&self, user_id: Uuid) -> Result<Vec<Uuid>>;
    async fn listings_for_user(&self, user_id: Uuid) -> Result<Vec<Listing>>;
    /// Returns false when the favorite already existed.
    async fn save(&self, user_id: Uuid, listing_id: Uuid) -> Result<bool>;
    /// Returns false when there was nothing to remove.
    async fn unsave(&self, user_id: Uuid, listing_id: Uuid) -> Result<bool>;
}

#[derive(Clone)]
pub struct FavoriteRepository {
    pool: Pool<Postgres>,
}

impl FavoriteRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteRepositoryTrait for FavoriteRepository {
    async fn ids_for_user(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT listing_id FROM favorites WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn listings_for_user(&self, user_id: Uuid) -> Result<Vec<Listing>> {
        let listings = sqlx::query_as::<_, Listing>(
            r#"
            SELECT l.*
            FROM listings l
            JOIN favorites f ON f.listing_id = l.id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(listings)
    }

    async fn save(&self, user_id: Uuid, listing_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO favorites (user_id, listing_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, listing_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(listing_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn unsave(&self, user_id: Uuid, listing_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND listing_id = $2")
            .bind(user_id)
            .bind(listing_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
