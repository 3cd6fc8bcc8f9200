use crate::entities::{Material, MaterialKind};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MaterialRepositoryTrait {
    async fn insert(&self, listing_id: Uuid, kind: MaterialKind, content: &str) -> Result<Material>;
    /// Most recent material of the given kind, if any.
    async fn latest(&self, listing_id: Uuid, kind: MaterialKind) -> Result<Option<Material>>;
}

#[derive(Clone)]
pub struct MaterialRepository {
    pool: Pool<Postgres>,
}

impl MaterialRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MaterialRepositoryTrait for MaterialRepository {
    async fn insert(&self, listing_id: Uuid, kind: MaterialKind, content: &str) -> Result<Material> {
        let material = sqlx::query_as::<_, Material>(
            r#"
            INSERT INTO materials (listing_id, kind, content)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(listing_id)
        .bind(kind)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(material)
    }

    async fn latest(&self, listing_id: Uuid, kind: MaterialKind) -> Result<Option<Material>> {
        let material = sqlx::query_as::<_, Material>(
            r#"
            SELECT * FROM materials
            WHERE listing_id = $1 AND kind = $2
            ORDER BY generated_at DESC
            LIMIT 1
            "#,
        )
        .bind(listing_id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;
        Ok(material)
    }
}
