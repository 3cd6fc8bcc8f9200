use crate::entities::{AnalysisStatus, Listing, ListingStatus};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Insertable listing fields. Slug is generated by the caller.
#[derive(Debug, Clone)]
pub struct NewListing {
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
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ListingPatch {
    pub title: Option<String>,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub format: Option<String>,
    pub logline: Option<String>,
    pub themes: Option<Vec<String>>,
    pub target_audience: Option<String>,
    pub comparables: Option<Vec<String>>,
    pub rights_holder: Option<String>,
    pub available_rights: Option<Vec<String>>,
    pub script_url: Option<String>,
    pub poster_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub genre: Option<String>,
    pub status: Option<ListingStatus>,
    pub featured: Option<bool>,
    pub limit: i64,
    pub offset: i64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingRepositoryTrait {
    async fn create(&self, creator_id: Uuid, new: NewListing) -> Result<Listing>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Listing>>;
    async fn list(&self, filter: ListingFilter) -> Result<Vec<Listing>>;
    async fn list_by_creator(&self, creator_id: Uuid) -> Result<Vec<Listing>>;
    async fn update(&self, id: Uuid, patch: ListingPatch) -> Result<Option<Listing>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn set_status(&self, id: Uuid, status: ListingStatus) -> Result<bool>;
    async fn set_featured(&self, id: Uuid, featured: bool) -> Result<bool>;
    async fn set_analysis_status(&self, id: Uuid, status: AnalysisStatus) -> Result<bool>;
    /// Persist a completed analysis: summary fields plus status `ready` in one
    /// statement so readers never see a half-applied result.
    async fn apply_analysis(
        &self,
        id: Uuid,
        score: i32,
        strengths: Vec<String>,
        improvements: Vec<String>,
    ) -> Result<bool>;
    async fn record_view(&self, id: Uuid) -> Result<()>;
    async fn adjust_save_count(&self, id: Uuid, delta: i32) -> Result<()>;
    async fn bump_inquiry_count(&self, id: Uuid) -> Result<()>;
    async fn count_by_status(&self) -> Result<Vec<(ListingStatus, i64)>>;
}

#[derive(Clone)]
pub struct ListingRepository {
    pool: Pool<Postgres>,
}

impl ListingRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingRepositoryTrait for ListingRepository {
    async fn create(&self, creator_id: Uuid, new: NewListing) -> Result<Listing> {
        let listing = sqlx::query_as::<_, Listing>(
            r#"
            INSERT INTO listings
                (creator_id, title, tagline, description, slug, genre, format,
                 logline, themes, target_audience, comparables, rights_holder,
                 available_rights)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(creator_id)
        .bind(&new.title)
        .bind(&new.tagline)
        .bind(&new.description)
        .bind(&new.slug)
        .bind(&new.genre)
        .bind(&new.format)
        .bind(&new.logline)
        .bind(&new.themes)
        .bind(&new.target_audience)
        .bind(&new.comparables)
        .bind(&new.rights_holder)
        .bind(&new.available_rights)
        .fetch_one(&self.pool)
        .await?;

        Ok(listing)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>> {
        let listing = sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(listing)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Listing>> {
        let listing = sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(listing)
    }

    async fn list(&self, filter: ListingFilter) -> Result<Vec<Listing>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM listings WHERE 1=1");
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(genre) = filter.genre {
            qb.push(" AND genre = ").push_bind(genre);
        }
        if let Some(featured) = filter.featured {
            qb.push(" AND featured = ").push_bind(featured);
        }
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit.clamp(1, 100))
            .push(" OFFSET ")
            .push_bind(filter.offset.max(0));

        let listings = qb.build_query_as::<Listing>().fetch_all(&self.pool).await?;
        Ok(listings)
    }

    async fn list_by_creator(&self, creator_id: Uuid) -> Result<Vec<Listing>> {
        let listings = sqlx::query_as::<_, Listing>(
            "SELECT * FROM listings WHERE creator_id = $1 ORDER BY created_at DESC",
        )
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(listings)
    }

    async fn update(&self, id: Uuid, patch: ListingPatch) -> Result<Option<Listing>> {
        let listing = sqlx::query_as::<_, Listing>(
            r#"
            UPDATE listings SET
                title            = COALESCE($2, title),
                tagline          = COALESCE($3, tagline),
                description      = COALESCE($4, description),
                genre            = COALESCE($5, genre),
                format           = COALESCE($6, format),
                logline          = COALESCE($7, logline),
                themes           = COALESCE($8, themes),
                target_audience  = COALESCE($9, target_audience),
                comparables      = COALESCE($10, comparables),
                rights_holder    = COALESCE($11, rights_holder),
                available_rights = COALESCE($12, available_rights),
                script_url       = COALESCE($13, script_url),
                poster_url       = COALESCE($14, poster_url),
                updated_at       = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.tagline)
        .bind(&patch.description)
        .bind(&patch.genre)
        .bind(&patch.format)
        .bind(&patch.logline)
        .bind(&patch.themes)
        .bind(&patch.target_audience)
        .bind(&patch.comparables)
        .bind(&patch.rights_holder)
        .bind(&patch.available_rights)
        .bind(&patch.script_url)
        .bind(&patch.poster_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(listing)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_status(&self, id: Uuid, status: ListingStatus) -> Result<bool> {
        let result =
            sqlx::query("UPDATE listings SET status = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(status)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_featured(&self, id: Uuid, featured: bool) -> Result<bool> {
        let result =
            sqlx::query("UPDATE listings SET featured = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(featured)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_analysis_status(&self, id: Uuid, status: AnalysisStatus) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE listings SET ai_analysis_status = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn apply_analysis(
        &self,
        id: Uuid,
        score: i32,
        strengths: Vec<String>,
        improvements: Vec<String>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE listings SET
                ai_analysis_status = 'ready'::analysis_status,
                ai_score        = $2,
                ai_strengths    = $3,
                ai_improvements = $4,
                updated_at      = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(score)
        .bind(&strengths)
        .bind(&improvements)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_view(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE listings SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn adjust_save_count(&self, id: Uuid, delta: i32) -> Result<()> {
        sqlx::query(
            "UPDATE listings SET save_count = GREATEST(save_count + $2, 0) WHERE id = $1",
        )
        .bind(id)
        .bind(delta)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn bump_inquiry_count(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE listings SET inquiry_count = inquiry_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count_by_status(&self) -> Result<Vec<(ListingStatus, i64)>> {
        let counts = sqlx::query_as::<_, (ListingStatus, i64)>(
            "SELECT status, COUNT(*) FROM listings GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }
}
