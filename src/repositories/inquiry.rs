use crate::entities::Inquiry;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewInquiry {
    pub listing_id: Uuid,
    pub buyer_id: Option<Uuid>,
    pub buyer_name: Option<String>,
    pub buyer_contact_email: String,
    pub company_name: Option<String>,
    pub message: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InquiryRepositoryTrait {
    async fn create(&self, new: NewInquiry) -> Result<Inquiry>;
    /// Inquiries the given buyer has sent.
    async fn sent_by(&self, buyer_id: Uuid) -> Result<Vec<Inquiry>>;
    /// Inquiries against any listing owned by the given creator.
    async fn received_by(&self, creator_id: Uuid) -> Result<Vec<Inquiry>>;
    /// Every inquiry on the platform, newest first. Admin reporting only.
    async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<Inquiry>>;
    async fn count(&self) -> Result<i64>;
}

#[derive(Clone)]
pub struct InquiryRepository {
    pool: Pool<Postgres>,
}

impl InquiryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InquiryRepositoryTrait for InquiryRepository {
    async fn create(&self, new: NewInquiry) -> Result<Inquiry> {
        let inquiry = sqlx::query_as::<_, Inquiry>(
            r#"
            INSERT INTO inquiries
                (listing_id, buyer_id, buyer_name, buyer_contact_email, company_name, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(new.listing_id)
        .bind(new.buyer_id)
        .bind(&new.buyer_name)
        .bind(&new.buyer_contact_email)
        .bind(&new.company_name)
        .bind(&new.message)
        .fetch_one(&self.pool)
        .await?;
        Ok(inquiry)
    }

    async fn sent_by(&self, buyer_id: Uuid) -> Result<Vec<Inquiry>> {
        let inquiries = sqlx::query_as::<_, Inquiry>(
            "SELECT * FROM inquiries WHERE buyer_id = $1 ORDER BY created_at DESC",
        )
        .bind(buyer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(inquiries)
    }

    async fn received_by(&self, creator_id: Uuid) -> Result<Vec<Inquiry>> {
        let inquiries = sqlx::query_as::<_, Inquiry>(
            r#"
            SELECT i.*
            FROM inquiries i
            JOIN listings l ON l.id = i.listing_id
            WHERE l.creator_id = $1
            ORDER BY i.created_at DESC
            "#,
        )
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(inquiries)
    }

    async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<Inquiry>> {
        let inquiries = sqlx::query_as::<_, Inquiry>(
            "SELECT * FROM inquiries ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(inquiries)
    }

    async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM inquiries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
