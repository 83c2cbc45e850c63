use garde::Validate;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Batch, Error, ListingParams, Pool, error::Result};

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub author: String,
    #[serde(with = "time::serde::rfc3339")]
    pub pub_date: OffsetDateTime,
    #[serde(skip)]
    pub author_id: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateComment {
    #[garde(length(min = 1, max = 1500))]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, Validate)]
pub struct UpdateComment {
    #[garde(length(min = 1, max = 1500))]
    #[serde(default)]
    pub text: Option<String>,
}

const SELECT_COMMENTS: &str = r#"
    SELECT c.id, c.text, u.username AS author, c.pub_date, c.author_id
    FROM comments c
    JOIN users u ON u.id = c.author_id
    JOIN reviews r ON r.id = c.review_id
"#;

/// Comments are always addressed through title and review,
/// a review under a different title is treated as missing
pub struct CommentRepository {
    pool: Pool,
}

impl CommentRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn ensure_review(&self, title_id: i64, review_id: i64) -> Result<()> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM reviews WHERE title_id = ? AND id = ?")
            .bind(title_id)
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await?
            .map(|_| ())
            .ok_or_else(|| Error::RecordNotFound(format!("Review {review_id}")))
    }

    /// Newest comments first
    pub async fn list_for_review(
        &self,
        title_id: i64,
        review_id: i64,
        params: ListingParams,
    ) -> Result<Batch<Comment>> {
        self.ensure_review(title_id, review_id).await?;
        let total: i64 = sqlx::query_scalar("SELECT count(*) FROM comments WHERE review_id = ?")
            .bind(review_id)
            .fetch_one(&self.pool)
            .await?;
        let rows = sqlx::query_as::<_, Comment>(&format!(
            "{SELECT_COMMENTS} WHERE c.review_id = ? ORDER BY c.pub_date DESC, c.id DESC LIMIT ? OFFSET ?"
        ))
        .bind(review_id)
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(Batch {
            offset: params.offset,
            limit: params.limit,
            total: total as u64,
            rows,
        })
    }

    pub async fn get(&self, title_id: i64, review_id: i64, id: i64) -> Result<Comment> {
        sqlx::query_as::<_, Comment>(&format!(
            "{SELECT_COMMENTS} WHERE r.title_id = ? AND c.review_id = ? AND c.id = ?"
        ))
        .bind(title_id)
        .bind(review_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::RecordNotFound(format!("Comment {id}")))
    }

    pub async fn create(
        &self,
        title_id: i64,
        review_id: i64,
        author_id: i64,
        payload: CreateComment,
    ) -> Result<Comment> {
        self.ensure_review(title_id, review_id).await?;
        let result = sqlx::query(
            "INSERT INTO comments (text, review_id, author_id, pub_date) VALUES (?, ?, ?, ?)",
        )
        .bind(&payload.text)
        .bind(review_id)
        .bind(author_id)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await?;
        self.get(title_id, review_id, result.last_insert_rowid())
            .await
    }

    pub async fn update(
        &self,
        title_id: i64,
        review_id: i64,
        id: i64,
        payload: UpdateComment,
    ) -> Result<Comment> {
        // checks the whole path before touching the row
        self.get(title_id, review_id, id).await?;
        if let Some(text) = payload.text {
            sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
                .bind(text)
                .bind(id)
                .execute(&self.pool)
                .await?;
        }
        self.get(title_id, review_id, id).await
    }

    pub async fn delete(&self, title_id: i64, review_id: i64, id: i64) -> Result<()> {
        self.get(title_id, review_id, id).await?;
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
