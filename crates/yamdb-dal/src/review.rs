use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::QueryBuilder;
use time::OffsetDateTime;

use crate::{Batch, ChosenDB, Error, ListingParams, Pool, error::Result};

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    pub text: String,
    /// Username of the author
    pub author: String,
    pub score: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub pub_date: OffsetDateTime,
    #[serde(skip)]
    pub author_id: i64,
    #[serde(skip)]
    pub title_id: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateReview {
    #[garde(length(min = 1, max = 1500))]
    pub text: String,
    #[garde(range(min = 1, max = 10))]
    pub score: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, Validate)]
pub struct UpdateReview {
    #[garde(length(min = 1, max = 1500))]
    #[serde(default)]
    pub text: Option<String>,
    #[garde(range(min = 1, max = 10))]
    #[serde(default)]
    pub score: Option<i64>,
}

const SELECT_REVIEWS: &str = r#"
    SELECT r.id, r.text, u.username AS author, r.score, r.pub_date, r.author_id, r.title_id
    FROM reviews r
    JOIN users u ON u.id = r.author_id
"#;

pub struct ReviewRepository {
    pool: Pool,
}

impl ReviewRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn ensure_title(&self, title_id: i64) -> Result<()> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM titles WHERE id = ?")
            .bind(title_id)
            .fetch_optional(&self.pool)
            .await?
            .map(|_| ())
            .ok_or_else(|| Error::RecordNotFound(format!("Title {title_id}")))
    }

    pub async fn list_for_title(&self, title_id: i64, params: ListingParams) -> Result<Batch<Review>> {
        self.ensure_title(title_id).await?;
        let total: i64 = sqlx::query_scalar("SELECT count(*) FROM reviews WHERE title_id = ?")
            .bind(title_id)
            .fetch_one(&self.pool)
            .await?;
        let rows = sqlx::query_as::<_, Review>(&format!(
            "{SELECT_REVIEWS} WHERE r.title_id = ? ORDER BY r.id LIMIT ? OFFSET ?"
        ))
        .bind(title_id)
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

    /// Review is only found through the title it belongs to
    pub async fn get(&self, title_id: i64, id: i64) -> Result<Review> {
        sqlx::query_as::<_, Review>(&format!(
            "{SELECT_REVIEWS} WHERE r.title_id = ? AND r.id = ?"
        ))
        .bind(title_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::RecordNotFound(format!("Review {id}")))
    }

    pub async fn create(&self, title_id: i64, author_id: i64, payload: CreateReview) -> Result<Review> {
        self.ensure_title(title_id).await?;
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM reviews WHERE title_id = ? AND author_id = ?")
                .bind(title_id)
                .bind(author_id)
                .fetch_optional(&self.pool)
                .await?;
        if existing.is_some() {
            return Err(Error::DuplicateReview);
        }

        let result = sqlx::query(
            "INSERT INTO reviews (text, title_id, author_id, score, pub_date) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&payload.text)
        .bind(title_id)
        .bind(author_id)
        .bind(payload.score)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| match Error::from(e) {
            Error::UniqueViolation { .. } => Error::DuplicateReview,
            other => other,
        })?;
        self.get(title_id, result.last_insert_rowid()).await
    }

    pub async fn update(&self, title_id: i64, id: i64, payload: UpdateReview) -> Result<Review> {
        let mut query: QueryBuilder<ChosenDB> = QueryBuilder::new("UPDATE reviews SET ");
        let mut fields = query.separated(", ");
        let mut changed = false;
        if let Some(text) = payload.text {
            fields.push("text = ").push_bind_unseparated(text);
            changed = true;
        }
        if let Some(score) = payload.score {
            fields.push("score = ").push_bind_unseparated(score);
            changed = true;
        }
        if changed {
            query
                .push(" WHERE title_id = ")
                .push_bind(title_id)
                .push(" AND id = ")
                .push_bind(id);
            let res = query.build().execute(&self.pool).await?;
            if res.rows_affected() == 0 {
                return Err(Error::RecordNotFound(format!("Review {id}")));
            }
        }
        self.get(title_id, id).await
    }

    pub async fn delete(&self, title_id: i64, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM reviews WHERE title_id = ? AND id = ?")
            .bind(title_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound(format!("Review {id}")))
        } else {
            Ok(())
        }
    }
}
