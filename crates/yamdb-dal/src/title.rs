use std::collections::HashMap;

use garde::Validate;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    Batch, ChosenDB, Error, ListingParams, Pool, category::Category, contains_pattern,
    error::Result, genre::Genre,
};

fn current_year() -> i32 {
    time::OffsetDateTime::now_utc().year()
}

fn not_in_future(year: &i32, _ctx: &()) -> garde::Result {
    if *year > current_year() {
        Err(garde::Error::new("Year cannot be in the future"))
    } else {
        Ok(())
    }
}

fn optional_not_in_future(year: &Option<i32>, ctx: &()) -> garde::Result {
    year.as_ref().map_or(Ok(()), |y| not_in_future(y, ctx))
}

#[allow(clippy::ptr_arg)]
fn valid_slugs(slugs: &Vec<String>, _ctx: &()) -> garde::Result {
    if slugs.len() > 100 {
        return Err(garde::Error::new("Too many genres"));
    }
    match slugs.iter().find(|s| s.is_empty() || s.len() > 50) {
        Some(s) => Err(garde::Error::new(format!("Invalid slug '{s}'"))),
        None => Ok(()),
    }
}

fn optional_valid_slugs(slugs: &Option<Vec<String>>, ctx: &()) -> garde::Result {
    slugs.as_ref().map_or(Ok(()), |s| valid_slugs(s, ctx))
}

/// Read representation with nested category and genres
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Title {
    pub id: i64,
    pub name: String,
    pub year: i32,
    /// Mean of review scores, truncated to integer
    pub rating: Option<i64>,
    pub description: Option<String>,
    pub genre: Vec<Genre>,
    pub category: Option<Category>,
}

/// Write representation, category and genres referenced by slug
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TitleRef {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub genre: Vec<String>,
    pub category: Option<String>,
}

impl From<Title> for TitleRef {
    fn from(value: Title) -> Self {
        TitleRef {
            id: value.id,
            name: value.name,
            year: value.year,
            description: value.description,
            genre: value.genre.into_iter().map(|g| g.slug).collect(),
            category: value.category.map(|c| c.slug),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateTitle {
    #[garde(length(min = 1, max = 256))]
    pub name: String,
    #[garde(custom(not_in_future))]
    pub year: i32,
    #[garde(length(max = 1000))]
    #[serde(default)]
    pub description: Option<String>,
    #[garde(custom(valid_slugs))]
    pub genre: Vec<String>,
    #[garde(length(min = 1, max = 50))]
    pub category: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, Validate)]
pub struct UpdateTitle {
    #[garde(length(min = 1, max = 256))]
    #[serde(default)]
    pub name: Option<String>,
    #[garde(custom(optional_not_in_future))]
    #[serde(default)]
    pub year: Option<i32>,
    #[garde(length(max = 1000))]
    #[serde(default)]
    pub description: Option<String>,
    #[garde(custom(optional_valid_slugs))]
    #[serde(default)]
    pub genre: Option<Vec<String>>,
    #[garde(length(min = 1, max = 50))]
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TitleFilter {
    #[garde(length(max = 256))]
    pub name: Option<String>,
    #[garde(skip)]
    #[serde(default, deserialize_with = "empty_as_none")]
    pub year: Option<i32>,
    #[garde(length(max = 50))]
    pub category: Option<String>,
    #[garde(length(max = 50))]
    pub genre: Option<String>,
}

/// Blank query value means the filter is not applied
fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TitleRow {
    id: i64,
    name: String,
    year: i32,
    description: Option<String>,
    rating: Option<i64>,
    category_name: Option<String>,
    category_slug: Option<String>,
}

impl TitleRow {
    fn into_title(self, genre: Vec<Genre>) -> Title {
        let category = match (self.category_name, self.category_slug) {
            (Some(name), Some(slug)) => Some(Category { name, slug }),
            _ => None,
        };
        Title {
            id: self.id,
            name: self.name,
            year: self.year,
            rating: self.rating,
            description: self.description,
            genre,
            category,
        }
    }
}

const SELECT_TITLES: &str = r#"
    SELECT t.id, t.name, t.year, t.description,
    (SELECT CAST(AVG(r.score) AS INTEGER) FROM reviews r WHERE r.title_id = t.id) AS rating,
    c.name AS category_name, c.slug AS category_slug
    FROM titles t
    LEFT JOIN categories c ON c.id = t.category_id
"#;

const FROM_TITLES: &str =
    "SELECT count(*) FROM titles t LEFT JOIN categories c ON c.id = t.category_id";

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn push_filter(query: &mut QueryBuilder<'_, ChosenDB>, filter: &TitleFilter) {
    query.push(" WHERE 1 = 1");
    if let Some(name) = non_blank(&filter.name) {
        query
            .push(" AND t.name LIKE ")
            .push_bind(contains_pattern(name))
            .push(" ESCAPE '\\'");
    }
    if let Some(year) = filter.year {
        query.push(" AND t.year = ").push_bind(year);
    }
    if let Some(category) = non_blank(&filter.category) {
        query
            .push(" AND c.slug LIKE ")
            .push_bind(contains_pattern(category))
            .push(" ESCAPE '\\'");
    }
    if let Some(genre) = non_blank(&filter.genre) {
        query
            .push(
                " AND EXISTS (SELECT 1 FROM title_genres tg JOIN genres g ON g.id = tg.genre_id \
                WHERE tg.title_id = t.id AND g.slug LIKE ",
            )
            .push_bind(contains_pattern(genre))
            .push(" ESCAPE '\\')");
    }
}

async fn category_id(conn: &mut SqliteConnection, slug: &str) -> Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM categories WHERE slug = ?")
        .bind(slug)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::ReferenceNotFound(format!("Category {slug}")))
}

async fn genre_ids(conn: &mut SqliteConnection, slugs: &[String]) -> Result<Vec<i64>> {
    let mut ids = Vec::with_capacity(slugs.len());
    for slug in slugs {
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM genres WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| Error::ReferenceNotFound(format!("Genre {slug}")))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

async fn set_genres(conn: &mut SqliteConnection, title_id: i64, genre_ids: &[i64]) -> Result<()> {
    sqlx::query("DELETE FROM title_genres WHERE title_id = ?")
        .bind(title_id)
        .execute(&mut *conn)
        .await?;
    for genre_id in genre_ids {
        sqlx::query("INSERT INTO title_genres (title_id, genre_id) VALUES (?, ?)")
            .bind(title_id)
            .bind(genre_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub struct TitleRepository {
    pool: Pool,
}

impl TitleRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn genres_for(&self, title_ids: &[i64]) -> Result<HashMap<i64, Vec<Genre>>> {
        let mut genres: HashMap<i64, Vec<Genre>> = HashMap::new();
        if title_ids.is_empty() {
            return Ok(genres);
        }
        let mut query: QueryBuilder<ChosenDB> = QueryBuilder::new(
            "SELECT tg.title_id, g.name, g.slug FROM title_genres tg \
            JOIN genres g ON g.id = tg.genre_id WHERE tg.title_id IN (",
        );
        let mut ids = query.separated(", ");
        for id in title_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY g.id");
        let rows: Vec<(i64, String, String)> =
            query.build_query_as().fetch_all(&self.pool).await?;
        for (title_id, name, slug) in rows {
            genres
                .entry(title_id)
                .or_default()
                .push(Genre { name, slug });
        }
        Ok(genres)
    }

    pub async fn count(&self, filter: &TitleFilter) -> Result<u64> {
        let mut query: QueryBuilder<ChosenDB> = QueryBuilder::new(FROM_TITLES);
        push_filter(&mut query, filter);
        let count: i64 = query.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    /// Lists titles ordered by name, matching all given filters
    pub async fn list(&self, params: ListingParams, filter: &TitleFilter) -> Result<Batch<Title>> {
        let total = self.count(filter).await?;
        let mut query: QueryBuilder<ChosenDB> = QueryBuilder::new(SELECT_TITLES);
        push_filter(&mut query, filter);
        query
            .push(" ORDER BY t.name LIMIT ")
            .push_bind(params.limit)
            .push(" OFFSET ")
            .push_bind(params.offset);
        let rows: Vec<TitleRow> = query.build_query_as().fetch_all(&self.pool).await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut genres = self.genres_for(&ids).await?;
        let rows = rows
            .into_iter()
            .map(|row| {
                let genre = genres.remove(&row.id).unwrap_or_default();
                row.into_title(genre)
            })
            .collect();
        Ok(Batch {
            offset: params.offset,
            limit: params.limit,
            total,
            rows,
        })
    }

    pub async fn get(&self, id: i64) -> Result<Title> {
        let row = sqlx::query_as::<_, TitleRow>(&format!("{SELECT_TITLES} WHERE t.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::RecordNotFound(format!("Title {id}")))?;
        let genre = self.genres_for(&[id]).await?.remove(&id).unwrap_or_default();
        Ok(row.into_title(genre))
    }

    pub async fn get_ref(&self, id: i64) -> Result<TitleRef> {
        self.get(id).await.map(TitleRef::from)
    }

    pub async fn create(&self, payload: CreateTitle) -> Result<TitleRef> {
        let mut transaction = self.pool.begin().await?;
        let category_id = category_id(&mut transaction, &payload.category).await?;
        let genre_ids = genre_ids(&mut transaction, &payload.genre).await?;
        let result = sqlx::query(
            "INSERT INTO titles (name, year, description, category_id) VALUES (?, ?, ?, ?)",
        )
        .bind(&payload.name)
        .bind(payload.year)
        .bind(&payload.description)
        .bind(category_id)
        .execute(&mut *transaction)
        .await?;
        let id = result.last_insert_rowid();
        set_genres(&mut transaction, id, &genre_ids).await?;
        transaction.commit().await?;

        tracing::debug!("Created title {} with id {id}", payload.name);
        self.get_ref(id).await
    }

    pub async fn update(&self, id: i64, payload: UpdateTitle) -> Result<TitleRef> {
        let mut transaction = self.pool.begin().await?;
        sqlx::query_scalar::<_, i64>("SELECT id FROM titles WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *transaction)
            .await?
            .ok_or_else(|| Error::RecordNotFound(format!("Title {id}")))?;

        let category_id = match &payload.category {
            Some(slug) => Some(category_id(&mut transaction, slug).await?),
            None => None,
        };

        let mut query: QueryBuilder<ChosenDB> = QueryBuilder::new("UPDATE titles SET ");
        let mut fields = query.separated(", ");
        let mut changed = false;
        if let Some(name) = payload.name {
            fields.push("name = ").push_bind_unseparated(name);
            changed = true;
        }
        if let Some(year) = payload.year {
            fields.push("year = ").push_bind_unseparated(year);
            changed = true;
        }
        if let Some(description) = payload.description {
            fields
                .push("description = ")
                .push_bind_unseparated(description);
            changed = true;
        }
        if let Some(category_id) = category_id {
            fields
                .push("category_id = ")
                .push_bind_unseparated(category_id);
            changed = true;
        }
        if changed {
            query.push(" WHERE id = ").push_bind(id);
            query.build().execute(&mut *transaction).await?;
        }

        if let Some(slugs) = payload.genre {
            let genre_ids = genre_ids(&mut transaction, &slugs).await?;
            set_genres(&mut transaction, id, &genre_ids).await?;
        }
        transaction.commit().await?;

        self.get_ref(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM titles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound(format!("Title {id}")))
        } else {
            Ok(())
        }
    }
}
