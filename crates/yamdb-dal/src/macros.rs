/// Generates a record keyed by unique slug, its create payload and repository.
///
/// Records are listed in insertion order and can be searched by name.
macro_rules! slug_repository {
    ($entity:ident, $create:ident, $repository:ident, table = $table:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
        pub struct $entity {
            pub name: String,
            pub slug: String,
        }

        #[derive(Debug, Clone, serde::Serialize, serde::Deserialize, garde::Validate)]
        pub struct $create {
            #[garde(length(min = 1, max = 256))]
            pub name: String,
            #[garde(length(min = 1, max = 50), pattern(r"^[-a-zA-Z0-9_]+$"))]
            pub slug: String,
        }

        pub struct $repository {
            pool: $crate::Pool,
        }

        impl $repository {
            pub fn new(pool: $crate::Pool) -> Self {
                Self { pool }
            }

            pub async fn create(&self, payload: $create) -> $crate::error::Result<$entity> {
                sqlx::query(concat!("INSERT INTO ", $table, " (name, slug) VALUES (?, ?)"))
                    .bind(&payload.name)
                    .bind(&payload.slug)
                    .execute(&self.pool)
                    .await?;
                tracing::debug!("Created {} {}", stringify!($entity), payload.slug);
                self.get(&payload.slug).await
            }

            pub async fn get(&self, slug: &str) -> $crate::error::Result<$entity> {
                sqlx::query_as::<_, $entity>(concat!(
                    "SELECT name, slug FROM ",
                    $table,
                    " WHERE slug = ?"
                ))
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| {
                    $crate::Error::RecordNotFound(format!("{} {}", stringify!($entity), slug))
                })
            }

            pub async fn list(
                &self,
                params: $crate::ListingParams,
                search: Option<&str>,
            ) -> $crate::error::Result<$crate::Batch<$entity>> {
                let pattern = search.map($crate::contains_pattern);
                let total: i64 = sqlx::query_scalar(concat!(
                    "SELECT count(*) FROM ",
                    $table,
                    " WHERE ?1 IS NULL OR name LIKE ?1 ESCAPE '\\'"
                ))
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await?;
                let rows = sqlx::query_as::<_, $entity>(concat!(
                    "SELECT name, slug FROM ",
                    $table,
                    " WHERE ?1 IS NULL OR name LIKE ?1 ESCAPE '\\' ORDER BY id LIMIT ?2 OFFSET ?3"
                ))
                .bind(&pattern)
                .bind(params.limit)
                .bind(params.offset)
                .fetch_all(&self.pool)
                .await?;
                Ok($crate::Batch {
                    offset: params.offset,
                    limit: params.limit,
                    total: total as u64,
                    rows,
                })
            }

            pub async fn delete(&self, slug: &str) -> $crate::error::Result<()> {
                let res = sqlx::query(concat!("DELETE FROM ", $table, " WHERE slug = ?"))
                    .bind(slug)
                    .execute(&self.pool)
                    .await?;

                if res.rows_affected() == 0 {
                    Err($crate::Error::RecordNotFound(format!(
                        "{} {}",
                        stringify!($entity),
                        slug
                    )))
                } else {
                    Ok(())
                }
            }
        }
    };
}

pub(crate) use slug_repository;
