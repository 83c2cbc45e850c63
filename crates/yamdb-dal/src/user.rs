use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::QueryBuilder;
use tracing::debug;
use yamdb_types::{
    claim::Role,
    general::{ValidEmail, not_reserved_username, optional_not_reserved_username},
};

use crate::{Batch, ChosenDB, Error, ListingParams, Pool, error::Result};

fn new_nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateUser {
    #[garde(
        length(min = 1, max = 150),
        pattern(r"^[\w.@+-]+$"),
        custom(not_reserved_username)
    )]
    pub username: String,
    #[garde(dive)]
    pub email: ValidEmail,
    #[garde(length(max = 150))]
    #[serde(default)]
    pub first_name: Option<String>,
    #[garde(length(max = 150))]
    #[serde(default)]
    pub last_name: Option<String>,
    #[garde(length(max = 5000))]
    #[serde(default)]
    pub bio: Option<String>,
    #[garde(skip)]
    #[serde(default)]
    pub role: Option<Role>,
}

impl CreateUser {
    pub fn new(username: impl Into<String>, email: ValidEmail) -> Self {
        CreateUser {
            username: username.into(),
            email,
            first_name: None,
            last_name: None,
            bio: None,
            role: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }
}

/// Partial update, absent fields are left unchanged
#[derive(Debug, Serialize, Deserialize, Clone, Default, Validate)]
pub struct UpdateUser {
    #[garde(
        length(min = 1, max = 150),
        pattern(r"^[\w.@+-]+$"),
        custom(optional_not_reserved_username)
    )]
    #[serde(default)]
    pub username: Option<String>,
    #[garde(dive)]
    #[serde(default)]
    pub email: Option<ValidEmail>,
    #[garde(length(max = 150))]
    #[serde(default)]
    pub first_name: Option<String>,
    #[garde(length(max = 150))]
    #[serde(default)]
    pub last_name: Option<String>,
    #[garde(length(max = 5000))]
    #[serde(default)]
    pub bio: Option<String>,
    #[garde(skip)]
    #[serde(default)]
    pub role: Option<Role>,
}

/// Changes a user may make to their own record.
///
/// Role is not part of it, a `role` in the request body is accepted whatever its
/// value and dropped.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct UpdateProfile {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<ValidEmail>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    role: Option<serde::de::IgnoredAny>,
}

impl UpdateProfile {
    pub fn has_role(&self) -> bool {
        self.role.is_some()
    }
}

impl From<UpdateProfile> for UpdateUser {
    fn from(profile: UpdateProfile) -> Self {
        UpdateUser {
            username: profile.username,
            email: profile.email,
            first_name: profile.first_name,
            last_name: profile.last_name,
            bio: profile.bio,
            role: None,
        }
    }
}

impl UpdateUser {
    fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.bio.is_none()
            && self.role.is_none()
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserInt {
    id: i64,
    username: String,
    email: String,
    role: String,
    first_name: Option<String>,
    last_name: Option<String>,
    bio: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct User {
    #[serde(skip)]
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_moderator(&self) -> bool {
        self.role.is_moderator()
    }
}

impl TryFrom<UserInt> for User {
    type Error = Error;

    fn try_from(value: UserInt) -> Result<Self> {
        let role = value
            .role
            .parse::<Role>()
            .map_err(|e| Error::InvalidData(e.to_string()))?;
        Ok(Self {
            id: value.id,
            username: value.username,
            email: value.email,
            first_name: value.first_name,
            last_name: value.last_name,
            bio: value.bio,
            role,
        })
    }
}

/// State a confirmation code is bound to
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConfirmationState {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub confirmation_nonce: String,
}

const USER_COLUMNS: &str = "id, username, email, role, first_name, last_name, bio";

pub struct UserRepository {
    pool: Pool,
}

impl UserRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, payload: CreateUser) -> Result<User> {
        let role = payload.role.unwrap_or_default();
        let result = sqlx::query(
            "INSERT INTO users (username, email, role, first_name, last_name, bio, confirmation_nonce)
            VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&payload.username)
        .bind(payload.email.as_ref())
        .bind(role.as_str())
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.bio)
        .bind(new_nonce())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Created user {} with id {id}", payload.username);
        self.get(id).await
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    pub async fn list(&self, params: ListingParams) -> Result<Batch<User>> {
        let total = self.count().await?;
        let rows = sqlx::query_as::<_, UserInt>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect::<Result<Vec<_>>>()?;
        Ok(Batch {
            offset: params.offset,
            limit: params.limit,
            total,
            rows,
        })
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        sqlx::query_as::<_, UserInt>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::RecordNotFound(format!("User {id}")))?
            .try_into()
    }

    pub async fn find_by_username(&self, username: &str) -> Result<User> {
        sqlx::query_as::<_, UserInt>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::RecordNotFound(format!("User {username}")))?
        .try_into()
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User> {
        sqlx::query_as::<_, UserInt>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::RecordNotFound(format!("User with email {email}")))?
            .try_into()
    }

    /// Applies partial update, any change also replaces confirmation nonce,
    /// so outstanding confirmation codes become invalid
    pub async fn update(&self, id: i64, payload: UpdateUser) -> Result<User> {
        if payload.is_empty() {
            return self.get(id).await;
        }
        let mut query: QueryBuilder<ChosenDB> = QueryBuilder::new("UPDATE users SET ");
        let mut fields = query.separated(", ");
        if let Some(username) = payload.username {
            fields.push("username = ").push_bind_unseparated(username);
        }
        if let Some(email) = payload.email {
            fields
                .push("email = ")
                .push_bind_unseparated(String::from(email));
        }
        if let Some(first_name) = payload.first_name {
            fields.push("first_name = ").push_bind_unseparated(first_name);
        }
        if let Some(last_name) = payload.last_name {
            fields.push("last_name = ").push_bind_unseparated(last_name);
        }
        if let Some(bio) = payload.bio {
            fields.push("bio = ").push_bind_unseparated(bio);
        }
        if let Some(role) = payload.role {
            fields.push("role = ").push_bind_unseparated(role.as_str());
        }
        fields
            .push("confirmation_nonce = ")
            .push_bind_unseparated(new_nonce());
        query.push(" WHERE id = ").push_bind(id);

        let res = query.build().execute(&self.pool).await?;
        if res.rows_affected() == 0 {
            return Err(Error::RecordNotFound(format!("User {id}")));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound(format!("User {id}")))
        } else {
            Ok(())
        }
    }

    pub async fn confirmation_state(&self, id: i64) -> Result<ConfirmationState> {
        sqlx::query_as::<_, ConfirmationState>(
            "SELECT id, username, email, role, confirmation_nonce FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::RecordNotFound(format!("User {id}")))
    }

    /// Replaces nonce only if it still has expected value.
    ///
    /// Returns false when the nonce was changed meanwhile, so the confirmation code
    /// bound to it was already used or invalidated.
    pub async fn consume_nonce(&self, id: i64, expected_nonce: &str) -> Result<bool> {
        let now = time::OffsetDateTime::now_utc();
        let res = sqlx::query(
            "UPDATE users SET confirmation_nonce = ?, last_login = ? WHERE id = ? AND confirmation_nonce = ?",
        )
        .bind(new_nonce())
        .bind(now)
        .bind(id)
        .bind(expected_nonce)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }
}
