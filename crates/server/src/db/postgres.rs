//! `PostgreSQL` storage backend.
//!
//! Queries are checked at runtime (`sqlx::query_as` with `FromRow` row types)
//! and converted into domain types through `TryFrom`, surfacing bad rows as
//! `RepositoryError::DataCorruption`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use store_ratings_core::{Email, PrincipalId, RatingId, RatingValue, Role};

use super::{PrincipalStore, RatingStore, RepositoryError};
use crate::models::{
    NewPrincipal, Principal, PrincipalCredentials, Rating, RatingTotals, StoreRatingEntry,
};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for principal queries.
#[derive(Debug, sqlx::FromRow)]
struct PrincipalRow {
    id: i32,
    name: String,
    email: String,
    address: Option<String>,
    role: Role,
    created_at: DateTime<Utc>,
}

impl TryFrom<PrincipalRow> for Principal {
    type Error = RepositoryError;

    fn try_from(row: PrincipalRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: PrincipalId::new(row.id),
            name: row.name,
            email,
            address: row.address,
            role: row.role,
            created_at: row.created_at,
        })
    }
}

/// Internal row type for credential lookups.
#[derive(sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    principal: PrincipalRow,
    password_hash: String,
}

impl TryFrom<CredentialsRow> for PrincipalCredentials {
    type Error = RepositoryError;

    fn try_from(row: CredentialsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            principal: row.principal.try_into()?,
            password_hash: row.password_hash,
        })
    }
}

/// Internal row type for a store joined with its rating totals.
#[derive(Debug, sqlx::FromRow)]
struct StoreTotalsRow {
    #[sqlx(flatten)]
    principal: PrincipalRow,
    rating_count: i64,
    rating_sum: i64,
}

/// Internal row type for rating queries.
#[derive(Debug, sqlx::FromRow)]
struct RatingRow {
    id: i32,
    user_id: i32,
    store_id: i32,
    value: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RatingRow> for Rating {
    type Error = RepositoryError;

    fn try_from(row: RatingRow) -> Result<Self, Self::Error> {
        let value = RatingValue::try_from(row.value).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid rating in database: {e}"))
        })?;

        Ok(Self {
            id: RatingId::new(row.id),
            user_id: PrincipalId::new(row.user_id),
            store_id: PrincipalId::new(row.store_id),
            value,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for the store owner's view of its ratings.
#[derive(Debug, sqlx::FromRow)]
struct StoreRatingRow {
    user_email: String,
    value: i16,
    created_at: DateTime<Utc>,
}

impl TryFrom<StoreRatingRow> for StoreRatingEntry {
    type Error = RepositoryError;

    fn try_from(row: StoreRatingRow) -> Result<Self, Self::Error> {
        let user_email = Email::parse(&row.user_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let value = RatingValue::try_from(row.value).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid rating in database: {e}"))
        })?;

        Ok(Self {
            user_email,
            value,
            created_at: row.created_at,
            comment: None,
        })
    }
}

/// Internal row type for `COUNT`/`SUM` queries.
#[derive(Debug, sqlx::FromRow)]
struct TotalsRow {
    rating_count: i64,
    rating_sum: i64,
}

fn role_names(roles: &[Role]) -> Vec<String> {
    roles.iter().map(|r| r.as_str().to_owned()).collect()
}

// =============================================================================
// Store
// =============================================================================

/// `PostgreSQL`-backed storage.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl PrincipalStore for PgStore {
    #[instrument(skip(self, principal), fields(email = %principal.email, role = %principal.role))]
    async fn insert_principal(&self, principal: NewPrincipal) -> Result<Principal, RepositoryError> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r"
            INSERT INTO principal (name, email, address, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, address, role, created_at
            ",
        )
        .bind(&principal.name)
        .bind(principal.email.as_str())
        .bind(principal.address.as_deref())
        .bind(&principal.password_hash)
        .bind(principal.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<PrincipalCredentials>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r"
            SELECT id, name, email, address, role, created_at, password_hash
            FROM principal
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn find_principal(&self, id: PrincipalId) -> Result<Option<Principal>, RepositoryError> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r"
            SELECT id, name, email, address, role, created_at
            FROM principal
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self, password_hash), fields(id = %id))]
    async fn update_password_hash(
        &self,
        id: PrincipalId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE principal
            SET password_hash = $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_principals(&self, roles: &[Role]) -> Result<Vec<Principal>, RepositoryError> {
        let rows = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, name, email, address, role, created_at
            FROM principal
            WHERE role::TEXT = ANY($1)
            ORDER BY name COLLATE "C", id
            "#,
        )
        .bind(role_names(roles))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self))]
    async fn count_principals(&self, roles: &[Role]) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*) FROM principal WHERE role::TEXT = ANY($1)
            ",
        )
        .bind(role_names(roles))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

impl RatingStore for PgStore {
    #[instrument(skip(self), fields(user_id = %user_id, store_id = %store_id, value = %value))]
    async fn upsert_rating(
        &self,
        user_id: PrincipalId,
        store_id: PrincipalId,
        value: RatingValue,
    ) -> Result<Rating, RepositoryError> {
        let row = sqlx::query_as::<_, RatingRow>(
            r"
            INSERT INTO rating (user_id, store_id, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, store_id)
            DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            RETURNING id, user_id, store_id, value, created_at, updated_at
            ",
        )
        .bind(user_id.as_i32())
        .bind(store_id.as_i32())
        .bind(value.as_i16())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    #[instrument(skip(self), fields(store_id = %store_id))]
    async fn rating_totals(&self, store_id: PrincipalId) -> Result<RatingTotals, RepositoryError> {
        let row = sqlx::query_as::<_, TotalsRow>(
            r"
            SELECT COUNT(*) AS rating_count,
                   COALESCE(SUM(value), 0)::BIGINT AS rating_sum
            FROM rating
            WHERE store_id = $1
            ",
        )
        .bind(store_id.as_i32())
        .fetch_one(&self.pool)
        .await?;

        Ok(RatingTotals {
            count: row.rating_count,
            sum: row.rating_sum,
        })
    }

    #[instrument(skip(self))]
    async fn stores_with_totals(&self) -> Result<Vec<(Principal, RatingTotals)>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreTotalsRow>(
            r#"
            SELECT p.id, p.name, p.email, p.address, p.role, p.created_at,
                   COUNT(r.id) AS rating_count,
                   COALESCE(SUM(r.value), 0)::BIGINT AS rating_sum
            FROM principal p
            LEFT JOIN rating r ON r.store_id = p.id
            WHERE p.role = 'store'
            GROUP BY p.id
            ORDER BY p.name COLLATE "C", p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let totals = RatingTotals {
                    count: row.rating_count,
                    sum: row.rating_sum,
                };
                let store: Principal = row.principal.try_into()?;
                Ok((store, totals))
            })
            .collect()
    }

    #[instrument(skip(self), fields(store_id = %store_id))]
    async fn ratings_for_store(
        &self,
        store_id: PrincipalId,
    ) -> Result<Vec<StoreRatingEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRatingRow>(
            r#"
            SELECT u.email AS user_email, r.value, r.created_at
            FROM rating r
            JOIN principal u ON u.id = r.user_id
            WHERE r.store_id = $1
            ORDER BY u.email COLLATE "C"
            "#,
        )
        .bind(store_id.as_i32())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn ratings_by_user(&self, user_id: PrincipalId) -> Result<Vec<Rating>, RepositoryError> {
        let rows = sqlx::query_as::<_, RatingRow>(
            r"
            SELECT id, user_id, store_id, value, created_at, updated_at
            FROM rating
            WHERE user_id = $1
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self))]
    async fn count_ratings(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM rating")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
