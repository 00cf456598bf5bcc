//! [`PgProfileStore`]: PostgreSQL-backed profile store.
//!
//! Expects a `client_profiles` table owned by the wider application:
//!
//! ```sql
//! CREATE TABLE client_profiles (
//!     id                  UUID PRIMARY KEY,
//!     ssn                 TEXT,
//!     address             TEXT,
//!     bank_routing_number TEXT,
//!     bank_account_number TEXT,
//!     portal_email        TEXT,
//!     portal_password     TEXT,
//!     irs_username        TEXT,
//!     irs_password        TEXT,
//!     state_username      TEXT,
//!     state_password      TEXT,
//!     updated_at          TIMESTAMPTZ NOT NULL DEFAULT now()
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::SensitiveFields;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::{ProfileStore, StoreError, StoredProfile};

const COLUMNS: &str = "id, ssn, address, bank_routing_number, bank_account_number, \
     portal_email, portal_password, irs_username, irs_password, \
     state_username, state_password, updated_at";

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    ssn: Option<String>,
    address: Option<String>,
    bank_routing_number: Option<String>,
    bank_account_number: Option<String>,
    portal_email: Option<String>,
    portal_password: Option<String>,
    irs_username: Option<String>,
    irs_password: Option<String>,
    state_username: Option<String>,
    state_password: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for StoredProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            fields: SensitiveFields {
                ssn: row.ssn,
                address: row.address,
                bank_routing_number: row.bank_routing_number,
                bank_account_number: row.bank_account_number,
                portal_email: row.portal_email,
                portal_password: row.portal_password,
                irs_username: row.irs_username,
                irs_password: row.irs_password,
                state_username: row.state_username,
                state_password: row.state_password,
            },
            updated_at: row.updated_at,
        }
    }
}

/// Profile store over a `sqlx` connection pool.
#[derive(Clone, Debug)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the initial connection fails.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!(max_connections, "connected to profile database");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredProfile>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM client_profiles WHERE id = $1");
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(StoredProfile::from))
    }

    async fn list(&self) -> Result<Vec<StoredProfile>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM client_profiles ORDER BY id");
        let rows = sqlx::query_as::<_, ProfileRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(StoredProfile::from).collect())
    }

    async fn save(&self, id: Uuid, fields: &SensitiveFields) -> Result<StoredProfile, StoreError> {
        let sql = format!(
            "INSERT INTO client_profiles (
                id, ssn, address, bank_routing_number, bank_account_number,
                portal_email, portal_password, irs_username, irs_password,
                state_username, state_password, updated_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, now())
             ON CONFLICT (id) DO UPDATE SET
                ssn                 = COALESCE(EXCLUDED.ssn, client_profiles.ssn),
                address             = COALESCE(EXCLUDED.address, client_profiles.address),
                bank_routing_number = COALESCE(EXCLUDED.bank_routing_number, client_profiles.bank_routing_number),
                bank_account_number = COALESCE(EXCLUDED.bank_account_number, client_profiles.bank_account_number),
                portal_email        = COALESCE(EXCLUDED.portal_email, client_profiles.portal_email),
                portal_password     = COALESCE(EXCLUDED.portal_password, client_profiles.portal_password),
                irs_username        = COALESCE(EXCLUDED.irs_username, client_profiles.irs_username),
                irs_password        = COALESCE(EXCLUDED.irs_password, client_profiles.irs_password),
                state_username      = COALESCE(EXCLUDED.state_username, client_profiles.state_username),
                state_password      = COALESCE(EXCLUDED.state_password, client_profiles.state_password),
                updated_at          = now()
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(id)
            .bind(fields.ssn.as_deref())
            .bind(fields.address.as_deref())
            .bind(fields.bank_routing_number.as_deref())
            .bind(fields.bank_account_number.as_deref())
            .bind(fields.portal_email.as_deref())
            .bind(fields.portal_password.as_deref())
            .bind(fields.irs_username.as_deref())
            .bind(fields.irs_password.as_deref())
            .bind(fields.state_username.as_deref())
            .bind(fields.state_password.as_deref())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }
}
