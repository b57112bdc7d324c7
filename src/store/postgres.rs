use async_trait::async_trait;
use sqlx::PgPool;

use super::{IdentityStore, StoreError};
use crate::models::identity::{Identity, NewIdentity, ProfileUpdate};

const IDENTITY_COLUMNS: &str =
    "id, external_id, full_name, pseudonym, bio, avatar_url, role, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Map unique violations on the `users` constraints to their conflict kind.
fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some("users_external_id_key") => return StoreError::DuplicateExternalId,
                Some("users_pseudonym_key") => return StoreError::DuplicatePseudonym,
                _ => {}
            }
        }
    }
    StoreError::Other(e.into())
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn find_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<Identity>> {
        let row = sqlx::query_as::<_, Identity>(&format!(
            "SELECT {} FROM users WHERE external_id = $1",
            IDENTITY_COLUMNS
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create(&self, new: &NewIdentity) -> Result<Identity, StoreError> {
        sqlx::query_as::<_, Identity>(&format!(
            r#"INSERT INTO users (external_id, full_name, pseudonym, bio, avatar_url)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {}"#,
            IDENTITY_COLUMNS
        ))
        .bind(&new.external_id)
        .bind(&new.full_name)
        .bind(&new.pseudonym)
        .bind(&new.bio)
        .bind(&new.avatar_url)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn update_profile(
        &self,
        external_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<Identity>, StoreError> {
        sqlx::query_as::<_, Identity>(&format!(
            r#"UPDATE users SET
                   full_name  = COALESCE($2, full_name),
                   pseudonym  = COALESCE($3, pseudonym),
                   bio        = COALESCE($4, bio),
                   avatar_url = COALESCE($5, avatar_url),
                   updated_at = NOW()
               WHERE external_id = $1
               RETURNING {}"#,
            IDENTITY_COLUMNS
        ))
        .bind(external_id)
        .bind(&update.full_name)
        .bind(&update.pseudonym)
        .bind(&update.bio)
        .bind(&update.avatar_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
