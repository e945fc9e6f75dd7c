use super::{RoleStore, StoreResult};
use crate::models::{Identity, Role, UserRecord};
use async_trait::async_trait;
use sqlx::PgPool;

/// Repository for user role records
pub struct PgRoleStore {
    pool: PgPool,
}

impl PgRoleStore {
    /// Create a new PgRoleStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a role record by identity uid
    pub async fn find_by_uid(&self, uid: &str) -> StoreResult<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT uid, email, display_name, role, created_at
            FROM users
            WHERE uid = $1
            "#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }
}

#[async_trait]
impl RoleStore for PgRoleStore {
    async fn get_role(&self, uid: &str) -> StoreResult<Option<Role>> {
        Ok(self
            .find_by_uid(uid)
            .await?
            .map(|record| record.role_enum()))
    }

    async fn ensure_default_role(&self, identity: &Identity) -> StoreResult<Role> {
        let record = UserRecord::new(identity);

        // An existing record is never overwritten
        sqlx::query(
            r#"
            INSERT INTO users (uid, email, display_name, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (uid) DO NOTHING
            "#,
        )
        .bind(&record.uid)
        .bind(&record.email)
        .bind(&record.display_name)
        .bind(&record.role)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        let stored = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT uid, email, display_name, role, created_at
            FROM users
            WHERE uid = $1
            "#,
        )
        .bind(&record.uid)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored.role_enum())
    }
}
