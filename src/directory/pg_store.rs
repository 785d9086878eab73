use rocket_db_pools::sqlx::{self, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::directory::store::{DirectoryStore, StoreError, StoreResult};
use crate::models::{Organisation, User};

const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed directory store.
#[derive(Debug, Clone)]
pub struct PgDirectoryStore {
    pool: PgPool,
}

impl PgDirectoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Translate unique violations into `StoreError::Conflict`; the database
/// constraint is the authoritative uniqueness guard.
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().map(|code| code == UNIQUE_VIOLATION).unwrap_or(false) {
            let constraint = db_err.constraint().unwrap_or("unique").to_string();
            return StoreError::conflict(constraint);
        }
    }
    StoreError::Database(err)
}

async fn insert_organisation_tx(
    tx: &mut Transaction<'_, Postgres>,
    org: &Organisation,
    creator_id: Uuid,
) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO organisations (id, name, description, created_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(org.id)
    .bind(&org.name)
    .bind(&org.description)
    .bind(org.created_at)
    .execute(&mut **tx)
    .await
    .map_err(map_write_error)?;

    sqlx::query("INSERT INTO organisation_members (organisation_id, user_id) VALUES ($1, $2)")
        .bind(org.id)
        .bind(creator_id)
        .execute(&mut **tx)
        .await
        .map_err(map_write_error)?;

    Ok(())
}

#[rocket::async_trait]
impl DirectoryStore for PgDirectoryStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, first_name, last_name, email, password_hash, phone, created_at
               FROM users
               WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, first_name, last_name, email, password_hash, phone, created_at
               FROM users
               WHERE id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: &User, default_org: &Organisation) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO users (id, first_name, last_name, email, password_hash, phone, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        insert_organisation_tx(&mut tx, default_org, user.id).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_organisation_by_id(&self, org_id: Uuid) -> StoreResult<Option<Organisation>> {
        let org = sqlx::query_as::<_, Organisation>(
            "SELECT id, name, description, created_at FROM organisations WHERE id = $1",
        )
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(org)
    }

    async fn create_organisation(&self, org: &Organisation, creator_id: Uuid) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        insert_organisation_tx(&mut tx, org, creator_id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn append_member(&self, org_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"INSERT INTO organisation_members (organisation_id, user_id)
               VALUES ($1, $2)
               ON CONFLICT (organisation_id, user_id) DO NOTHING"#,
        )
        .bind(org_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_member(&self, org_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(
                   SELECT 1 FROM organisation_members
                   WHERE organisation_id = $1 AND user_id = $2
               )"#,
        )
        .bind(org_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list_organisations_for(&self, user_id: Uuid) -> StoreResult<Vec<Organisation>> {
        let orgs = sqlx::query_as::<_, Organisation>(
            r#"SELECT o.id, o.name, o.description, o.created_at
               FROM organisations o
               JOIN organisation_members m ON m.organisation_id = o.id
               WHERE m.user_id = $1
               ORDER BY o.created_at ASC, o.name ASC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(orgs)
    }

    async fn shares_organisation(&self, first: Uuid, second: Uuid) -> StoreResult<bool> {
        let shared: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(
                   SELECT 1
                   FROM organisation_members a
                   JOIN organisation_members b ON b.organisation_id = a.organisation_id
                   WHERE a.user_id = $1 AND b.user_id = $2
               )"#,
        )
        .bind(first)
        .bind(second)
        .fetch_one(&self.pool)
        .await?;
        Ok(shared)
    }
}
