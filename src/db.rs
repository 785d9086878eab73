use rocket_db_pools::sqlx::{self, PgPool};
use rocket_db_pools::Database;

/// Connection pool configured under `databases.directory_db`.
#[derive(Database)]
#[database("directory_db")]
pub struct DirectoryDb(sqlx::PgPool);

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Apply pending schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}
