pub mod repository;

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{error, info};

use crate::config::Config;

pub use repository::{SqliteTodoStore, TodoStore};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Creates the `todos` table if it does not exist yet. Safe to run again.
pub async fn migrate(pool: &SqlitePool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Opens the pool for the lifetime of the process.
///
/// A failed first connection is logged and replaced by a lazy pool, so the
/// server still starts and requests report the failure instead. Only a
/// connection string that cannot be parsed at all is returned as an error.
pub async fn connect(config: &Config) -> Result<SqlitePool, sqlx::Error> {
    let options: SqliteConnectOptions = config.database_url.parse()?;
    let options = options.create_if_missing(true);

    let pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);

    match pool_options.clone().connect_with(options.clone()).await {
        Ok(pool) => {
            info!("database connected");
            Ok(pool)
        }
        Err(e) => {
            error!("database connection error: {}", e);
            Ok(pool_options.connect_lazy_with(options))
        }
    }
}
