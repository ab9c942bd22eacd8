use std::sync::Arc;

use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database as SeaDatabase};

use crate::database::Database;

/// Fresh in-memory database with the real migrations applied. A single pooled
/// connection keeps every query on the same in-memory store.
pub async fn test_db() -> Arc<Database> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).sqlx_logging(false);

    let conn = SeaDatabase::connect(opt).await.unwrap();
    migration::Migrator::up(&conn, None).await.unwrap();

    Arc::new(Database { conn })
}
