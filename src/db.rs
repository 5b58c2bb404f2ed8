use std::time::Duration;

use anyhow::Context;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};

const SCHEMA: &str = include_str!("../sql/001_movies.sql");

// Recycling the only :memory: connection would swap in a fresh, empty database.
const IN_MEMORY_KEEPALIVE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Opens the pool and makes sure the `movies` table exists.
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<DatabaseConnection> {
    let in_memory = is_in_memory(database_url);
    let opts = connect_options(database_url, max_connections);

    let db = Database::connect(opts).await.with_context(|| format!("connecting to {database_url}"))?;

    if !in_memory {
        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            db.execute(Statement::from_string(db.get_database_backend(), pragma.to_string()))
                .await
                .with_context(|| pragma.to_string())?;
        }
    }

    run_sql(&db, SCHEMA).await.context("creating movies table")?;
    Ok(db)
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:")
}

fn connect_options(database_url: &str, max_connections: u32) -> ConnectOptions {
    let mut opts = ConnectOptions::new(database_url.to_string());
    opts.sqlx_logging(false);
    if is_in_memory(database_url) {
        // every pooled connection to :memory: would open its own empty database
        opts.max_connections(1)
            .min_connections(1)
            .max_lifetime(IN_MEMORY_KEEPALIVE)
            .idle_timeout(IN_MEMORY_KEEPALIVE);
    } else {
        opts.max_connections(max_connections);
    }
    opts
}

async fn run_sql(db: &DatabaseConnection, sql: &str) -> anyhow::Result<()> {
    for stmt in sql.split(';') {
        let stmt = stmt.trim();
        if stmt.is_empty() {
            continue;
        }
        db.execute(Statement::from_string(db.get_database_backend(), stmt.to_string())).await?;
    }
    Ok(())
}
