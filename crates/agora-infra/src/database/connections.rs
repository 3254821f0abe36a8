#[cfg(feature = "postgres")]
use std::sync::Arc;
#[cfg(feature = "postgres")]
use std::time::Duration;

#[cfg(feature = "postgres")]
use sea_orm::{ConnectOptions, Database, DbConn, DbErr};

/// Configuration for the main database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Explicitly constructed storage handle.
///
/// Built once by the process entry point; each repository holds a clone of
/// the `Arc`, so all of them share one pool.
#[cfg(feature = "postgres")]
pub struct DatabaseConnections {
    pub main: Arc<DbConn>,
}

#[cfg(feature = "postgres")]
impl DatabaseConnections {
    /// Initialize the connection pool from configuration.
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DbErr> {
        tracing::info!("Initializing database connections...");

        // Bounded acquire/connect so no store call blocks indefinitely
        let opts = ConnectOptions::new(&config.url)
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(true)
            .to_owned();

        let main = Database::connect(opts).await?;
        tracing::info!("Main database connected (pool: {})", config.max_connections);

        Ok(Self {
            main: Arc::new(main),
        })
    }
}
