//! # ideate-db
//!
//! PostgreSQL database layer for the ideate board.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for ideas and tags
//! - Embedded schema migrations (behind the `migrations` feature)
//!
//! ## Example
//!
//! ```rust,ignore
//! use ideate_db::Database;
//! use ideate_core::{CreateIdeaRequest, IdeaRepository, Platform};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/ideate").await?;
//!
//!     let idea = db.ideas.insert(CreateIdeaRequest {
//!         title: "Threads on error handling".to_string(),
//!         description: None,
//!         platform: Platform::Twitter,
//!         tags: vec!["rust".to_string()],
//!     }).await?;
//!
//!     println!("Created idea: {}", idea.idea.id);
//!     Ok(())
//! }
//! ```

pub mod ideas;
pub mod pool;
pub mod tags;

// Re-export core types
pub use ideate_core::*;

// Re-export repository implementations
pub use ideas::PgIdeaRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use tags::PgTagRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Idea repository for CRUD and ordering operations.
    pub ideas: PgIdeaRepository,
    /// Tag repository for find-or-create and relinking.
    pub tags: PgTagRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            ideas: PgIdeaRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
