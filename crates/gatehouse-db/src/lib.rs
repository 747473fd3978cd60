//! # Gatehouse DB
//!
//! Persistence for the Gatehouse admin API.
//!
//! Request handlers and authorization policies only see the
//! [`UserRepository`] and [`RoleRepository`] traits. Two implementations
//! exist:
//!
//! - [`PgStore`]: PostgreSQL via SQLx, used by the server
//! - `MemoryStore`: in-process maps, behind the `test-utils` feature
//!
//! # Example
//!
//! ```ignore
//! use gatehouse_db::{PgStore, init_db_pool, migrator};
//!
//! let pool = init_db_pool(&database_url, 10).await?;
//! migrator().run(&pool).await?;
//! let store = PgStore::new(pool);
//! ```

pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod postgres;
pub mod repository;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub use error::StoreError;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{RoleRepository, UserRepository};

// Re-export PgPool for convenience
pub use sqlx::PgPool;

/// Connects a PostgreSQL pool.
pub async fn init_db_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Embedded schema migrations.
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("../../migrations")
}
