//! # vault-db
//!
//! Database layer implementing the repository traits from `vault-core`.
//!
//! ## Overview
//!
//! - Connection pool management and schema setup for PostgreSQL
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - PostgreSQL repository implementations
//! - In-memory repository implementations for single-process deployments and tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vault_db::pool::{create_pool, run_migrations, DatabaseConfig};
//! use vault_db::PgTokenRepository;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::default()).await?;
//!     run_migrations(&pool).await?;
//!     let tokens = PgTokenRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::{
    MemoryDeliveryRepository, MemoryJoinRequestRepository, MemoryTokenRepository,
    MemoryUserRepository,
};
pub use pool::{create_pool, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{
    PgDeliveryRepository, PgJoinRequestRepository, PgTokenRepository, PgUserRepository,
};
