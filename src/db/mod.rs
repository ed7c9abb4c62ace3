//! Database layer
//!
//! This module provides database abstraction for the Vitrine backend.
//! It supports:
//! - SQLite (default, for single-binary deployment)
//! - PostgreSQL (for hosted deployments)
//!
//! The database driver is selected based on configuration.
//!
//! # Architecture
//!
//! The database layer uses a trait-based abstraction (`DatabasePool`) that
//! allows the application to work with either SQLite or PostgreSQL without
//! knowing the specific backend.
//!
//! # Usage
//!
//! ```ignore
//! use vitrine::config::DatabaseConfig;
//! use vitrine::db::{create_pool, DatabasePool, migrations};
//!
//! // Create pool from configuration
//! let config = DatabaseConfig::default();
//! let pool = create_pool(&config).await?;
//!
//! // Run migrations
//! migrations::run_migrations(&pool).await?;
//!
//! // Use the pool
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, PostgresDatabase, SqliteDatabase,
};
