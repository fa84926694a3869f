//! Shared configuration, error type, storage handles and row types.

pub mod config;
pub mod db;
pub mod error;
pub mod redis_pool;
pub mod types;
