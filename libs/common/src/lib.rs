//! Common library for the to-do mini app backend
//!
//! This crate provides the infrastructure shared by the service
//! binaries: PostgreSQL configuration, connection pooling, schema
//! bootstrap, and database error types.

pub mod database;
pub mod error;
