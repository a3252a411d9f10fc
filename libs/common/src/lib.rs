//! Common library for the front-desk application
//!
//! This crate provides shared functionality used by the front-desk service,
//! including database connectivity and the database error taxonomy.

pub mod database;
pub mod error;
