//! Visitor registration and front-desk service

pub mod bootstrap;
pub mod card;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod password;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod scope;
pub mod session;
pub mod state;
pub mod store;
pub mod token;
pub mod validation;

pub use routes::create_router;
pub use state::AppState;
