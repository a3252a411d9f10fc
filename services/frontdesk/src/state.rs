//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    rate_limiter::RateLimiter,
    store::{BranchStore, UserStore, VisitStore},
    token::TokenCodec,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub branches: Arc<dyn BranchStore>,
    pub visits: Arc<dyn VisitStore>,
    pub token_codec: TokenCodec,
    pub rate_limiter: RateLimiter,
    /// Mark the session cookie `Secure`
    pub cookie_secure: bool,
}
