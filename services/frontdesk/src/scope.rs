//! Branch-scoped authorization
//!
//! Admins see every branch. Everyone else sees only rows owned by their
//! assigned branch, and a non-admin without a branch sees nothing at all.
//! Out-of-scope rows are filtered away rather than reported as forbidden.

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
};

/// Restriction applied to queries returning branch-owned rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchScope {
    /// Every branch
    Unrestricted,
    /// Only rows of this branch
    Branch(i64),
    /// No rows
    Nothing,
}

/// Compute the scope of an authenticated user
pub fn scope_for(user: &AuthUser) -> BranchScope {
    match (user.is_admin, user.branch_id) {
        (true, _) => BranchScope::Unrestricted,
        (false, Some(branch_id)) => BranchScope::Branch(branch_id),
        (false, None) => BranchScope::Nothing,
    }
}

impl BranchScope {
    /// Whether a row owned by `branch_id` is visible under this scope
    pub fn allows(&self, branch_id: Option<i64>) -> bool {
        match self {
            BranchScope::Unrestricted => true,
            BranchScope::Branch(allowed) => branch_id == Some(*allowed),
            BranchScope::Nothing => false,
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, BranchScope::Nothing)
    }
}

/// Reject callers without the admin flag
pub fn ensure_admin(user: &AuthUser) -> ApiResult<()> {
    if user.is_admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}
