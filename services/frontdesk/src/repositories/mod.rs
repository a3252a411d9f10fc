//! PostgreSQL implementations of the store traits

pub mod branch;
pub mod user;
pub mod visit;

pub use branch::PgBranchRepository;
pub use user::PgUserRepository;
pub use visit::PgVisitRepository;

use sqlx::{Postgres, QueryBuilder};

use crate::scope::BranchScope;

/// Append `AND <column> = <branch>` (or `AND FALSE`) for a scope
pub(crate) fn push_scope(
    builder: &mut QueryBuilder<'_, Postgres>,
    column: &str,
    scope: BranchScope,
) {
    match scope {
        BranchScope::Unrestricted => {}
        BranchScope::Branch(branch_id) => {
            builder.push(" AND ").push(column).push(" = ").push_bind(branch_id);
        }
        BranchScope::Nothing => {
            builder.push(" AND FALSE");
        }
    }
}

/// `%term%` for `ILIKE .. ESCAPE '\'`, with the term's wildcards taken literally
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(scope: BranchScope) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM visits v WHERE TRUE");
        push_scope(&mut builder, "v.branch_id", scope);
        builder.sql().to_string()
    }

    #[test]
    fn test_push_scope() {
        assert_eq!(
            render(BranchScope::Unrestricted),
            "SELECT 1 FROM visits v WHERE TRUE"
        );
        assert_eq!(
            render(BranchScope::Branch(2)),
            "SELECT 1 FROM visits v WHERE TRUE AND v.branch_id = $1"
        );
        assert_eq!(
            render(BranchScope::Nothing),
            "SELECT 1 FROM visits v WHERE TRUE AND FALSE"
        );
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("ann"), "%ann%");
        assert_eq!(contains_pattern("_"), r"%\_%");
        assert_eq!(contains_pattern("50%"), r"%50\%%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
