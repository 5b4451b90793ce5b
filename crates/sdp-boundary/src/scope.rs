//! §4.4 Scope Boundary Guard.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeVerdict {
    pub pass: bool,
    pub violations: Vec<String>,
}

/// Classify `changed_paths` against `scope_prefixes`. A path is in-scope if
/// it exactly equals, or has as a path-prefix, any declared entry. An empty
/// `scope_prefixes` means unconstrained: nothing is out-of-scope.
#[must_use]
pub fn check_scope(changed_paths: &[String], scope_prefixes: &[String]) -> ScopeVerdict {
    if scope_prefixes.is_empty() {
        return ScopeVerdict {
            pass: true,
            violations: Vec::new(),
        };
    }

    let violations: Vec<String> = changed_paths
        .iter()
        .filter(|path| !is_in_scope(path, scope_prefixes))
        .cloned()
        .collect();

    ScopeVerdict {
        pass: violations.is_empty(),
        violations,
    }
}

fn is_in_scope(path: &str, scope_prefixes: &[String]) -> bool {
    scope_prefixes.iter().any(|prefix| {
        let prefix = prefix.trim_end_matches('/');
        path == prefix || path.starts_with(&format!("{prefix}/"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_declared_prefixes_is_unconstrained() {
        let verdict = check_scope(&["anything/at/all.rs".to_string()], &[]);
        assert!(verdict.pass);
        assert!(verdict.violations.is_empty());
    }

    #[test]
    fn exact_match_is_in_scope() {
        let verdict = check_scope(&["cmd/guard/main.go".to_string()], &["cmd/guard/main.go".to_string()]);
        assert!(verdict.pass);
    }

    #[test]
    fn prefix_match_is_in_scope() {
        let verdict = check_scope(
            &["internal/guard/scope.go".to_string()],
            &["internal/guard".to_string()],
        );
        assert!(verdict.pass);
    }

    #[test]
    fn out_of_scope_path_fails_and_is_reported() {
        let verdict = check_scope(
            &["internal/guard/scope.go".to_string(), "internal/other/file.go".to_string()],
            &["internal/guard".to_string()],
        );
        assert!(!verdict.pass);
        assert_eq!(verdict.violations, vec!["internal/other/file.go".to_string()]);
    }

    #[test]
    fn prefix_does_not_match_sibling_directory_with_shared_prefix_string() {
        let verdict = check_scope(&["internal/guardian/x.go".to_string()], &["internal/guard".to_string()]);
        assert!(!verdict.pass);
    }
}
