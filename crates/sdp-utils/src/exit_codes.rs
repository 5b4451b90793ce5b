//! Stable process exit codes. Every error kind in the taxonomy (see the root
//! crate's `error` module) maps to exactly one of these.

/// Process exit code, stable across releases so that scripted callers
/// (CI, the surrounding tool) can branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExitCode {
    /// Phase completed, or `Advance` succeeded.
    Success,
    /// Malformed feature/workstream identifier, bad configuration, or a
    /// workstream-discovery failure (missing files, a dependency cycle).
    IdentifierError,
    /// Scope boundary violation: an out-of-scope path was touched.
    ScopeViolation,
    /// Attempted an undeclared FSM transition, or its guard failed.
    FsmViolation,
    /// Context hydration failed (fail-safe: worker never invoked).
    HydrationError,
    /// A phase ran longer than its configured timeout.
    PhaseTimeout,
    /// Worker, CI tool or platform CLI exited non-zero after retries.
    SubprocessError,
    /// Any other fatal error.
    Other,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::IdentifierError => 2,
            Self::ScopeViolation => 4,
            Self::FsmViolation => 5,
            Self::HydrationError => 9,
            Self::PhaseTimeout => 10,
            Self::SubprocessError => 70,
            Self::Other => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_zero_everything_else_nonzero() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        for code in [
            ExitCode::IdentifierError,
            ExitCode::ScopeViolation,
            ExitCode::FsmViolation,
            ExitCode::HydrationError,
            ExitCode::PhaseTimeout,
            ExitCode::SubprocessError,
            ExitCode::Other,
        ] {
            assert_ne!(code.as_i32(), 0);
        }
    }

    #[test]
    fn matches_declared_table() {
        assert_eq!(ExitCode::IdentifierError.as_i32(), 2);
        assert_eq!(ExitCode::ScopeViolation.as_i32(), 4);
        assert_eq!(ExitCode::FsmViolation.as_i32(), 5);
        assert_eq!(ExitCode::HydrationError.as_i32(), 9);
        assert_eq!(ExitCode::PhaseTimeout.as_i32(), 10);
        assert_eq!(ExitCode::SubprocessError.as_i32(), 70);
        assert_eq!(ExitCode::Other.as_i32(), 1);
    }
}
