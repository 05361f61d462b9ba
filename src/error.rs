//! Error surface for the simulation kernel.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type SimResult<T> = Result<T, SimError>;

/// The two error kinds the core can produce.
///
/// Everything else (ledger underflow, releasing a facility you don't hold,
/// a capacity request larger than the store itself) is a programming error
/// and is reported via `assert!`/`panic!` rather than `Result`, matching the
/// source's "assertable" defects.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    #[error("operation requires Init to have completed successfully first")]
    NotInitialized,

    #[error("invalid Init arguments: t0={t0}, t1={t1} (require 0 <= t0 <= t1)")]
    InvalidArgs { t0: f64, t1: f64 },
}

impl SimError {
    /// Matches the source's two-bucket error taxonomy (`GLOB_NOTINIT` / `GLOB_INVAL`).
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, SimError::NotInitialized)
    }

    pub fn is_invalid_args(&self) -> bool {
        matches!(self, SimError::InvalidArgs { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_initialized_message() {
        let e = SimError::NotInitialized;
        assert!(e.is_not_initialized());
        assert!(!e.is_invalid_args());
        assert_eq!(e.to_string(), "operation requires Init to have completed successfully first");
    }

    #[test]
    fn invalid_args_carries_values() {
        let e = SimError::InvalidArgs { t0: 5.0, t1: 3.0 };
        assert!(e.is_invalid_args());
        assert!(e.to_string().contains("t0=5"));
    }
}
