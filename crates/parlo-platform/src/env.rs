//! Environment variable abstraction.
//!
//! Config discovery reads `PARLO_CONFIG` through [`Environment`] so tests
//! can supply an in-memory map instead of mutating the process environment.

/// Read-only environment access.
pub trait Environment: Send + Sync {
    /// Value of `name`, or `None` if unset.
    fn get_var(&self, name: &str) -> Option<String>;
}

/// Process environment via [`std::env`].
pub struct NativeEnvironment;

impl Environment for NativeEnvironment {
    fn get_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}
