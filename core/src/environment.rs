//! Dependency injection traits and the todo environment.
//!
//! All external dependencies of the domain are abstracted behind traits and
//! injected via the environment parameter of the reducer and the store
//! boundary. Production uses the system clock and random UUIDs; tests inject
//! fixed clocks and sequential ids from the `todolist-testing` crate.

use crate::todo::TodoId;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Clock trait - abstracts time operations for testability
///
/// # Examples
///
/// ```
/// use todolist_core::environment::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let now = clock.now();
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Id generation trait - abstracts id assignment for testability.
///
/// The store boundary generates ids through this trait so that callers never
/// choose identifiers themselves and tests get predictable ones.
pub trait IdGenerator: Send + Sync {
    /// Generate a fresh, unique id
    fn generate(&self) -> TodoId;
}

/// Production id generator backed by random v4 UUIDs
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self) -> TodoId {
        TodoId::new()
    }
}

/// Environment dependencies for the todo store
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Clock for persistence health timestamps
    pub clock: Arc<dyn Clock>,
    /// Generator for ids assigned at creation
    pub id_generator: Arc<dyn IdGenerator>,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, id_generator: Arc<dyn IdGenerator>) -> Self {
        Self {
            clock,
            id_generator,
        }
    }

    /// Environment wired with production implementations
    #[must_use]
    pub fn production() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(UuidIdGenerator))
    }
}

impl std::fmt::Debug for TodoEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoEnvironment").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_generator_yields_unique_ids() {
        let generator = UuidIdGenerator;
        assert_ne!(generator.generate(), generator.generate());
    }
}
