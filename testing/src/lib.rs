//! # Todo Client Testing
//!
//! Testing utilities and helpers for the todo client.
//!
//! This crate provides:
//! - Mock implementations of Environment traits ([`FixedClock`])
//! - An in-memory document store with failure injection ([`InMemoryTodoStore`])
//! - A Given-When-Then reducer harness ([`ReducerTest`])
//! - proptest strategies for drafts and fields ([`properties`])
//!
//! ## Example
//!
//! ```ignore
//! use todo_client_testing::{InMemoryTodoStore, test_clock};
//!
//! #[tokio::test]
//! async fn creates_an_item() {
//!     let store = Arc::new(InMemoryTodoStore::new());
//!     let client = TodoClient::new(TodoEnvironment::new(Arc::new(test_clock()), store.clone()));
//!
//!     client.set_draft(Draft::new("Buy milk", "2%, 1 gallon", "2024-06-01T10:00")).await?;
//!     client.create().await?;
//!
//!     assert_eq!(store.len(), 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use todo_client_core::environment::Clock;

pub mod in_memory_store;

pub use in_memory_store::{CallCounts, InMemoryTodoStore};
pub use reducer_test::{ReducerTest, assertions, collect_actions};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use todo_client_testing::mocks::FixedClock;
    /// use todo_client_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(20_089))
    }
}

/// Property-based testing utilities
///
/// Strategies producing form input the entry form would accept.
pub mod properties {
    use proptest::prelude::*;
    use todo_client_core::todo::{Draft, TodoFields};

    /// Non-blank single-line text
    pub fn arb_title() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 ,.%!?-]{0,40}"
    }

    /// Non-blank text that may span several lines
    pub fn arb_details() -> impl Strategy<Value = String> {
        proptest::collection::vec("[A-Za-z0-9][A-Za-z0-9 ,.%]{0,30}", 1..4)
            .prop_map(|lines| lines.join("\n"))
    }

    /// A `datetime-local` value with minute precision
    pub fn arb_due_date() -> impl Strategy<Value = String> {
        (2000i32..2100, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60).prop_map(
            |(year, month, day, hour, minute)| {
                format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}")
            },
        )
    }

    /// A draft that passes validation
    pub fn arb_draft() -> impl Strategy<Value = Draft> {
        (arb_title(), arb_details(), arb_due_date())
            .prop_map(|(title, details, due_date)| Draft::new(title, details, due_date))
    }

    /// Valid update fields
    pub fn arb_fields() -> impl Strategy<Value = TodoFields> {
        arb_draft().prop_filter_map("draft should validate", |draft| draft.validate().ok())
    }
}

/// Installs a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn test_clock_is_new_year_2025() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single();
        assert_eq!(Some(test_clock().now()), expected);
    }
}
