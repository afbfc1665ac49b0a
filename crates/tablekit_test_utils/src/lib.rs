//! Tablekit Test Utilities
//!
//! In-memory implementations of the engine's service contracts plus fixture
//! builders for schemas and rows. Everything here behaves like a small but
//! honest backend: filters, pagination, soft deletes and the error-cause
//! taxonomy all work, and failures can be injected per fake to exercise the
//! engine's error routing.
//!
//! ```rust,ignore
//! use tablekit_test_utils::{fixtures, InMemoryRows};
//!
//! #[tokio::test]
//! async fn lists_rows() {
//!     let rows = InMemoryRows::new();
//!     rows.seed("tasks", fixtures::row(&[("title", "write tests")]));
//!     // hand Arc::new(rows) to the engine under test
//! }
//! ```

pub mod fakes;
pub mod fixtures;

pub use fakes::{InMemoryFiles, InMemoryRows, InMemoryTables, OwnerOracle};
