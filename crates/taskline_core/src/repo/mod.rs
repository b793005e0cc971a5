//! Record Store contracts and persistence implementations.
//!
//! # Responsibility
//! - Define the store interface the timeline core consumes.
//! - Isolate SQLite query details from graph/service orchestration.
//!
//! # Invariants
//! - Read APIs return deterministic orderings so projection is idempotent.
//! - Mutations either fully apply or return an error; no partial owner
//!   writes are observable.

pub mod record_store;
pub mod sqlite_store;
