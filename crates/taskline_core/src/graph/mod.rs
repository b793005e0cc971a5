//! Timeline graph projection.
//!
//! # Responsibility
//! - Project the current task/artifact record set into a `{nodes, edges}`
//!   snapshot for the canvas.
//! - Interpret user-drawn connections as ownership mutations.
//!
//! # Invariants
//! - Projection is a pure function of its input: identical records yield
//!   identical node/edge sets, including positions.
//! - Every rebuild replaces the whole node/edge set; nodes are never
//!   patched in place.
//! - No artifact appears as more than one node.

pub mod build;
pub mod classify;
pub mod layout;
pub mod node;
