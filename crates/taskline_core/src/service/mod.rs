//! Timeline use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls, change tracking and graph rebuilds behind
//!   the command surface the UI shell consumes.
//! - Keep the shell decoupled from storage and projection details.

pub mod intake;
pub mod timeline_service;
