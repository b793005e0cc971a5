//! Recompute scheduling via explicit dependency versions.
//!
//! # Responsibility
//! - Track one monotonic version per record category.
//! - Let the presenting layer decide "rebuild or reuse" by comparing the
//!   current versions with the versions captured at the last build.
//!
//! # Invariants
//! - Counters only ever increase.
//! - Staleness is a whole-stamp comparison; no category is privileged.

use crate::model::artifact::ArtifactKind;

/// Record category whose mutation invalidates the projected graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeCategory {
    Tasks,
    Notes,
    Attachments,
    UrlMarks,
}

impl From<ArtifactKind> for ChangeCategory {
    fn from(kind: ArtifactKind) -> Self {
        match kind {
            ArtifactKind::Note => Self::Notes,
            ArtifactKind::Attachment => Self::Attachments,
            ArtifactKind::UrlMark => Self::UrlMarks,
        }
    }
}

/// Immutable snapshot of all category versions at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeStamp {
    pub tasks: u64,
    pub notes: u64,
    pub attachments: u64,
    pub url_marks: u64,
}

/// Monotonic per-category version counters.
#[derive(Debug, Default)]
pub struct ChangeCounters {
    current: ChangeStamp,
}

impl ChangeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one mutation in `category`.
    pub fn bump(&mut self, category: ChangeCategory) {
        match category {
            ChangeCategory::Tasks => self.current.tasks += 1,
            ChangeCategory::Notes => self.current.notes += 1,
            ChangeCategory::Attachments => self.current.attachments += 1,
            ChangeCategory::UrlMarks => self.current.url_marks += 1,
        }
    }

    /// Records one mutation in the category matching an artifact kind.
    pub fn bump_kind(&mut self, kind: ArtifactKind) {
        self.bump(kind.into());
    }

    /// Captures the current versions.
    pub fn stamp(&self) -> ChangeStamp {
        self.current
    }

    /// Returns whether any category moved since `rendered` was captured.
    pub fn changed_since(&self, rendered: ChangeStamp) -> bool {
        self.current != rendered
    }
}
