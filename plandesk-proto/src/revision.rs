//! Per-document write metadata and the last-write-wins ordering.

use std::cmp::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Returns the current time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> u64 {
    u64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis(),
    )
    .unwrap_or(u64::MAX)
}

/// Describes the last write applied to a document.
///
/// Ordering rule:
/// 1. Higher `at` wins.
/// 2. Equal `at`: higher `by` (lexicographic) wins.
/// 3. Equal revisions are the same write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Revision {
    /// Milliseconds since epoch when the write happened.
    pub at: u64,
    /// User that performed the write.
    pub by: UserId,
}

impl Revision {
    /// Creates a revision for a write by `by` at time `at`.
    #[must_use]
    pub const fn new(at: u64, by: UserId) -> Self {
        Self { at, by }
    }

    /// Creates a revision stamped with the current wall-clock time.
    #[must_use]
    pub fn now(by: &UserId) -> Self {
        Self::new(now_ms(), by.clone())
    }

    /// Returns `true` if `self` strictly supersedes `other`.
    #[must_use]
    pub fn supersedes(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Greater
    }

    /// Returns the revision for a follow-up write by `by`.
    ///
    /// The timestamp never goes backwards relative to `self`, so a local
    /// edit always supersedes the revision it was based on even when the
    /// wall clock lags behind the previous writer.
    #[must_use]
    pub fn next(&self, by: &UserId) -> Self {
        let at = now_ms().max(self.at.saturating_add(1));
        Self::new(at, by.clone())
    }
}

impl PartialOrd for Revision {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Revision {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.cmp(&other.at).then_with(|| self.by.cmp(&other.by))
    }
}
