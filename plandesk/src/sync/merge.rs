//! Pure last-write-wins merge functions.
//!
//! Merging is commutative, associative and idempotent: any two replicas that
//! have seen the same set of document versions hold the same documents.

use std::collections::HashMap;
use std::hash::BuildHasher;

use plandesk_proto::document::Document;

/// Merges two versions of the same document, returning the winner.
///
/// Rules (in priority order):
/// 1. Higher revision timestamp wins.
/// 2. Equal timestamps: higher author (lexicographic) wins.
/// 3. Equal revisions: local wins (idempotent).
#[must_use]
pub fn merge_document<T: Document>(local: &T, remote: &T) -> T {
    if remote.revision().supersedes(local.revision()) {
        remote.clone()
    } else {
        local.clone()
    }
}

/// Merges a list of remote documents into a local map.
///
/// For each remote document:
/// - If it exists locally, keep whichever version wins [`merge_document`].
/// - If it is new, add it.
///
/// Returns the number of local entries that changed.
pub fn merge_document_list<T: Document, S: BuildHasher>(
    local: &mut HashMap<T::Id, T, S>,
    remote: &[T],
) -> usize {
    let mut changed = 0;
    for doc in remote {
        match local.get_mut(&doc.id()) {
            Some(existing) => {
                if doc.revision().supersedes(existing.revision()) {
                    *existing = doc.clone();
                    changed += 1;
                }
            }
            None => {
                local.insert(doc.id(), doc.clone());
                changed += 1;
            }
        }
    }
    changed
}
