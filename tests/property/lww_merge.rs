//! Property tests for last-write-wins merging.
//!
//! 1. `merge_document` is commutative for distinct revisions.
//! 2. Merging is idempotent.
//! 3. A cache fed the same Added/Modified events in any order converges.

use std::collections::HashMap;

use plandesk::sync::{CollectionCache, merge_document, merge_document_list};
use plandesk_proto::document::{ChangeEvent, ChangeKind, Document};
use plandesk_proto::ids::{ProjectId, TaskId, UserId};
use plandesk_proto::revision::Revision;
use plandesk_proto::task::Task;
use proptest::prelude::*;
use uuid::Uuid;

fn version(doc: u128, at: u64, by: &str, title: &str) -> Task {
    let mut task = Task::new(
        ProjectId::from_uuid(Uuid::from_u128(1)),
        title,
        &UserId::new("seed"),
    );
    task.id = TaskId::from_uuid(Uuid::from_u128(doc + 1));
    task.created_at = 0;
    task.revision = Revision::new(at, UserId::new(by));
    task
}

/// Versions of up to three documents. Titles are derived from the
/// revision so equal revisions always carry equal content.
fn arb_versions() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec((0u128..3, 0u64..20, "[a-c]"), 1..12).prop_map(|raw| {
        raw.into_iter()
            .map(|(doc, at, by)| version(doc, at, &by, &format!("{doc}-{at}-{by}")))
            .collect()
    })
}

fn sorted(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by_key(|t| t.id);
    tasks
}

proptest! {
    #[test]
    fn merge_is_commutative(a in 0u64..10, b in 0u64..10, x in "[a-c]", y in "[a-c]") {
        let left = version(0, a, &x, &format!("{a}-{x}"));
        let right = version(0, b, &y, &format!("{b}-{y}"));
        prop_assert_eq!(merge_document(&left, &right), merge_document(&right, &left));
    }

    #[test]
    fn merge_is_idempotent(versions in arb_versions()) {
        let mut local = HashMap::new();
        merge_document_list(&mut local, &versions);
        let once = local.clone();
        prop_assert_eq!(merge_document_list(&mut local, &versions), 0);
        prop_assert_eq!(local, once);
    }

    #[test]
    fn cache_converges_regardless_of_order(versions in arb_versions()) {
        let mut forward = CollectionCache::<Task>::new();
        let mut backward = CollectionCache::<Task>::new();
        for task in &versions {
            forward.apply(&ChangeEvent::new(ChangeKind::Modified, task.clone().into_record()));
        }
        for task in versions.iter().rev() {
            backward.apply(&ChangeEvent::new(ChangeKind::Added, task.clone().into_record()));
        }
        prop_assert_eq!(sorted(forward.to_vec()), sorted(backward.to_vec()));
    }
}
