//! Property tests for the snapshot file codec.
//!
//! 1. Arbitrary bytes never panic `decode_snapshot` (it returns `Err`).
//! 2. Any snapshot of tasks survives encode → decode.
//! 3. Truncating a valid frame anywhere is always rejected.

use chrono::NaiveDate;
use plandesk_proto::codec::{decode_snapshot, encode_snapshot};
use plandesk_proto::document::{Record, Snapshot};
use plandesk_proto::ids::{ProjectId, TaskId, UserId};
use plandesk_proto::revision::Revision;
use plandesk_proto::task::{Priority, Task, TaskStatus};
use proptest::prelude::*;
use uuid::Uuid;

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::NotStarted),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Done),
    ]
}

fn arb_task() -> impl Strategy<Value = Task> {
    (
        any::<u128>(),
        "[^\x00]{1,64}",
        arb_status(),
        prop::collection::vec(any::<u128>(), 0..4),
        prop::option::of(0u32..3650),
        any::<u64>(),
        "[a-z]{1,8}",
    )
        .prop_map(|(id, title, status, deps, due, at, author)| Task {
            id: TaskId::from_uuid(Uuid::from_u128(id)),
            project_id: ProjectId::from_uuid(Uuid::from_u128(7)),
            title,
            description: String::new(),
            status,
            priority: Priority::High,
            depends_on: deps
                .into_iter()
                .map(|d| TaskId::from_uuid(Uuid::from_u128(d)))
                .collect(),
            assignee: None,
            start_date: None,
            due_date: due.and_then(|days| {
                NaiveDate::from_ymd_opt(2020, 1, 1)
                    .and_then(|d| d.checked_add_days(chrono::Days::new(u64::from(days))))
            }),
            reminder_at: None,
            created_at: at,
            revision: Revision::new(at, UserId::new(author)),
        })
}

proptest! {
    #[test]
    fn random_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = decode_snapshot(&bytes);
    }

    #[test]
    fn task_snapshots_round_trip(tasks in prop::collection::vec(arb_task(), 0..16)) {
        let snapshot = Snapshot {
            records: tasks.into_iter().map(Record::Task).collect(),
        };
        let bytes = encode_snapshot(&snapshot).unwrap();
        prop_assert_eq!(decode_snapshot(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn truncated_frames_are_rejected(task in arb_task(), cut in any::<prop::sample::Index>()) {
        let snapshot = Snapshot { records: vec![Record::Task(task)] };
        let bytes = encode_snapshot(&snapshot).unwrap();
        let len = cut.index(bytes.len());
        prop_assert!(decode_snapshot(&bytes[..len]).is_err());
    }
}
