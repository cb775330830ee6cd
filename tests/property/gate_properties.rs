//! Property tests for the dependency gate.
//!
//! 1. A task without prerequisites may always move.
//! 2. A gated move is rejected exactly when some known prerequisite is not
//!    Done, and every reported blocker is such a prerequisite.
//! 3. Ungated moves are never rejected.
//! 4. The decision is a pure function of its inputs.

use plandesk::gate::{GateDecision, check_transition, is_gated};
use plandesk_proto::ids::{ProjectId, TaskId, UserId};
use plandesk_proto::task::{Task, TaskStatus};
use proptest::prelude::*;
use uuid::Uuid;

const POOL: u128 = 6;

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::NotStarted),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Done),
    ]
}

fn id(n: u128) -> TaskId {
    TaskId::from_uuid(Uuid::from_u128(n + 1))
}

fn project() -> ProjectId {
    ProjectId::from_uuid(Uuid::from_u128(99))
}

/// Six prerequisite candidates with random statuses.
fn arb_pool() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(arb_status(), POOL as usize).prop_map(|statuses| {
        statuses
            .into_iter()
            .enumerate()
            .map(|(i, status)| {
                let mut task = Task::new(project(), format!("T{i}"), &UserId::new("u"));
                task.id = id(i as u128);
                task.status = status;
                task
            })
            .collect()
    })
}

/// Subject task depending on pool members and on ids no task has.
fn arb_subject() -> impl Strategy<Value = Task> {
    (arb_status(), prop::collection::vec(0..POOL + 3, 0..5)).prop_map(|(status, deps)| {
        let mut task = Task::new(project(), "Subject", &UserId::new("u"));
        task.id = id(1_000);
        task.status = status;
        task.depends_on = deps.into_iter().map(id).collect();
        task
    })
}

proptest! {
    #[test]
    fn no_prerequisites_always_permitted(
        from in arb_status(),
        to in arb_status(),
        pool in arb_pool(),
    ) {
        let mut task = Task::new(project(), "Free", &UserId::new("u"));
        task.status = from;
        prop_assert!(check_transition(&task, to, &pool).is_permitted());
    }

    #[test]
    fn rejected_iff_known_prerequisite_incomplete(
        subject in arb_subject(),
        to in arb_status(),
        pool in arb_pool(),
    ) {
        let incomplete: Vec<TaskId> = subject
            .depends_on
            .iter()
            .copied()
            .filter(|dep| pool.iter().any(|t| t.id == *dep && t.status != TaskStatus::Done))
            .collect();
        let expect_reject = is_gated(subject.status, to) && !incomplete.is_empty();

        match check_transition(&subject, to, &pool) {
            GateDecision::Permitted => prop_assert!(!expect_reject),
            GateDecision::Rejected(rejection) => {
                prop_assert!(expect_reject);
                prop_assert_eq!(rejection.task_id, subject.id);
                prop_assert_eq!(rejection.requested, to);
                prop_assert!(rejection.cycle.is_none());
                for blocker in &rejection.blocked_by {
                    prop_assert!(incomplete.contains(&blocker.id));
                    prop_assert_ne!(blocker.status, TaskStatus::Done);
                }
                for dep in &incomplete {
                    prop_assert!(rejection.blocked_by.iter().any(|b| b.id == *dep));
                }
            }
        }
    }

    #[test]
    fn ungated_moves_never_rejected(
        subject in arb_subject(),
        to in arb_status(),
        pool in arb_pool(),
    ) {
        prop_assume!(!is_gated(subject.status, to));
        prop_assert!(check_transition(&subject, to, &pool).is_permitted());
    }

    #[test]
    fn decision_is_deterministic(
        subject in arb_subject(),
        to in arb_status(),
        pool in arb_pool(),
    ) {
        let first = check_transition(&subject, to, &pool);
        let second = check_transition(&subject, to, &pool);
        prop_assert_eq!(first, second);
    }
}
