//! Collections, the type-erased [`Record`] the store holds, and change events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::budget::BudgetItem;
use crate::ids::{BudgetItemId, MemberId, ProjectId, RiskId, TaskId};
use crate::project::Project;
use crate::revision::Revision;
use crate::risk::Risk;
use crate::task::Task;
use crate::team::TeamMember;

/// The collections a project is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    /// Project documents.
    Projects,
    /// Task documents.
    Tasks,
    /// Team member documents.
    Team,
    /// Budget item documents.
    Budget,
    /// Risk documents.
    Risks,
}

impl CollectionKind {
    /// Every collection, projects first.
    pub const ALL: [Self; 5] = [
        Self::Projects,
        Self::Tasks,
        Self::Team,
        Self::Budget,
        Self::Risks,
    ];
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Projects => write!(f, "projects"),
            Self::Tasks => write!(f, "tasks"),
            Self::Team => write!(f, "team"),
            Self::Budget => write!(f, "budget"),
            Self::Risks => write!(f, "risks"),
        }
    }
}

/// Address of a document: its collection plus its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocKey {
    /// Collection the document lives in.
    pub kind: CollectionKind,
    /// Document id.
    pub id: Uuid,
}

impl DocKey {
    /// Builds a key from its parts.
    #[must_use]
    pub const fn new(kind: CollectionKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

impl std::fmt::Display for DocKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Any document the store can hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    /// A project.
    Project(Project),
    /// A task.
    Task(Task),
    /// A team member.
    Member(TeamMember),
    /// A budget item.
    BudgetItem(BudgetItem),
    /// A risk.
    Risk(Risk),
}

impl Record {
    /// Collection this record belongs to.
    #[must_use]
    pub const fn kind(&self) -> CollectionKind {
        match self {
            Self::Project(_) => CollectionKind::Projects,
            Self::Task(_) => CollectionKind::Tasks,
            Self::Member(_) => CollectionKind::Team,
            Self::BudgetItem(_) => CollectionKind::Budget,
            Self::Risk(_) => CollectionKind::Risks,
        }
    }

    /// Storage key of this record.
    #[must_use]
    pub const fn key(&self) -> DocKey {
        let id = match self {
            Self::Project(p) => *p.id.as_uuid(),
            Self::Task(t) => *t.id.as_uuid(),
            Self::Member(m) => *m.id.as_uuid(),
            Self::BudgetItem(b) => *b.id.as_uuid(),
            Self::Risk(r) => *r.id.as_uuid(),
        };
        DocKey::new(self.kind(), id)
    }

    /// Project the record is scoped to. A project is scoped to itself.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        match self {
            Self::Project(p) => p.id,
            Self::Task(t) => t.project_id,
            Self::Member(m) => m.project_id,
            Self::BudgetItem(b) => b.project_id,
            Self::Risk(r) => r.project_id,
        }
    }

    /// Last write applied to the record.
    #[must_use]
    pub const fn revision(&self) -> &Revision {
        match self {
            Self::Project(p) => &p.revision,
            Self::Task(t) => &t.revision,
            Self::Member(m) => &m.revision,
            Self::BudgetItem(b) => &b.revision,
            Self::Risk(r) => &r.revision,
        }
    }
}

/// A concrete document type stored in one collection.
///
/// Lets services work with typed documents while the store deals only in
/// [`Record`]s.
pub trait Document: Clone + Send + Sync + 'static {
    /// Id type of the document.
    type Id: Copy + Eq + std::hash::Hash + std::fmt::Display + Send + Sync;

    /// Collection the document lives in.
    const KIND: CollectionKind;

    /// Typed document id.
    fn id(&self) -> Self::Id;

    /// Untyped id as used in [`DocKey`].
    fn uuid(id: Self::Id) -> Uuid;

    /// Last write applied to the document.
    fn revision(&self) -> &Revision;

    /// Wraps the document in a [`Record`].
    fn into_record(self) -> Record;

    /// Extracts the document from a [`Record`] of the matching variant.
    fn from_record(record: Record) -> Option<Self>;

    /// Storage key of the document.
    fn key(&self) -> DocKey {
        DocKey::new(Self::KIND, Self::uuid(self.id()))
    }
}

macro_rules! impl_document {
    ($ty:ty, $id:ty, $kind:expr, $variant:ident) => {
        impl Document for $ty {
            type Id = $id;

            const KIND: CollectionKind = $kind;

            fn id(&self) -> Self::Id {
                self.id
            }

            fn uuid(id: Self::Id) -> Uuid {
                *id.as_uuid()
            }

            fn revision(&self) -> &Revision {
                &self.revision
            }

            fn into_record(self) -> Record {
                Record::$variant(self)
            }

            fn from_record(record: Record) -> Option<Self> {
                match record {
                    Record::$variant(doc) => Some(doc),
                    _ => None,
                }
            }
        }
    };
}

impl_document!(Project, ProjectId, CollectionKind::Projects, Project);
impl_document!(Task, TaskId, CollectionKind::Tasks, Task);
impl_document!(TeamMember, MemberId, CollectionKind::Team, Member);
impl_document!(BudgetItem, BudgetItemId, CollectionKind::Budget, BudgetItem);
impl_document!(Risk, RiskId, CollectionKind::Risks, Risk);

/// What happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// The document did not exist before.
    Added,
    /// An existing document was overwritten.
    Modified,
    /// The document was deleted.
    Removed,
}

/// A change pushed to subscribers of a collection.
///
/// For [`ChangeKind::Removed`] the record is the last version before the
/// delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Kind of change.
    pub kind: ChangeKind,
    /// The document after (or, for removals, before) the change.
    pub record: Record,
}

impl ChangeEvent {
    /// Creates a change event.
    #[must_use]
    pub const fn new(kind: ChangeKind, record: Record) -> Self {
        Self { kind, record }
    }
}

/// Every document in a store, used for persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// All records, in no particular order.
    pub records: Vec<Record>,
}
