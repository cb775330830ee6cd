//! Client-side mirrors of store collections.
//!
//! A view subscribes to one collection filtered by project id and keeps a
//! local copy up to date from the change feed. Events can arrive late or
//! twice, so every write is resolved last-write-wins on the document's
//! [`Revision`](plandesk_proto::revision::Revision).

pub mod cache;
pub mod live;
pub mod merge;

pub use cache::CollectionCache;
pub use live::LiveCollection;
pub use merge::{merge_document, merge_document_list};
