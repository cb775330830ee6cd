//! Shared document model for `plandesk`.
//!
//! Every collection the store holds (projects, tasks, team members, budget
//! items, risks) is defined here, together with the change events the store
//! emits and the snapshot codec used for the on-disk data file.

pub mod budget;
pub mod codec;
pub mod document;
pub mod ids;
pub mod project;
pub mod revision;
pub mod risk;
pub mod task;
pub mod team;
