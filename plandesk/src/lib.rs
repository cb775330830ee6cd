//! Project management core: tasks, dependency gate, team, budget and risks.

pub mod app;
pub mod budget;
pub mod calendar;
pub mod cli;
pub mod collection;
pub mod config;
pub mod gate;
pub mod notify;
pub mod projects;
pub mod reports;
pub mod risks;
pub mod scope;
pub mod session;
pub mod store;
pub mod sync;
pub mod tasks;
pub mod team;
