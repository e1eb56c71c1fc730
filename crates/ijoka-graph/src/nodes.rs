//! Typed CRUD over each node label. Each submodule owns the SQL for one
//! table and the row <-> domain-type mapping; nothing outside this crate
//! writes SQL directly (spec.md §4.1: "the Gateway is the ONLY component
//! that talks to the store").

pub mod commits;
pub mod events;
pub mod features;
pub mod insights;
pub mod projects;
pub mod sessions;
pub mod status_events;
pub mod steps;
