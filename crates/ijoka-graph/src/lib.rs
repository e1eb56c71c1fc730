//! Graph Store Gateway (spec.md §4.1).
//!
//! The only component that talks to the store. Exposes two operations --
//! read query and write query -- behind a typed Rust API; callers never see
//! SQL. The engine itself is a property-graph layer over SQLite
//! (`rusqlite`/`tokio-rusqlite`): nodes are rows in per-label tables, edges
//! are rows in a generic `edges(kind, src_id, dst_id, props)` table. See
//! SPEC_FULL.md §C for why SQLite rather than a dedicated graph database.

pub mod edges;
pub mod error;
pub mod gateway;
pub mod nodes;
pub mod schema;

pub use error::GraphError;
pub use gateway::GraphGateway;
