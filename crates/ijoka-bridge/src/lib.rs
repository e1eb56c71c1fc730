//! HTTP Adapter (spec.md §4.12): a thin axum surface over `ijoka-core` and
//! `ijoka-analytics`. Every handler here is a translation from JSON/query
//! params to a core function call and back -- no domain logic lives in
//! this crate.

pub mod api_error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod types;
mod util;

pub use router::api_router;
pub use state::ApiState;
