//! Core orchestration layer: Project & Session lifecycle, Feature store,
//! Claim Arbiter, Attribution Engine, Plan/Step Engine, Auto-Completion &
//! Nudges, Stuckness Detector, and Discover/Re-attribution.
//!
//! This crate is transport-agnostic -- `ijoka-bridge` and `ijoka-cli` are
//! thin adapters over the functions exposed here, same as the teacher's
//! `at-agents` sits underneath `at-bridge`/`at-cli`.

pub mod attribution;
pub mod background_shells;
pub mod claim_arbiter;
pub mod config;
pub mod discover;
pub mod error;
pub mod feature_store;
pub mod hooks;
pub mod insights;
pub mod nudges;
pub mod plan_step;
pub mod project_session;
pub mod stopwords;
pub mod stuckness;
pub mod text;

pub use config::Config;
pub use error::CoreError;
