//! Structured logging for Ijoka's services (`ijoka-bridge`, `ijoka-cli`).
//!
//! Every core operation that mutates graph state logs at `debug`/`info`
//! with the entity id and kind of transition as fields, never as a format
//! string, so logs stay greppable/queryable downstream.

pub mod logging;
