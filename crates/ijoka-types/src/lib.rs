//! Domain model for Ijoka -- entities, enumerations, and pure validation.
//!
//! This crate has no I/O. It defines the typed shape of every node and edge
//! kind in the attribution graph (Project, Session, Feature, Step, Event,
//! StatusEvent, Commit, Insight) and the closed enumerations that appear on
//! them. Everything here is `Serialize`/`Deserialize` so it can cross the
//! Graph Store Gateway and the HTTP/CLI adapters without re-encoding.

pub mod commit;
pub mod edge;
pub mod enums;
pub mod error;
pub mod event;
pub mod feature;
pub mod insight;
pub mod project;
pub mod session;
pub mod status_event;
pub mod step;
pub mod validate;

pub use commit::Commit;
pub use edge::{DependsOnKind, EdgeKind};
pub use enums::{
    EventType, FeatureCategory, FeatureStatus, InsightPatternType, SessionStatus, StepStatus,
    WorkItemType,
};
pub use error::ValidationError;
pub use event::Event;
pub use feature::{CompletionCriteria, Feature};
pub use insight::Insight;
pub use project::Project;
pub use session::Session;
pub use status_event::StatusEvent;
pub use step::Step;
