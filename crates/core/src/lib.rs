//! Domain layer of the StudioAI client: wire models, plan entitlements,
//! navigation guards and view-layer state machines. No I/O.

pub mod approval;
pub mod episode_tabs;
pub mod error;
pub mod files;
pub mod format;
pub mod models;
pub mod plan;
pub mod routes;
pub mod types;
pub mod wizard;
