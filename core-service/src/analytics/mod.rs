//! Analytics Aggregation Pipeline
//!
//! Independent jobs compute one metric family each (productivity, alerts,
//! AI suggestions, autonomy) from operational sources and persist dated
//! read-model rows through the `AnalyticsService`. Rows are upserts keyed
//! by (empresa_id, fecha[, dimension]) so re-running a job supersedes the
//! previous run instead of duplicating it.

pub mod jobs;
pub mod service;
pub mod sources;
pub mod store;
pub mod types;

pub use service::AnalyticsService;
pub use store::AnalyticsStore;
pub use types::{FilaAlertas, FilaAutonomia, FilaIa, FilaProductividad};
