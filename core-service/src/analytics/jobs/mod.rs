//! Aggregation jobs
//!
//! One job per metric family. Jobs are independent of each other, write to
//! disjoint key spaces, and are safe to re-invoke for the same key (the
//! service upserts). Errors always propagate to the caller so the trigger
//! can record or retry the run.

pub mod alertas;
pub mod autonomia;
pub mod ia;
pub mod productividad;
pub mod scheduler;

use chrono::NaiveDate;

use crate::error::Result;

pub use alertas::AlertasJob;
pub use autonomia::AutonomiaJob;
pub use ia::IaJob;
pub use productividad::ProductividadJob;
pub use scheduler::JobScheduler;

/// A periodic aggregation job. `fecha` defaults to the current date when
/// omitted, which is the normal case for the hourly trigger.
pub trait AnalyticsJob: Send + Sync {
    fn nombre(&self) -> &'static str;

    fn ejecutar(&self, empresa_id: i64, fecha: Option<NaiveDate>) -> Result<()>;
}

/// Resolve the effective fecha of a run.
pub(crate) fn fecha_efectiva(fecha: Option<NaiveDate>) -> NaiveDate {
    fecha.unwrap_or_else(|| chrono::Utc::now().date_naive())
}
