//! Risk Scoring Engine
//!
//! Ingests risky user actions, detects recurring dangerous patterns within
//! sliding time windows, and computes a bounded 0-100 risk score per user
//! with human-readable justification.
//!
//! Flow: `AccionRiesgosa` -> `PatronDetectado` -> `ScoreRiesgoUsuario`
//! -> `AlertaOperativa`. Patterns and scores are always derivable from the
//! per-user action history; nothing downstream is persisted.

pub mod export;
pub mod patterns;
pub mod report;
pub mod scoring;
pub mod service;
pub mod types;

pub use export::ExportacionRiesgos;
pub use report::ReporteMensual;
pub use service::RiskManagementService;
pub use types::{
    AccionRiesgosa, AlertaOperativa, NivelAlerta, NivelRiesgo, PatronDetectado,
    ScoreRiesgoUsuario, TipoAccion, TipoPatron,
};
