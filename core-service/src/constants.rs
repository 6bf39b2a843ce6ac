//! Central Configuration Constants
//!
//! Single source of truth for scoring weights, detection windows and
//! scheduler defaults. To tune the risk engine, only edit this file.

use std::path::PathBuf;

/// App name
pub const APP_NAME: &str = "FincaFácil";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================
// Risk scoring
// ============================================

/// Trailing window over which individual actions contribute to the score (days)
pub const VENTANA_ACCIONES_DIAS: i64 = 30;

/// Actions with gravedad at or above this level get a double weight,
/// so a handful of mass deletions outranks a pile of medium actions.
pub const GRAVEDAD_PESO_DOBLE: u8 = 8;

/// Score points contributed per gravedad unit of a detected pattern
pub const PUNTOS_POR_GRAVEDAD_PATRON: u32 = 3;

/// Score at or above which a user counts as high risk (alert threshold)
pub const UMBRAL_ALTO_RIESGO: u8 = 60;

/// Score thresholds for nivel (ascending: BAJO < MEDIO < ALTO < CRITICO)
pub const NIVEL_MEDIO_MIN: u8 = 30;
pub const NIVEL_ALTO_MIN: u8 = 60;
pub const NIVEL_CRITICO_MIN: u8 = 85;

/// Alert grading above the high-risk threshold
pub const ALERTA_URGENTE_MIN: u8 = 75;
pub const ALERTA_CRITICO_MIN: u8 = 90;

/// Users listed in the monthly report's top-risk section
pub const REPORTE_TOP_USUARIOS: usize = 5;

// ============================================
// Analytics scheduler
// ============================================

/// Default cadence between full job rounds (seconds)
pub const DEFAULT_INTERVALO_JOBS_SECS: u64 = 3600;

/// Default stagger between sibling jobs within a round (seconds)
pub const DEFAULT_ESCALONADO_JOBS_SECS: u64 = 180;

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// App data directory (FINCAFACIL_DATA_DIR overrides the platform default).
pub fn get_data_dir() -> PathBuf {
    std::env::var("FINCAFACIL_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("fincafacil")
        })
}

/// Get the analytics database path from environment or use the default
/// location under the app data directory.
pub fn get_db_path() -> PathBuf {
    std::env::var("FINCAFACIL_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| get_data_dir().join("analitica.db"))
}

/// Get the job round interval from environment or use default
pub fn get_intervalo_jobs() -> u64 {
    std::env::var("FINCAFACIL_INTERVALO_JOBS_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_INTERVALO_JOBS_SECS)
}

/// Get the stagger between sibling jobs from environment or use default
pub fn get_escalonado_jobs() -> u64 {
    std::env::var("FINCAFACIL_ESCALONADO_JOBS_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_ESCALONADO_JOBS_SECS)
}
