//! Risk Engine Types
//!
//! Entities are named in the product's domain language. Wire names (serde)
//! match what the desktop app and export files already use.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// ACTION TYPES
// ============================================================================

/// Closed set of user actions flagged as carrying elevated operational risk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TipoAccion {
    /// User dismissed or overrode a safety alert
    OverrideAlerta,
    /// Many records deleted at once
    EliminacionMasiva,
    /// Change to a critical configuration value
    CambioConfigCritico,
    /// Bulk data export out of the system
    ExportacionDatos,
    /// Activity outside working hours
    AccesoFueraHorario,
}

impl TipoAccion {
    /// Base severity of one occurrence, on the 1-10 scale.
    pub fn gravedad_base(&self) -> u8 {
        match self {
            TipoAccion::OverrideAlerta => 6,
            TipoAccion::EliminacionMasiva => 9,
            TipoAccion::CambioConfigCritico => 7,
            TipoAccion::ExportacionDatos => 5,
            TipoAccion::AccesoFueraHorario => 4,
        }
    }

    /// Recurring-pattern parameters for this action type:
    /// (pattern kind, trailing window, occurrence threshold).
    ///
    /// `None` means repetition of this action alone is not a pattern.
    pub fn parametros_patron(&self) -> Option<(TipoPatron, Duration, usize)> {
        match self {
            TipoAccion::OverrideAlerta => {
                Some((TipoPatron::OverridesFrecuentes, Duration::days(7), 5))
            }
            TipoAccion::EliminacionMasiva => {
                Some((TipoPatron::EliminacionesMasivas, Duration::days(14), 3))
            }
            TipoAccion::CambioConfigCritico => {
                Some((TipoPatron::CambiosConfigFrecuentes, Duration::days(7), 4))
            }
            TipoAccion::AccesoFueraHorario => {
                Some((TipoPatron::ActividadFueraHorario, Duration::days(30), 6))
            }
            TipoAccion::ExportacionDatos => None,
        }
    }

    pub fn descripcion(&self) -> &'static str {
        match self {
            TipoAccion::OverrideAlerta => "Override de alerta de seguridad",
            TipoAccion::EliminacionMasiva => "Eliminación masiva de registros",
            TipoAccion::CambioConfigCritico => "Cambio de configuración crítica",
            TipoAccion::ExportacionDatos => "Exportación masiva de datos",
            TipoAccion::AccesoFueraHorario => "Actividad fuera de horario",
        }
    }
}

/// Risky action event tied to a user. Immutable once created; the service
/// keeps them append-only per user, FIFO in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccionRiesgosa {
    pub usuario: String,
    pub tipo_accion: TipoAccion,
    /// Origin subsystem name (e.g. "salud", "inventario")
    pub modulo: String,
    pub descripcion: String,
    /// Severity 1-10, clamped at construction
    pub gravedad: u8,
    pub timestamp: DateTime<Utc>,
}

impl AccionRiesgosa {
    /// Build an action stamped now, with the type's base severity.
    pub fn nueva(usuario: &str, tipo_accion: TipoAccion, modulo: &str, descripcion: &str) -> Self {
        Self {
            usuario: usuario.to_string(),
            tipo_accion,
            modulo: modulo.to_string(),
            descripcion: descripcion.to_string(),
            gravedad: tipo_accion.gravedad_base(),
            timestamp: Utc::now(),
        }
    }

    /// Override the severity. Out-of-range values are clamped to 1-10 so a
    /// bad caller cannot skew the score space.
    pub fn con_gravedad(mut self, gravedad: u8) -> Self {
        self.gravedad = gravedad.clamp(1, 10);
        self
    }

    /// Override the timestamp (backfill and tests).
    pub fn con_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

// ============================================================================
// PATTERN TYPES
// ============================================================================

/// Recurring dangerous behaviors detectable from an action history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoPatron {
    OverridesFrecuentes,
    EliminacionesMasivas,
    CambiosConfigFrecuentes,
    ActividadFueraHorario,
}

impl TipoPatron {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoPatron::OverridesFrecuentes => "OVERRIDES_FRECUENTES",
            TipoPatron::EliminacionesMasivas => "ELIMINACIONES_MASIVAS",
            TipoPatron::CambiosConfigFrecuentes => "CAMBIOS_CONFIG_FRECUENTES",
            TipoPatron::ActividadFueraHorario => "ACTIVIDAD_FUERA_HORARIO",
        }
    }
}

/// Dangerous pattern observed within a trailing window. Recomputed from the
/// action history on every registration; never persisted on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatronDetectado {
    pub tipo_patron: TipoPatron,
    pub descripcion: String,
    /// Occurrences inside the detection window
    pub ocurrencias: usize,
    /// Derived severity 1-10
    pub gravedad: u8,
}

// ============================================================================
// SCORE TYPES
// ============================================================================

/// Risk level as a step function of the score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NivelRiesgo {
    Bajo,
    Medio,
    Alto,
    Critico,
}

impl NivelRiesgo {
    pub fn as_str(&self) -> &'static str {
        match self {
            NivelRiesgo::Bajo => "BAJO",
            NivelRiesgo::Medio => "MEDIO",
            NivelRiesgo::Alto => "ALTO",
            NivelRiesgo::Critico => "CRITICO",
        }
    }
}

/// Composite risk score for one user, recomputed on every query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRiesgoUsuario {
    pub usuario: String,
    /// 0-100, clamped
    pub score: u8,
    pub nivel: NivelRiesgo,
    pub requiere_accion: bool,
    /// Ordered human-readable contributing factors
    pub causas: Vec<String>,
    pub recomendacion: String,
}

// ============================================================================
// OPERATIONAL ALERT TYPES
// ============================================================================

/// Alert grading for users above the high-risk threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NivelAlerta {
    Atencion,
    Urgente,
    Critico,
}

/// Ephemeral alert emitted for a user whose score crossed the threshold.
/// Recomputed per query, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertaOperativa {
    pub usuario: String,
    pub score_riesgo: u8,
    pub nivel_alerta: NivelAlerta,
    pub mensaje: String,
    pub patrones: Vec<PatronDetectado>,
    pub acciones_sugeridas: Vec<String>,
}

// ============================================================================
// TESTS
// ============================================================================
