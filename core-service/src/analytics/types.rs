//! Read-model row types
//!
//! One struct per analytics table. Field names are the published wire
//! format consumed by the API layer and the desktop dashboards.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily productivity aggregate per (empresa, fecha, lote, sector).
/// lote_id/sector_id 0 means the whole-farm aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilaProductividad {
    pub empresa_id: i64,
    pub fecha: NaiveDate,
    pub lote_id: i64,
    pub sector_id: i64,
    pub nacimientos: i64,
    pub destetes: i64,
    pub muertes: i64,
    pub traslados: i64,
    pub servicios: i64,
    pub partos_confirmados: i64,
    pub total_animales: i64,
    pub mortalidad_pct: f64,
}

/// Daily alert aggregate per (empresa, fecha, tipo_alerta).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilaAlertas {
    pub empresa_id: i64,
    pub fecha: NaiveDate,
    pub tipo_alerta: String,
    pub activas: i64,
    pub resueltas: i64,
    pub criticas: i64,
    pub tiempo_resolucion_promedio_min: f64,
}

/// Daily AI-suggestion aggregate per (empresa, fecha).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilaIa {
    pub empresa_id: i64,
    pub fecha: NaiveDate,
    pub sugerencias_generadas: i64,
    pub sugerencias_aceptadas: i64,
    pub sugerencias_rechazadas: i64,
    pub tasa_aceptacion_pct: f64,
    pub impacto_estimado: f64,
}

/// Daily orchestration/autonomy aggregate per (empresa, fecha).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilaAutonomia {
    pub empresa_id: i64,
    pub fecha: NaiveDate,
    pub ejecuciones: i64,
    pub exitosas: i64,
    pub fallidas: i64,
    pub rollbacks: i64,
    pub activaciones_kill_switch: i64,
    pub tasa_exito_pct: f64,
}

/// Ratio helper used by every job: 0/0 counts as 0, never NaN.
pub fn porcentaje(parte: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        parte as f64 / total as f64 * 100.0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_porcentaje_division_por_cero() {
        assert_eq!(porcentaje(0, 0), 0.0);
        assert_eq!(porcentaje(5, 0), 0.0);
    }

    #[test]
    fn test_porcentaje_normal() {
        assert_eq!(porcentaje(1, 4), 25.0);
        assert_eq!(porcentaje(3, 3), 100.0);
    }
}
