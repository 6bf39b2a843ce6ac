//! AI-suggestion aggregation job

use std::sync::Arc;

use chrono::NaiveDate;

use crate::analytics::service::AnalyticsService;
use crate::analytics::sources::FuenteIa;
use crate::analytics::types::{porcentaje, FilaIa};
use crate::error::Result;

use super::{fecha_efectiva, AnalyticsJob};

/// Aggregates suggestion generation/acceptance counters and the estimated
/// monetary impact into one row per fecha.
pub struct IaJob {
    fuente: Arc<dyn FuenteIa>,
    servicio: Arc<AnalyticsService>,
}

impl IaJob {
    pub fn new(fuente: Arc<dyn FuenteIa>, servicio: Arc<AnalyticsService>) -> Self {
        Self { fuente, servicio }
    }
}

impl AnalyticsJob for IaJob {
    fn nombre(&self) -> &'static str {
        "ia"
    }

    fn ejecutar(&self, empresa_id: i64, fecha: Option<NaiveDate>) -> Result<()> {
        let fecha = fecha_efectiva(fecha);
        let c = self.fuente.contadores(empresa_id, fecha)?;

        self.servicio.registrar_ia(FilaIa {
            empresa_id,
            fecha,
            sugerencias_generadas: c.sugerencias_generadas,
            sugerencias_aceptadas: c.sugerencias_aceptadas,
            sugerencias_rechazadas: c.sugerencias_rechazadas,
            tasa_aceptacion_pct: porcentaje(c.sugerencias_aceptadas, c.sugerencias_generadas),
            impacto_estimado: c.impacto_estimado,
        })?;

        log::debug!("Job ia completado para empresa {empresa_id} fecha {fecha}");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
