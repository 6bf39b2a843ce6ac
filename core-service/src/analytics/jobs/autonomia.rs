//! Orchestration/autonomy aggregation job

use std::sync::Arc;

use chrono::NaiveDate;

use crate::analytics::service::AnalyticsService;
use crate::analytics::sources::FuenteAutonomia;
use crate::analytics::types::{porcentaje, FilaAutonomia};
use crate::error::Result;

use super::{fecha_efectiva, AnalyticsJob};

/// Aggregates orchestration run outcomes (success, failure, rollbacks,
/// kill-switch activations) into one row per fecha.
pub struct AutonomiaJob {
    fuente: Arc<dyn FuenteAutonomia>,
    servicio: Arc<AnalyticsService>,
}

impl AutonomiaJob {
    pub fn new(fuente: Arc<dyn FuenteAutonomia>, servicio: Arc<AnalyticsService>) -> Self {
        Self { fuente, servicio }
    }
}

impl AnalyticsJob for AutonomiaJob {
    fn nombre(&self) -> &'static str {
        "autonomia"
    }

    fn ejecutar(&self, empresa_id: i64, fecha: Option<NaiveDate>) -> Result<()> {
        let fecha = fecha_efectiva(fecha);
        let c = self.fuente.contadores(empresa_id, fecha)?;

        self.servicio.registrar_autonomia(FilaAutonomia {
            empresa_id,
            fecha,
            ejecuciones: c.ejecuciones,
            exitosas: c.exitosas,
            fallidas: c.fallidas,
            rollbacks: c.rollbacks,
            activaciones_kill_switch: c.activaciones_kill_switch,
            tasa_exito_pct: porcentaje(c.exitosas, c.ejecuciones),
        })?;

        log::debug!("Job autonomia completado para empresa {empresa_id} fecha {fecha}");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
