//! Alert aggregation job

use std::sync::Arc;

use chrono::NaiveDate;

use crate::analytics::service::AnalyticsService;
use crate::analytics::sources::FuenteAlertas;
use crate::analytics::types::FilaAlertas;
use crate::error::Result;

use super::{fecha_efectiva, AnalyticsJob};

/// Writes one row per tipo_alerta dimension for the fecha. Writes are not
/// atomic across dimensions: rows persisted before a failure stand, and the
/// error propagates so the trigger can retry the run (retries upsert over
/// the same keys).
pub struct AlertasJob {
    fuente: Arc<dyn FuenteAlertas>,
    servicio: Arc<AnalyticsService>,
}

impl AlertasJob {
    pub fn new(fuente: Arc<dyn FuenteAlertas>, servicio: Arc<AnalyticsService>) -> Self {
        Self { fuente, servicio }
    }
}

impl AnalyticsJob for AlertasJob {
    fn nombre(&self) -> &'static str {
        "alertas"
    }

    fn ejecutar(&self, empresa_id: i64, fecha: Option<NaiveDate>) -> Result<()> {
        let fecha = fecha_efectiva(fecha);
        let contadores = self.fuente.contadores(empresa_id, fecha)?;

        let filas: Vec<FilaAlertas> = contadores
            .into_iter()
            .map(|c| FilaAlertas {
                empresa_id,
                fecha,
                tipo_alerta: c.tipo_alerta,
                activas: c.activas,
                resueltas: c.resueltas,
                criticas: c.criticas,
                tiempo_resolucion_promedio_min: c.tiempo_resolucion_promedio_min,
            })
            .collect();

        self.servicio.registrar_alertas(empresa_id, filas)?;
        log::debug!("Job alertas completado para empresa {empresa_id} fecha {fecha}");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
