//! Productivity aggregation job

use std::sync::Arc;

use chrono::NaiveDate;

use crate::analytics::service::AnalyticsService;
use crate::analytics::sources::FuenteProductividad;
use crate::analytics::types::{porcentaje, FilaProductividad};
use crate::error::Result;

use super::{fecha_efectiva, AnalyticsJob};

/// Aggregates births, weanings, deaths, transfers and services into one
/// productivity row per (lote, sector) for the fecha.
pub struct ProductividadJob {
    fuente: Arc<dyn FuenteProductividad>,
    servicio: Arc<AnalyticsService>,
}

impl ProductividadJob {
    pub fn new(fuente: Arc<dyn FuenteProductividad>, servicio: Arc<AnalyticsService>) -> Self {
        Self { fuente, servicio }
    }
}

impl AnalyticsJob for ProductividadJob {
    fn nombre(&self) -> &'static str {
        "productividad"
    }

    fn ejecutar(&self, empresa_id: i64, fecha: Option<NaiveDate>) -> Result<()> {
        let fecha = fecha_efectiva(fecha);
        let contadores = self.fuente.contadores(empresa_id, fecha)?;

        for c in contadores {
            self.servicio.registrar_productividad(FilaProductividad {
                empresa_id,
                fecha,
                lote_id: c.lote_id,
                sector_id: c.sector_id,
                nacimientos: c.nacimientos,
                destetes: c.destetes,
                muertes: c.muertes,
                traslados: c.traslados,
                servicios: c.servicios,
                partos_confirmados: c.partos_confirmados,
                total_animales: c.total_animales,
                mortalidad_pct: porcentaje(c.muertes, c.total_animales),
            })?;
        }

        log::debug!("Job productividad completado para empresa {empresa_id} fecha {fecha}");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::sources::ContadoresProductividad;
    use crate::analytics::store::{AnalyticsStore, FiltroProductividad};

    struct FuenteFija(Vec<ContadoresProductividad>);

    impl FuenteProductividad for FuenteFija {
        fn contadores(&self, _: i64, _: NaiveDate) -> Result<Vec<ContadoresProductividad>> {
            Ok(self.0.clone())
        }
    }

    struct FuenteRota;

    impl FuenteProductividad for FuenteRota {
        fn contadores(&self, _: i64, _: NaiveDate) -> Result<Vec<ContadoresProductividad>> {
            Err(crate::Error::Source {
                fuente: "operacional".to_string(),
                message: "sin conexión".to_string(),
            })
        }
    }

    fn servicio() -> Arc<AnalyticsService> {
        Arc::new(AnalyticsService::new(Arc::new(
            AnalyticsStore::open_in_memory().unwrap(),
        )))
    }

    #[test]
    fn test_job_escribe_filas_con_ratio() {
        let servicio = servicio();
        let fuente = Arc::new(FuenteFija(vec![ContadoresProductividad {
            lote_id: 1,
            muertes: 2,
            total_animales: 50,
            nacimientos: 4,
            ..Default::default()
        }]));

        let job = ProductividadJob::new(fuente, servicio.clone());
        job.ejecutar(1, Some("2026-08-07".parse().unwrap())).unwrap();

        let filas = servicio
            .productividad(1, &FiltroProductividad::default())
            .unwrap();
        assert_eq!(filas.len(), 1);
        assert_eq!(filas[0].mortalidad_pct, 4.0);
    }

    #[test]
    fn test_reinvocacion_supersede() {
        let servicio = servicio();
        let fecha: NaiveDate = "2026-08-07".parse().unwrap();

        for muertes in [1, 3] {
            let fuente = Arc::new(FuenteFija(vec![ContadoresProductividad {
                lote_id: 1,
                muertes,
                total_animales: 100,
                ..Default::default()
            }]));
            ProductividadJob::new(fuente, servicio.clone())
                .ejecutar(1, Some(fecha))
                .unwrap();
        }

        let filas = servicio
            .productividad(1, &FiltroProductividad::default())
            .unwrap();
        assert_eq!(filas.len(), 1);
        assert_eq!(filas[0].muertes, 3);
    }

    #[test]
    fn test_fallo_de_fuente_propaga() {
        let job = ProductividadJob::new(Arc::new(FuenteRota), servicio());
        assert!(job.ejecutar(1, None).is_err());
    }

    #[test]
    fn test_rebano_vacio_ratio_cero() {
        let servicio = servicio();
        let fuente = Arc::new(FuenteFija(vec![ContadoresProductividad::default()]));
        ProductividadJob::new(fuente, servicio.clone())
            .ejecutar(1, Some("2026-08-07".parse().unwrap()))
            .unwrap();

        let filas = servicio
            .productividad(1, &FiltroProductividad::default())
            .unwrap();
        assert_eq!(filas[0].mortalidad_pct, 0.0);
    }
}
