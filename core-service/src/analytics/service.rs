//! Analytics Service
//!
//! The write boundary used by jobs (validated upserts) and the read side
//! consumed by the HTTP API (filtered queries, KPI overview, comparisons).

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::store::{
    AnalyticsStore, FiltroProductividad, TotalesLote, TotalesPeriodo, TotalesProductividad,
};
use super::types::{FilaAlertas, FilaAutonomia, FilaIa, FilaProductividad};

/// Default trailing range for comparisons (days)
const RANGO_COMPARATIVO_DIAS: i64 = 30;

/// KPI snapshot across every metric family, for the overview endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumenGeneral {
    pub empresa_id: i64,
    pub productividad: Option<TotalesProductividad>,
    pub alertas: Vec<FilaAlertas>,
    pub ia: Option<FilaIa>,
    pub autonomia: Option<FilaAutonomia>,
}

/// Comparison payload; the variant follows the requested `comparador`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "comparador", rename_all = "snake_case")]
pub enum Comparativo {
    Lotes {
        rango_dias: i64,
        lotes: Vec<TotalesLote>,
    },
    Periodos {
        actual: TotalesPeriodo,
        anterior: TotalesPeriodo,
    },
}

/// Service over the read-model store. Shared as `Arc<AnalyticsService>`
/// between the jobs (writers) and the API handlers (readers).
pub struct AnalyticsService {
    store: Arc<AnalyticsStore>,
}

impl AnalyticsService {
    pub fn new(store: Arc<AnalyticsStore>) -> Self {
        Self { store }
    }

    fn validar_empresa(empresa_id: i64) -> Result<()> {
        if empresa_id <= 0 {
            return Err(Error::Validation(format!(
                "empresa_id inválido: {empresa_id}"
            )));
        }
        Ok(())
    }

    // ========================================================================
    // WRITE SIDE (called by jobs)
    // ========================================================================

    /// Upsert one productivity row, keyed by (empresa, fecha, lote, sector).
    pub fn registrar_productividad(&self, fila: FilaProductividad) -> Result<()> {
        Self::validar_empresa(fila.empresa_id)?;
        self.store.upsert_productividad(&fila)
    }

    /// Upsert one row per tipo_alerta dimension. Rows already written stand
    /// if a later row in the batch fails; the error still propagates.
    pub fn registrar_alertas(&self, empresa_id: i64, filas: Vec<FilaAlertas>) -> Result<()> {
        Self::validar_empresa(empresa_id)?;
        for fila in filas {
            if fila.tipo_alerta.trim().is_empty() {
                return Err(Error::Validation("tipo_alerta vacío".to_string()));
            }
            self.store.upsert_alertas(&fila)?;
        }
        Ok(())
    }

    /// Upsert the AI-suggestion aggregate, keyed by (empresa, fecha).
    pub fn registrar_ia(&self, fila: FilaIa) -> Result<()> {
        Self::validar_empresa(fila.empresa_id)?;
        self.store.upsert_ia(&fila)
    }

    /// Upsert the autonomy aggregate, keyed by (empresa, fecha).
    pub fn registrar_autonomia(&self, fila: FilaAutonomia) -> Result<()> {
        Self::validar_empresa(fila.empresa_id)?;
        self.store.upsert_autonomia(&fila)
    }

    // ========================================================================
    // READ SIDE (consumed by the API layer)
    // ========================================================================

    pub fn productividad(
        &self,
        empresa_id: i64,
        filtro: &FiltroProductividad,
    ) -> Result<Vec<FilaProductividad>> {
        Self::validar_empresa(empresa_id)?;
        self.store.productividad(empresa_id, filtro)
    }

    pub fn alertas(&self, empresa_id: i64, fecha: Option<NaiveDate>) -> Result<Vec<FilaAlertas>> {
        Self::validar_empresa(empresa_id)?;
        self.store.alertas(empresa_id, fecha)
    }

    pub fn ia(&self, empresa_id: i64, fecha: Option<NaiveDate>) -> Result<Vec<FilaIa>> {
        Self::validar_empresa(empresa_id)?;
        self.store.ia(empresa_id, fecha)
    }

    pub fn autonomia(
        &self,
        empresa_id: i64,
        fecha: Option<NaiveDate>,
    ) -> Result<Vec<FilaAutonomia>> {
        Self::validar_empresa(empresa_id)?;
        self.store.autonomia(empresa_id, fecha)
    }

    /// KPI snapshot from the most recent row of each metric family.
    pub fn resumen_general(&self, empresa_id: i64) -> Result<ResumenGeneral> {
        Self::validar_empresa(empresa_id)?;
        Ok(ResumenGeneral {
            empresa_id,
            productividad: self.store.totales_productividad_recientes(empresa_id)?,
            alertas: self.store.alertas_recientes(empresa_id)?,
            ia: self.store.ia_reciente(empresa_id)?,
            autonomia: self.store.autonomia_reciente(empresa_id)?,
        })
    }

    /// Comparison payload. `comparador` is "lotes" or "periodos".
    pub fn comparativo(
        &self,
        empresa_id: i64,
        comparador: &str,
        rango_dias: Option<i64>,
    ) -> Result<Comparativo> {
        Self::validar_empresa(empresa_id)?;
        let rango = rango_dias.unwrap_or(RANGO_COMPARATIVO_DIAS);
        if rango <= 0 {
            return Err(Error::Validation(format!("rango_dias inválido: {rango}")));
        }
        let hoy = Utc::now().date_naive();

        match comparador {
            "lotes" => {
                let desde = hoy - Duration::days(rango);
                Ok(Comparativo::Lotes {
                    rango_dias: rango,
                    lotes: self.store.totales_por_lote(empresa_id, desde)?,
                })
            }
            "periodos" => {
                let desde_actual = hoy - Duration::days(rango);
                let hasta_anterior = desde_actual - Duration::days(1);
                let desde_anterior = hasta_anterior - Duration::days(rango);
                Ok(Comparativo::Periodos {
                    actual: self.store.totales_periodo(empresa_id, desde_actual, hoy)?,
                    anterior: self
                        .store
                        .totales_periodo(empresa_id, desde_anterior, hasta_anterior)?,
                })
            }
            otro => Err(Error::Validation(format!(
                "comparador desconocido: {otro} (se espera 'lotes' o 'periodos')"
            ))),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn servicio() -> AnalyticsService {
        AnalyticsService::new(Arc::new(AnalyticsStore::open_in_memory().unwrap()))
    }

    fn fila_prod(fecha: NaiveDate, lote: i64) -> FilaProductividad {
        FilaProductividad {
            empresa_id: 1,
            fecha,
            lote_id: lote,
            sector_id: 0,
            nacimientos: 2,
            destetes: 1,
            muertes: 1,
            traslados: 0,
            servicios: 2,
            partos_confirmados: 1,
            total_animales: 50,
            mortalidad_pct: 2.0,
        }
    }

    #[test]
    fn test_empresa_invalida_rechazada() {
        let servicio = servicio();
        let mut fila = fila_prod(Utc::now().date_naive(), 1);
        fila.empresa_id = 0;
        assert!(matches!(
            servicio.registrar_productividad(fila),
            Err(Error::Validation(_))
        ));
        assert!(servicio.resumen_general(-3).is_err());
    }

    #[test]
    fn test_resumen_general_compone_dominios() {
        let servicio = servicio();
        let hoy = Utc::now().date_naive();
        servicio.registrar_productividad(fila_prod(hoy, 1)).unwrap();
        servicio
            .registrar_ia(FilaIa {
                empresa_id: 1,
                fecha: hoy,
                sugerencias_generadas: 10,
                sugerencias_aceptadas: 7,
                sugerencias_rechazadas: 3,
                tasa_aceptacion_pct: 70.0,
                impacto_estimado: 1500.0,
            })
            .unwrap();

        let resumen = servicio.resumen_general(1).unwrap();
        assert!(resumen.productividad.is_some());
        assert!(resumen.ia.is_some());
        assert!(resumen.autonomia.is_none());
    }

    #[test]
    fn test_comparativo_lotes() {
        let servicio = servicio();
        let hoy = Utc::now().date_naive();
        servicio.registrar_productividad(fila_prod(hoy, 1)).unwrap();
        servicio.registrar_productividad(fila_prod(hoy, 2)).unwrap();

        match servicio.comparativo(1, "lotes", None).unwrap() {
            Comparativo::Lotes { lotes, .. } => assert_eq!(lotes.len(), 2),
            otro => panic!("variante inesperada: {otro:?}"),
        }
    }

    #[test]
    fn test_comparativo_periodos_sin_solape() {
        let servicio = servicio();
        let hoy = Utc::now().date_naive();
        servicio.registrar_productividad(fila_prod(hoy, 1)).unwrap();

        match servicio.comparativo(1, "periodos", Some(7)).unwrap() {
            Comparativo::Periodos { actual, anterior } => {
                assert!(anterior.hasta < actual.desde);
                assert_eq!(actual.nacimientos, 2);
                assert_eq!(anterior.nacimientos, 0);
            }
            otro => panic!("variante inesperada: {otro:?}"),
        }
    }

    #[test]
    fn test_comparador_desconocido() {
        let servicio = servicio();
        assert!(matches!(
            servicio.comparativo(1, "sectores", None),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_registrar_alertas_valida_dimension() {
        let servicio = servicio();
        let filas = vec![FilaAlertas {
            empresa_id: 1,
            fecha: Utc::now().date_naive(),
            tipo_alerta: "  ".to_string(),
            activas: 1,
            resueltas: 0,
            criticas: 0,
            tiempo_resolucion_promedio_min: 0.0,
        }];
        assert!(servicio.registrar_alertas(1, filas).is_err());
    }
}
