//! Operational data sources
//!
//! Each job depends on an explicit source trait delivering the raw counters
//! for its metric family; production wiring injects a real implementation
//! and tests inject in-memory stubs. Sample values never live in job code.
//!
//! `ArchivoOperacional` is the file-backed implementation: it reads a JSON
//! export of the operational database (produced by the desktop app) and
//! serves all four counter families from it.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// COUNTER SETS
// ============================================================================

/// Raw productivity counters for one (lote, sector) on one fecha.
/// lote_id/sector_id 0 is the whole-farm aggregate; a source delivers either
/// per-lote rows or a single aggregate row, never both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContadoresProductividad {
    #[serde(default)]
    pub lote_id: i64,
    #[serde(default)]
    pub sector_id: i64,
    pub nacimientos: i64,
    pub destetes: i64,
    pub muertes: i64,
    pub traslados: i64,
    pub servicios: i64,
    pub partos_confirmados: i64,
    pub total_animales: i64,
}

/// Raw alert counters for one tipo_alerta on one fecha.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContadoresAlertas {
    pub tipo_alerta: String,
    pub activas: i64,
    pub resueltas: i64,
    pub criticas: i64,
    pub tiempo_resolucion_promedio_min: f64,
}

/// Raw AI-suggestion counters for one fecha.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContadoresIa {
    pub sugerencias_generadas: i64,
    pub sugerencias_aceptadas: i64,
    pub sugerencias_rechazadas: i64,
    pub impacto_estimado: f64,
}

/// Raw orchestration counters for one fecha.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContadoresAutonomia {
    pub ejecuciones: i64,
    pub exitosas: i64,
    pub fallidas: i64,
    pub rollbacks: i64,
    pub activaciones_kill_switch: i64,
}

// ============================================================================
// SOURCE TRAITS
// ============================================================================

pub trait FuenteProductividad: Send + Sync {
    fn contadores(&self, empresa_id: i64, fecha: NaiveDate)
        -> Result<Vec<ContadoresProductividad>>;
}

pub trait FuenteAlertas: Send + Sync {
    fn contadores(&self, empresa_id: i64, fecha: NaiveDate) -> Result<Vec<ContadoresAlertas>>;
}

pub trait FuenteIa: Send + Sync {
    fn contadores(&self, empresa_id: i64, fecha: NaiveDate) -> Result<ContadoresIa>;
}

pub trait FuenteAutonomia: Send + Sync {
    fn contadores(&self, empresa_id: i64, fecha: NaiveDate) -> Result<ContadoresAutonomia>;
}

// ============================================================================
// FILE-BACKED SOURCE
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
struct RegistroProductividad {
    empresa_id: i64,
    fecha: NaiveDate,
    #[serde(flatten)]
    contadores: ContadoresProductividad,
}

#[derive(Debug, Clone, Deserialize)]
struct RegistroAlertas {
    empresa_id: i64,
    fecha: NaiveDate,
    #[serde(flatten)]
    contadores: ContadoresAlertas,
}

#[derive(Debug, Clone, Deserialize)]
struct RegistroIa {
    empresa_id: i64,
    fecha: NaiveDate,
    #[serde(flatten)]
    contadores: ContadoresIa,
}

#[derive(Debug, Clone, Deserialize)]
struct RegistroAutonomia {
    empresa_id: i64,
    fecha: NaiveDate,
    #[serde(flatten)]
    contadores: ContadoresAutonomia,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentoOperacional {
    #[serde(default)]
    productividad: Vec<RegistroProductividad>,
    #[serde(default)]
    alertas: Vec<RegistroAlertas>,
    #[serde(default)]
    ia: Vec<RegistroIa>,
    #[serde(default)]
    autonomia: Vec<RegistroAutonomia>,
}

/// Operational-export file source. Serves every counter family from one
/// JSON document; dates absent from the document read as zero activity.
pub struct ArchivoOperacional {
    documento: DocumentoOperacional,
}

impl ArchivoOperacional {
    pub fn abrir(ruta: &Path) -> Result<Self> {
        let contenido = std::fs::read_to_string(ruta).map_err(|e| Error::Source {
            fuente: ruta.display().to_string(),
            message: e.to_string(),
        })?;
        let documento = serde_json::from_str(&contenido).map_err(|e| Error::Source {
            fuente: ruta.display().to_string(),
            message: format!("JSON inválido: {e}"),
        })?;
        Ok(Self { documento })
    }
}

impl FuenteProductividad for ArchivoOperacional {
    fn contadores(
        &self,
        empresa_id: i64,
        fecha: NaiveDate,
    ) -> Result<Vec<ContadoresProductividad>> {
        Ok(self
            .documento
            .productividad
            .iter()
            .filter(|r| r.empresa_id == empresa_id && r.fecha == fecha)
            .map(|r| r.contadores.clone())
            .collect())
    }
}

impl FuenteAlertas for ArchivoOperacional {
    fn contadores(&self, empresa_id: i64, fecha: NaiveDate) -> Result<Vec<ContadoresAlertas>> {
        Ok(self
            .documento
            .alertas
            .iter()
            .filter(|r| r.empresa_id == empresa_id && r.fecha == fecha)
            .map(|r| r.contadores.clone())
            .collect())
    }
}

impl FuenteIa for ArchivoOperacional {
    fn contadores(&self, empresa_id: i64, fecha: NaiveDate) -> Result<ContadoresIa> {
        Ok(self
            .documento
            .ia
            .iter()
            .find(|r| r.empresa_id == empresa_id && r.fecha == fecha)
            .map(|r| r.contadores.clone())
            .unwrap_or_default())
    }
}

impl FuenteAutonomia for ArchivoOperacional {
    fn contadores(&self, empresa_id: i64, fecha: NaiveDate) -> Result<ContadoresAutonomia> {
        Ok(self
            .documento
            .autonomia
            .iter()
            .find(|r| r.empresa_id == empresa_id && r.fecha == fecha)
            .map(|r| r.contadores.clone())
            .unwrap_or_default())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DOCUMENTO: &str = r#"{
        "productividad": [
            {"empresa_id": 1, "fecha": "2026-08-07", "lote_id": 1,
             "nacimientos": 3, "destetes": 1, "muertes": 1, "traslados": 0,
             "servicios": 2, "partos_confirmados": 1, "total_animales": 80}
        ],
        "alertas": [
            {"empresa_id": 1, "fecha": "2026-08-07", "tipo_alerta": "sanitaria",
             "activas": 2, "resueltas": 5, "criticas": 1,
             "tiempo_resolucion_promedio_min": 38.5}
        ],
        "ia": [
            {"empresa_id": 1, "fecha": "2026-08-07", "sugerencias_generadas": 12,
             "sugerencias_aceptadas": 9, "sugerencias_rechazadas": 3,
             "impacto_estimado": 2400.0}
        ]
    }"#;

    fn archivo() -> (TempDir, ArchivoOperacional) {
        let dir = TempDir::new().unwrap();
        let ruta = dir.path().join("operacional.json");
        std::fs::write(&ruta, DOCUMENTO).unwrap();
        let fuente = ArchivoOperacional::abrir(&ruta).unwrap();
        (dir, fuente)
    }

    #[test]
    fn test_lee_contadores_por_empresa_y_fecha() {
        let (_dir, fuente) = archivo();
        let fecha = "2026-08-07".parse().unwrap();

        let prod = FuenteProductividad::contadores(&fuente, 1, fecha).unwrap();
        assert_eq!(prod.len(), 1);
        assert_eq!(prod[0].nacimientos, 3);

        let alertas = FuenteAlertas::contadores(&fuente, 1, fecha).unwrap();
        assert_eq!(alertas[0].tipo_alerta, "sanitaria");
    }

    #[test]
    fn test_fecha_ausente_es_actividad_cero() {
        let (_dir, fuente) = archivo();
        let otra: NaiveDate = "2026-08-01".parse().unwrap();

        assert!(FuenteProductividad::contadores(&fuente, 1, otra)
            .unwrap()
            .is_empty());
        let ia = FuenteIa::contadores(&fuente, 1, otra).unwrap();
        assert_eq!(ia.sugerencias_generadas, 0);
        // "autonomia" section missing entirely
        let auto = FuenteAutonomia::contadores(&fuente, 1, otra).unwrap();
        assert_eq!(auto.ejecuciones, 0);
    }

    #[test]
    fn test_archivo_invalido_falla_como_fuente() {
        let dir = TempDir::new().unwrap();
        let ruta = dir.path().join("roto.json");
        std::fs::write(&ruta, "{ no es json").unwrap();
        assert!(matches!(
            ArchivoOperacional::abrir(&ruta),
            Err(Error::Source { .. })
        ));
    }
}
