//! Risk Data Export
//!
//! Serializes every known user's score and the current operational alerts
//! to a single JSON document. I/O failures propagate to the caller.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::service::RiskManagementService;
use super::types::{AlertaOperativa, ScoreRiesgoUsuario};

/// On-disk export document. Field names are the published file format.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportacionRiesgos {
    pub total_usuarios: usize,
    pub scores_riesgo: Vec<ScoreRiesgoUsuario>,
    pub alertas_operativas: Vec<AlertaOperativa>,
    /// ISO-8601 generation timestamp
    pub timestamp_exportacion: String,
}

impl RiskManagementService {
    /// Write the current risk snapshot as pretty-printed JSON at `ruta`.
    pub fn exportar_datos(&self, ruta: &Path) -> Result<()> {
        let mut scores = self.scores_todos();
        scores.sort_by(|a, b| a.usuario.cmp(&b.usuario));

        let documento = ExportacionRiesgos {
            total_usuarios: scores.len(),
            scores_riesgo: scores,
            alertas_operativas: self.obtener_alertas_operativas(),
            timestamp_exportacion: Utc::now().to_rfc3339(),
        };

        let file = File::create(ruta)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &documento)?;
        writer.flush()?;

        log::info!(
            "Exportados {} usuarios de riesgo a {}",
            documento.total_usuarios,
            ruta.display()
        );
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::types::{AccionRiesgosa, TipoAccion};
    use tempfile::TempDir;

    #[test]
    fn test_export_round_trip() {
        let servicio = RiskManagementService::new();
        for usuario in ["ana", "benito", "carla"] {
            servicio
                .registrar_accion_riesgosa(AccionRiesgosa::nueva(
                    usuario,
                    TipoAccion::OverrideAlerta,
                    "alertas",
                    "override",
                ))
                .unwrap();
        }

        let dir = TempDir::new().unwrap();
        let ruta = dir.path().join("riesgos.json");
        servicio.exportar_datos(&ruta).unwrap();

        let contenido = std::fs::read_to_string(&ruta).unwrap();
        let documento: ExportacionRiesgos = serde_json::from_str(&contenido).unwrap();
        assert_eq!(documento.total_usuarios, 3);
        assert_eq!(documento.scores_riesgo.len(), 3);
        assert!(!documento.timestamp_exportacion.is_empty());
    }

    #[test]
    fn test_export_vacio_valido() {
        let servicio = RiskManagementService::new();
        let dir = TempDir::new().unwrap();
        let ruta = dir.path().join("vacio.json");
        servicio.exportar_datos(&ruta).unwrap();

        let contenido = std::fs::read_to_string(&ruta).unwrap();
        let documento: ExportacionRiesgos = serde_json::from_str(&contenido).unwrap();
        assert_eq!(documento.total_usuarios, 0);
        assert!(documento.alertas_operativas.is_empty());
    }

    #[test]
    fn test_export_ruta_invalida_falla() {
        let servicio = RiskManagementService::new();
        let resultado = servicio.exportar_datos(Path::new("/no/existe/riesgos.json"));
        assert!(matches!(resultado, Err(crate::Error::Io(_))));
    }
}
