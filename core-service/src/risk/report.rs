//! Monthly Risk Report
//!
//! Aggregates the current calendar month's risky activity into a single
//! report: totals, a severity histogram, the highest-risk users and the
//! most frequent pattern types.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::REPORTE_TOP_USUARIOS;

use super::service::RiskManagementService;
use super::types::ScoreRiesgoUsuario;

/// Severity histogram buckets over the 1-10 scale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistogramaGravedad {
    /// gravedad 1-3
    pub baja: usize,
    /// gravedad 4-6
    pub media: usize,
    /// gravedad 7-8
    pub alta: usize,
    /// gravedad 9-10
    pub critica: usize,
}

impl HistogramaGravedad {
    fn contar(&mut self, gravedad: u8) {
        match gravedad {
            1..=3 => self.baja += 1,
            4..=6 => self.media += 1,
            7..=8 => self.alta += 1,
            _ => self.critica += 1,
        }
    }
}

/// Pattern type with its occurrence count across users this month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatronFrecuente {
    pub tipo_patron: String,
    pub detecciones: usize,
}

/// Aggregated risky-activity report for one calendar month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporteMensual {
    /// Month covered, as "YYYY-MM"
    pub mes: String,
    pub total_acciones_riesgosas: usize,
    pub usuarios_con_acciones: usize,
    pub por_gravedad: HistogramaGravedad,
    pub top_usuarios_riesgo: Vec<ScoreRiesgoUsuario>,
    pub patrones_mas_frecuentes: Vec<PatronFrecuente>,
    pub generado_en: DateTime<Utc>,
}

impl RiskManagementService {
    /// Aggregate the current calendar month's activity.
    pub fn generar_reporte_mensual(&self) -> ReporteMensual {
        let ahora = Utc::now();
        let historiales = self.historiales_snapshot();

        let mut total = 0usize;
        let mut usuarios_activos = 0usize;
        let mut histograma = HistogramaGravedad::default();

        for acciones in historiales.values() {
            let del_mes: Vec<_> = acciones
                .iter()
                .filter(|a| a.timestamp.year() == ahora.year() && a.timestamp.month() == ahora.month())
                .collect();
            if del_mes.is_empty() {
                continue;
            }
            usuarios_activos += 1;
            total += del_mes.len();
            for accion in del_mes {
                histograma.contar(accion.gravedad);
            }
        }

        let mut top = self.obtener_usuarios_alto_riesgo(0);
        top.truncate(REPORTE_TOP_USUARIOS);

        let mut conteo_patrones: HashMap<&'static str, usize> = HashMap::new();
        for patrones in self.patrones_snapshot().values() {
            for patron in patrones {
                *conteo_patrones.entry(patron.tipo_patron.as_str()).or_insert(0) += 1;
            }
        }
        let mut frecuentes: Vec<PatronFrecuente> = conteo_patrones
            .into_iter()
            .map(|(tipo, detecciones)| PatronFrecuente {
                tipo_patron: tipo.to_string(),
                detecciones,
            })
            .collect();
        frecuentes.sort_by(|a, b| {
            b.detecciones
                .cmp(&a.detecciones)
                .then_with(|| a.tipo_patron.cmp(&b.tipo_patron))
        });

        ReporteMensual {
            mes: format!("{}-{:02}", ahora.year(), ahora.month()),
            total_acciones_riesgosas: total,
            usuarios_con_acciones: usuarios_activos,
            por_gravedad: histograma,
            top_usuarios_riesgo: top,
            patrones_mas_frecuentes: frecuentes,
            generado_en: ahora,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::types::{AccionRiesgosa, TipoAccion};

    #[test]
    fn test_reporte_cuenta_acciones_y_usuarios() {
        let servicio = RiskManagementService::new();

        for _ in 0..3 {
            servicio
                .registrar_accion_riesgosa(AccionRiesgosa::nueva(
                    "ana",
                    TipoAccion::OverrideAlerta,
                    "alertas",
                    "override",
                ))
                .unwrap();
        }
        for _ in 0..2 {
            servicio
                .registrar_accion_riesgosa(AccionRiesgosa::nueva(
                    "benito",
                    TipoAccion::EliminacionMasiva,
                    "animales",
                    "borrado",
                ))
                .unwrap();
        }

        let reporte = servicio.generar_reporte_mensual();
        assert_eq!(reporte.total_acciones_riesgosas, 5);
        assert_eq!(reporte.usuarios_con_acciones, 2);
        assert_eq!(reporte.por_gravedad.media, 3); // overrides, gravedad 6
        assert_eq!(reporte.por_gravedad.critica, 2); // deletions, gravedad 9
    }

    #[test]
    fn test_reporte_con_timestamp() {
        let servicio = RiskManagementService::new();
        let reporte = servicio.generar_reporte_mensual();
        let ahora = Utc::now();
        assert_eq!(
            reporte.mes,
            format!("{}-{:02}", ahora.year(), ahora.month())
        );
        assert_eq!(reporte.total_acciones_riesgosas, 0);
    }

    #[test]
    fn test_top_usuarios_acotado() {
        let servicio = RiskManagementService::new();
        for i in 0..8 {
            servicio
                .registrar_accion_riesgosa(AccionRiesgosa::nueva(
                    &format!("usuario{}", i),
                    TipoAccion::ExportacionDatos,
                    "reportes",
                    "export",
                ))
                .unwrap();
        }

        let reporte = servicio.generar_reporte_mensual();
        assert!(reporte.top_usuarios_riesgo.len() <= REPORTE_TOP_USUARIOS);
    }
}
