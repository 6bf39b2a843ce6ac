//! Risk Management Service
//!
//! Owns the per-user action histories and the patterns derived from them.
//! All state is in-memory with process lifetime; both maps sit behind a
//! `parking_lot::RwLock` so concurrent request handlers cannot lose updates.
//!
//! Within one user's stream, registrations apply in lock-acquisition order
//! (FIFO per user); across users no ordering is guaranteed or needed.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;

use crate::constants::UMBRAL_ALTO_RIESGO;
use crate::error::{Error, Result};

use super::patterns::detectar_patrones;
use super::scoring::{calcular_score, construir_alerta};
use super::types::{AccionRiesgosa, AlertaOperativa, PatronDetectado, ScoreRiesgoUsuario};

/// In-process risk scoring engine. Construct once at the composition root
/// and share as `Arc<RiskManagementService>`.
pub struct RiskManagementService {
    /// usuario -> append-only action history, oldest first
    historiales: RwLock<HashMap<String, Vec<AccionRiesgosa>>>,
    /// usuario -> patterns detected at the last registration
    patrones: RwLock<HashMap<String, Vec<PatronDetectado>>>,
}

impl RiskManagementService {
    pub fn new() -> Self {
        Self {
            historiales: RwLock::new(HashMap::new()),
            patrones: RwLock::new(HashMap::new()),
        }
    }

    /// Append an action to the user's history and refresh that user's
    /// detected patterns from the updated window.
    pub fn registrar_accion_riesgosa(&self, accion: AccionRiesgosa) -> Result<()> {
        if accion.usuario.trim().is_empty() {
            return Err(Error::Validation(
                "acción riesgosa sin usuario".to_string(),
            ));
        }

        let usuario = accion.usuario.clone();
        let detectados = {
            let mut historiales = self.historiales.write();
            let historial = historiales.entry(usuario.clone()).or_default();
            historial.push(accion);
            detectar_patrones(historial, Utc::now())
        };

        if !detectados.is_empty() {
            log::warn!(
                "Usuario {} con {} patrón(es) de riesgo activos",
                usuario,
                detectados.len()
            );
        }
        self.patrones.write().insert(usuario, detectados);
        Ok(())
    }

    /// Current score for a user, or `None` if the user has no history.
    pub fn obtener_score_usuario(&self, usuario: &str) -> Option<ScoreRiesgoUsuario> {
        let historiales = self.historiales.read();
        let historial = historiales.get(usuario)?;

        let patrones = self.patrones.read();
        let del_usuario = patrones.get(usuario).cloned().unwrap_or_default();
        Some(calcular_score(usuario, historial, &del_usuario, Utc::now()))
    }

    /// One alert per user whose score is at or above the high-risk
    /// threshold, graded by how far above it the score sits.
    pub fn obtener_alertas_operativas(&self) -> Vec<AlertaOperativa> {
        let usuarios: Vec<String> = self.historiales.read().keys().cloned().collect();
        let mut alertas = Vec::new();

        for usuario in usuarios {
            let score = match self.obtener_score_usuario(&usuario) {
                Some(s) => s,
                None => continue,
            };
            if score.score >= UMBRAL_ALTO_RIESGO {
                let patrones = self
                    .patrones
                    .read()
                    .get(&usuario)
                    .cloned()
                    .unwrap_or_default();
                alertas.push(construir_alerta(&score, patrones));
            }
        }

        alertas.sort_by(|a, b| {
            b.score_riesgo
                .cmp(&a.score_riesgo)
                .then_with(|| a.usuario.cmp(&b.usuario))
        });
        alertas
    }

    /// All user scores at or above `umbral`, sorted by score descending.
    /// Ties break by usuario ascending so the order is stable.
    pub fn obtener_usuarios_alto_riesgo(&self, umbral: u8) -> Vec<ScoreRiesgoUsuario> {
        let usuarios: Vec<String> = self.historiales.read().keys().cloned().collect();
        let mut scores: Vec<ScoreRiesgoUsuario> = usuarios
            .iter()
            .filter_map(|u| self.obtener_score_usuario(u))
            .filter(|s| s.score >= umbral)
            .collect();

        scores.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.usuario.cmp(&b.usuario))
        });
        scores
    }

    /// Snapshot of every known user's current score, unsorted.
    pub(crate) fn scores_todos(&self) -> Vec<ScoreRiesgoUsuario> {
        let usuarios: Vec<String> = self.historiales.read().keys().cloned().collect();
        usuarios
            .iter()
            .filter_map(|u| self.obtener_score_usuario(u))
            .collect()
    }

    /// Snapshot of all histories, for the monthly report.
    pub(crate) fn historiales_snapshot(&self) -> HashMap<String, Vec<AccionRiesgosa>> {
        self.historiales.read().clone()
    }

    /// Patterns currently active for every user.
    pub(crate) fn patrones_snapshot(&self) -> HashMap<String, Vec<PatronDetectado>> {
        self.patrones.read().clone()
    }
}

impl Default for RiskManagementService {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::types::{NivelRiesgo, TipoAccion};

    fn registrar(servicio: &RiskManagementService, usuario: &str, tipo: TipoAccion, gravedad: u8) {
        servicio
            .registrar_accion_riesgosa(
                AccionRiesgosa::nueva(usuario, tipo, "test", "acción").con_gravedad(gravedad),
            )
            .unwrap();
    }

    #[test]
    fn test_usuario_desconocido_sin_score() {
        let servicio = RiskManagementService::new();
        assert!(servicio.obtener_score_usuario("nadie").is_none());
    }

    #[test]
    fn test_usuario_sin_nombre_rechazado() {
        let servicio = RiskManagementService::new();
        let accion = AccionRiesgosa::nueva("  ", TipoAccion::OverrideAlerta, "m", "d");
        assert!(servicio.registrar_accion_riesgosa(accion).is_err());
    }

    #[test]
    fn test_registro_detecta_patron() {
        let servicio = RiskManagementService::new();
        for _ in 0..5 {
            registrar(&servicio, "ana", TipoAccion::OverrideAlerta, 6);
        }

        let score = servicio.obtener_score_usuario("ana").unwrap();
        assert!(score
            .causas
            .iter()
            .any(|c| c.contains("OVERRIDES_FRECUENTES")));
    }

    #[test]
    fn test_orden_bajo_medio_alto() {
        let servicio = RiskManagementService::new();

        // low: 2 low-severity actions
        for _ in 0..2 {
            registrar(&servicio, "baja", TipoAccion::AccesoFueraHorario, 4);
        }
        // medium: 8 medium-severity actions
        for _ in 0..8 {
            registrar(&servicio, "media", TipoAccion::ExportacionDatos, 5);
        }
        // high: 6 medium + 4 high-severity actions
        for _ in 0..6 {
            registrar(&servicio, "alta", TipoAccion::ExportacionDatos, 5);
        }
        for _ in 0..4 {
            registrar(&servicio, "alta", TipoAccion::EliminacionMasiva, 9);
        }

        let s_baja = servicio.obtener_score_usuario("baja").unwrap();
        let s_media = servicio.obtener_score_usuario("media").unwrap();
        let s_alta = servicio.obtener_score_usuario("alta").unwrap();

        assert!(s_baja.score < s_media.score);
        assert!(s_media.score < s_alta.score);
        assert!(matches!(
            s_alta.nivel,
            NivelRiesgo::Alto | NivelRiesgo::Critico
        ));
    }

    #[test]
    fn test_alertas_solo_sobre_umbral() {
        let servicio = RiskManagementService::new();

        for _ in 0..2 {
            registrar(&servicio, "tranquilo", TipoAccion::AccesoFueraHorario, 3);
        }
        for _ in 0..6 {
            registrar(&servicio, "peligroso", TipoAccion::EliminacionMasiva, 9);
        }

        let alertas = servicio.obtener_alertas_operativas();
        assert_eq!(alertas.len(), 1);
        assert_eq!(alertas[0].usuario, "peligroso");
        assert!(!alertas[0].acciones_sugeridas.is_empty());
        assert!(alertas[0].score_riesgo >= UMBRAL_ALTO_RIESGO);
    }

    #[test]
    fn test_alto_riesgo_ordenado_descendente() {
        let servicio = RiskManagementService::new();

        for _ in 0..6 {
            registrar(&servicio, "uno", TipoAccion::EliminacionMasiva, 9);
        }
        for _ in 0..4 {
            registrar(&servicio, "dos", TipoAccion::EliminacionMasiva, 9);
        }
        for _ in 0..1 {
            registrar(&servicio, "tres", TipoAccion::AccesoFueraHorario, 3);
        }

        let altos = servicio.obtener_usuarios_alto_riesgo(60);
        assert!(altos.iter().all(|s| s.score >= 60));
        for ventana in altos.windows(2) {
            assert!(ventana[0].score >= ventana[1].score);
        }
        assert!(altos.iter().all(|s| s.usuario != "tres"));
    }

    #[test]
    fn test_score_monotono_en_servicio() {
        let servicio = RiskManagementService::new();
        let mut anterior = 0;

        for _ in 0..15 {
            registrar(&servicio, "ana", TipoAccion::CambioConfigCritico, 7);
            let s = servicio.obtener_score_usuario("ana").unwrap();
            assert!(s.score >= anterior);
            anterior = s.score;
        }
    }
}
