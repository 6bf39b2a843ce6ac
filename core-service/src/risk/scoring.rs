//! Risk Score Computation
//!
//! Deterministic and explainable: the score is a weighted sum of recent
//! action severities plus pattern contributions, clamped to 0-100, with a
//! reason recorded for every contribution.

use chrono::{DateTime, Duration, Utc};

use crate::constants::{
    ALERTA_CRITICO_MIN, ALERTA_URGENTE_MIN, GRAVEDAD_PESO_DOBLE, NIVEL_ALTO_MIN,
    NIVEL_CRITICO_MIN, NIVEL_MEDIO_MIN, PUNTOS_POR_GRAVEDAD_PATRON, UMBRAL_ALTO_RIESGO,
    VENTANA_ACCIONES_DIAS,
};

use super::types::{
    AccionRiesgosa, AlertaOperativa, NivelAlerta, NivelRiesgo, PatronDetectado,
    ScoreRiesgoUsuario,
};

// ============================================================================
// SCORE
// ============================================================================

/// Compute the bounded score for one user from the full action history and
/// the currently detected patterns.
///
/// Weighting: each action inside the trailing window contributes its
/// gravedad in points, doubled at gravedad >= 8 so high-severity actions
/// dominate. Each pattern adds `gravedad * 3`. Additional qualifying
/// actions can only raise the total, so the score is monotone
/// non-decreasing until the 100 clamp.
pub fn calcular_score(
    usuario: &str,
    historial: &[AccionRiesgosa],
    patrones: &[PatronDetectado],
    ahora: DateTime<Utc>,
) -> ScoreRiesgoUsuario {
    let desde = ahora - Duration::days(VENTANA_ACCIONES_DIAS);
    let mut puntos: u32 = 0;
    let mut causas = Vec::new();

    let recientes: Vec<&AccionRiesgosa> = historial
        .iter()
        .filter(|a| a.timestamp >= desde && a.timestamp <= ahora)
        .collect();

    let graves = recientes
        .iter()
        .filter(|a| a.gravedad >= GRAVEDAD_PESO_DOBLE)
        .count();

    for accion in &recientes {
        puntos += peso_accion(accion.gravedad);
    }

    if !recientes.is_empty() {
        causas.push(format!(
            "{} acciones riesgosas en los últimos {} días",
            recientes.len(),
            VENTANA_ACCIONES_DIAS
        ));
    }
    if graves > 0 {
        causas.push(format!(
            "{} acciones de gravedad alta (>= {})",
            graves, GRAVEDAD_PESO_DOBLE
        ));
    }

    for patron in patrones {
        puntos += patron.gravedad as u32 * PUNTOS_POR_GRAVEDAD_PATRON;
        causas.push(format!(
            "Patrón {}: {}",
            patron.tipo_patron.as_str(),
            patron.descripcion
        ));
    }

    let score = puntos.min(100) as u8;
    let nivel = nivel_para_score(score);

    ScoreRiesgoUsuario {
        usuario: usuario.to_string(),
        score,
        nivel,
        requiere_accion: score >= UMBRAL_ALTO_RIESGO,
        causas,
        recomendacion: recomendacion_para(nivel).to_string(),
    }
}

/// Per-action weight. Superlinear at the top of the scale: a severity-9
/// action is worth 18 points against 7 for a severity-7 one.
fn peso_accion(gravedad: u8) -> u32 {
    if gravedad >= GRAVEDAD_PESO_DOBLE {
        gravedad as u32 * 2
    } else {
        gravedad as u32
    }
}

/// Deterministic step function from score to nivel.
pub fn nivel_para_score(score: u8) -> NivelRiesgo {
    if score >= NIVEL_CRITICO_MIN {
        NivelRiesgo::Critico
    } else if score >= NIVEL_ALTO_MIN {
        NivelRiesgo::Alto
    } else if score >= NIVEL_MEDIO_MIN {
        NivelRiesgo::Medio
    } else {
        NivelRiesgo::Bajo
    }
}

fn recomendacion_para(nivel: NivelRiesgo) -> &'static str {
    match nivel {
        NivelRiesgo::Bajo => "Sin acción requerida",
        NivelRiesgo::Medio => "Monitorear la actividad del usuario",
        NivelRiesgo::Alto => "Revisar las acciones recientes con el supervisor",
        NivelRiesgo::Critico => {
            "Suspender permisos elevados y auditar la actividad de inmediato"
        }
    }
}

// ============================================================================
// OPERATIONAL ALERTS
// ============================================================================

/// Build the operational alert for a user already known to be at or above
/// the high-risk threshold, graded by how far above it the score sits.
pub fn construir_alerta(
    score: &ScoreRiesgoUsuario,
    patrones: Vec<PatronDetectado>,
) -> AlertaOperativa {
    let nivel_alerta = if score.score >= ALERTA_CRITICO_MIN {
        NivelAlerta::Critico
    } else if score.score >= ALERTA_URGENTE_MIN {
        NivelAlerta::Urgente
    } else {
        NivelAlerta::Atencion
    };

    let mut acciones_sugeridas = vec![format!(
        "Revisar la actividad reciente de {} con su supervisor",
        score.usuario
    )];
    for patron in &patrones {
        match patron.tipo_patron {
            super::types::TipoPatron::OverridesFrecuentes => acciones_sugeridas
                .push("Verificar por qué se están ignorando las alertas de seguridad".to_string()),
            super::types::TipoPatron::EliminacionesMasivas => acciones_sugeridas
                .push("Confirmar respaldos y revisar los registros eliminados".to_string()),
            super::types::TipoPatron::CambiosConfigFrecuentes => acciones_sugeridas
                .push("Auditar los cambios de configuración aplicados".to_string()),
            super::types::TipoPatron::ActividadFueraHorario => acciones_sugeridas
                .push("Validar los accesos fuera del horario laboral".to_string()),
        }
    }
    if nivel_alerta == NivelAlerta::Critico {
        acciones_sugeridas.push("Considerar la suspensión temporal de permisos".to_string());
    }

    AlertaOperativa {
        usuario: score.usuario.clone(),
        score_riesgo: score.score,
        nivel_alerta,
        mensaje: format!(
            "Usuario {} con score de riesgo {} ({})",
            score.usuario,
            score.score,
            score.nivel.as_str()
        ),
        patrones,
        acciones_sugeridas,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::types::TipoAccion;

    fn accion(tipo: TipoAccion, gravedad: u8) -> AccionRiesgosa {
        AccionRiesgosa::nueva("ana", tipo, "test", "acción").con_gravedad(gravedad)
    }

    #[test]
    fn test_score_monotono_con_mas_acciones() {
        let ahora = Utc::now();
        let mut historial = Vec::new();
        let mut anterior = 0;

        for _ in 0..20 {
            historial.push(accion(TipoAccion::ExportacionDatos, 5));
            let s = calcular_score("ana", &historial, &[], ahora);
            assert!(s.score >= anterior);
            anterior = s.score;
        }
    }

    #[test]
    fn test_gravedad_alta_domina() {
        let ahora = Utc::now();
        // 5 severity-9 actions vs 5 severity-7 actions of the same count
        let graves: Vec<_> = (0..5)
            .map(|_| accion(TipoAccion::EliminacionMasiva, 9))
            .collect();
        let medias: Vec<_> = (0..5)
            .map(|_| accion(TipoAccion::CambioConfigCritico, 7))
            .collect();

        let s_grave = calcular_score("ana", &graves, &[], ahora);
        let s_media = calcular_score("bea", &medias, &[], ahora);
        assert!(s_grave.score > s_media.score);
    }

    #[test]
    fn test_score_clampeado_a_100() {
        let ahora = Utc::now();
        let historial: Vec<_> = (0..50)
            .map(|_| accion(TipoAccion::EliminacionMasiva, 10))
            .collect();
        let s = calcular_score("ana", &historial, &[], ahora);
        assert_eq!(s.score, 100);
        assert_eq!(s.nivel, NivelRiesgo::Critico);
    }

    #[test]
    fn test_niveles_ascendentes() {
        assert_eq!(nivel_para_score(0), NivelRiesgo::Bajo);
        assert_eq!(nivel_para_score(29), NivelRiesgo::Bajo);
        assert_eq!(nivel_para_score(30), NivelRiesgo::Medio);
        assert_eq!(nivel_para_score(60), NivelRiesgo::Alto);
        assert_eq!(nivel_para_score(85), NivelRiesgo::Critico);
        assert_eq!(nivel_para_score(100), NivelRiesgo::Critico);
    }

    #[test]
    fn test_acciones_antiguas_no_contribuyen() {
        let ahora = Utc::now();
        let vieja = accion(TipoAccion::EliminacionMasiva, 9)
            .con_timestamp(ahora - Duration::days(VENTANA_ACCIONES_DIAS + 5));
        let s = calcular_score("ana", &[vieja], &[], ahora);
        assert_eq!(s.score, 0);
        assert_eq!(s.nivel, NivelRiesgo::Bajo);
    }

    #[test]
    fn test_alerta_graduada_por_score() {
        let base = ScoreRiesgoUsuario {
            usuario: "ana".to_string(),
            score: 62,
            nivel: NivelRiesgo::Alto,
            requiere_accion: true,
            causas: vec![],
            recomendacion: String::new(),
        };
        assert_eq!(
            construir_alerta(&base, vec![]).nivel_alerta,
            NivelAlerta::Atencion
        );

        let urgente = ScoreRiesgoUsuario { score: 80, ..base.clone() };
        assert_eq!(
            construir_alerta(&urgente, vec![]).nivel_alerta,
            NivelAlerta::Urgente
        );

        let critico = ScoreRiesgoUsuario { score: 95, ..base };
        assert_eq!(
            construir_alerta(&critico, vec![]).nivel_alerta,
            NivelAlerta::Critico
        );
    }

    #[test]
    fn test_alerta_siempre_sugiere_acciones() {
        let score = ScoreRiesgoUsuario {
            usuario: "ana".to_string(),
            score: 70,
            nivel: NivelRiesgo::Alto,
            requiere_accion: true,
            causas: vec![],
            recomendacion: String::new(),
        };
        let alerta = construir_alerta(&score, vec![]);
        assert!(!alerta.acciones_sugeridas.is_empty());
    }
}
