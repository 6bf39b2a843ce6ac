//! Sliding-Window Pattern Detection
//!
//! Rescans one user's action history restricted to a trailing window per
//! action type, and emits a `PatronDetectado` when the same-type count meets
//! the type's threshold. The detector is a pure function of the history, so
//! re-running it on the same input always yields the same patterns.

use chrono::{DateTime, Utc};

use super::types::{AccionRiesgosa, PatronDetectado, TipoAccion, TipoPatron};

/// All pattern-bearing action types, scanned in a fixed order so pattern
/// lists are deterministic.
const TIPOS_CON_PATRON: &[TipoAccion] = &[
    TipoAccion::OverrideAlerta,
    TipoAccion::EliminacionMasiva,
    TipoAccion::CambioConfigCritico,
    TipoAccion::AccesoFueraHorario,
];

/// Detect every pattern present in `historial` as of `ahora`.
///
/// Counts same-type actions inside the type's trailing window; at or above
/// the threshold a pattern is emitted with the observed occurrence count.
pub fn detectar_patrones(
    historial: &[AccionRiesgosa],
    ahora: DateTime<Utc>,
) -> Vec<PatronDetectado> {
    let mut patrones = Vec::new();

    for tipo in TIPOS_CON_PATRON {
        let (tipo_patron, ventana, umbral) = match tipo.parametros_patron() {
            Some(p) => p,
            None => continue,
        };

        let desde = ahora - ventana;
        let ocurrencias = historial
            .iter()
            .filter(|a| a.tipo_accion == *tipo && a.timestamp >= desde && a.timestamp <= ahora)
            .count();

        if ocurrencias >= umbral {
            patrones.push(PatronDetectado {
                tipo_patron,
                descripcion: descripcion_patron(tipo_patron, ocurrencias, ventana.num_days()),
                ocurrencias,
                gravedad: gravedad_patron(tipo.gravedad_base(), ocurrencias, umbral),
            });
        }
    }

    patrones
}

/// Pattern severity derives from the action type's base severity, bumped by
/// one once occurrences reach double the threshold. Capped at 10.
fn gravedad_patron(gravedad_base: u8, ocurrencias: usize, umbral: usize) -> u8 {
    if ocurrencias >= umbral * 2 {
        (gravedad_base + 1).min(10)
    } else {
        gravedad_base
    }
}

fn descripcion_patron(tipo: TipoPatron, ocurrencias: usize, dias: i64) -> String {
    match tipo {
        TipoPatron::OverridesFrecuentes => format!(
            "{} overrides de alertas en los últimos {} días",
            ocurrencias, dias
        ),
        TipoPatron::EliminacionesMasivas => format!(
            "{} eliminaciones masivas en los últimos {} días",
            ocurrencias, dias
        ),
        TipoPatron::CambiosConfigFrecuentes => format!(
            "{} cambios de configuración crítica en los últimos {} días",
            ocurrencias, dias
        ),
        TipoPatron::ActividadFueraHorario => format!(
            "{} accesos fuera de horario en los últimos {} días",
            ocurrencias, dias
        ),
    }
}

// ============================================================================
// TESTS
// ============================================================================
