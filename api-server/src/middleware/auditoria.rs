//! Audit middleware
//!
//! Records one structured audit entry per `/api/v1` call - cached responses
//! included - with the real response outcome. The write happens after the
//! handler so the entry carries the status code, and it goes through
//! `AuditTrail::record`, which isolates failures from the response path.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::audit::RegistroAuditoria;
use crate::AppState;

/// Middleware: audit every analytics/risk API call.
pub async fn registrar_auditoria(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let endpoint = req.uri().path().to_string();
    let parametros = req.uri().query().unwrap_or("").to_string();
    let (empresa_id, usuario_id) = extraer_identidad(&parametros);

    let respuesta = next.run(req).await;

    state.audit.record(&RegistroAuditoria::nuevo(
        empresa_id,
        usuario_id,
        &endpoint,
        &parametros,
        respuesta.status().as_u16(),
    ));

    respuesta
}

/// Pull empresa_id / usuario_id out of the raw query string.
fn extraer_identidad(query: &str) -> (Option<i64>, Option<String>) {
    let mut empresa_id = None;
    let mut usuario_id = None;

    for par in query.split('&') {
        match par.split_once('=') {
            Some(("empresa_id", valor)) => empresa_id = valor.parse().ok(),
            Some(("usuario_id", valor)) if !valor.is_empty() => {
                usuario_id = Some(valor.to_string())
            }
            _ => {}
        }
    }
    (empresa_id, usuario_id)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraer_identidad() {
        let (empresa, usuario) = extraer_identidad("empresa_id=7&usuario_id=ana&fecha=2026-08-07");
        assert_eq!(empresa, Some(7));
        assert_eq!(usuario, Some("ana".to_string()));
    }

    #[test]
    fn test_identidad_ausente() {
        let (empresa, usuario) = extraer_identidad("fecha=2026-08-07");
        assert_eq!(empresa, None);
        assert_eq!(usuario, None);

        let (empresa, usuario) = extraer_identidad("");
        assert_eq!(empresa, None);
        assert_eq!(usuario, None);
    }

    #[test]
    fn test_empresa_no_numerica_ignorada() {
        let (empresa, _) = extraer_identidad("empresa_id=abc");
        assert_eq!(empresa, None);
    }
}
