//! Request handlers

pub mod analytics;
pub mod health;
pub mod riesgos;

use chrono::Utc;
use serde_json::Value;

use crate::{ApiError, ApiResult};

/// Fallback for unknown routes.
pub async fn ruta_desconocida() -> ApiError {
    ApiError::NotFound("ruta desconocida".to_string())
}

/// empresa_id is mandatory on every analytics route; there is no implicit
/// default company.
pub(crate) fn requerir_empresa(empresa_id: Option<i64>) -> ApiResult<i64> {
    match empresa_id {
        Some(id) if id > 0 => Ok(id),
        Some(id) => Err(ApiError::Validation(format!("empresa_id inválido: {id}"))),
        None => Err(ApiError::Validation("empresa_id es requerido".to_string())),
    }
}

/// Stamp the payload with its computation time. Cached responses keep the
/// original stamp, so recomputation after TTL expiry is observable.
pub(crate) fn con_generado_en(mut payload: Value) -> Value {
    if let Value::Object(ref mut objeto) = payload {
        objeto.insert(
            "generado_en".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
    }
    payload
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_requerir_empresa() {
        assert_eq!(requerir_empresa(Some(3)).unwrap(), 3);
        assert!(requerir_empresa(None).is_err());
        assert!(requerir_empresa(Some(0)).is_err());
        assert!(requerir_empresa(Some(-1)).is_err());
    }

    #[test]
    fn test_con_generado_en() {
        let payload = con_generado_en(json!({"filas": []}));
        assert!(payload.get("generado_en").is_some());
    }
}
