//! Risk view handlers
//!
//! Uncached reads over the in-process risk engine: the admin screens poll
//! these to surface operational alerts and high-risk users. Scores are
//! recomputed on every call, so no TTL cache sits in front.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use fincafacil_core::constants::UMBRAL_ALTO_RIESGO;

use crate::{ApiResult, AppState};

use super::con_generado_en;

#[derive(Debug, Deserialize)]
pub struct ParamsUmbral {
    umbral: Option<u8>,
}

/// GET /api/v1/riesgos/alertas
pub async fn alertas(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let alertas = state.riesgos.obtener_alertas_operativas();
    Ok(Json(con_generado_en(json!({
        "total": alertas.len(),
        "alertas": alertas,
    }))))
}

/// GET /api/v1/riesgos/usuarios
pub async fn usuarios(
    State(state): State<AppState>,
    Query(params): Query<ParamsUmbral>,
) -> ApiResult<Json<Value>> {
    let umbral = params.umbral.unwrap_or(UMBRAL_ALTO_RIESGO);
    let usuarios = state.riesgos.obtener_usuarios_alto_riesgo(umbral);
    Ok(Json(con_generado_en(json!({
        "umbral": umbral,
        "total": usuarios.len(),
        "usuarios": usuarios,
    }))))
}
