//! Analytics handlers
//!
//! Read-only, cached views over the read models. Every handler follows the
//! same shape: validate empresa_id, consult the TTL cache under the
//! canonical key, otherwise compute through the `AnalyticsService`, stamp
//! `generado_en`, store and return.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use fincafacil_core::analytics::store::FiltroProductividad;

use crate::cache::{clave_cache, TTL_CORTO, TTL_LARGO};
use crate::{ApiResult, AppState};

use super::{con_generado_en, requerir_empresa};

#[derive(Debug, Deserialize)]
pub struct ParamsOverview {
    empresa_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ParamsProductividad {
    empresa_id: Option<i64>,
    fecha: Option<NaiveDate>,
    lote_id: Option<i64>,
    rango_dias: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ParamsFecha {
    empresa_id: Option<i64>,
    fecha: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ParamsComparativos {
    empresa_id: Option<i64>,
    comparador: Option<String>,
    rango_dias: Option<i64>,
}

/// GET /api/v1/analytics/overview
pub async fn overview(
    State(state): State<AppState>,
    Query(params): Query<ParamsOverview>,
) -> ApiResult<Json<Value>> {
    let empresa_id = requerir_empresa(params.empresa_id)?;
    let clave = clave_cache("overview", &[("empresa_id", Some(empresa_id.to_string()))]);
    if let Some(payload) = state.cache.get(&clave) {
        return Ok(Json(payload));
    }

    let resumen = state.analytics.resumen_general(empresa_id)?;
    let payload = con_generado_en(serde_json::to_value(resumen)?);
    state.cache.put(&clave, payload.clone(), TTL_CORTO);
    Ok(Json(payload))
}

/// GET /api/v1/analytics/productividad
pub async fn productividad(
    State(state): State<AppState>,
    Query(params): Query<ParamsProductividad>,
) -> ApiResult<Json<Value>> {
    let empresa_id = requerir_empresa(params.empresa_id)?;
    let clave = clave_cache(
        "productividad",
        &[
            ("empresa_id", Some(empresa_id.to_string())),
            ("fecha", params.fecha.map(|f| f.to_string())),
            ("lote_id", params.lote_id.map(|l| l.to_string())),
            ("rango_dias", params.rango_dias.map(|r| r.to_string())),
        ],
    );
    if let Some(payload) = state.cache.get(&clave) {
        return Ok(Json(payload));
    }

    let filtro = FiltroProductividad {
        fecha: params.fecha,
        lote_id: params.lote_id,
        rango_dias: params.rango_dias,
    };
    let filas = state.analytics.productividad(empresa_id, &filtro)?;
    let payload = con_generado_en(json!({ "empresa_id": empresa_id, "filas": filas }));
    state.cache.put(&clave, payload.clone(), TTL_LARGO);
    Ok(Json(payload))
}

/// GET /api/v1/analytics/alertas
pub async fn alertas(
    State(state): State<AppState>,
    Query(params): Query<ParamsFecha>,
) -> ApiResult<Json<Value>> {
    let empresa_id = requerir_empresa(params.empresa_id)?;
    let clave = clave_cache(
        "alertas",
        &[
            ("empresa_id", Some(empresa_id.to_string())),
            ("fecha", params.fecha.map(|f| f.to_string())),
        ],
    );
    if let Some(payload) = state.cache.get(&clave) {
        return Ok(Json(payload));
    }

    let filas = state.analytics.alertas(empresa_id, params.fecha)?;
    let payload = con_generado_en(json!({ "empresa_id": empresa_id, "filas": filas }));
    state.cache.put(&clave, payload.clone(), TTL_CORTO);
    Ok(Json(payload))
}

/// GET /api/v1/analytics/ia
pub async fn ia(
    State(state): State<AppState>,
    Query(params): Query<ParamsFecha>,
) -> ApiResult<Json<Value>> {
    let empresa_id = requerir_empresa(params.empresa_id)?;
    let clave = clave_cache(
        "ia",
        &[
            ("empresa_id", Some(empresa_id.to_string())),
            ("fecha", params.fecha.map(|f| f.to_string())),
        ],
    );
    if let Some(payload) = state.cache.get(&clave) {
        return Ok(Json(payload));
    }

    let filas = state.analytics.ia(empresa_id, params.fecha)?;
    let payload = con_generado_en(json!({ "empresa_id": empresa_id, "filas": filas }));
    state.cache.put(&clave, payload.clone(), TTL_CORTO);
    Ok(Json(payload))
}

/// GET /api/v1/analytics/autonomia
pub async fn autonomia(
    State(state): State<AppState>,
    Query(params): Query<ParamsFecha>,
) -> ApiResult<Json<Value>> {
    let empresa_id = requerir_empresa(params.empresa_id)?;
    let clave = clave_cache(
        "autonomia",
        &[
            ("empresa_id", Some(empresa_id.to_string())),
            ("fecha", params.fecha.map(|f| f.to_string())),
        ],
    );
    if let Some(payload) = state.cache.get(&clave) {
        return Ok(Json(payload));
    }

    let filas = state.analytics.autonomia(empresa_id, params.fecha)?;
    let payload = con_generado_en(json!({ "empresa_id": empresa_id, "filas": filas }));
    state.cache.put(&clave, payload.clone(), TTL_CORTO);
    Ok(Json(payload))
}

/// GET /api/v1/analytics/comparativos
pub async fn comparativos(
    State(state): State<AppState>,
    Query(params): Query<ParamsComparativos>,
) -> ApiResult<Json<Value>> {
    let empresa_id = requerir_empresa(params.empresa_id)?;
    let comparador = params
        .comparador
        .ok_or_else(|| crate::ApiError::Validation("comparador es requerido".to_string()))?;

    let clave = clave_cache(
        "comparativos",
        &[
            ("empresa_id", Some(empresa_id.to_string())),
            ("comparador", Some(comparador.clone())),
            ("rango_dias", params.rango_dias.map(|r| r.to_string())),
        ],
    );
    if let Some(payload) = state.cache.get(&clave) {
        return Ok(Json(payload));
    }

    let comparativo = state
        .analytics
        .comparativo(empresa_id, &comparador, params.rango_dias)?;
    let payload = con_generado_en(serde_json::to_value(comparativo)?);
    state.cache.put(&clave, payload.clone(), TTL_LARGO);
    Ok(Json(payload))
}
