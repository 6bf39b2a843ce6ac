//! Router-level acceptance tests
//!
//! Drive the full router with in-memory state: routes, error contract,
//! security headers, cache behavior and the audit trail.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use fincafacil_api::{audit::AuditTrail, cache::ResponseCache, create_router, AppState};
use fincafacil_core::analytics::types::{FilaIa, FilaProductividad};
use fincafacil_core::analytics::{AnalyticsService, AnalyticsStore};
use fincafacil_core::risk::{AccionRiesgosa, RiskManagementService, TipoAccion};

struct Contexto {
    state: AppState,
    _audit_dir: tempfile::TempDir,
}

fn contexto() -> Contexto {
    let audit_dir = tempfile::TempDir::new().unwrap();
    let audit = AuditTrail::open(&audit_dir.path().join("auditoria.jsonl")).unwrap();

    let store = Arc::new(AnalyticsStore::open_in_memory().unwrap());
    let state = AppState {
        analytics: Arc::new(AnalyticsService::new(store)),
        riesgos: Arc::new(RiskManagementService::new()),
        cache: Arc::new(ResponseCache::new()),
        audit: Arc::new(audit),
    };
    Contexto {
        state,
        _audit_dir: audit_dir,
    }
}

fn sembrar_analitica(state: &AppState) {
    let hoy = chrono::Utc::now().date_naive();
    state
        .analytics
        .registrar_productividad(FilaProductividad {
            empresa_id: 1,
            fecha: hoy,
            lote_id: 1,
            sector_id: 0,
            nacimientos: 5,
            destetes: 2,
            muertes: 1,
            traslados: 0,
            servicios: 3,
            partos_confirmados: 2,
            total_animales: 120,
            mortalidad_pct: 0.83,
        })
        .unwrap();
    state
        .analytics
        .registrar_ia(FilaIa {
            empresa_id: 1,
            fecha: hoy,
            sugerencias_generadas: 10,
            sugerencias_aceptadas: 8,
            sugerencias_rechazadas: 2,
            tasa_aceptacion_pct: 80.0,
            impacto_estimado: 3200.0,
        })
        .unwrap();
}

async fn get(state: &AppState, uri: &str) -> (StatusCode, serde_json::Value, axum::http::HeaderMap) {
    let app = create_router(state.clone());
    let respuesta = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = respuesta.status();
    let headers = respuesta.headers().clone();
    let bytes = axum::body::to_bytes(respuesta.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json, headers)
}

#[tokio::test]
async fn health_responde_ok() {
    let ctx = contexto();
    let (status, json, headers) = get(&ctx.state, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["timestamp"].is_i64());

    // baseline security headers on every response
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["cache-control"], "no-cache, no-store, must-revalidate");
}

#[tokio::test]
async fn ruta_desconocida_es_404_con_error() {
    let ctx = contexto();
    let (status, json, _) = get(&ctx.state, "/api/v1/analytics/inexistente").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn empresa_id_es_requerido() {
    let ctx = contexto();
    let (status, json, _) = get(&ctx.state, "/api/v1/analytics/overview").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("empresa_id"));
}

#[tokio::test]
async fn overview_compone_kpis() {
    let ctx = contexto();
    sembrar_analitica(&ctx.state);

    let (status, json, _) = get(&ctx.state, "/api/v1/analytics/overview?empresa_id=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["empresa_id"], 1);
    assert_eq!(json["productividad"]["nacimientos"], 5);
    assert_eq!(json["ia"]["tasa_aceptacion_pct"], 80.0);
    assert!(json["generado_en"].is_string());
}

#[tokio::test]
async fn productividad_filtra_y_cachea() {
    let ctx = contexto();
    sembrar_analitica(&ctx.state);

    let uri = "/api/v1/analytics/productividad?empresa_id=1&lote_id=1";
    let (status, primera, _) = get(&ctx.state, uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(primera["filas"].as_array().unwrap().len(), 1);

    // Same parameters within TTL: byte-identical cached payload,
    // generado_en included.
    let (_, segunda, _) = get(&ctx.state, uri).await;
    assert_eq!(
        serde_json::to_vec(&primera).unwrap(),
        serde_json::to_vec(&segunda).unwrap()
    );

    // Different parameters miss the cache
    let (_, otra, _) = get(&ctx.state, "/api/v1/analytics/productividad?empresa_id=1&lote_id=9").await;
    assert!(otra["filas"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn comparativos_requiere_comparador() {
    let ctx = contexto();
    let (status, _, _) = get(&ctx.state, "/api/v1/analytics/comparativos?empresa_id=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json, _) = get(
        &ctx.state,
        "/api/v1/analytics/comparativos?empresa_id=1&comparador=lotes",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["comparador"], "lotes");
}

#[tokio::test]
async fn riesgos_expone_usuarios_alto_riesgo() {
    let ctx = contexto();
    for _ in 0..6 {
        ctx.state
            .riesgos
            .registrar_accion_riesgosa(AccionRiesgosa::nueva(
                "benito",
                TipoAccion::EliminacionMasiva,
                "animales",
                "borrado masivo",
            ))
            .unwrap();
    }

    let (status, json, _) = get(&ctx.state, "/api/v1/riesgos/usuarios?umbral=60").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 1);
    assert_eq!(json["usuarios"][0]["usuario"], "benito");
    assert!(json["usuarios"][0]["score"].as_u64().unwrap() >= 60);

    let (status, json, _) = get(&ctx.state, "/api/v1/riesgos/alertas").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["alertas"][0]["usuario"], "benito");
    assert!(!json["alertas"][0]["acciones_sugeridas"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn toda_llamada_api_queda_auditada() {
    let ctx = contexto();
    sembrar_analitica(&ctx.state);

    let uri = "/api/v1/analytics/overview?empresa_id=1&usuario_id=ana";
    let _ = get(&ctx.state, uri).await;
    // cached second call is audited too
    let _ = get(&ctx.state, uri).await;
    // failed calls are audited with their outcome
    let _ = get(&ctx.state, "/api/v1/analytics/overview").await;

    assert_eq!(ctx.state.audit.registros(), 3);

    let contenido = std::fs::read_to_string(ctx.state.audit.path()).unwrap();
    let lineas: Vec<&str> = contenido.lines().collect();
    assert_eq!(lineas.len(), 3);

    let primera: serde_json::Value = serde_json::from_str(lineas[0]).unwrap();
    assert_eq!(primera["empresa_id"], 1);
    assert_eq!(primera["usuario_id"], "ana");
    assert_eq!(primera["resultado"], 200);

    let ultima: serde_json::Value = serde_json::from_str(lineas[2]).unwrap();
    assert_eq!(ultima["resultado"], 400);
}

#[tokio::test]
async fn health_no_pasa_por_auditoria() {
    let ctx = contexto();
    let _ = get(&ctx.state, "/health").await;
    assert_eq!(ctx.state.audit.registros(), 0);
}
