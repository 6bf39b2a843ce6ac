//! Read-model store
//!
//! SQLite-backed persistence for the analytics read models, with embedded
//! migrations managed via PRAGMA user_version. Every write is an upsert on
//! the row's natural key, so re-running a job for the same key supersedes
//! the previous run (last-write-wins).

use std::path::Path;

use chrono::NaiveDate;
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, ToSql};

use crate::error::Result;

use super::types::{FilaAlertas, FilaAutonomia, FilaIa, FilaProductividad};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: read-model tables, one per metric family
    r#"
    CREATE TABLE IF NOT EXISTS analitica_productividad (
        empresa_id          INTEGER NOT NULL,
        fecha               TEXT NOT NULL,
        lote_id             INTEGER NOT NULL DEFAULT 0,
        sector_id           INTEGER NOT NULL DEFAULT 0,
        nacimientos         INTEGER NOT NULL DEFAULT 0,
        destetes            INTEGER NOT NULL DEFAULT 0,
        muertes             INTEGER NOT NULL DEFAULT 0,
        traslados           INTEGER NOT NULL DEFAULT 0,
        servicios           INTEGER NOT NULL DEFAULT 0,
        partos_confirmados  INTEGER NOT NULL DEFAULT 0,
        total_animales      INTEGER NOT NULL DEFAULT 0,
        mortalidad_pct      REAL NOT NULL DEFAULT 0,
        computed_at         TEXT NOT NULL,
        PRIMARY KEY (empresa_id, fecha, lote_id, sector_id)
    );

    CREATE TABLE IF NOT EXISTS analitica_alertas (
        empresa_id                      INTEGER NOT NULL,
        fecha                           TEXT NOT NULL,
        tipo_alerta                     TEXT NOT NULL,
        activas                         INTEGER NOT NULL DEFAULT 0,
        resueltas                       INTEGER NOT NULL DEFAULT 0,
        criticas                        INTEGER NOT NULL DEFAULT 0,
        tiempo_resolucion_promedio_min  REAL NOT NULL DEFAULT 0,
        computed_at                     TEXT NOT NULL,
        PRIMARY KEY (empresa_id, fecha, tipo_alerta)
    );

    CREATE TABLE IF NOT EXISTS analitica_ia (
        empresa_id              INTEGER NOT NULL,
        fecha                   TEXT NOT NULL,
        sugerencias_generadas   INTEGER NOT NULL DEFAULT 0,
        sugerencias_aceptadas   INTEGER NOT NULL DEFAULT 0,
        sugerencias_rechazadas  INTEGER NOT NULL DEFAULT 0,
        tasa_aceptacion_pct     REAL NOT NULL DEFAULT 0,
        impacto_estimado        REAL NOT NULL DEFAULT 0,
        computed_at             TEXT NOT NULL,
        PRIMARY KEY (empresa_id, fecha)
    );

    CREATE TABLE IF NOT EXISTS analitica_autonomia (
        empresa_id                INTEGER NOT NULL,
        fecha                     TEXT NOT NULL,
        ejecuciones               INTEGER NOT NULL DEFAULT 0,
        exitosas                  INTEGER NOT NULL DEFAULT 0,
        fallidas                  INTEGER NOT NULL DEFAULT 0,
        rollbacks                 INTEGER NOT NULL DEFAULT 0,
        activaciones_kill_switch  INTEGER NOT NULL DEFAULT 0,
        tasa_exito_pct            REAL NOT NULL DEFAULT 0,
        computed_at               TEXT NOT NULL,
        PRIMARY KEY (empresa_id, fecha)
    );

    CREATE INDEX IF NOT EXISTS idx_productividad_empresa_fecha
        ON analitica_productividad(empresa_id, fecha);
    CREATE INDEX IF NOT EXISTS idx_alertas_empresa_fecha
        ON analitica_alertas(empresa_id, fecha);
    "#,
];

/// Filters accepted by the productivity read side.
#[derive(Debug, Clone, Default)]
pub struct FiltroProductividad {
    pub fecha: Option<NaiveDate>,
    pub lote_id: Option<i64>,
    pub rango_dias: Option<i64>,
}

/// Productivity totals summed across lotes for one fecha.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TotalesProductividad {
    pub fecha: NaiveDate,
    pub nacimientos: i64,
    pub destetes: i64,
    pub muertes: i64,
    pub traslados: i64,
    pub servicios: i64,
    pub partos_confirmados: i64,
    pub total_animales: i64,
    pub mortalidad_pct: f64,
}

/// Per-lote totals over a trailing range, for comparisons.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TotalesLote {
    pub lote_id: i64,
    pub nacimientos: i64,
    pub destetes: i64,
    pub muertes: i64,
    pub total_animales: i64,
    pub mortalidad_pct: f64,
}

/// Totals over an inclusive fecha range, for period comparisons.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TotalesPeriodo {
    pub desde: NaiveDate,
    pub hasta: NaiveDate,
    pub nacimientos: i64,
    pub destetes: i64,
    pub muertes: i64,
    pub mortalidad_pct: f64,
}

/// SQLite store for all analytics read models.
pub struct AnalyticsStore {
    conn: Mutex<Connection>,
}

impl AnalyticsStore {
    /// Open (creating directories and running migrations as needed).
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        run_migrations(&conn)?;
        log::info!("Analytics store abierto en {}", path.display());
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    // ========================================================================
    // UPSERTS
    // ========================================================================

    pub fn upsert_productividad(&self, fila: &FilaProductividad) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO analitica_productividad
                (empresa_id, fecha, lote_id, sector_id, nacimientos, destetes, muertes,
                 traslados, servicios, partos_confirmados, total_animales, mortalidad_pct,
                 computed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(empresa_id, fecha, lote_id, sector_id) DO UPDATE SET
                nacimientos = excluded.nacimientos,
                destetes = excluded.destetes,
                muertes = excluded.muertes,
                traslados = excluded.traslados,
                servicios = excluded.servicios,
                partos_confirmados = excluded.partos_confirmados,
                total_animales = excluded.total_animales,
                mortalidad_pct = excluded.mortalidad_pct,
                computed_at = excluded.computed_at
            "#,
            params![
                fila.empresa_id,
                fila.fecha.to_string(),
                fila.lote_id,
                fila.sector_id,
                fila.nacimientos,
                fila.destetes,
                fila.muertes,
                fila.traslados,
                fila.servicios,
                fila.partos_confirmados,
                fila.total_animales,
                fila.mortalidad_pct,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn upsert_alertas(&self, fila: &FilaAlertas) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO analitica_alertas
                (empresa_id, fecha, tipo_alerta, activas, resueltas, criticas,
                 tiempo_resolucion_promedio_min, computed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(empresa_id, fecha, tipo_alerta) DO UPDATE SET
                activas = excluded.activas,
                resueltas = excluded.resueltas,
                criticas = excluded.criticas,
                tiempo_resolucion_promedio_min = excluded.tiempo_resolucion_promedio_min,
                computed_at = excluded.computed_at
            "#,
            params![
                fila.empresa_id,
                fila.fecha.to_string(),
                fila.tipo_alerta,
                fila.activas,
                fila.resueltas,
                fila.criticas,
                fila.tiempo_resolucion_promedio_min,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn upsert_ia(&self, fila: &FilaIa) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO analitica_ia
                (empresa_id, fecha, sugerencias_generadas, sugerencias_aceptadas,
                 sugerencias_rechazadas, tasa_aceptacion_pct, impacto_estimado, computed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(empresa_id, fecha) DO UPDATE SET
                sugerencias_generadas = excluded.sugerencias_generadas,
                sugerencias_aceptadas = excluded.sugerencias_aceptadas,
                sugerencias_rechazadas = excluded.sugerencias_rechazadas,
                tasa_aceptacion_pct = excluded.tasa_aceptacion_pct,
                impacto_estimado = excluded.impacto_estimado,
                computed_at = excluded.computed_at
            "#,
            params![
                fila.empresa_id,
                fila.fecha.to_string(),
                fila.sugerencias_generadas,
                fila.sugerencias_aceptadas,
                fila.sugerencias_rechazadas,
                fila.tasa_aceptacion_pct,
                fila.impacto_estimado,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn upsert_autonomia(&self, fila: &FilaAutonomia) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO analitica_autonomia
                (empresa_id, fecha, ejecuciones, exitosas, fallidas, rollbacks,
                 activaciones_kill_switch, tasa_exito_pct, computed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(empresa_id, fecha) DO UPDATE SET
                ejecuciones = excluded.ejecuciones,
                exitosas = excluded.exitosas,
                fallidas = excluded.fallidas,
                rollbacks = excluded.rollbacks,
                activaciones_kill_switch = excluded.activaciones_kill_switch,
                tasa_exito_pct = excluded.tasa_exito_pct,
                computed_at = excluded.computed_at
            "#,
            params![
                fila.empresa_id,
                fila.fecha.to_string(),
                fila.ejecuciones,
                fila.exitosas,
                fila.fallidas,
                fila.rollbacks,
                fila.activaciones_kill_switch,
                fila.tasa_exito_pct,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ========================================================================
    // READ SIDE
    // ========================================================================

    pub fn productividad(
        &self,
        empresa_id: i64,
        filtro: &FiltroProductividad,
    ) -> Result<Vec<FilaProductividad>> {
        let mut sql = String::from(
            "SELECT empresa_id, fecha, lote_id, sector_id, nacimientos, destetes, muertes, \
             traslados, servicios, partos_confirmados, total_animales, mortalidad_pct \
             FROM analitica_productividad WHERE empresa_id = ?",
        );
        let mut valores: Vec<Box<dyn ToSql>> = vec![Box::new(empresa_id)];

        if let Some(fecha) = filtro.fecha {
            sql.push_str(" AND fecha = ?");
            valores.push(Box::new(fecha.to_string()));
        }
        if let Some(lote_id) = filtro.lote_id {
            sql.push_str(" AND lote_id = ?");
            valores.push(Box::new(lote_id));
        }
        if let Some(rango) = filtro.rango_dias {
            let desde = chrono::Utc::now().date_naive() - chrono::Duration::days(rango);
            sql.push_str(" AND fecha >= ?");
            valores.push(Box::new(desde.to_string()));
        }
        sql.push_str(" ORDER BY fecha DESC, lote_id, sector_id");

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let filas = stmt
            .query_map(params_from_iter(valores.iter()), row_a_productividad)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(filas)
    }

    pub fn alertas(&self, empresa_id: i64, fecha: Option<NaiveDate>) -> Result<Vec<FilaAlertas>> {
        let conn = self.conn.lock();
        let sql_base = "SELECT empresa_id, fecha, tipo_alerta, activas, resueltas, criticas, \
                        tiempo_resolucion_promedio_min FROM analitica_alertas \
                        WHERE empresa_id = ?1";
        let filas = match fecha {
            Some(f) => {
                let mut stmt =
                    conn.prepare(&format!("{sql_base} AND fecha = ?2 ORDER BY tipo_alerta"))?;
                let filas = stmt
                    .query_map(params![empresa_id, f.to_string()], row_a_alertas)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                filas
            }
            None => {
                let mut stmt =
                    conn.prepare(&format!("{sql_base} ORDER BY fecha DESC, tipo_alerta"))?;
                let filas = stmt
                    .query_map(params![empresa_id], row_a_alertas)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                filas
            }
        };
        Ok(filas)
    }

    pub fn ia(&self, empresa_id: i64, fecha: Option<NaiveDate>) -> Result<Vec<FilaIa>> {
        let conn = self.conn.lock();
        let sql_base = "SELECT empresa_id, fecha, sugerencias_generadas, sugerencias_aceptadas, \
                        sugerencias_rechazadas, tasa_aceptacion_pct, impacto_estimado \
                        FROM analitica_ia WHERE empresa_id = ?1";
        let filas = match fecha {
            Some(f) => {
                let mut stmt = conn.prepare(&format!("{sql_base} AND fecha = ?2"))?;
                let filas = stmt
                    .query_map(params![empresa_id, f.to_string()], row_a_ia)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                filas
            }
            None => {
                let mut stmt = conn.prepare(&format!("{sql_base} ORDER BY fecha DESC LIMIT 30"))?;
                let filas = stmt
                    .query_map(params![empresa_id], row_a_ia)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                filas
            }
        };
        Ok(filas)
    }

    pub fn autonomia(
        &self,
        empresa_id: i64,
        fecha: Option<NaiveDate>,
    ) -> Result<Vec<FilaAutonomia>> {
        let conn = self.conn.lock();
        let sql_base = "SELECT empresa_id, fecha, ejecuciones, exitosas, fallidas, rollbacks, \
                        activaciones_kill_switch, tasa_exito_pct \
                        FROM analitica_autonomia WHERE empresa_id = ?1";
        let filas = match fecha {
            Some(f) => {
                let mut stmt = conn.prepare(&format!("{sql_base} AND fecha = ?2"))?;
                let filas = stmt
                    .query_map(params![empresa_id, f.to_string()], row_a_autonomia)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                filas
            }
            None => {
                let mut stmt = conn.prepare(&format!("{sql_base} ORDER BY fecha DESC LIMIT 30"))?;
                let filas = stmt
                    .query_map(params![empresa_id], row_a_autonomia)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                filas
            }
        };
        Ok(filas)
    }

    /// Productivity totals for the most recent fecha with data, summed
    /// across lotes. `None` when no rows exist for the empresa.
    pub fn totales_productividad_recientes(
        &self,
        empresa_id: i64,
    ) -> Result<Option<TotalesProductividad>> {
        let conn = self.conn.lock();
        let fila = conn
            .query_row(
                r#"
                SELECT fecha, SUM(nacimientos), SUM(destetes), SUM(muertes), SUM(traslados),
                       SUM(servicios), SUM(partos_confirmados), SUM(total_animales)
                FROM analitica_productividad
                WHERE empresa_id = ?1
                  AND fecha = (SELECT MAX(fecha) FROM analitica_productividad WHERE empresa_id = ?1)
                GROUP BY fecha
                "#,
                params![empresa_id],
                |row| {
                    let muertes: i64 = row.get(3)?;
                    let total: i64 = row.get(7)?;
                    Ok(TotalesProductividad {
                        fecha: parse_fecha(row, 0)?,
                        nacimientos: row.get(1)?,
                        destetes: row.get(2)?,
                        muertes,
                        traslados: row.get(4)?,
                        servicios: row.get(5)?,
                        partos_confirmados: row.get(6)?,
                        total_animales: total,
                        mortalidad_pct: super::types::porcentaje(muertes, total),
                    })
                },
            )
            .optional()?;
        Ok(fila)
    }

    /// Alert rows for the most recent fecha with data.
    pub fn alertas_recientes(&self, empresa_id: i64) -> Result<Vec<FilaAlertas>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT empresa_id, fecha, tipo_alerta, activas, resueltas, criticas,
                   tiempo_resolucion_promedio_min
            FROM analitica_alertas
            WHERE empresa_id = ?1
              AND fecha = (SELECT MAX(fecha) FROM analitica_alertas WHERE empresa_id = ?1)
            ORDER BY tipo_alerta
            "#,
        )?;
        let filas = stmt
            .query_map(params![empresa_id], row_a_alertas)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(filas)
    }

    /// Most recent AI aggregate row, if any.
    pub fn ia_reciente(&self, empresa_id: i64) -> Result<Option<FilaIa>> {
        Ok(self.ia(empresa_id, None)?.into_iter().next())
    }

    /// Most recent autonomy aggregate row, if any.
    pub fn autonomia_reciente(&self, empresa_id: i64) -> Result<Option<FilaAutonomia>> {
        Ok(self.autonomia(empresa_id, None)?.into_iter().next())
    }

    /// Per-lote productivity totals since `desde`, for lote comparisons.
    pub fn totales_por_lote(&self, empresa_id: i64, desde: NaiveDate) -> Result<Vec<TotalesLote>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT lote_id, SUM(nacimientos), SUM(destetes), SUM(muertes), SUM(total_animales)
            FROM analitica_productividad
            WHERE empresa_id = ?1 AND fecha >= ?2
            GROUP BY lote_id
            ORDER BY lote_id
            "#,
        )?;
        let filas = stmt
            .query_map(params![empresa_id, desde.to_string()], |row| {
                let muertes: i64 = row.get(3)?;
                let total: i64 = row.get(4)?;
                Ok(TotalesLote {
                    lote_id: row.get(0)?,
                    nacimientos: row.get(1)?,
                    destetes: row.get(2)?,
                    muertes,
                    total_animales: total,
                    mortalidad_pct: super::types::porcentaje(muertes, total),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(filas)
    }

    /// Productivity totals over the inclusive `[desde, hasta]` range.
    pub fn totales_periodo(
        &self,
        empresa_id: i64,
        desde: NaiveDate,
        hasta: NaiveDate,
    ) -> Result<TotalesPeriodo> {
        let conn = self.conn.lock();
        let fila = conn.query_row(
            r#"
            SELECT COALESCE(SUM(nacimientos), 0), COALESCE(SUM(destetes), 0),
                   COALESCE(SUM(muertes), 0), COALESCE(SUM(total_animales), 0)
            FROM analitica_productividad
            WHERE empresa_id = ?1 AND fecha >= ?2 AND fecha <= ?3
            "#,
            params![empresa_id, desde.to_string(), hasta.to_string()],
            |row| {
                let muertes: i64 = row.get(2)?;
                let total: i64 = row.get(3)?;
                Ok(TotalesPeriodo {
                    desde,
                    hasta,
                    nacimientos: row.get(0)?,
                    destetes: row.get(1)?,
                    muertes,
                    mortalidad_pct: super::types::porcentaje(muertes, total),
                })
            },
        )?;
        Ok(fila)
    }
}

// ============================================================================
// ROW MAPPERS
// ============================================================================

fn parse_fecha(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let texto: String = row.get(idx)?;
    NaiveDate::parse_from_str(&texto, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_a_productividad(row: &Row<'_>) -> rusqlite::Result<FilaProductividad> {
    Ok(FilaProductividad {
        empresa_id: row.get(0)?,
        fecha: parse_fecha(row, 1)?,
        lote_id: row.get(2)?,
        sector_id: row.get(3)?,
        nacimientos: row.get(4)?,
        destetes: row.get(5)?,
        muertes: row.get(6)?,
        traslados: row.get(7)?,
        servicios: row.get(8)?,
        partos_confirmados: row.get(9)?,
        total_animales: row.get(10)?,
        mortalidad_pct: row.get(11)?,
    })
}

fn row_a_alertas(row: &Row<'_>) -> rusqlite::Result<FilaAlertas> {
    Ok(FilaAlertas {
        empresa_id: row.get(0)?,
        fecha: parse_fecha(row, 1)?,
        tipo_alerta: row.get(2)?,
        activas: row.get(3)?,
        resueltas: row.get(4)?,
        criticas: row.get(5)?,
        tiempo_resolucion_promedio_min: row.get(6)?,
    })
}

fn row_a_ia(row: &Row<'_>) -> rusqlite::Result<FilaIa> {
    Ok(FilaIa {
        empresa_id: row.get(0)?,
        fecha: parse_fecha(row, 1)?,
        sugerencias_generadas: row.get(2)?,
        sugerencias_aceptadas: row.get(3)?,
        sugerencias_rechazadas: row.get(4)?,
        tasa_aceptacion_pct: row.get(5)?,
        impacto_estimado: row.get(6)?,
    })
}

fn row_a_autonomia(row: &Row<'_>) -> rusqlite::Result<FilaAutonomia> {
    Ok(FilaAutonomia {
        empresa_id: row.get(0)?,
        fecha: parse_fecha(row, 1)?,
        ejecuciones: row.get(2)?,
        exitosas: row.get(3)?,
        fallidas: row.get(4)?,
        rollbacks: row.get(5)?,
        activaciones_kill_switch: row.get(6)?,
        tasa_exito_pct: row.get(7)?,
    })
}

// ============================================================================
// MIGRATIONS
// ============================================================================

fn run_migrations(conn: &Connection) -> Result<()> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for (idx, migration) in MIGRATIONS.iter().enumerate() {
        let target = idx as i32 + 1;
        if version < target {
            conn.execute_batch(migration)?;
            conn.pragma_update(None, "user_version", target)?;
            log::info!("Analytics store migrado a la versión {}", target);
        }
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
