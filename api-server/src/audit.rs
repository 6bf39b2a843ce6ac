//! Request Audit Trail
//!
//! Append-only JSONL writer for API audit records. Thread-safe and
//! isolated: a failed audit write is logged and never propagates into the
//! response path.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One audit entry per `/api/v1` call, fixed fields only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistroAuditoria {
    pub id: Uuid,
    pub empresa_id: Option<i64>,
    pub usuario_id: Option<String>,
    pub endpoint: String,
    /// Raw serialized query parameters
    pub parametros: String,
    /// HTTP status of the response
    pub resultado: u16,
    pub timestamp: DateTime<Utc>,
}

impl RegistroAuditoria {
    pub fn nuevo(
        empresa_id: Option<i64>,
        usuario_id: Option<String>,
        endpoint: &str,
        parametros: &str,
        resultado: u16,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            empresa_id,
            usuario_id,
            endpoint: endpoint.to_string(),
            parametros: parametros.to_string(),
            resultado,
            timestamp: Utc::now(),
        }
    }
}

/// Append-only JSONL audit trail.
pub struct AuditTrail {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
    registros: AtomicU64,
}

impl AuditTrail {
    /// Open (append) the trail at `path`, creating directories as needed.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        tracing::info!("Auditoría abierta en {}", path.display());
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
            registros: AtomicU64::new(0),
        })
    }

    /// Record one entry. Failures are logged, never returned: the audit
    /// trail must not fail a user-facing request.
    pub fn record(&self, registro: &RegistroAuditoria) {
        if let Err(e) = self.try_record(registro) {
            tracing::error!("Fallo al escribir auditoría: {}", e);
        }
    }

    fn try_record(&self, registro: &RegistroAuditoria) -> std::io::Result<()> {
        let linea = serde_json::to_string(registro)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "audit lock poisoned"))?;
        writer.write_all(linea.as_bytes())?;
        writer.write_all(b"\n")?;
        // Flush for durability
        writer.flush()?;

        self.registros.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Entries recorded in this session.
    pub fn registros(&self) -> u64 {
        self.registros.load(Ordering::SeqCst)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_registros_en_jsonl() {
        let dir = TempDir::new().unwrap();
        let ruta = dir.path().join("auditoria.jsonl");
        let trail = AuditTrail::open(&ruta).unwrap();

        for i in 0..3 {
            trail.record(&RegistroAuditoria::nuevo(
                Some(1),
                Some("ana".to_string()),
                "/api/v1/analytics/overview",
                &format!("empresa_id=1&n={i}"),
                200,
            ));
        }
        assert_eq!(trail.registros(), 3);

        let contenido = std::fs::read_to_string(&ruta).unwrap();
        let lineas: Vec<&str> = contenido.lines().collect();
        assert_eq!(lineas.len(), 3);
        for linea in lineas {
            let registro: RegistroAuditoria = serde_json::from_str(linea).unwrap();
            assert_eq!(registro.empresa_id, Some(1));
            assert_eq!(registro.resultado, 200);
        }
    }

    #[test]
    fn test_reabrir_anexa() {
        let dir = TempDir::new().unwrap();
        let ruta = dir.path().join("auditoria.jsonl");

        {
            let trail = AuditTrail::open(&ruta).unwrap();
            trail.record(&RegistroAuditoria::nuevo(None, None, "/health", "", 200));
        }
        {
            let trail = AuditTrail::open(&ruta).unwrap();
            trail.record(&RegistroAuditoria::nuevo(None, None, "/health", "", 200));
        }

        let contenido = std::fs::read_to_string(&ruta).unwrap();
        assert_eq!(contenido.lines().count(), 2);
    }
}
