//! In-memory TTL response cache
//!
//! Keyed by (endpoint, canonical serialized parameters). Entries expire by
//! TTL only; read models are overwrite-only so bounded staleness is an
//! accepted tradeoff and no explicit invalidation API exists.
//!
//! The map is behind a `std::sync::RwLock` because request handlers on a
//! multi-threaded runtime hit it concurrently.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde_json::Value;

/// TTL for the fast-moving endpoints (overview, alertas, ia, autonomia)
pub const TTL_CORTO: Duration = Duration::from_secs(300);

/// TTL for the heavier aggregates (productividad, comparativos)
pub const TTL_LARGO: Duration = Duration::from_secs(600);

struct CacheEntry {
    payload: Value,
    expires_at: Instant,
}

/// Process-wide response cache shared by all handlers.
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Live payload for the key, if any. Expired entries read as misses
    /// and are dropped lazily on the next write.
    pub fn get(&self, clave: &str) -> Option<Value> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(clave)?;
        if entry.expires_at > Instant::now() {
            Some(entry.payload.clone())
        } else {
            None
        }
    }

    /// Store a payload under the key for `ttl`.
    pub fn put(&self, clave: &str, payload: Value, ttl: Duration) {
        if let Ok(mut entries) = self.entries.write() {
            let ahora = Instant::now();
            entries.retain(|_, e| e.expires_at > ahora);
            entries.insert(
                clave.to_string(),
                CacheEntry {
                    payload,
                    expires_at: ahora + ttl,
                },
            );
        }
    }

    /// Number of live entries (for status/debug views).
    pub fn len(&self) -> usize {
        let ahora = Instant::now();
        self.entries
            .read()
            .map(|e| e.values().filter(|v| v.expires_at > ahora).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical cache key: endpoint plus the present parameters in the fixed
/// order the caller passes them. Two requests with the same parameters
/// always map to the same key.
pub fn clave_cache(endpoint: &str, pares: &[(&str, Option<String>)]) -> String {
    let mut clave = String::from(endpoint);
    let mut separador = '?';
    for (nombre, valor) in pares {
        if let Some(valor) = valor {
            clave.push(separador);
            clave.push_str(nombre);
            clave.push('=');
            clave.push_str(valor);
            separador = '&';
        }
    }
    clave
}

// ============================================================================
// TESTS
// ============================================================================
