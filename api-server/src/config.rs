//! Configuration module

use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Analytics read-model database path
    pub db_path: PathBuf,

    /// JSONL audit trail path
    pub audit_path: PathBuf,

    /// Operational-export JSON file feeding the jobs; jobs are disabled
    /// when unset
    pub fuente_operacional: Option<PathBuf>,

    /// Empresas the job scheduler aggregates for
    pub empresas: Vec<i64>,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("FINCAFACIL_API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8350),

            db_path: fincafacil_core::constants::get_db_path(),

            audit_path: env::var("FINCAFACIL_AUDITORIA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    fincafacil_core::constants::get_data_dir().join("auditoria.jsonl")
                }),

            fuente_operacional: env::var("FINCAFACIL_FUENTE_OPERACIONAL")
                .ok()
                .map(PathBuf::from),

            empresas: env::var("FINCAFACIL_EMPRESAS")
                .map(|s| {
                    s.split(',')
                        .filter_map(|p| p.trim().parse().ok())
                        .collect()
                })
                .unwrap_or_else(|_| vec![1]),

            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_env();
        assert!(config.port > 0);
        assert!(!config.empresas.is_empty());
        assert!(!config.is_production() || config.environment == "production");
    }
}
