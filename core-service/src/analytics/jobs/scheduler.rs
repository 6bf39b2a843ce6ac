//! Periodic job trigger
//!
//! Background thread that runs every registered job once per round,
//! staggered a few minutes apart so sibling jobs never hit the operational
//! store at the same instant. A failing job is logged and counted; the
//! round carries on, and the next round retries the same keys (upserts).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::AnalyticsJob;

/// Handle to a running scheduler. Dropping the handle does not stop the
/// thread; call `stop` for an orderly shutdown at the end of a round.
pub struct JobScheduler {
    running: Arc<AtomicBool>,
    fallos: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl JobScheduler {
    /// Spawn the trigger thread. Each round runs every job for every
    /// empresa with `fecha = None` (today), sleeping `escalonado` between
    /// sibling jobs and `intervalo` between rounds.
    pub fn start(
        jobs: Vec<Arc<dyn AnalyticsJob>>,
        empresas: Vec<i64>,
        intervalo: Duration,
        escalonado: Duration,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let fallos = Arc::new(AtomicU64::new(0));

        let flag = running.clone();
        let contador = fallos.clone();
        let handle = thread::Builder::new()
            .name("analitica-jobs".to_string())
            .spawn(move || {
                log::info!(
                    "Scheduler de analítica iniciado: {} jobs, {} empresas",
                    jobs.len(),
                    empresas.len()
                );
                while flag.load(Ordering::Relaxed) {
                    for (i, job) in jobs.iter().enumerate() {
                        for empresa_id in &empresas {
                            if let Err(e) = job.ejecutar(*empresa_id, None) {
                                contador.fetch_add(1, Ordering::Relaxed);
                                log::error!(
                                    "Job {} falló para empresa {}: {}",
                                    job.nombre(),
                                    empresa_id,
                                    e
                                );
                            }
                        }
                        // Stagger siblings, but never past a stop request
                        if i + 1 < jobs.len() {
                            dormir_interrumpible(&flag, escalonado);
                        }
                    }
                    dormir_interrumpible(&flag, intervalo);
                }
                log::info!("Scheduler de analítica detenido");
            })
            .expect("failed to spawn scheduler thread");

        Self {
            running,
            fallos,
            handle: Some(handle),
        }
    }

    /// Total failed job runs since start.
    pub fn fallos(&self) -> u64 {
        self.fallos.load(Ordering::Relaxed)
    }

    /// Request shutdown and wait for the current round to finish.
    pub fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Sleep in short slices so a stop request is honored promptly.
fn dormir_interrumpible(flag: &AtomicBool, total: Duration) {
    let paso = Duration::from_millis(50);
    let mut restante = total;
    while flag.load(Ordering::Relaxed) && restante > Duration::ZERO {
        let tramo = restante.min(paso);
        thread::sleep(tramo);
        restante = restante.saturating_sub(tramo);
    }
}

// ============================================================================
// TESTS
// ============================================================================
