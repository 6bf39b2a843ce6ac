//! FincaFácil Core - Analytics & Risk Engines
//!
//! Library half of the FincaFácil analytics subsystem. It owns:
//! - `risk/` - Risk scoring over user actions (patterns, scores, alerts)
//! - `analytics/` - Daily read models (store, service, jobs, scheduler)
//!
//! Services here are constructed by the application's composition root and
//! shared as `Arc` handles. There are no module-level singletons.

pub mod constants;
pub mod error;

pub mod analytics;
pub mod risk;

pub use error::{Error, Result};
