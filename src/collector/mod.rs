//! Session and metric collection from Oracle dynamic performance views.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                         Sampler                           │
//! │   PRIMARY_SESSIONS ─┐           SYSTEM_METRICS ─┐         │
//! │   FALLBACK_SESSIONS ┤           OS_CPU_TIMES ───┤         │
//! │                     └──────────┬────────────────┘         │
//! │                         ┌──────▼───────┐                  │
//! │                         │ QueryExecutor│ (trait)          │
//! │                         └──────┬───────┘                  │
//! └────────────────────────────────┼──────────────────────────┘
//!                     ┌────────────┴────────────┐
//!              ┌──────▼───────┐          ┌──────▼───────┐
//!              │OracleExecutor│          │ MockExecutor │
//!              │  (live DB)   │          │  (Testing)   │
//!              └──────────────┘          └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use oraload::collector::MockExecutor;
//! use oraload::sampler::{Sampler, SessionRegistry};
//!
//! let mut sampler = Sampler::new(SessionRegistry::new());
//! let id = sampler.registry_mut().register(MockExecutor::healthy_instance());
//! let snapshot = sampler.poll(&id).unwrap();
//! assert_eq!(snapshot.summary.active_sessions, 4);
//! ```

pub mod mock;
pub mod live;
pub mod queries;
pub mod sessions;
pub mod traits;

pub use mock::MockExecutor;
pub use live::OracleExecutor;
pub use sessions::{OsCpuTimes, SystemCpuMetrics, parse_session_row};
pub use traits::{QueryError, QueryExecutor, QueryRow, Value};
