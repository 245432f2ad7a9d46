//! # Funding Opportunity Detector
//!
//! Turns per-venue funding snapshots into ranked cross-venue opportunities:
//! merge by canonical symbol, classify every venue pair, then cost, filter
//! and summarise for presentation. The [`Scheduler`] drives the cycle on a
//! fixed cadence or on request.

pub mod aggregate;
pub mod api;
pub mod classifier;
pub mod merge;
pub mod pairs;
pub mod scheduler;
pub mod service;

pub use aggregate::{
    apply_spread_cost, build_view, compute_stats, filter_by_exchanges, rank, ViewParams,
    DEFAULT_SPREAD_COST_BPS,
};
pub use api::{DashboardApi, RefreshResponse};
pub use classifier::{classify, classify_pair, DetectorConfig};
pub use merge::merge;
pub use pairs::{EXCHANGE_PAIRS, PAIR_COUNT};
pub use scheduler::{Scheduler, SchedulerHandle, MIN_REFRESH_INTERVAL};
pub use service::{CycleSnapshot, ScannerService};
