//! Monitoring service for the data.gouv.fr open-data platform.
//!
//! Dashboards are computed on request from snapshots in public object
//! storage, the catalog REST API and a few open-data files, and served as
//! chart descriptions over a versioned HTTP API. Suggestion tables can be
//! acted upon through typed write-back actions.

pub mod actions;
pub mod api;
pub mod charts;
pub mod clients;
pub mod config;
pub mod dashboards;
pub mod error;
pub mod export;
pub mod matching;
pub mod session;
pub mod snapshots;
pub mod tabular;
