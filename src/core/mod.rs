//! Application core: state, events, polling queries and derived data

pub mod app;
pub mod charts;
pub mod events;
pub mod metrics;
pub mod queries;
pub mod query;
pub mod state;
