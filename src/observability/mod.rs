// Observability: metrics counters for the catalog core

pub mod metrics;
