//! Counters for the import and upsert paths.
//!
//! Recording is a no-op until a `metrics` recorder is installed, so library
//! users and tests pay nothing for these calls.

use std::fmt;

/// Every metric name emitted by the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    ImportSuccess,
    ImportNodeNotFound,
    ImportMissingFields,
    ImportPostcodeDefaulted,
    UpsertCreated,
    UpsertUpdated,
    UpsertDuplicateName,
    UpsertNotFound,
    CatalogCleared,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ImportSuccess => "campus_coffee_import_success_total",
            MetricName::ImportNodeNotFound => "campus_coffee_import_node_not_found_total",
            MetricName::ImportMissingFields => "campus_coffee_import_missing_fields_total",
            MetricName::ImportPostcodeDefaulted => "campus_coffee_import_postcode_defaulted_total",
            MetricName::UpsertCreated => "campus_coffee_upsert_created_total",
            MetricName::UpsertUpdated => "campus_coffee_upsert_updated_total",
            MetricName::UpsertDuplicateName => "campus_coffee_upsert_duplicate_name_total",
            MetricName::UpsertNotFound => "campus_coffee_upsert_not_found_total",
            MetricName::CatalogCleared => "campus_coffee_catalog_cleared_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn increment(name: MetricName) {
    ::metrics::counter!(name.as_str()).increment(1);
}

pub mod import {
    use super::{increment, MetricName};

    pub fn success() {
        increment(MetricName::ImportSuccess);
    }

    pub fn node_not_found() {
        increment(MetricName::ImportNodeNotFound);
    }

    pub fn missing_fields() {
        increment(MetricName::ImportMissingFields);
    }

    pub fn postcode_defaulted() {
        increment(MetricName::ImportPostcodeDefaulted);
    }
}

pub mod upsert {
    use super::{increment, MetricName};

    pub fn created() {
        increment(MetricName::UpsertCreated);
    }

    pub fn updated() {
        increment(MetricName::UpsertUpdated);
    }

    pub fn duplicate_name() {
        increment(MetricName::UpsertDuplicateName);
    }

    pub fn not_found() {
        increment(MetricName::UpsertNotFound);
    }
}

pub fn catalog_cleared() {
    increment(MetricName::CatalogCleared);
}
