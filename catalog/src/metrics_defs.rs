//! Metrics definitions for the catalog.

use shared::metrics_defs::{MetricDef, MetricType};

pub const GITHUB_REQUESTS: MetricDef = MetricDef {
    name: "github.requests",
    metric_type: MetricType::Counter,
    description: "Number of requests sent to the GitHub API, tagged by endpoint",
};

pub const FETCH_FALLBACK: MetricDef = MetricDef {
    name: "fetch.fallback",
    metric_type: MetricType::Counter,
    description: "Number of fetches served from the local fallback dataset",
};

pub const FETCH_BATCH_DURATION: MetricDef = MetricDef {
    name: "fetch.batch.duration",
    metric_type: MetricType::Histogram,
    description: "Time to complete one batched file query in seconds",
};

pub const CACHED_PROJECTS: MetricDef = MetricDef {
    name: "catalog.cached_projects",
    metric_type: MetricType::Gauge,
    description: "Number of project records held in the cache",
};

pub const ALL_METRICS: &[MetricDef] = &[
    GITHUB_REQUESTS,
    FETCH_FALLBACK,
    FETCH_BATCH_DURATION,
    CACHED_PROJECTS,
];
