use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;

/// Counters accumulated across packing and layout calls.
#[derive(Debug, Default, Clone)]
pub struct PackingMetrics {
    solves: u64,
    placement_attempts: u64,
    expansions: u64,
    cache_hits: u64,
    nodes_laid_out: u64,
}

impl PackingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_solve(&mut self, attempts: u32, expansions: u32) {
        self.solves = self.solves.saturating_add(1);
        self.placement_attempts = self.placement_attempts.saturating_add(attempts as u64);
        self.expansions = self.expansions.saturating_add(expansions as u64);
    }

    pub fn record_cache_hit(&mut self) {
        self.cache_hits = self.cache_hits.saturating_add(1);
    }

    pub fn record_nodes(&mut self, count: usize) {
        if count > 0 {
            self.nodes_laid_out = self.nodes_laid_out.saturating_add(count as u64);
        }
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            solves: self.solves,
            placement_attempts: self.placement_attempts,
            expansions: self.expansions,
            cache_hits: self.cache_hits,
            nodes_laid_out: self.nodes_laid_out,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub solves: u64,
    pub placement_attempts: u64,
    pub expansions: u64,
    pub cache_hits: u64,
    pub nodes_laid_out: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "packing_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("solves".to_string(), json!(self.solves));
        map.insert(
            "placement_attempts".to_string(),
            json!(self.placement_attempts),
        );
        map.insert("expansions".to_string(), json!(self.expansions));
        map.insert("cache_hits".to_string(), json!(self.cache_hits));
        map.insert("nodes_laid_out".to_string(), json!(self.nodes_laid_out));
        map
    }
}
