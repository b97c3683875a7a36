//! Request log reporter — aggregation for `compass log`.
//!
//! Reads the JSONL request log and groups calls by API route so slow or
//! failing endpoints stand out.

use std::collections::HashMap;

use crate::analytics::logger::{self, RequestLogEntry};

// ---------------------------------------------------------------------------
// Aggregated stats
// ---------------------------------------------------------------------------

/// Summary statistics over the request log.
#[derive(Debug)]
pub struct RequestStats {
    pub total_requests: usize,
    pub failures: usize,
    pub avg_latency_ms: f64,
    pub routes: Vec<RouteStat>,
}

impl RequestStats {
    /// Failure percentage, 0.0 when there is no data.
    pub fn failure_pct(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            (self.failures as f64 / self.total_requests as f64) * 100.0
        }
    }
}

/// Per-route aggregated statistics.
#[derive(Debug, Clone)]
pub struct RouteStat {
    pub route: String,
    pub count: usize,
    pub failures: usize,
    pub avg_latency_ms: f64,
    pub max_latency_ms: u64,
    /// Most recent error message seen on this route.
    pub last_error: Option<String>,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Compute stats from the log, optionally limited to the last `days` days.
pub fn compute_stats(days: Option<u32>) -> RequestStats {
    let entries = logger::read_entries_since_days(days);
    build_stats(&entries)
}

/// The `limit` most recent entries, newest first.
pub fn recent_entries(days: Option<u32>, limit: usize) -> Vec<RequestLogEntry> {
    let mut entries = logger::read_entries_since_days(days);
    entries.reverse();
    entries.truncate(limit);
    entries
}

fn build_stats(entries: &[RequestLogEntry]) -> RequestStats {
    if entries.is_empty() {
        return RequestStats {
            total_requests: 0,
            failures: 0,
            avg_latency_ms: 0.0,
            routes: Vec::new(),
        };
    }

    let total_requests = entries.len();
    let failures = entries.iter().filter(|e| !e.success).count();
    let avg_latency_ms =
        entries.iter().map(|e| e.duration_ms as f64).sum::<f64>() / total_requests as f64;

    RequestStats {
        total_requests,
        failures,
        avg_latency_ms,
        routes: compute_route_stats(entries),
    }
}

/// Group entries by method + route.
///
/// Sorted by request count (descending), ties broken by route name so the
/// output is stable.
fn compute_route_stats(entries: &[RequestLogEntry]) -> Vec<RouteStat> {
    let mut groups: HashMap<String, Vec<&RequestLogEntry>> = HashMap::new();
    for entry in entries {
        let key = format!("{} {}", entry.method, logger::route_of(&entry.path));
        groups.entry(key).or_default().push(entry);
    }

    let mut stats: Vec<RouteStat> = groups
        .into_iter()
        .map(|(route, group)| {
            let count = group.len();
            let failures = group.iter().filter(|e| !e.success).count();
            let total_ms: u64 = group.iter().map(|e| e.duration_ms).sum();
            let max_latency_ms = group.iter().map(|e| e.duration_ms).max().unwrap_or(0);
            let last_error = group.iter().rev().find_map(|e| e.error.clone());

            RouteStat {
                route,
                count,
                failures,
                avg_latency_ms: total_ms as f64 / count as f64,
                max_latency_ms,
                last_error,
            }
        })
        .collect();

    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.route.cmp(&b.route)));
    stats
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, ms: u64, error: Option<&str>) -> RequestLogEntry {
        RequestLogEntry {
            timestamp: "2024-05-01T08:00:00+00:00".to_string(),
            method: "GET".to_string(),
            path: path.to_string(),
            status: Some(if error.is_some() { 503 } else { 200 }),
            duration_ms: ms,
            success: error.is_none(),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn empty_log_has_zero_stats() {
        let stats = build_stats(&[]);
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.failure_pct(), 0.0);
        assert!(stats.routes.is_empty());
    }

    #[test]
    fn stats_group_detail_paths_by_route() {
        let entries = vec![
            entry("/charts", 10, None),
            entry("/charts/2024-05-01", 20, None),
            entry("/charts/2024-05-02", 40, Some("vault offline")),
            entry("/charts", 30, None),
            entry("/charts", 20, None),
        ];
        let stats = build_stats(&entries);

        assert_eq!(stats.total_requests, 5);
        assert_eq!(stats.failures, 1);
        assert!((stats.failure_pct() - 20.0).abs() < f64::EPSILON);
        assert!((stats.avg_latency_ms - 24.0).abs() < f64::EPSILON);

        assert_eq!(stats.routes.len(), 2);
        assert_eq!(stats.routes[0].route, "GET /charts");
        assert_eq!(stats.routes[0].count, 3);
        assert!((stats.routes[0].avg_latency_ms - 20.0).abs() < f64::EPSILON);

        let detail = &stats.routes[1];
        assert_eq!(detail.route, "GET /charts/:date");
        assert_eq!(detail.failures, 1);
        assert_eq!(detail.max_latency_ms, 40);
        assert_eq!(detail.last_error.as_deref(), Some("vault offline"));
    }
}
