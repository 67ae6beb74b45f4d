// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Immutable cost reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tracker::CostDetail;
use crate::telemetry::ActivityId;

/// Snapshot of one activity: its wall-clock cost and every tracked description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostReport {
    /// Wall-clock duration of the whole scope (ms).
    pub cost: u64,

    /// Per-description costs, ascending by max with ties broken by description.
    pub details: Vec<CostDetail>,

    /// Activity that produced the report; absent when tracking was disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<ActivityId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl CostReport {
    /// Build a report, putting the details in report order.
    pub fn new(
        cost: u64,
        mut details: Vec<CostDetail>,
        activity_id: Option<ActivityId>,
        started_at: Option<DateTime<Utc>>,
    ) -> Self {
        sort_details(&mut details);
        Self {
            cost,
            details,
            activity_id,
            started_at,
        }
    }

    /// Report produced when cost tracking is disabled.
    pub fn empty() -> Self {
        Self {
            cost: 0,
            details: Vec::new(),
            activity_id: None,
            started_at: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    /// Find the detail for a description.
    pub fn detail(&self, description: &str) -> Option<&CostDetail> {
        self.details.iter().find(|d| d.description == description)
    }

    /// Sum of all recorded call costs (ms). Exceeds `cost` when work ran in parallel.
    pub fn accumulated(&self) -> u64 {
        self.details.iter().map(|d| d.total).sum()
    }

    /// Format as a human-readable report, most expensive description last.
    pub fn format_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Cost Report ===\n\n");
        if let Some(id) = &self.activity_id {
            report.push_str(&format!("Activity: {}\n", id.short()));
        }
        report.push_str(&format!(
            "Elapsed: {}ms (accumulated {}ms)\n",
            self.cost,
            self.accumulated()
        ));

        if !self.details.is_empty() {
            report.push_str("\nDetails:\n");
            for detail in &self.details {
                report.push_str(&format!(
                    "  {}: {} calls, total {}ms, avg {:.1}ms, max {}ms\n",
                    detail.description,
                    detail.count,
                    detail.total,
                    detail.mean(),
                    detail.max
                ));
            }
        }

        report
    }
}

/// Ascending by max, ties broken by description so the order is total.
pub fn sort_details(details: &mut [CostDetail]) {
    details.sort_by(|a, b| {
        a.max
            .cmp(&b.max)
            .then_with(|| a.description.cmp(&b.description))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn detail(description: &str, max: u64, total: u64, count: u64) -> CostDetail {
        CostDetail {
            description: description.to_string(),
            bucket_size: 1000,
            count,
            total,
            max,
            buckets: BTreeMap::from([(0, count)]),
        }
    }

    #[test]
    fn test_details_sorted_by_max_then_description() {
        let report = CostReport::new(
            10,
            vec![
                detail("zeta", 5, 5, 1),
                detail("alpha", 9, 9, 1),
                detail("beta", 5, 5, 1),
                detail("gamma", 1, 1, 1),
            ],
            None,
            None,
        );
        let order: Vec<_> = report.details.iter().map(|d| d.description.as_str()).collect();
        assert_eq!(order, vec!["gamma", "beta", "zeta", "alpha"]);
    }

    #[test]
    fn test_empty_report() {
        let report = CostReport::empty();
        assert_eq!(report.cost, 0);
        assert!(report.is_empty());
        assert_eq!(report.accumulated(), 0);
    }

    #[test]
    fn test_lookup_and_accumulated() {
        let report = CostReport::new(
            4,
            vec![detail("a", 3, 6, 2), detail("b", 4, 4, 1)],
            None,
            None,
        );
        assert_eq!(report.detail("a").unwrap().count, 2);
        assert!(report.detail("c").is_none());
        assert_eq!(report.accumulated(), 10);
    }

    #[test]
    fn test_format_report() {
        let report = CostReport::new(12, vec![detail("load user", 7, 10, 2)], None, None);
        insta::assert_snapshot!(report.format_report(), @r"
        === Cost Report ===

        Elapsed: 12ms (accumulated 10ms)

        Details:
          load user: 2 calls, total 10ms, avg 5.0ms, max 7ms
        ");
    }

    #[test]
    fn test_report_serde() {
        let report = CostReport::new(3, vec![detail("x", 3, 3, 1)], Some(ActivityId::generate()), Some(Utc::now()));
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"details\""));
        assert!(json.contains("\"activityId\""));
        let parsed: CostReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_empty_report_skips_activity_fields() {
        let json = serde_json::to_string(&CostReport::empty()).unwrap();
        assert_eq!(json, r#"{"cost":0,"details":[]}"#);
    }
}
