//! Milestone comparison.
//!
//! Two snapshots are compared on their high and medium risk counts only.
//! The counts cannot tell a new risk from a changed one, so `new_risks`
//! and `resolved_risks` stay empty.

use tokio_util::sync::CancellationToken;

use crate::engine::{ReviewEngine, require_workload_id};
use crate::error::{Error, Result};
use crate::types::{MilestoneComparison, MilestoneSnapshot, Severity};

/// Severities whose counts are compared.
const TRACKED_SEVERITIES: [Severity; 2] = [Severity::High, Severity::Medium];

/// Classify count changes from `first` to `second`.
#[must_use]
pub fn compare_snapshots(
    first: &MilestoneSnapshot,
    second: &MilestoneSnapshot,
) -> MilestoneComparison {
    let mut comparison = MilestoneComparison {
        snapshot_id1: first.id.clone(),
        snapshot_id2: second.id.clone(),
        ..Default::default()
    };

    for severity in TRACKED_SEVERITIES {
        let before = first.risk_count(severity);
        let after = second.risk_count(severity);
        if before > after {
            comparison
                .improvements
                .push(format!("{severity} risks reduced from {before} to {after}"));
        } else if after > before {
            comparison
                .regressions
                .push(format!("{severity} risks increased from {before} to {after}"));
        }
    }

    comparison
}

impl ReviewEngine {
    /// Fetch two milestones and compare their risk counts.
    pub async fn compare(
        &self,
        workload_id: &str,
        snapshot_id1: &str,
        snapshot_id2: &str,
        cancel: &CancellationToken,
    ) -> Result<MilestoneComparison> {
        require_workload_id(workload_id)?;
        if snapshot_id1.trim().is_empty() || snapshot_id2.trim().is_empty() {
            return Err(Error::MissingSnapshotIds);
        }

        let first = self
            .fetch_milestone(workload_id, snapshot_id1, cancel)
            .await
            .map_err(|e| snapshot_error(1, e))?;
        let second = self
            .fetch_milestone(workload_id, snapshot_id2, cancel)
            .await
            .map_err(|e| snapshot_error(2, e))?;

        Ok(compare_snapshots(&first, &second))
    }

    /// Fetch a single milestone.
    pub async fn fetch_milestone(
        &self,
        workload_id: &str,
        milestone_id: &str,
        cancel: &CancellationToken,
    ) -> Result<MilestoneSnapshot> {
        require_workload_id(workload_id)?;
        self.invoker
            .invoke("GetMilestone", cancel, || {
                self.api.get_milestone(workload_id, milestone_id)
            })
            .await
    }
}

fn snapshot_error(snapshot: u8, source: Error) -> Error {
    Error::SnapshotFetch {
        snapshot,
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn snapshot(id: &str, high: u32, medium: u32) -> MilestoneSnapshot {
        MilestoneSnapshot {
            id: id.to_string(),
            name: format!("milestone {id}"),
            recorded_at: Utc::now(),
            risk_counts: BTreeMap::from([(Severity::High, high), (Severity::Medium, medium)]),
        }
    }

    #[test]
    fn reduced_counts_are_improvements() {
        let comparison = compare_snapshots(&snapshot("1", 5, 10), &snapshot("2", 2, 8));

        assert_eq!(
            comparison.improvements,
            ["High risks reduced from 5 to 2", "Medium risks reduced from 10 to 8"]
        );
        assert!(comparison.regressions.is_empty());
        assert_eq!(comparison.snapshot_id1, "1");
        assert_eq!(comparison.snapshot_id2, "2");
    }

    #[test]
    fn increased_counts_are_regressions() {
        let comparison = compare_snapshots(&snapshot("1", 2, 5), &snapshot("2", 5, 8));

        assert_eq!(
            comparison.regressions,
            ["High risks increased from 2 to 5", "Medium risks increased from 5 to 8"]
        );
        assert!(comparison.improvements.is_empty());
    }

    #[test]
    fn equal_counts_produce_no_entries() {
        let comparison = compare_snapshots(&snapshot("1", 3, 4), &snapshot("2", 3, 4));

        assert!(comparison.improvements.is_empty());
        assert!(comparison.regressions.is_empty());
        assert!(comparison.new_risks.is_empty());
        assert!(comparison.resolved_risks.is_empty());
    }

    #[test]
    fn mixed_changes_split_by_severity() {
        let comparison = compare_snapshots(&snapshot("1", 4, 1), &snapshot("2", 1, 3));

        assert_eq!(comparison.improvements, ["High risks reduced from 4 to 1"]);
        assert_eq!(comparison.regressions, ["Medium risks increased from 1 to 3"]);
    }

    #[test]
    fn missing_severity_counts_compare_as_zero() {
        let mut first = snapshot("1", 0, 0);
        first.risk_counts.clear();
        let comparison = compare_snapshots(&first, &snapshot("2", 1, 0));

        assert_eq!(comparison.regressions, ["High risks increased from 0 to 1"]);
    }
}
