//! Run-level result summary.

use serde::{Deserialize, Serialize};

use crate::graph::NodeStatus;

/// Terminal status of one node within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRunRecord {
    pub node_id: String,
    pub status: NodeStatus,
    pub error: Option<String>,
}

/// Full per-node report for one run.
///
/// A run with zero successes is a valid, reportable outcome, not an error:
/// the caller always receives every node's detail, never just the first
/// failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: bool,
    pub records: Vec<NodeRunRecord>,
}

impl RunReport {
    pub(crate) fn new() -> Self {
        RunReport {
            run_id: uuid::Uuid::new_v4().to_string(),
            succeeded: 0,
            failed: 0,
            skipped: 0,
            cancelled: false,
            records: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, node_id: &str, status: NodeStatus, error: Option<String>) {
        match status {
            NodeStatus::Success => self.succeeded += 1,
            NodeStatus::Error => self.failed += 1,
            NodeStatus::Skipped => self.skipped += 1,
            NodeStatus::Idle | NodeStatus::Running => {}
        }
        self.records.push(NodeRunRecord {
            node_id: node_id.to_string(),
            status,
            error,
        });
    }

    /// Record for one node, if it was part of the plan.
    pub fn record_for(&self, node_id: &str) -> Option<&NodeRunRecord> {
        self.records.iter().find(|r| r.node_id == node_id)
    }

    /// Node ids in the order they were driven.
    pub fn executed_order(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.node_id.as_str()).collect()
    }
}
