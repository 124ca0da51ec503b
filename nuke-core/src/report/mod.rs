//! Run-scoped outcome ledger. One `Reporter` is shared by every pipeline of a
//! run; appends are serialized through a mutex and nothing is ever removed.

pub mod store;

use crate::types::{DeletionOutcome, OutcomeStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Mutex;

/// A resource-type pipeline that hard-failed. Kept apart from per-item outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineFailure {
  pub resource_type: String,
  pub region: String,
  pub error: String,
}

/// Identifiers a dry run would have deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedDeletion {
  pub resource_type: String,
  pub region: String,
  pub identifiers: Vec<String>,
}

#[derive(Debug)]
pub struct Reporter {
  run_id: String,
  started_at: DateTime<Utc>,
  outcomes: Mutex<Vec<DeletionOutcome>>,
  failures: Mutex<Vec<PipelineFailure>>,
  planned: Mutex<Vec<PlannedDeletion>>,
}

impl Reporter {
  pub fn new(started_at: DateTime<Utc>) -> Self {
    Self {
      run_id: uuid::Uuid::new_v4().to_string(),
      started_at,
      outcomes: Mutex::new(Vec::new()),
      failures: Mutex::new(Vec::new()),
      planned: Mutex::new(Vec::new()),
    }
  }

  pub fn run_id(&self) -> &str {
    &self.run_id
  }

  pub fn record(&self, outcome: DeletionOutcome) {
    lock(&self.outcomes).push(outcome);
  }

  pub fn record_pipeline_failure(
    &self,
    resource_type: &str,
    region: &str,
    error: impl std::fmt::Display,
  ) {
    lock(&self.failures).push(PipelineFailure {
      resource_type: resource_type.to_string(),
      region: region.to_string(),
      error: error.to_string(),
    });
  }

  pub fn record_planned(&self, resource_type: &str, region: &str, identifiers: Vec<String>) {
    lock(&self.planned).push(PlannedDeletion {
      resource_type: resource_type.to_string(),
      region: region.to_string(),
      identifiers,
    });
  }

  /// Snapshot of recorded outcomes in insertion order.
  pub fn entries(&self) -> Vec<DeletionOutcome> {
    lock(&self.outcomes).clone()
  }

  pub fn failures(&self) -> Vec<PipelineFailure> {
    lock(&self.failures).clone()
  }

  /// Builds the run summary. Call once every pipeline has joined.
  pub fn finish(&self, finished_at: DateTime<Utc>) -> RunReport {
    let outcomes = self.entries();
    let deleted = outcomes.iter().filter(|o| o.is_success()).count();
    RunReport {
      run_id: self.run_id.clone(),
      started_at: self.started_at,
      finished_at,
      deleted,
      failed: outcomes.len() - deleted,
      outcomes,
      failures: self.failures(),
      planned: lock(&self.planned).clone(),
    }
  }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
  m.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
  pub run_id: String,
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  pub deleted: usize,
  pub failed: usize,

  #[serde(default)]
  pub outcomes: Vec<DeletionOutcome>,

  #[serde(default)]
  pub failures: Vec<PipelineFailure>,

  #[serde(default)]
  pub planned: Vec<PlannedDeletion>,
}

impl RunReport {
  pub fn is_clean(&self) -> bool {
    self.failed == 0 && self.failures.is_empty()
  }

  pub fn render_table(&self) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "run {} ({} -> {})", self.run_id, self.started_at, self.finished_at);

    if !self.planned.is_empty() {
      let _ = writeln!(out, "\nwould delete:");
      for p in &self.planned {
        let _ = writeln!(
          out,
          "  {} [{}]: {} resource(s)",
          p.resource_type,
          p.region,
          p.identifiers.len()
        );
        for id in &p.identifiers {
          let _ = writeln!(out, "    {id}");
        }
      }
    }

    if !self.outcomes.is_empty() {
      let width = self
        .outcomes
        .iter()
        .map(|o| o.identifier.len())
        .max()
        .unwrap_or(0)
        .max("IDENTIFIER".len());
      let _ = writeln!(
        out,
        "\n{:<width$}  {:<24}  {:<14}  STATUS",
        "IDENTIFIER", "RESOURCE TYPE", "REGION"
      );
      for o in &self.outcomes {
        let status = match o.status {
          OutcomeStatus::Deleted => "deleted".to_string(),
          OutcomeStatus::Failed => {
            format!("failed: {}", o.error.as_deref().unwrap_or("unknown error"))
          }
        };
        let _ = writeln!(
          out,
          "{:<width$}  {:<24}  {:<14}  {status}",
          o.identifier, o.resource_type, o.region
        );
      }
    }

    if !self.failures.is_empty() {
      let _ = writeln!(out, "\npipelines failed:");
      for f in &self.failures {
        let _ = writeln!(out, "  {} [{}]: {}", f.resource_type, f.region, f.error);
      }
    }

    let _ = writeln!(
      out,
      "\n{} deleted, {} failed, {} pipeline failure(s)",
      self.deleted,
      self.failed,
      self.failures.len()
    );
    out
  }
}
