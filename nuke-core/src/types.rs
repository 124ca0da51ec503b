use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type ResourceType = String;

/// Tag key most providers use for a human-readable resource name.
pub const NAME_TAG_KEY: &str = "Name";

/// A resource discovered by a listing call, not yet filtered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCandidate {
  pub identifier: String,

  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,

  #[serde(default)]
  pub label: Option<String>,

  #[serde(default)]
  pub tags: BTreeMap<String, String>,
}

impl ResourceCandidate {
  pub fn new(identifier: impl Into<String>) -> Self {
    Self {
      identifier: identifier.into(),
      created_at: None,
      label: None,
      tags: BTreeMap::new(),
    }
  }

  pub fn with_label(mut self, label: impl Into<String>) -> Self {
    self.label = Some(label.into());
    self
  }

  pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
    self.created_at = Some(created_at);
    self
  }

  pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.tags.insert(key.into(), value.into());
    self
  }

  /// Builds a candidate from a provider tag list, taking the label from the `Name` tag.
  pub fn from_tags<I, K, V>(identifier: impl Into<String>, tags: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    let mut candidate = Self::new(identifier);
    for (k, v) in tags {
      candidate.tags.insert(k.into(), v.into());
    }
    candidate.label = candidate.tags.get(NAME_TAG_KEY).cloned();
    candidate
  }

  /// Name used for pattern matching: the label when present, otherwise the identifier.
  pub fn display_name(&self) -> &str {
    self
      .label
      .as_deref()
      // A blank Name tag counts as no label.
      .filter(|l| !l.trim().is_empty())
      .unwrap_or(&self.identifier)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
  Deleted,
  Failed,
}

/// Result of one attempted deletion. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionOutcome {
  pub identifier: String,
  pub resource_type: ResourceType,
  pub region: String,
  pub status: OutcomeStatus,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,

  pub recorded_at: DateTime<Utc>,
}

impl DeletionOutcome {
  pub fn deleted(
    identifier: &str,
    resource_type: &str,
    region: &str,
    recorded_at: DateTime<Utc>,
  ) -> Self {
    Self {
      identifier: identifier.to_string(),
      resource_type: resource_type.to_string(),
      region: region.to_string(),
      status: OutcomeStatus::Deleted,
      error: None,
      recorded_at,
    }
  }

  pub fn failed(
    identifier: &str,
    resource_type: &str,
    region: &str,
    error: impl std::fmt::Display,
    recorded_at: DateTime<Utc>,
  ) -> Self {
    Self {
      identifier: identifier.to_string(),
      resource_type: resource_type.to_string(),
      region: region.to_string(),
      status: OutcomeStatus::Failed,
      error: Some(error.to_string()),
      recorded_at,
    }
  }

  pub fn is_success(&self) -> bool {
    self.status == OutcomeStatus::Deleted
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_name_prefers_label() {
    let c = ResourceCandidate::new("ipam-pool-1").with_label("test-pool");
    assert_eq!(c.display_name(), "test-pool");
  }

  #[test]
  fn blank_label_falls_back_to_identifier() {
    let c = ResourceCandidate::new("ipam-pool-1").with_label("  ");
    assert_eq!(c.display_name(), "ipam-pool-1");

    let c = ResourceCandidate::from_tags("ipam-pool-2", vec![("Name", "")]);
    assert_eq!(c.display_name(), "ipam-pool-2");
  }

  #[test]
  fn from_tags_takes_label_from_name_tag() {
    let c = ResourceCandidate::from_tags(
      "ipam-pool-1",
      vec![("Name", "test-pool"), ("team", "infra")],
    );
    assert_eq!(c.label.as_deref(), Some("test-pool"));
    assert_eq!(c.tags.get("team").map(String::as_str), Some("infra"));
  }
}
