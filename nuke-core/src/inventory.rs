//! Offline candidate snapshots, used to evaluate a rule file without provider
//! access. The JSON shape is `{ "<resource type>": [candidate, ...] }`.

use crate::config::{Config, RunConfig};
use crate::resource::{single_page, Pages, ResourceLister};
use crate::runner::Pipeline;
use crate::runtime::{RunContext, RunSettings};
use crate::types::ResourceCandidate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
  resources: BTreeMap<String, Vec<ResourceCandidate>>,
}

impl Inventory {
  pub fn from_json(raw: &str) -> anyhow::Result<Self> {
    Ok(serde_json::from_str(raw)?)
  }

  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let raw = std::fs::read_to_string(path)?;
    Self::from_json(&raw)
  }

  pub fn resource_types(&self) -> impl Iterator<Item = &str> {
    self.resources.keys().map(String::as_str)
  }

  /// One list-only pipeline per resource type, with rules from `cfg`.
  pub fn into_pipelines(self, region: &str, cfg: &Config) -> Vec<Pipeline> {
    self
      .resources
      .into_iter()
      .map(|(resource_type, candidates)| {
        let rules = cfg.rules_for(&resource_type);
        let lister = Arc::new(InventoryLister {
          resource_type,
          candidates,
        });
        Pipeline::list_only(region, lister, rules)
      })
      .collect()
  }
}

/// Run settings for evaluating an inventory: the `[run]` table, with dry-run
/// and tag exclusion forced on since inventory candidates have no provider.
pub fn evaluation_settings(run: &RunConfig) -> RunSettings {
  let configured = run.settings();
  if !configured.dry_run || !configured.exclude_first_seen_tag {
    tracing::warn!(
      dry_run = configured.dry_run,
      exclude_first_seen_tag = configured.exclude_first_seen_tag,
      "inventory evaluation always runs dry without tagging; overriding [run] settings"
    );
  }
  RunSettings {
    dry_run: true,
    exclude_first_seen_tag: true,
  }
}

#[derive(Debug, Clone)]
pub struct InventoryLister {
  resource_type: String,
  candidates: Vec<ResourceCandidate>,
}

impl ResourceLister for InventoryLister {
  fn resource_type(&self) -> &str {
    &self.resource_type
  }

  fn list<'a>(&'a self, _ctx: &'a RunContext) -> Pages<'a> {
    single_page(self.candidates.clone())
  }
}
