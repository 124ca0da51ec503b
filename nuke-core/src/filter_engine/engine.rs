use super::rules::ResourceRules;
use crate::types::ResourceCandidate;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// The attributes a rule can look at.
#[derive(Debug, Clone, Copy)]
pub struct ResourceValue<'a> {
  pub name: &'a str,
  pub time: Option<DateTime<Utc>>,
  pub tags: &'a BTreeMap<String, String>,
}

impl<'a> ResourceValue<'a> {
  /// `time` is the effective age: native creation time or first-seen time.
  pub fn from_candidate(candidate: &'a ResourceCandidate, time: Option<DateTime<Utc>>) -> Self {
    Self {
      name: candidate.display_name(),
      time,
      tags: &candidate.tags,
    }
  }
}

/// Decides whether a resource is eligible for deletion. Exclusion always wins;
/// with no inclusion rules everything not excluded is included.
pub fn should_include(value: &ResourceValue<'_>, rules: &ResourceRules) -> bool {
  let exclude = &rules.exclude;
  if exclude.matches_name(value.name) {
    return false;
  }
  // time_after is a "too recent to touch" cutoff.
  if exclude.matches_after(value.time) || exclude.matches_before(value.time) {
    return false;
  }
  if exclude.matches_tag(value.tags) {
    return false;
  }

  let include = &rules.include;
  if include.is_empty() {
    return true;
  }

  include.matches_name(value.name)
    || include.matches_after(value.time)
    || include.matches_before(value.time)
    || include.matches_tag(value.tags)
}
