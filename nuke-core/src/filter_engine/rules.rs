use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name pattern. Unanchored unless the pattern itself anchors.
#[derive(Debug, Clone)]
pub struct NamePattern(Regex);

impl NamePattern {
  pub fn new(pattern: &str) -> Result<Self, regex::Error> {
    Regex::new(pattern).map(Self)
  }

  pub fn as_str(&self) -> &str {
    self.0.as_str()
  }

  pub fn is_match(&self, name: &str) -> bool {
    self.0.is_match(name)
  }
}

impl PartialEq for NamePattern {
  fn eq(&self, other: &Self) -> bool {
    self.as_str() == other.as_str()
  }
}

/// Matches a tag by key, or by key and exact value when `value` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMatch {
  pub key: String,

  #[serde(default)]
  pub value: Option<String>,
}

impl TagMatch {
  pub fn matches(&self, tags: &BTreeMap<String, String>) -> bool {
    match (tags.get(&self.key), self.value.as_deref()) {
      (Some(actual), Some(expected)) => actual == expected,
      (Some(_), None) => true,
      (None, _) => false,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRule {
  pub names_regex: Vec<NamePattern>,
  pub time_after: Option<DateTime<Utc>>,
  pub time_before: Option<DateTime<Utc>>,
  pub tag: Option<TagMatch>,
}

impl FilterRule {
  pub fn is_empty(&self) -> bool {
    self.names_regex.is_empty()
      && self.time_after.is_none()
      && self.time_before.is_none()
      && self.tag.is_none()
  }

  pub(crate) fn matches_name(&self, name: &str) -> bool {
    self.names_regex.iter().any(|re| re.is_match(name))
  }

  pub(crate) fn matches_after(&self, time: Option<DateTime<Utc>>) -> bool {
    matches!((time, self.time_after), (Some(t), Some(after)) if t > after)
  }

  pub(crate) fn matches_before(&self, time: Option<DateTime<Utc>>) -> bool {
    matches!((time, self.time_before), (Some(t), Some(before)) if t < before)
  }

  pub(crate) fn matches_tag(&self, tags: &BTreeMap<String, String>) -> bool {
    self.tag.as_ref().map(|m| m.matches(tags)).unwrap_or(false)
  }
}

/// Inclusion and exclusion rules for one resource type. Empty means include-all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceRules {
  pub include: FilterRule,
  pub exclude: FilterRule,
}

impl ResourceRules {
  pub fn is_empty(&self) -> bool {
    self.include.is_empty() && self.exclude.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect()
  }

  #[test]
  fn tag_match_by_key_only() {
    let m = TagMatch {
      key: "keep".to_string(),
      value: None,
    };
    assert!(m.matches(&tags(&[("keep", "anything")])));
    assert!(!m.matches(&tags(&[("other", "x")])));
  }

  #[test]
  fn tag_match_by_key_and_value() {
    let m = TagMatch {
      key: "keep".to_string(),
      value: Some("true".to_string()),
    };
    assert!(m.matches(&tags(&[("keep", "true")])));
    assert!(!m.matches(&tags(&[("keep", "false")])));
    assert!(!m.matches(&tags(&[])));
  }

  #[test]
  fn name_patterns_are_unanchored() {
    let p = NamePattern::new("test").unwrap();
    assert!(p.is_match("my-test-domain"));
    let anchored = NamePattern::new("^test$").unwrap();
    assert!(!anchored.is_match("my-test-domain"));
  }
}
