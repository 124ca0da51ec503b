use crate::error::ConfigError;
use crate::filter_engine::{FilterRule, NamePattern, ResourceRules, TagMatch};
use crate::runtime::RunSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct Config {
  pub logging: LoggingConfig,
  pub run: RunConfig,
  pub resources: BTreeMap<String, ResourceRules>,
}

impl Config {
  /// Rules for `resource_type`; unconfigured types get the include-all default.
  pub fn rules_for(&self, resource_type: &str) -> ResourceRules {
    self.resources.get(resource_type).cloned().unwrap_or_default()
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
  #[serde(default = "default_log_level")]
  pub level: String,

  #[serde(default = "default_retention_days")]
  pub retention_days: u64,
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_retention_days() -> u64 {
  14
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      retention_days: default_retention_days(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
  #[serde(default = "default_max_workers")]
  pub max_workers: usize,

  #[serde(default)]
  pub exclude_first_seen_tag: bool,

  #[serde(default)]
  pub dry_run: bool,
}

fn default_max_workers() -> usize {
  4
}

impl Default for RunConfig {
  fn default() -> Self {
    Self {
      max_workers: default_max_workers(),
      exclude_first_seen_tag: false,
      dry_run: false,
    }
  }
}

impl RunConfig {
  pub fn settings(&self) -> RunSettings {
    RunSettings {
      exclude_first_seen_tag: self.exclude_first_seen_tag,
      dry_run: self.dry_run,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
  #[serde(default)]
  logging: Option<LoggingConfig>,

  #[serde(default)]
  run: Option<RunConfig>,

  #[serde(default)]
  resources: BTreeMap<String, RawResourceRules>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawResourceRules {
  #[serde(default)]
  include: RawFilterRule,

  #[serde(default)]
  exclude: RawFilterRule,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawFilterRule {
  #[serde(default)]
  names_regex: Vec<String>,

  #[serde(default)]
  time_after: Option<String>,

  #[serde(default)]
  time_before: Option<String>,

  #[serde(default)]
  tag: Option<TagMatch>,
}

impl RawFilterRule {
  fn compile(self, resource_type: &str) -> Result<FilterRule, ConfigError> {
    let names_regex = self
      .names_regex
      .iter()
      .map(|p| {
        NamePattern::new(p).map_err(|source| ConfigError::InvalidPattern {
          resource_type: resource_type.to_string(),
          pattern: p.clone(),
          source,
        })
      })
      .collect::<Result<Vec<_>, _>>()?;

    Ok(FilterRule {
      names_regex,
      time_after: parse_time(resource_type, "time_after", self.time_after)?,
      time_before: parse_time(resource_type, "time_before", self.time_before)?,
      tag: self.tag,
    })
  }
}

fn parse_time(
  resource_type: &str,
  field: &'static str,
  value: Option<String>,
) -> Result<Option<DateTime<Utc>>, ConfigError> {
  let Some(value) = value else {
    return Ok(None);
  };
  DateTime::parse_from_rfc3339(value.trim())
    .map(|t| Some(t.with_timezone(&Utc)))
    .map_err(|source| ConfigError::InvalidTimestamp {
      resource_type: resource_type.to_string(),
      field,
      value,
      source,
    })
}

impl ConfigFile {
  fn normalize(self) -> Result<Config, ConfigError> {
    let mut cfg = Config::default();
    if let Some(l) = self.logging {
      cfg.logging = l;
    }
    if let Some(r) = self.run {
      cfg.run = r;
    }

    for (resource_type, raw) in self.resources {
      let rules = ResourceRules {
        include: raw.include.compile(&resource_type)?,
        exclude: raw.exclude.compile(&resource_type)?,
      };
      cfg.resources.insert(resource_type, rules);
    }

    validate(&cfg)?;
    Ok(cfg)
  }
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
  if cfg.run.max_workers == 0 {
    return Err(ConfigError::InvalidValue {
      field: "run.max_workers",
      reason: "must be > 0".to_string(),
    });
  }
  for (resource_type, rules) in &cfg.resources {
    let empty_key = rules
      .include
      .tag
      .iter()
      .chain(rules.exclude.tag.iter())
      .find(|t| t.key.trim().is_empty());
    if let Some(tag) = empty_key {
      return Err(ConfigError::InvalidValue {
        field: "tag.key",
        reason: format!("{resource_type}: empty tag key (value {:?})", tag.value),
      });
    }
  }
  Ok(())
}

pub fn from_toml_str(raw: &str) -> Result<Config, ConfigError> {
  toml::from_str::<ConfigFile>(raw)?.normalize()
}

/// Loads the rule file. A missing file yields defaults (include-all, tagging on);
/// a malformed one is an error, never a silent fallback.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
  if !path.exists() {
    eprintln!(
      "cloud-nuke: no config at {}; using defaults (every resource type is eligible).",
      path.display()
    );
    return Ok(Config::default());
  }

  let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
    path: path.display().to_string(),
    source,
  })?;
  from_toml_str(&raw)
}
