//! Error types for listing, tagging, deletion and configuration.

use thiserror::Error;

/// Error reported by a provider client. The core only distinguishes "not found"
/// from everything else.
#[derive(Debug, Error)]
pub enum ProviderError {
  #[error("resource not found: {identifier}")]
  NotFound { identifier: String },

  #[error("provider error {code}: {message}")]
  Service { code: String, message: String },

  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

impl ProviderError {
  pub fn not_found(identifier: impl Into<String>) -> Self {
    Self::NotFound {
      identifier: identifier.into(),
    }
  }

  pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Service {
      code: code.into(),
      message: message.into(),
    }
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::NotFound { .. })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("run cancelled")]
pub struct Cancelled;

/// The reserved first-seen tag holds a value that is not a valid timestamp.
#[derive(Debug, Error)]
#[error("invalid first-seen timestamp {value:?}: {source}")]
pub struct TagParseError {
  pub value: String,
  #[source]
  pub source: chrono::ParseError,
}

#[derive(Debug, Error)]
pub enum NukeError {
  #[error("run cancelled")]
  Cancelled,

  #[error(
    "{resource_type}: deletion of {} resource(s) not confirmed after {attempts} attempts",
    survivors.len()
  )]
  DeletionTimeout {
    resource_type: String,
    attempts: u32,
    survivors: Vec<String>,
  },

  #[error("{resource_type}: failed to confirm deletion: {source}")]
  Confirmation {
    resource_type: String,
    #[source]
    source: ProviderError,
  },
}

impl From<Cancelled> for NukeError {
  fn from(_: Cancelled) -> Self {
    Self::Cancelled
  }
}

/// Hard failure of one resource-type pipeline. Other pipelines keep running.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("{resource_type}: listing failed: {source}")]
  Listing {
    resource_type: String,
    #[source]
    source: ProviderError,
  },

  #[error("{resource_type}: no deleter configured")]
  MissingDeleter { resource_type: String },

  #[error("run cancelled")]
  Cancelled,

  #[error(transparent)]
  Deletion(#[from] NukeError),
}

impl From<Cancelled> for PipelineError {
  fn from(_: Cancelled) -> Self {
    Self::Cancelled
  }
}

impl PipelineError {
  pub fn is_cancelled(&self) -> bool {
    matches!(self, Self::Cancelled | Self::Deletion(NukeError::Cancelled))
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config: {0}")]
  Parse(#[from] toml::de::Error),

  #[error("{resource_type}: invalid name pattern {pattern:?}: {source}")]
  InvalidPattern {
    resource_type: String,
    pattern: String,
    #[source]
    source: regex::Error,
  },

  #[error("{resource_type}: invalid timestamp {value:?} for {field}: {source}")]
  InvalidTimestamp {
    resource_type: String,
    field: &'static str,
    value: String,
    #[source]
    source: chrono::ParseError,
  },

  #[error("invalid value for {field}: {reason}")]
  InvalidValue { field: &'static str, reason: String },
}
