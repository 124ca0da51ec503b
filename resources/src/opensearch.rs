//! OpenSearch domains. No native creation time: age comes from the first-seen
//! tag, read from the domain's tag list and written with `add_tags`.

use crate::classify;
use nuke_core::error::ProviderError;
use nuke_core::resource::{single_page, Pages, ResourceDeleter, ResourceLister, TagWriter};
use nuke_core::runtime::RunContext;
use nuke_core::types::ResourceCandidate;

pub const RESOURCE_TYPE: &str = "opensearch-domain";

const NOT_FOUND_CODES: &[&str] = &["ResourceNotFoundException"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainStatus {
  pub domain_name: String,
  pub created: bool,
  /// Deletion has been requested and is in progress.
  pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
  pub key: String,
  pub value: String,
}

pub trait OpenSearchClient: Send + Sync {
  fn list_domain_names(&self) -> Result<Vec<String>, ProviderError>;

  fn describe_domains(&self, names: &[String]) -> Result<Vec<DomainStatus>, ProviderError>;

  fn list_tags(&self, domain_name: &str) -> Result<Vec<Tag>, ProviderError>;

  fn add_tags(&self, domain_name: &str, tags: &[Tag]) -> Result<(), ProviderError>;

  fn delete_domain(&self, domain_name: &str) -> Result<(), ProviderError>;
}

pub struct OpenSearchDomains<C> {
  client: C,
}

impl<C: OpenSearchClient> OpenSearchDomains<C> {
  pub fn new(client: C) -> Self {
    Self { client }
  }

  /// Stops reading tags once the run is cancelled; the caller sees the
  /// cancellation before it looks at a partial listing.
  fn live_domains(&self, ctx: &RunContext) -> Result<Vec<ResourceCandidate>, ProviderError> {
    let names = self.client.list_domain_names()?;
    if names.is_empty() {
      return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for status in self.client.describe_domains(&names)? {
      if ctx.check_cancelled().is_err() {
        break;
      }
      if status.deleted {
        continue;
      }
      let tags = self.client.list_tags(&status.domain_name)?;
      out.push(ResourceCandidate::from_tags(
        status.domain_name,
        tags.into_iter().map(|t| (t.key, t.value)),
      ));
    }
    Ok(out)
  }
}

impl<C: OpenSearchClient> ResourceLister for OpenSearchDomains<C> {
  fn resource_type(&self) -> &str {
    RESOURCE_TYPE
  }

  fn list<'a>(&'a self, ctx: &'a RunContext) -> Pages<'a> {
    match self.live_domains(ctx) {
      Ok(candidates) => single_page(candidates),
      Err(e) => Box::new(std::iter::once(Err(e))),
    }
  }

  fn tagger(&self) -> Option<&dyn TagWriter> {
    Some(self)
  }
}

impl<C: OpenSearchClient> TagWriter for OpenSearchDomains<C> {
  fn write_tag(
    &self,
    _ctx: &RunContext,
    identifier: &str,
    key: &str,
    value: &str,
  ) -> Result<(), ProviderError> {
    let tag = Tag {
      key: key.to_string(),
      value: value.to_string(),
    };
    self.client.add_tags(identifier, &[tag])
  }
}

impl<C: OpenSearchClient> ResourceDeleter for OpenSearchDomains<C> {
  fn resource_type(&self) -> &str {
    RESOURCE_TYPE
  }

  fn delete(&self, _ctx: &RunContext, identifier: &str) -> Result<(), ProviderError> {
    self
      .client
      .delete_domain(identifier)
      .map_err(|e| classify(e, identifier, NOT_FOUND_CODES))
  }

  fn requires_confirmation(&self) -> bool {
    true
  }

  fn describe_survivors(
    &self,
    _ctx: &RunContext,
    identifiers: &[String],
  ) -> Result<Vec<String>, ProviderError> {
    let statuses = self
      .client
      .describe_domains(identifiers)
      .map_err(|e| classify(e, &identifiers.join(","), NOT_FOUND_CODES))?;
    Ok(
      statuses
        .into_iter()
        .filter(|s| !s.deleted)
        .map(|s| s.domain_name)
        .collect(),
    )
  }
}
