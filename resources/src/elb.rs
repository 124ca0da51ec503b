//! Classic (v1) Elastic Load Balancers. Carry a native creation time, so no
//! first-seen tagging; deletion is asynchronous and confirmed by polling.

use crate::classify;
use chrono::{DateTime, Utc};
use nuke_core::error::ProviderError;
use nuke_core::resource::{single_page, Pages, ResourceDeleter, ResourceLister};
use nuke_core::runtime::RunContext;
use nuke_core::types::ResourceCandidate;

pub const RESOURCE_TYPE: &str = "elb";

const NOT_FOUND_CODES: &[&str] = &["LoadBalancerNotFound"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerDescription {
  pub name: String,
  pub created_time: Option<DateTime<Utc>>,
}

pub trait ElbClient: Send + Sync {
  /// All load balancers when `names` is empty, otherwise only those named.
  fn describe_load_balancers(
    &self,
    names: &[String],
  ) -> Result<Vec<LoadBalancerDescription>, ProviderError>;

  fn delete_load_balancer(&self, name: &str) -> Result<(), ProviderError>;
}

pub struct LoadBalancers<C> {
  client: C,
}

impl<C: ElbClient> LoadBalancers<C> {
  pub fn new(client: C) -> Self {
    Self { client }
  }
}

impl<C: ElbClient> ResourceLister for LoadBalancers<C> {
  fn resource_type(&self) -> &str {
    RESOURCE_TYPE
  }

  fn list<'a>(&'a self, _ctx: &'a RunContext) -> Pages<'a> {
    let page = self.client.describe_load_balancers(&[]).map(|lbs| {
      lbs
        .into_iter()
        .map(|lb| ResourceCandidate {
          created_at: lb.created_time,
          ..ResourceCandidate::new(lb.name)
        })
        .collect()
    });
    match page {
      Ok(candidates) => single_page(candidates),
      Err(e) => Box::new(std::iter::once(Err(e))),
    }
  }
}

impl<C: ElbClient> ResourceDeleter for LoadBalancers<C> {
  fn resource_type(&self) -> &str {
    RESOURCE_TYPE
  }

  fn delete(&self, _ctx: &RunContext, identifier: &str) -> Result<(), ProviderError> {
    self
      .client
      .delete_load_balancer(identifier)
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
    let lbs = self
      .client
      .describe_load_balancers(identifiers)
      .map_err(|e| classify(e, &identifiers.join(","), NOT_FOUND_CODES))?;
    Ok(lbs.into_iter().map(|lb| lb.name).collect())
  }
}
