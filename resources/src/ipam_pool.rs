use crate::classify;
use nuke_core::error::ProviderError;
use nuke_core::resource::{paginate, Pages, ResourceDeleter, ResourceLister, TagWriter};
use nuke_core::runtime::RunContext;
use nuke_core::types::ResourceCandidate;

pub const RESOURCE_TYPE: &str = "ec2-ipam-pool";

const NOT_FOUND_CODES: &[&str] = &["InvalidIpamPoolId.NotFound"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpamPool {
  pub ipam_pool_id: String,
  pub tags: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpamPoolsPage {
  pub pools: Vec<IpamPool>,
  pub next_token: Option<String>,
}

pub trait Ec2IpamClient: Send + Sync {
  fn describe_ipam_pools(&self, next_token: Option<&str>)
    -> Result<IpamPoolsPage, ProviderError>;

  fn delete_ipam_pool(&self, ipam_pool_id: &str) -> Result<(), ProviderError>;

  fn create_tags(&self, resource_id: &str, key: &str, value: &str) -> Result<(), ProviderError>;
}

pub struct IpamPools<C> {
  client: C,
}

impl<C: Ec2IpamClient> IpamPools<C> {
  pub fn new(client: C) -> Self {
    Self { client }
  }
}

impl<C: Ec2IpamClient> ResourceLister for IpamPools<C> {
  fn resource_type(&self) -> &str {
    RESOURCE_TYPE
  }

  fn list<'a>(&'a self, _ctx: &'a RunContext) -> Pages<'a> {
    paginate(move |token| {
      let page = self.client.describe_ipam_pools(token)?;
      let candidates = page
        .pools
        .into_iter()
        .map(|p| ResourceCandidate::from_tags(p.ipam_pool_id, p.tags))
        .collect();
      Ok((candidates, page.next_token))
    })
  }

  fn tagger(&self) -> Option<&dyn TagWriter> {
    Some(self)
  }
}

impl<C: Ec2IpamClient> TagWriter for IpamPools<C> {
  fn write_tag(
    &self,
    _ctx: &RunContext,
    identifier: &str,
    key: &str,
    value: &str,
  ) -> Result<(), ProviderError> {
    self.client.create_tags(identifier, key, value)
  }
}

impl<C: Ec2IpamClient> ResourceDeleter for IpamPools<C> {
  fn resource_type(&self) -> &str {
    RESOURCE_TYPE
  }

  fn delete(&self, _ctx: &RunContext, identifier: &str) -> Result<(), ProviderError> {
    self
      .client
      .delete_ipam_pool(identifier)
      .map_err(|e| classify(e, identifier, NOT_FOUND_CODES))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, Utc};
  use nuke_core::filter_engine::{FilterRule, NamePattern, ResourceRules};
  use nuke_core::first_seen::{format_timestamp, FIRST_SEEN_TAG_KEY};
  use nuke_core::pipeline::list_and_filter;
  use nuke_core::report::Reporter;
  use nuke_core::runtime::RunSettings;
  use nuke_core::testing::context_with_sleeper;
  use std::collections::HashMap;

  #[derive(Default)]
  struct MockedIpamPools {
    pages: HashMap<Option<String>, IpamPoolsPage>,
  }

  impl Ec2IpamClient for MockedIpamPools {
    fn describe_ipam_pools(
      &self,
      next_token: Option<&str>,
    ) -> Result<IpamPoolsPage, ProviderError> {
      Ok(
        self
          .pages
          .get(&next_token.map(str::to_string))
          .cloned()
          .unwrap_or_default(),
      )
    }

    fn delete_ipam_pool(&self, _ipam_pool_id: &str) -> Result<(), ProviderError> {
      Ok(())
    }

    fn create_tags(&self, _id: &str, _key: &str, _value: &str) -> Result<(), ProviderError> {
      Ok(())
    }
  }

  fn pool(id: &str, name: &str, seen: &str) -> IpamPool {
    IpamPool {
      ipam_pool_id: id.to_string(),
      tags: vec![
        ("Name".to_string(), name.to_string()),
        (FIRST_SEEN_TAG_KEY.to_string(), seen.to_string()),
      ],
    }
  }

  #[test]
  fn get_all() {
    let now = Utc::now();
    let seen = format_timestamp(now);
    let test_id1 = "ipam-pool-0dfc56f901b2c3462";
    let test_id2 = "ipam-pool-0dfc56f901b2c3463";

    let ipam = IpamPools::new(MockedIpamPools {
      pages: HashMap::from([(
        None,
        IpamPoolsPage {
          pools: vec![
            pool(test_id1, "test-ipam-pool-id1", &seen),
            pool(test_id2, "test-ipam-pool-id2", &seen),
          ],
          next_token: None,
        },
      )]),
    });
    let (ctx, _) = context_with_sleeper(RunSettings::default());

    let cases = [
      (ResourceRules::default(), vec![test_id1, test_id2]),
      (
        ResourceRules {
          exclude: FilterRule {
            names_regex: vec![NamePattern::new("test-ipam-pool-id1").unwrap()],
            ..FilterRule::default()
          },
          ..ResourceRules::default()
        },
        vec![test_id2],
      ),
      (
        ResourceRules {
          exclude: FilterRule {
            time_after: Some(now - Duration::hours(1)),
            ..FilterRule::default()
          },
          ..ResourceRules::default()
        },
        vec![],
      ),
    ];

    for (rules, expected) in cases {
      assert_eq!(list_and_filter(&ctx, &ipam, &rules).unwrap(), expected);
    }
  }

  #[test]
  fn follows_pagination() {
    let seen = format_timestamp(Utc::now());
    let ipam = IpamPools::new(MockedIpamPools {
      pages: HashMap::from([
        (
          None,
          IpamPoolsPage {
            pools: vec![pool("pool-a", "a", &seen)],
            next_token: Some("page-2".to_string()),
          },
        ),
        (
          Some("page-2".to_string()),
          IpamPoolsPage {
            pools: vec![pool("pool-b", "b", &seen)],
            next_token: None,
          },
        ),
      ]),
    });
    let (ctx, _) = context_with_sleeper(RunSettings::default());
    let ids = list_and_filter(&ctx, &ipam, &ResourceRules::default()).unwrap();
    assert_eq!(ids, vec!["pool-a", "pool-b"]);
  }

  #[test]
  fn nuke_all() {
    let ipam = IpamPools::new(MockedIpamPools::default());
    let (ctx, _) = context_with_sleeper(RunSettings::default());
    let reporter = Reporter::new(Utc::now());

    nuke_core::orchestrator::nuke_all(&ctx, &ipam, "us-east-1", &["test".to_string()], &reporter)
      .unwrap();
    assert_eq!(reporter.entries().len(), 1);
  }
}
