//! Resource-type adapters. Each module wraps a thin provider client trait and
//! exposes it to the core as a `ResourceLister` + `ResourceDeleter`.

pub mod elb;
pub mod ipam_pool;
pub mod opensearch;

use nuke_core::config::Config;
use nuke_core::error::ProviderError;
use nuke_core::runner::Pipeline;
use std::sync::Arc;

/// Every resource type this crate knows how to nuke.
pub const RESOURCE_TYPES: &[&str] = &[
  elb::RESOURCE_TYPE,
  ipam_pool::RESOURCE_TYPE,
  opensearch::RESOURCE_TYPE,
];

/// Maps provider-specific "does not exist" codes to `ProviderError::NotFound`.
pub(crate) fn classify(
  err: ProviderError,
  identifier: &str,
  not_found_codes: &[&str],
) -> ProviderError {
  match err {
    ProviderError::Service { ref code, .. } if not_found_codes.contains(&code.as_str()) => {
      tracing::debug!(identifier, code = %code, "provider reports resource missing");
      ProviderError::not_found(identifier)
    }
    other => other,
  }
}

/// Collects the pipelines for one region, with rules taken from the config.
pub struct RegionResources<'a> {
  region: String,
  cfg: &'a Config,
  pipelines: Vec<Pipeline>,
}

impl<'a> RegionResources<'a> {
  pub fn new(region: impl Into<String>, cfg: &'a Config) -> Self {
    Self {
      region: region.into(),
      cfg,
      pipelines: Vec::new(),
    }
  }

  pub fn with_load_balancers<C>(self, client: C) -> Self
  where
    C: elb::ElbClient + 'static,
  {
    self.push(Arc::new(elb::LoadBalancers::new(client)))
  }

  pub fn with_opensearch_domains<C>(self, client: C) -> Self
  where
    C: opensearch::OpenSearchClient + 'static,
  {
    self.push(Arc::new(opensearch::OpenSearchDomains::new(client)))
  }

  pub fn with_ipam_pools<C>(self, client: C) -> Self
  where
    C: ipam_pool::Ec2IpamClient + 'static,
  {
    self.push(Arc::new(ipam_pool::IpamPools::new(client)))
  }

  pub fn into_pipelines(self) -> Vec<Pipeline> {
    self.pipelines
  }

  fn push<R>(mut self, resource: Arc<R>) -> Self
  where
    R: nuke_core::resource::ResourceLister + nuke_core::resource::ResourceDeleter + 'static,
  {
    let pipeline = Pipeline::from_config(self.region.clone(), resource, self.cfg);
    self.pipelines.push(pipeline);
    self
  }
}

/// Single-type convenience over `RegionResources`.
pub fn pipeline_for<R>(region: &str, resource: R, cfg: &Config) -> Pipeline
where
  R: nuke_core::resource::ResourceLister + nuke_core::resource::ResourceDeleter + 'static,
{
  Pipeline::from_config(region, Arc::new(resource), cfg)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;
  use nuke_core::report::Reporter;
  use nuke_core::runner::Runner;
  use nuke_core::runtime::RunSettings;
  use nuke_core::testing::context_with_sleeper;
  use std::sync::Mutex;

  #[derive(Default)]
  struct Elb {
    deleted: Mutex<Vec<String>>,
  }

  impl elb::ElbClient for Elb {
    fn describe_load_balancers(
      &self,
      names: &[String],
    ) -> Result<Vec<elb::LoadBalancerDescription>, ProviderError> {
      let deleted = self.deleted.lock().unwrap();
      let all = ["web-1", "keep-me"];
      Ok(
        all
          .iter()
          .filter(|n| !deleted.iter().any(|d| d == *n))
          .filter(|n| names.is_empty() || names.iter().any(|x| x == *n))
          .map(|n| elb::LoadBalancerDescription {
            name: n.to_string(),
            created_time: Some(Utc::now()),
          })
          .collect(),
      )
    }

    fn delete_load_balancer(&self, name: &str) -> Result<(), ProviderError> {
      self.deleted.lock().unwrap().push(name.to_string());
      Ok(())
    }
  }

  struct OpenSearch;

  impl opensearch::OpenSearchClient for OpenSearch {
    fn list_domain_names(&self) -> Result<Vec<String>, ProviderError> {
      Err(ProviderError::service("AccessDenied", "not authorized"))
    }

    fn describe_domains(
      &self,
      _names: &[String],
    ) -> Result<Vec<opensearch::DomainStatus>, ProviderError> {
      Ok(Vec::new())
    }

    fn list_tags(&self, _domain_name: &str) -> Result<Vec<opensearch::Tag>, ProviderError> {
      Ok(Vec::new())
    }

    fn add_tags(&self, _domain_name: &str, _tags: &[opensearch::Tag]) -> Result<(), ProviderError> {
      Ok(())
    }

    fn delete_domain(&self, _domain_name: &str) -> Result<(), ProviderError> {
      Ok(())
    }
  }

  struct Ipam;

  impl ipam_pool::Ec2IpamClient for Ipam {
    fn describe_ipam_pools(
      &self,
      _next_token: Option<&str>,
    ) -> Result<ipam_pool::IpamPoolsPage, ProviderError> {
      Ok(ipam_pool::IpamPoolsPage {
        pools: vec![ipam_pool::IpamPool {
          ipam_pool_id: "ipam-pool-1".to_string(),
          tags: vec![("Name".to_string(), "scratch".to_string())],
        }],
        next_token: None,
      })
    }

    fn delete_ipam_pool(&self, _ipam_pool_id: &str) -> Result<(), ProviderError> {
      Err(ProviderError::service("InvalidIpamPoolId.NotFound", "gone"))
    }

    fn create_tags(&self, _id: &str, _key: &str, _value: &str) -> Result<(), ProviderError> {
      Ok(())
    }
  }

  #[test]
  fn classify_maps_only_listed_codes() {
    let mapped = classify(ProviderError::service("Gone", "x"), "id-1", &["Gone"]);
    assert!(mapped.is_not_found());

    let kept = classify(ProviderError::service("Throttling", "x"), "id-1", &["Gone"]);
    assert!(matches!(kept, ProviderError::Service { ref code, .. } if code == "Throttling"));
  }

  #[test]
  fn builder_keeps_registration_order() {
    let cfg = nuke_core::config::from_toml_str(
      r#"
[resources.elb.exclude]
names_regex = ["^keep-"]
"#,
    )
    .unwrap();

    let pipelines = RegionResources::new("eu-west-1", &cfg)
      .with_load_balancers(Elb::default())
      .with_opensearch_domains(OpenSearch)
      .with_ipam_pools(Ipam)
      .into_pipelines();

    let types: Vec<&str> = pipelines.iter().map(|p| p.resource_type()).collect();
    assert_eq!(types, vec!["elb", "opensearch-domain", "ec2-ipam-pool"]);
    assert!(pipelines.iter().all(|p| p.region() == "eu-west-1"));
    assert!(RESOURCE_TYPES.iter().all(|t| types.contains(t)));
  }

  #[test]
  fn one_region_runs_all_types_and_isolates_failures() {
    let cfg = nuke_core::config::from_toml_str(
      r#"
[resources.elb.exclude]
names_regex = ["^keep-"]
"#,
    )
    .unwrap();
    let pipelines = RegionResources::new("us-east-1", &cfg)
      .with_load_balancers(Elb::default())
      .with_opensearch_domains(OpenSearch)
      .with_ipam_pools(Ipam)
      .into_pipelines();

    let (ctx, _) = context_with_sleeper(RunSettings {
      exclude_first_seen_tag: true,
      dry_run: false,
    });
    let reporter = Arc::new(Reporter::new(Utc::now()));
    let report = Runner::new(ctx, reporter).with_max_workers(3).run(pipelines);

    let mut deleted: Vec<&str> = report.outcomes.iter().map(|o| o.identifier.as_str()).collect();
    deleted.sort_unstable();
    assert_eq!(deleted, vec!["ipam-pool-1", "web-1"]);
    assert!(report.outcomes.iter().all(|o| o.is_success()));

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].resource_type, "opensearch-domain");
  }

  #[test]
  fn pipeline_for_single_type() {
    let cfg = Config::default();
    let p = pipeline_for("ap-south-1", ipam_pool::IpamPools::new(Ipam), &cfg);
    assert_eq!(p.resource_type(), ipam_pool::RESOURCE_TYPE);
  }
}
