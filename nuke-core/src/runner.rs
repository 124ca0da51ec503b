use crate::config::Config;
use crate::error::PipelineError;
use crate::filter_engine::ResourceRules;
use crate::orchestrator::{self, NukeSummary};
use crate::pipeline;
use crate::report::{Reporter, RunReport};
use crate::resource::{ResourceDeleter, ResourceLister};
use crate::runtime::RunContext;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One resource type in one region: how to list it, how to delete it, and
/// which rules decide between the two.
pub struct Pipeline {
  region: String,
  lister: Arc<dyn ResourceLister>,
  deleter: Option<Arc<dyn ResourceDeleter>>,
  rules: ResourceRules,
}

impl Pipeline {
  pub fn new<R>(region: impl Into<String>, resource: Arc<R>, rules: ResourceRules) -> Self
  where
    R: ResourceLister + ResourceDeleter + 'static,
  {
    Self {
      region: region.into(),
      lister: resource.clone(),
      deleter: Some(resource),
      rules,
    }
  }

  /// Pipeline that can only be evaluated in dry-run mode.
  pub fn list_only(
    region: impl Into<String>,
    lister: Arc<dyn ResourceLister>,
    rules: ResourceRules,
  ) -> Self {
    Self {
      region: region.into(),
      lister,
      deleter: None,
      rules,
    }
  }

  /// Same as `new`, with rules looked up from `cfg` by resource type.
  pub fn from_config<R>(region: impl Into<String>, resource: Arc<R>, cfg: &Config) -> Self
  where
    R: ResourceLister + ResourceDeleter + 'static,
  {
    let rules = cfg.rules_for(ResourceLister::resource_type(resource.as_ref()));
    Self::new(region, resource, rules)
  }

  pub fn resource_type(&self) -> &str {
    self.lister.resource_type()
  }

  pub fn region(&self) -> &str {
    &self.region
  }

  pub fn run(&self, ctx: &RunContext, reporter: &Reporter) -> Result<NukeSummary, PipelineError> {
    let identifiers = pipeline::list_and_filter(ctx, self.lister.as_ref(), &self.rules)?;

    if ctx.settings.dry_run {
      tracing::info!(
        resource_type = %self.resource_type(),
        region = %self.region,
        count = identifiers.len(),
        "DRY-RUN: would delete resources"
      );
      reporter.record_planned(self.resource_type(), &self.region, identifiers);
      return Ok(NukeSummary::default());
    }

    if identifiers.is_empty() {
      return Ok(NukeSummary::default());
    }

    let deleter = self
      .deleter
      .as_deref()
      .ok_or_else(|| PipelineError::MissingDeleter {
        resource_type: self.resource_type().to_string(),
      })?;
    Ok(orchestrator::nuke_all(ctx, deleter, &self.region, &identifiers, reporter)?)
  }
}

/// Runs pipelines on a bounded pool of worker threads. A failing pipeline is
/// recorded and does not affect the others.
pub struct Runner {
  ctx: RunContext,
  reporter: Arc<Reporter>,
  max_workers: usize,
}

impl Runner {
  pub fn new(ctx: RunContext, reporter: Arc<Reporter>) -> Self {
    Self {
      ctx,
      reporter,
      max_workers: 1,
    }
  }

  pub fn with_max_workers(mut self, max_workers: usize) -> Self {
    self.max_workers = max_workers.max(1);
    self
  }

  pub fn run(&self, pipelines: Vec<Pipeline>) -> RunReport {
    let workers = self.max_workers.min(pipelines.len()).max(1);
    tracing::info!(
      run_id = %self.reporter.run_id(),
      pipelines = pipelines.len(),
      workers,
      dry_run = self.ctx.settings.dry_run,
      exclude_first_seen_tag = self.ctx.settings.exclude_first_seen_tag,
      "run started"
    );

    let queue = Mutex::new(VecDeque::from(pipelines));
    std::thread::scope(|s| {
      for _ in 0..workers {
        s.spawn(|| loop {
          let next = queue.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
          let Some(p) = next else { break };
          self.run_one(&p);
        });
      }
    });

    let report = self.reporter.finish(self.ctx.now());
    tracing::info!(
      run_id = %report.run_id,
      deleted = report.deleted,
      failed = report.failed,
      pipeline_failures = report.failures.len(),
      "run finished"
    );
    report
  }

  fn run_one(&self, p: &Pipeline) {
    if self.ctx.check_cancelled().is_err() {
      self
        .reporter
        .record_pipeline_failure(p.resource_type(), p.region(), PipelineError::Cancelled);
      return;
    }

    match p.run(&self.ctx, &self.reporter) {
      Ok(summary) => tracing::debug!(
        resource_type = %p.resource_type(),
        region = %p.region(),
        requested = summary.requested,
        failed = summary.failed,
        "pipeline finished"
      ),
      Err(e) => {
        tracing::error!(
          resource_type = %p.resource_type(),
          region = %p.region(),
          error = %e,
          "pipeline failed"
        );
        self.reporter.record_pipeline_failure(p.resource_type(), p.region(), &e);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ProviderError;
  use crate::filter_engine::{FilterRule, NamePattern};
  use crate::resource::{single_page, Pages};
  use crate::runtime::RunSettings;
  use crate::testing::context_with_sleeper;
  use crate::types::{OutcomeStatus, ResourceCandidate};
  use chrono::Utc;

  struct FakeResource {
    kind: &'static str,
    ids: Vec<&'static str>,
    list_error: bool,
  }

  impl FakeResource {
    fn new(kind: &'static str, ids: Vec<&'static str>) -> Arc<Self> {
      Arc::new(Self {
        kind,
        ids,
        list_error: false,
      })
    }
  }

  impl ResourceLister for FakeResource {
    fn resource_type(&self) -> &str {
      self.kind
    }

    fn list<'a>(&'a self, _ctx: &'a RunContext) -> Pages<'a> {
      if self.list_error {
        let err = ProviderError::service("Throttling", "slow down");
        return Box::new(std::iter::once(Err(err)));
      }
      single_page(
        self
          .ids
          .iter()
          .map(|id| ResourceCandidate::new(*id).with_created_at(Utc::now()))
          .collect(),
      )
    }
  }

  impl ResourceDeleter for FakeResource {
    fn resource_type(&self) -> &str {
      self.kind
    }

    fn delete(&self, _ctx: &RunContext, identifier: &str) -> Result<(), ProviderError> {
      if identifier.starts_with("locked") {
        return Err(ProviderError::service("ResourceInUse", "locked"));
      }
      Ok(())
    }
  }

  fn runner(settings: RunSettings) -> Runner {
    let (ctx, _) = context_with_sleeper(settings);
    Runner::new(ctx, Arc::new(Reporter::new(Utc::now()))).with_max_workers(3)
  }

  #[test]
  fn failed_pipeline_does_not_stop_others() {
    let broken = Arc::new(FakeResource {
      kind: "broken",
      ids: vec![],
      list_error: true,
    });
    let elb = FakeResource::new("elb", vec!["lb-1", "locked-lb"]);
    let pools = FakeResource::new("ipam-pool", vec!["pool-1"]);
    let pipelines = vec![
      Pipeline::new("us-east-1", elb, ResourceRules::default()),
      Pipeline::new("us-east-1", broken, ResourceRules::default()),
      Pipeline::new("eu-west-1", pools, ResourceRules::default()),
    ];

    let report = runner(RunSettings::default()).run(pipelines);

    assert_eq!(report.deleted, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].resource_type, "broken");
    let locked = report
      .outcomes
      .iter()
      .find(|o| o.identifier == "locked-lb")
      .unwrap();
    assert_eq!(locked.status, OutcomeStatus::Failed);
  }

  #[test]
  fn per_pipeline_outcome_order_is_listing_order() {
    let report = runner(RunSettings::default()).run(vec![Pipeline::new(
      "us-east-1",
      FakeResource::new("elb", vec!["c", "a", "b"]),
      ResourceRules::default(),
    )]);
    let ids: Vec<_> = report.outcomes.iter().map(|o| o.identifier.as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
  }

  #[test]
  fn dry_run_plans_without_deleting() {
    let rules = ResourceRules {
      exclude: FilterRule {
        names_regex: vec![NamePattern::new("^keep").unwrap()],
        ..FilterRule::default()
      },
      ..ResourceRules::default()
    };
    let report = runner(RunSettings {
      dry_run: true,
      ..RunSettings::default()
    })
    .run(vec![Pipeline::new(
      "us-east-1",
      FakeResource::new("elb", vec!["keep-me", "drop-me"]),
      rules,
    )]);

    assert!(report.outcomes.is_empty());
    assert_eq!(report.planned.len(), 1);
    assert_eq!(report.planned[0].identifiers, vec!["drop-me"]);
  }

  #[test]
  fn list_only_pipeline_needs_dry_run() {
    let lister: Arc<dyn ResourceLister> = FakeResource::new("elb", vec!["lb-1"]);
    let report = runner(RunSettings::default()).run(vec![Pipeline::list_only(
      "us-east-1",
      lister,
      ResourceRules::default(),
    )]);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].error.contains("no deleter"));
  }

  #[test]
  fn cancelled_run_skips_pipelines() {
    let r = runner(RunSettings::default());
    r.ctx.cancel_token().cancel();
    let report = r.run(vec![Pipeline::new(
      "us-east-1",
      FakeResource::new("elb", vec!["lb-1"]),
      ResourceRules::default(),
    )]);
    assert!(report.outcomes.is_empty());
    assert_eq!(report.failures[0].error, "run cancelled");
  }
}
