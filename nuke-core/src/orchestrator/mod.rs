mod poll;

pub use poll::{CompletionPoller, PollState, POLL_ATTEMPTS, POLL_INTERVAL};

use crate::error::NukeError;
use crate::report::Reporter;
use crate::resource::ResourceDeleter;
use crate::runtime::RunContext;
use crate::types::DeletionOutcome;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NukeSummary {
  pub requested: usize,
  pub deleted: usize,
  pub already_gone: usize,
  pub failed: usize,
}

/// Deletes `identifiers` one at a time, recording an outcome for each.
///
/// Per-item failures are recorded and never abort the batch. "Not found" counts
/// as deleted. For resource types with asynchronous deletion the accepted
/// requests are then confirmed by polling; a confirmation failure is returned
/// as an error but leaves the recorded outcomes untouched.
pub fn nuke_all(
  ctx: &RunContext,
  deleter: &dyn ResourceDeleter,
  region: &str,
  identifiers: &[String],
  reporter: &Reporter,
) -> Result<NukeSummary, NukeError> {
  let resource_type = deleter.resource_type();
  if identifiers.is_empty() {
    tracing::debug!(resource_type = %resource_type, region = %region, "nothing to nuke");
    return Ok(NukeSummary::default());
  }

  tracing::info!(
    resource_type = %resource_type,
    region = %region,
    count = identifiers.len(),
    "deleting resources"
  );

  let mut summary = NukeSummary {
    requested: identifiers.len(),
    ..NukeSummary::default()
  };
  let mut accepted = Vec::new();

  for id in identifiers {
    ctx.check_cancelled()?;

    match deleter.delete(ctx, id) {
      Ok(()) => {
        reporter.record(DeletionOutcome::deleted(id, resource_type, region, ctx.now()));
        summary.deleted += 1;
        accepted.push(id.clone());
        tracing::debug!(resource_type = %resource_type, identifier = %id, "deleted");
      }
      Err(e) if e.is_not_found() => {
        reporter.record(DeletionOutcome::deleted(id, resource_type, region, ctx.now()));
        summary.already_gone += 1;
        tracing::debug!(resource_type = %resource_type, identifier = %id, "already gone");
      }
      Err(e) => {
        reporter.record(DeletionOutcome::failed(id, resource_type, region, &e, ctx.now()));
        summary.failed += 1;
        tracing::warn!(
          resource_type = %resource_type,
          identifier = %id,
          error = %e,
          "delete failed (continuing)"
        );
      }
    }
  }

  if deleter.requires_confirmation() && !accepted.is_empty() {
    CompletionPoller::new(deleter).run(ctx, accepted)?;
  }

  tracing::info!(
    resource_type = %resource_type,
    region = %region,
    deleted = summary.deleted + summary.already_gone,
    failed = summary.failed,
    "deletion finished"
  );
  Ok(summary)
}
