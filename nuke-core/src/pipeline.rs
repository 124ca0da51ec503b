use crate::error::PipelineError;
use crate::filter_engine::{should_include, ResourceRules, ResourceValue};
use crate::first_seen;
use crate::resource::{ResourceLister, TagWriter};
use crate::runtime::RunContext;
use crate::types::ResourceCandidate;
use chrono::{DateTime, Utc};

/// Lists every page from `lister` and returns the identifiers eligible for
/// deletion, in listing order.
pub fn list_and_filter(
  ctx: &RunContext,
  lister: &dyn ResourceLister,
  rules: &ResourceRules,
) -> Result<Vec<String>, PipelineError> {
  let resource_type = lister.resource_type();
  let tagger = lister.tagger();
  let mut approved = Vec::new();
  let mut seen = 0usize;

  let mut pages = lister.list(ctx);
  loop {
    ctx.check_cancelled()?;
    let Some(page) = pages.next() else { break };
    let candidates = page.map_err(|source| PipelineError::Listing {
      resource_type: resource_type.to_string(),
      source,
    })?;

    for candidate in &candidates {
      // Aging a candidate may write a tag.
      ctx.check_cancelled()?;
      seen += 1;
      let time = effective_time(ctx, candidate, tagger);
      if should_include(&ResourceValue::from_candidate(candidate, time), rules) {
        approved.push(candidate.identifier.clone());
      }
    }
  }

  tracing::debug!(
    resource_type = %resource_type,
    listed = seen,
    approved = approved.len(),
    "listing filtered"
  );
  Ok(approved)
}

fn effective_time(
  ctx: &RunContext,
  candidate: &ResourceCandidate,
  tagger: Option<&dyn TagWriter>,
) -> Option<DateTime<Utc>> {
  if let Some(created) = candidate.created_at {
    return Some(created);
  }
  match first_seen::ensure_first_seen(ctx, candidate, tagger) {
    Ok(t) => Some(t),
    Err(e) => {
      tracing::warn!(
        identifier = %candidate.identifier,
        error = %e,
        "unusable first-seen tag; time rules will not apply"
      );
      None
    }
  }
}
