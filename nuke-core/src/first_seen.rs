//! First-seen bookkeeping: an age proxy for resources the provider does not
//! timestamp. The tag lives on the remote resource and is written at most once.

use crate::error::TagParseError;
use crate::resource::TagWriter;
use crate::runtime::RunContext;
use crate::types::ResourceCandidate;
use chrono::{DateTime, SecondsFormat, Utc};

pub const FIRST_SEEN_TAG_KEY: &str = "cloud-nuke-first-seen";

pub fn format_timestamp(t: DateTime<Utc>) -> String {
  t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, TagParseError> {
  DateTime::parse_from_rfc3339(value.trim())
    .map(|t| t.with_timezone(&Utc))
    .map_err(|source| TagParseError {
      value: value.to_string(),
      source,
    })
}

/// Returns the instant `candidate` was first observed, tagging it now if it has
/// never been seen before.
///
/// A failed tag write is logged and the current instant is returned anyway; a
/// missed tag only costs age precision on later runs. With tagging disabled, or
/// when the resource type has no `tagger`, untagged resources are reported as
/// seen "now".
pub fn ensure_first_seen(
  ctx: &RunContext,
  candidate: &ResourceCandidate,
  tagger: Option<&dyn TagWriter>,
) -> Result<DateTime<Utc>, TagParseError> {
  if let Some(raw) = candidate.tags.get(FIRST_SEEN_TAG_KEY) {
    return parse_timestamp(raw);
  }

  let now = ctx.now();
  if ctx.settings.exclude_first_seen_tag {
    return Ok(now);
  }

  let Some(tagger) = tagger else {
    tracing::debug!(
      identifier = %candidate.identifier,
      "resource type does not support tagging; treating as first seen now"
    );
    return Ok(now);
  };

  let value = format_timestamp(now);
  match tagger.write_tag(ctx, &candidate.identifier, FIRST_SEEN_TAG_KEY, &value) {
    Ok(()) => tracing::debug!(
      identifier = %candidate.identifier,
      first_seen = %value,
      "first-seen tag written"
    ),
    Err(e) => tracing::warn!(
      identifier = %candidate.identifier,
      error = %e,
      "failed to write first-seen tag (continuing)"
    ),
  }

  Ok(now)
}
