//! Capabilities a resource type exposes to the core. Each concrete resource type
//! implements these against its own provider client; nothing in the core knows
//! which resource type it is driving.

use crate::error::ProviderError;
use crate::runtime::RunContext;
use crate::types::ResourceCandidate;

pub type Page = Result<Vec<ResourceCandidate>, ProviderError>;

/// Lazy, finite sequence of listing pages. A fresh call to `list` re-lists.
pub type Pages<'a> = Box<dyn Iterator<Item = Page> + 'a>;

pub trait TagWriter: Send + Sync {
  fn write_tag(
    &self,
    ctx: &RunContext,
    identifier: &str,
    key: &str,
    value: &str,
  ) -> Result<(), ProviderError>;
}

pub trait ResourceLister: Send + Sync {
  fn resource_type(&self) -> &str;

  fn list<'a>(&'a self, ctx: &'a RunContext) -> Pages<'a>;

  /// `None` when the resource type cannot carry tags.
  fn tagger(&self) -> Option<&dyn TagWriter> {
    None
  }
}

pub trait ResourceDeleter: Send + Sync {
  fn resource_type(&self) -> &str;

  fn delete(&self, ctx: &RunContext, identifier: &str) -> Result<(), ProviderError>;

  /// Whether deletion is asynchronous and must be confirmed by polling.
  fn requires_confirmation(&self) -> bool {
    false
  }

  /// Returns the subset of `identifiers` that still exist. Must be overridden
  /// whenever `requires_confirmation` is true; the default refuses to confirm.
  fn describe_survivors(
    &self,
    ctx: &RunContext,
    identifiers: &[String],
  ) -> Result<Vec<String>, ProviderError> {
    let _ = (ctx, identifiers);
    Err(ProviderError::Other(anyhow::anyhow!(
      "{}: completion confirmation is not implemented",
      self.resource_type()
    )))
  }
}

/// Listing that fits in a single response.
pub fn single_page<'a>(candidates: Vec<ResourceCandidate>) -> Pages<'a> {
  Box::new(std::iter::once(Ok(candidates)))
}

/// Token-driven pagination. `fetch` receives the previous page's continuation
/// token and returns a page plus the next token; iteration stops after the last
/// page or the first error.
pub fn paginate<'a, F>(mut fetch: F) -> Pages<'a>
where
  F: FnMut(Option<&str>) -> Result<(Vec<ResourceCandidate>, Option<String>), ProviderError> + 'a,
{
  let mut next: Option<String> = None;
  let mut done = false;
  Box::new(std::iter::from_fn(move || {
    if done {
      return None;
    }
    match fetch(next.as_deref()) {
      Ok((page, token)) => {
        done = token.as_deref().map(str::is_empty).unwrap_or(true);
        next = token;
        Some(Ok(page))
      }
      Err(e) => {
        done = true;
        Some(Err(e))
      }
    }
  }))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn paginate_follows_tokens_until_exhausted() {
    let mut calls = Vec::new();
    let pages: Vec<_> = paginate(|token| {
      calls.push(token.map(str::to_string));
      match token {
        None => Ok((vec![ResourceCandidate::new("a")], Some("t1".to_string()))),
        Some("t1") => Ok((vec![ResourceCandidate::new("b")], None)),
        Some(other) => panic!("unexpected token {other}"),
      }
    })
    .collect();

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[1].as_ref().unwrap()[0].identifier, "b");
    drop(pages);
    assert_eq!(calls, vec![None, Some("t1".to_string())]);
  }

  #[test]
  fn paginate_stops_after_error() {
    let pages: Vec<_> =
      paginate(|_| Err(ProviderError::service("Throttling", "slow down"))).collect();
    assert_eq!(pages.len(), 1);
    assert!(pages[0].is_err());
  }
}
