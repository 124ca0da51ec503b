use crate::error::{Cancelled, NukeError, ProviderError};
use crate::resource::ResourceDeleter;
use crate::runtime::RunContext;
use std::time::Duration;

pub const POLL_ATTEMPTS: u32 = 30;
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub enum PollState {
  Polling { attempt: u32, survivors: Vec<String> },
  Confirmed,
  TimedOut { survivors: Vec<String> },
  HardError(ProviderError),
}

impl PollState {
  pub fn is_terminal(&self) -> bool {
    !matches!(self, Self::Polling { .. })
  }
}

/// Confirms asynchronous deletions by polling the provider for survivors.
pub struct CompletionPoller<'a> {
  deleter: &'a dyn ResourceDeleter,
  max_attempts: u32,
  interval: Duration,
}

impl<'a> CompletionPoller<'a> {
  pub fn new(deleter: &'a dyn ResourceDeleter) -> Self {
    Self {
      deleter,
      max_attempts: POLL_ATTEMPTS,
      interval: POLL_INTERVAL,
    }
  }

  pub fn with_budget(mut self, max_attempts: u32, interval: Duration) -> Self {
    self.max_attempts = max_attempts;
    self.interval = interval;
    self
  }

  /// Advances one transition. Terminal states are returned unchanged.
  pub fn step(&self, ctx: &RunContext, state: PollState) -> Result<PollState, Cancelled> {
    let PollState::Polling { attempt, survivors } = state else {
      return Ok(state);
    };
    if attempt >= self.max_attempts {
      return Ok(PollState::TimedOut { survivors });
    }

    ctx.check_cancelled()?;
    match self.deleter.describe_survivors(ctx, &survivors) {
      Err(e) if e.is_not_found() => Ok(PollState::Confirmed),
      Err(e) => Ok(PollState::HardError(e)),
      Ok(remaining) if remaining.is_empty() => Ok(PollState::Confirmed),
      Ok(remaining) => {
        tracing::debug!(
          resource_type = %self.deleter.resource_type(),
          attempt = attempt + 1,
          remaining = remaining.len(),
          "waiting for deletion to complete"
        );
        ctx.sleep(self.interval)?;
        Ok(PollState::Polling {
          attempt: attempt + 1,
          survivors: remaining,
        })
      }
    }
  }

  pub fn run(&self, ctx: &RunContext, identifiers: Vec<String>) -> Result<(), NukeError> {
    let mut state = PollState::Polling {
      attempt: 0,
      survivors: identifiers,
    };
    loop {
      match state {
        polling @ PollState::Polling { .. } => state = self.step(ctx, polling)?,
        PollState::Confirmed => return Ok(()),
        PollState::TimedOut { survivors } => {
          return Err(NukeError::DeletionTimeout {
            resource_type: self.deleter.resource_type().to_string(),
            attempts: self.max_attempts,
            survivors,
          })
        }
        PollState::HardError(source) => {
          return Err(NukeError::Confirmation {
            resource_type: self.deleter.resource_type().to_string(),
            source,
          })
        }
      }
    }
  }
}
