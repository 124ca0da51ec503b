//! Deterministic clock and sleeper for driving pipelines without wall-clock delays.

use crate::error::Cancelled;
use crate::runtime::{CancelToken, Clock, RunContext, RunSettings, Sleeper};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    self.0
  }
}

/// Records requested sleeps and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
  slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn sleeps(&self) -> Vec<Duration> {
    self.slept.lock().unwrap_or_else(|e| e.into_inner()).clone()
  }
}

impl Sleeper for RecordingSleeper {
  fn sleep(&self, duration: Duration, cancel: &CancelToken) -> Result<(), Cancelled> {
    if cancel.is_cancelled() {
      return Err(Cancelled);
    }
    self
      .slept
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .push(duration);
    Ok(())
  }
}

/// Context for `settings` with a recording sleeper and the system clock.
pub fn context_with_sleeper(settings: RunSettings) -> (RunContext, Arc<RecordingSleeper>) {
  let sleeper = Arc::new(RecordingSleeper::new());
  let ctx = RunContext::new(settings).with_sleeper(sleeper.clone());
  (ctx, sleeper)
}
