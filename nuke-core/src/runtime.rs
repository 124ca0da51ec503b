use crate::error::Cancelled;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Flags that apply to every pipeline of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSettings {
  /// Skip first-seen bookkeeping: nothing is tagged and untagged resources count as new.
  pub exclude_first_seen_tag: bool,

  /// List and filter only; approved identifiers are reported but never deleted.
  pub dry_run: bool,
}

pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Waits between provider polls. Implementations must return early on cancellation.
pub trait Sleeper: Send + Sync {
  fn sleep(&self, duration: Duration, cancel: &CancelToken) -> Result<(), Cancelled>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
  fn sleep(&self, duration: Duration, cancel: &CancelToken) -> Result<(), Cancelled> {
    if cancel.wait_timeout(duration) {
      return Err(Cancelled);
    }
    Ok(())
  }
}

/// Run-scoped cancellation flag shared by all pipelines.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
  inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    let (lock, cvar) = &*self.inner;
    let mut cancelled = lock.lock().unwrap_or_else(|e| e.into_inner());
    *cancelled = true;
    cvar.notify_all();
  }

  pub fn is_cancelled(&self) -> bool {
    let (lock, _) = &*self.inner;
    *lock.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Blocks for up to `timeout`. Returns true if the token was cancelled.
  pub fn wait_timeout(&self, timeout: Duration) -> bool {
    let (lock, cvar) = &*self.inner;
    let guard = lock.lock().unwrap_or_else(|e| e.into_inner());
    let (guard, _) = cvar
      .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
      .unwrap_or_else(|e| e.into_inner());
    *guard
  }
}

/// Routes Ctrl-C to the token. Can only be installed once per process.
pub fn install_interrupt_handler(cancel: &CancelToken) -> anyhow::Result<()> {
  let token = cancel.clone();
  ctrlc::set_handler(move || {
    tracing::warn!("interrupt received; cancelling run");
    token.cancel();
  })?;
  Ok(())
}

/// Everything a pipeline needs from the run: flags, cancellation, time.
#[derive(Clone)]
pub struct RunContext {
  pub settings: RunSettings,
  cancel: CancelToken,
  clock: Arc<dyn Clock>,
  sleeper: Arc<dyn Sleeper>,
}

impl RunContext {
  pub fn new(settings: RunSettings) -> Self {
    Self {
      settings,
      cancel: CancelToken::new(),
      clock: Arc::new(SystemClock),
      sleeper: Arc::new(ThreadSleeper),
    }
  }

  pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
    self.cancel = cancel;
    self
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
    self.sleeper = sleeper;
    self
  }

  pub fn cancel_token(&self) -> &CancelToken {
    &self.cancel
  }

  pub fn now(&self) -> DateTime<Utc> {
    self.clock.now()
  }

  pub fn check_cancelled(&self) -> Result<(), Cancelled> {
    if self.cancel.is_cancelled() {
      return Err(Cancelled);
    }
    Ok(())
  }

  pub fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
    self.sleeper.sleep(duration, &self.cancel)
  }
}

impl std::fmt::Debug for RunContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RunContext")
      .field("settings", &self.settings)
      .field("cancelled", &self.cancel.is_cancelled())
      .finish_non_exhaustive()
  }
}
