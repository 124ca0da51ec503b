use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_FILE_NAME: &str = "cloud-nuke.log";

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Daily rolling log file plus stderr, filtered by `level` (an `EnvFilter`
/// directive). Files older than `retention_days` are removed first; 0 keeps all.
pub fn init_file_and_stderr(
  log_dir: &Path,
  level: &str,
  retention_days: u64,
) -> anyhow::Result<()> {
  fs::create_dir_all(log_dir)?;
  let pruned = retention_cutoff(retention_days)
    .map(|cutoff| remove_logs_older_than(log_dir, cutoff))
    .unwrap_or(0);

  let (file_writer, guard) =
    tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME));
  let _ = FILE_GUARD.set(guard);

  let filter = tracing_subscriber::EnvFilter::try_new(level)
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(
      tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_target(true),
    )
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false),
    )
    .try_init()?;

  tracing::debug!(log_dir = %log_dir.display(), pruned, retention_days, "logging initialized");
  Ok(())
}

fn retention_cutoff(retention_days: u64) -> Option<SystemTime> {
  if retention_days == 0 {
    return None;
  }
  let age = Duration::from_secs(retention_days.saturating_mul(24 * 60 * 60));
  Some(SystemTime::now().checked_sub(age).unwrap_or(SystemTime::UNIX_EPOCH))
}

/// Removes our log files last modified before `cutoff`. Returns how many went.
fn remove_logs_older_than(log_dir: &Path, cutoff: SystemTime) -> usize {
  let Ok(entries) = fs::read_dir(log_dir) else {
    return 0;
  };

  entries
    .flatten()
    .filter(|e| is_nuke_log_file(&e.path()))
    .filter(|e| {
      e.metadata()
        .and_then(|m| m.modified())
        .map(|modified| modified < cutoff)
        .unwrap_or(false)
    })
    .filter(|e| fs::remove_file(e.path()).is_ok())
    .count()
}

fn is_nuke_log_file(path: &Path) -> bool {
  path
    .file_name()
    .and_then(|n| n.to_str())
    .map(|name| name == LOG_FILE_NAME || name.starts_with("cloud-nuke.log."))
    .unwrap_or(false)
}
