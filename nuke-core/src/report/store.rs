use super::RunReport;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes `<run_id>.toml` into `dir`, creating it if needed. The report is
/// staged as a hidden file and renamed into place so readers never see a
/// partial report.
pub fn store_report(dir: &Path, report: &RunReport) -> anyhow::Result<PathBuf> {
  fs::create_dir_all(dir)?;
  let raw = toml::to_string_pretty(report)?;

  let file_name = format!("{}.toml", report.run_id);
  let staged = dir.join(format!(".{file_name}.tmp"));
  let file_path = dir.join(file_name);
  fs::write(&staged, raw)?;
  fs::rename(&staged, &file_path)?;
  Ok(file_path)
}

#[derive(Debug, Clone)]
pub struct ReportSummary {
  pub run_id: String,
  pub finished_at: DateTime<Utc>,
  pub deleted: usize,
  pub failed: usize,
  pub pipeline_failures: usize,
}

/// Newest stored reports first. Unreadable files are skipped.
pub fn list_recent(dir: &Path, limit: usize) -> anyhow::Result<Vec<ReportSummary>> {
  if !dir.exists() {
    return Ok(Vec::new());
  }

  let mut out = Vec::new();
  for e in fs::read_dir(dir)?.flatten() {
    if e.path().extension().and_then(|s| s.to_str()) != Some("toml") {
      continue;
    }
    let raw = match fs::read_to_string(e.path()) {
      Ok(r) => r,
      Err(_) => continue,
    };
    let report: RunReport = match toml::from_str(&raw) {
      Ok(r) => r,
      Err(_) => continue,
    };
    out.push(ReportSummary {
      run_id: report.run_id,
      finished_at: report.finished_at,
      deleted: report.deleted,
      failed: report.failed,
      pipeline_failures: report.failures.len(),
    });
  }

  out.sort_by(|a, b| b.finished_at.cmp(&a.finished_at));
  out.truncate(limit);
  Ok(out)
}
