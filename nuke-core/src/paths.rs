use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "CLOUD_NUKE_HOME";

pub fn base_dir() -> anyhow::Result<PathBuf> {
  match std::env::var(HOME_ENV) {
    Ok(home) if !home.trim().is_empty() => Ok(PathBuf::from(home)),
    _ => Ok(std::env::current_dir()?.join(".cloud-nuke")),
  }
}

pub fn config_path(base: &Path) -> PathBuf {
  base.join("config.toml")
}

pub fn logs_dir(base: &Path) -> PathBuf {
  base.join("logs")
}

pub fn reports_dir(base: &Path) -> PathBuf {
  base.join("reports")
}
