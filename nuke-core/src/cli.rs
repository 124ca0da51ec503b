use std::path::PathBuf;

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
  pub config: Option<PathBuf>,
  pub inventory: Option<PathBuf>,
  pub region: String,
  pub log_dir: Option<PathBuf>,
  pub reports: bool,
  pub help: bool,
}

impl Default for CliOptions {
  fn default() -> Self {
    Self {
      config: None,
      inventory: None,
      region: DEFAULT_REGION.to_string(),
      log_dir: None,
      reports: false,
      help: false,
    }
  }
}

pub fn parse_args(args: &[String]) -> anyhow::Result<CliOptions> {
  let mut opts = CliOptions::default();
  // args[0] is the program name.
  let mut it = args.iter().skip(1);
  while let Some(arg) = it.next() {
    match arg.as_str() {
      "--help" | "-h" => opts.help = true,
      "--reports" => opts.reports = true,
      "--config" => opts.config = Some(PathBuf::from(value_for(arg, it.next())?)),
      "--inventory" => opts.inventory = Some(PathBuf::from(value_for(arg, it.next())?)),
      "--region" => opts.region = value_for(arg, it.next())?.to_string(),
      "--log-dir" => opts.log_dir = Some(PathBuf::from(value_for(arg, it.next())?)),
      other => return Err(anyhow::anyhow!("unknown argument `{other}` (see --help)")),
    }
  }
  Ok(opts)
}

fn value_for<'a>(flag: &str, value: Option<&'a String>) -> anyhow::Result<&'a str> {
  value
    .map(String::as_str)
    .filter(|v| !v.starts_with("--"))
    .ok_or_else(|| anyhow::anyhow!("`{flag}` expects a value"))
}

pub fn print_help() {
  println!("cloud-nuke: evaluate cleanup rules against a resource inventory");
  println!();
  println!("USAGE:");
  println!("  cloud-nuke --inventory <file.json> [--config <file.toml>] [--region <name>]");
  println!("  cloud-nuke --reports");
  println!();
  println!("OPTIONS:");
  println!("  --config <file>     rule file (default: $CLOUD_NUKE_HOME/config.toml)");
  println!("  --inventory <file>  JSON map of resource type -> candidates");
  println!("  --region <name>     region label for the report (default: {DEFAULT_REGION})");
  println!("  --log-dir <dir>     log directory (default: $CLOUD_NUKE_HOME/logs)");
  println!("  --reports           list recent stored run reports");
  println!("  --version           print version");
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args(v: &[&str]) -> Vec<String> {
    std::iter::once("cloud-nuke")
      .chain(v.iter().copied())
      .map(String::from)
      .collect()
  }

  #[test]
  fn parses_all_flags() {
    let opts = parse_args(&args(&[
      "--config",
      "nuke.toml",
      "--inventory",
      "inv.json",
      "--region",
      "eu-west-1",
      "--log-dir",
      "/tmp/logs",
    ]))
    .unwrap();
    assert_eq!(opts.config, Some(PathBuf::from("nuke.toml")));
    assert_eq!(opts.inventory, Some(PathBuf::from("inv.json")));
    assert_eq!(opts.region, "eu-west-1");
    assert_eq!(opts.log_dir, Some(PathBuf::from("/tmp/logs")));
  }

  #[test]
  fn defaults_region() {
    assert_eq!(parse_args(&args(&[])).unwrap(), CliOptions::default());
  }

  #[test]
  fn missing_value_is_an_error() {
    assert!(parse_args(&args(&["--config"])).is_err());
    assert!(parse_args(&args(&["--config", "--region"])).is_err());
  }

  #[test]
  fn unknown_flag_is_an_error() {
    assert!(parse_args(&args(&["--nuke-everything"])).is_err());
  }
}
