pub mod cli;
pub mod config;
pub mod error;
pub mod filter_engine;
pub mod first_seen;
pub mod inventory;
pub mod logging;
pub mod orchestrator;
pub mod paths;
pub mod pipeline;
pub mod report;
pub mod resource;
pub mod runner;
pub mod runtime;
pub mod testing;
pub mod types;

use anyhow::Context;
use std::sync::Arc;

/// Offline evaluation: runs every resource type in an inventory file through
/// the filter pipeline in dry-run mode and prints what would be deleted.
pub fn run_cli(args: &[String]) -> anyhow::Result<()> {
  let opts = cli::parse_args(args)?;
  if opts.help {
    cli::print_help();
    return Ok(());
  }

  let base = paths::base_dir()?;
  let reports_dir = paths::reports_dir(&base);

  if opts.reports {
    for r in report::store::list_recent(&reports_dir, 20)? {
      println!(
        "{}  {}  deleted={} failed={} pipeline_failures={}",
        r.finished_at, r.run_id, r.deleted, r.failed, r.pipeline_failures
      );
    }
    return Ok(());
  }

  let inventory_path = opts
    .inventory
    .clone()
    .ok_or_else(|| anyhow::anyhow!("`--inventory <file>` is required (see --help)"))?;
  let config_path = opts.config.clone().unwrap_or_else(|| paths::config_path(&base));
  let cfg = config::load(&config_path)
    .with_context(|| format!("load config {}", config_path.display()))?;

  let log_dir = opts.log_dir.clone().unwrap_or_else(|| paths::logs_dir(&base));
  logging::init_file_and_stderr(&log_dir, &cfg.logging.level, cfg.logging.retention_days)?;

  let cancel = runtime::CancelToken::new();
  runtime::install_interrupt_handler(&cancel)?;

  let settings = inventory::evaluation_settings(&cfg.run);
  let ctx = runtime::RunContext::new(settings).with_cancel_token(cancel);

  let inventory = inventory::Inventory::load(&inventory_path)
    .with_context(|| format!("load inventory {}", inventory_path.display()))?;
  let pipelines = inventory.into_pipelines(&opts.region, &cfg);

  let reporter = Arc::new(report::Reporter::new(ctx.now()));
  let run = runner::Runner::new(ctx, reporter).with_max_workers(cfg.run.max_workers);
  let report = run.run(pipelines);

  print!("{}", report.render_table());
  match report::store::store_report(&reports_dir, &report) {
    Ok(path) => tracing::info!(report_path = %path.display(), "report stored"),
    Err(e) => tracing::error!(error = ?e, "failed to store report (continuing)"),
  }

  if !report.failures.is_empty() {
    return Err(anyhow::anyhow!(
      "{} resource type(s) could not be evaluated",
      report.failures.len()
    ));
  }
  Ok(())
}
