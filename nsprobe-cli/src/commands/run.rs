//! Run command implementation

use anyhow::{Context, Result};
use nsprobe_core::Summary;
use nsprobe_namespace::{CheckConfig, NamespaceIdentityCheck, Runner, RunnerConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub async fn execute(
    timeout: Option<u64>,
    no_root_check: bool,
    stack_size: usize,
    proc_root: PathBuf,
    json: bool,
) -> Result<i32> {
    let config = CheckConfig::new()
        .with_stack_size(stack_size)
        .with_proc_root(proc_root);
    config.validate().context("Invalid check configuration")?;

    let mut runner_config = RunnerConfig::new().with_root_check(!no_root_check);
    if let Some(secs) = timeout {
        if secs == 0 {
            anyhow::bail!("Timeout must be positive");
        }
        runner_config = runner_config.with_timeout(Duration::from_secs(secs));
    }

    info!("🔍 Running namespace identity check");

    let summary = Runner::new(runner_config)
        .run(NamespaceIdentityCheck::new(config))
        .await;

    print_summary(&summary, json)?;

    Ok(summary.exit_status())
}

fn print_summary(summary: &Summary, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(summary).context("Failed to encode results")?;
        println!("{out}");
        return Ok(());
    }

    println!();
    for result in &summary.results {
        println!("{result}");
    }
    println!("{:-<60}", "");
    print!("{summary}");

    Ok(())
}
