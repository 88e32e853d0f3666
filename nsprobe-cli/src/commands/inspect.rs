//! Inspect command implementation

use anyhow::{Context, Result};
use nsprobe_core::ProcessId;
use nsprobe_namespace::{NamespaceInspector, NamespaceKind};
use std::path::Path;

pub fn execute(pid: Option<i32>, kind: Option<NamespaceKind>, proc_root: &Path, json: bool) -> Result<()> {
    let target = pid.map_or_else(ProcessId::current, ProcessId::from_raw);
    let inspector = NamespaceInspector::for_pid(proc_root, target);

    let reports = match kind {
        Some(kind) => vec![inspector
            .inspect(kind)
            .with_context(|| format!("Failed to inspect {kind} namespace of PID {target}"))?],
        None => inspector
            .inspect_all()
            .with_context(|| format!("Failed to get namespace information for PID {target}"))?,
    };

    if json {
        let out = serde_json::to_string_pretty(&reports).context("Failed to encode namespaces")?;
        println!("{out}");
        return Ok(());
    }

    println!("\n🔒 Namespace Information for PID {target}");
    println!("{:-<60}", "");
    for report in &reports {
        println!("{report}");
    }

    Ok(())
}
