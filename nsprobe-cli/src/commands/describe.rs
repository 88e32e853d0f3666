//! Describe command implementation

use anyhow::{Context, Result};
use nsprobe_namespace::NamespaceIdentityCheck;

pub fn execute(json: bool) -> Result<()> {
    let descriptor = NamespaceIdentityCheck::<nsprobe_namespace::IoctlQuery>::describe();

    if json {
        let out = serde_json::to_string_pretty(&descriptor).context("Failed to encode descriptor")?;
        println!("{out}");
    } else {
        print!("{descriptor}");
    }

    Ok(())
}
