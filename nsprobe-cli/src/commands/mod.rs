use crate::cli::Commands;
use anyhow::Result;

pub mod describe;
pub mod health;
pub mod inspect;
pub mod run;

/// Dispatch command to appropriate handler, returning the exit status
pub async fn dispatch(command: Commands, json: bool) -> Result<i32> {
    match command {
        Commands::Run {
            timeout,
            no_root_check,
            stack_size,
            proc_root,
        } => run::execute(timeout, no_root_check, stack_size, proc_root, json).await,

        Commands::Describe => describe::execute(json).map(|()| 0),

        Commands::Inspect {
            pid,
            kind,
            proc_root,
        } => inspect::execute(pid, kind, &proc_root, json).map(|()| 0),

        Commands::Health => health::execute(),
    }
}
