use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use procreg::ProcessEvent;

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// YAML file holding a list of signals
    pub file: PathBuf,

    /// Stop at the first failing signal
    #[arg(long)]
    pub fail_fast: bool,
}

pub async fn execute(args: ReplayArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let events: Vec<ProcessEvent> = serde_yaml::from_str(&content)
        .with_context(|| format!("invalid signal file {}", args.file.display()))?;

    let manager = global.create_manager()?;

    let mut failures = 0usize;
    for (index, event) in events.into_iter().enumerate() {
        let kind = event.kind();
        match manager.handle(event).await {
            Ok(Some(response)) => print!("{}", serde_yaml::to_string(&response)?),
            Ok(None) => {}
            Err(e) => {
                eprintln!("Error: signal #{} ({}): {}", index + 1, kind, e);
                failures += 1;
                if args.fail_fast {
                    break;
                }
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} signal(s) failed", failures);
    }
    Ok(())
}
