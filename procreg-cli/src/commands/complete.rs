use clap::Args;
use procreg::CompletionReport;

#[derive(Args, Debug)]
pub struct CompleteArgs {
    /// Execution(s) to remove
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<String>,
}

pub async fn execute(args: CompleteArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let manager = global.create_manager()?;

    let mut errors = Vec::new();
    for target in args.targets {
        if let Err(e) = manager
            .handle_execution_completion(CompletionReport::new(target.as_str()))
            .await
        {
            eprintln!("Error completing execution '{}': {}", target, e);
            errors.push(target);
        } else {
            println!("{}", target);
        }
    }

    if !errors.is_empty() {
        anyhow::bail!("{} execution(s) could not be completed", errors.len());
    }
    Ok(())
}
