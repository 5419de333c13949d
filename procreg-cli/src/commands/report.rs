use clap::Args;
use procreg::{UnitReportEvent, UnitStatus};

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Execution the unit belongs to
    pub execution_id: String,

    /// Unit ID
    pub unit_id: String,

    /// Reported status (done or pending)
    #[arg(short, long, default_value = "done")]
    pub status: UnitStatus,
}

pub async fn execute(args: ReportArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let manager = global.create_manager()?;
    manager
        .handle_unit_report(UnitReportEvent::new(
            args.execution_id.as_str(),
            args.unit_id.as_str(),
            args.status,
        ))
        .await?;
    println!("{} {}", args.unit_id, args.status);
    Ok(())
}
