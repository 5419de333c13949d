use clap::Args;
use procreg::{ExecutionContext, ExecutionId, SummaryReport, UnitId};

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Execution ID (generated if omitted)
    pub execution_id: Option<String>,

    /// Unit ID, repeat for each unit
    #[arg(short, long = "unit")]
    pub units: Vec<String>,

    /// Routed unit as DATA_SOURCE=SQL; its ID is derived from the route
    #[arg(short, long = "route", value_parser = parse_route)]
    pub routes: Vec<(String, String)>,

    /// Logical schema the statement runs against
    #[arg(long)]
    pub schema: Option<String>,

    #[arg(long)]
    pub user: Option<String>,

    #[arg(long)]
    pub host: Option<String>,

    /// Statement text shown in the process list
    #[arg(long)]
    pub sql: Option<String>,
}

fn parse_route(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((data_source, sql)) if !data_source.is_empty() && !sql.is_empty() => {
            Ok((data_source.to_string(), sql.to_string()))
        }
        _ => Err(format!("expected DATA_SOURCE=SQL, got '{}'", s)),
    }
}

pub async fn execute(args: SummaryArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    if args.units.is_empty() && args.routes.is_empty() {
        anyhow::bail!("an execution needs at least one --unit or --route");
    }

    let manager = global.create_manager()?;

    let execution_id = args
        .execution_id
        .map(ExecutionId::from)
        .unwrap_or_else(ExecutionId::generate);
    let units = args
        .units
        .into_iter()
        .map(UnitId::from)
        .chain(
            args.routes
                .iter()
                .map(|(data_source, sql)| UnitId::for_route(data_source, sql)),
        )
        .collect();

    let mut context = ExecutionContext::new(execution_id.clone(), units);
    context.schema_name = args.schema;
    context.username = args.user;
    context.hostname = args.host;
    context.sql = args.sql;

    manager
        .handle_execution_summary(SummaryReport::new(context))
        .await?;
    println!("{}", execution_id);
    Ok(())
}
