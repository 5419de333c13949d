use chrono::{SecondsFormat, Utc};
use clap::{Args, ValueEnum};
use comfy_table::{ContentArrangement, Table, presets::NOTHING};
use procreg::ExecutionRecord;

/// Longest SQL text shown in table output
const SQL_PREVIEW_CHARS: usize = 48;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Only print execution IDs
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Yaml,
    Json,
}

pub async fn execute(args: ListArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let manager = global.create_manager()?;
    let response = manager.handle_list_request().await?;

    if args.quiet {
        for record in &response.records {
            println!("{}", record.execution_id);
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&response.records),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&response.records)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response.records)?),
    }
    Ok(())
}

fn print_table(records: &[ExecutionRecord]) {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(vec![
            "EXECUTION ID",
            "SCHEMA",
            "USER",
            "HOST",
            "RUNNING",
            "UNITS",
            "SQL",
        ]);

    for record in records {
        table.add_row(vec![
            record.execution_id.to_string(),
            record.schema_name.clone().unwrap_or_default(),
            record.username.clone().unwrap_or_default(),
            record.hostname.clone().unwrap_or_default(),
            record
                .start_time
                .map(format_elapsed)
                .unwrap_or_default(),
            format!("{}/{}", record.done_count(), record.unit_count()),
            record.sql.as_deref().map(preview).unwrap_or_default(),
        ]);
    }

    println!("{}", table);
}

fn format_elapsed(start: chrono::DateTime<Utc>) -> String {
    let secs = (Utc::now() - start).num_seconds().max(0);
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        // Long runners: show when they started instead
        start.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

fn preview(sql: &str) -> String {
    let single_line = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= SQL_PREVIEW_CHARS {
        single_line
    } else {
        let cut: String = single_line.chars().take(SQL_PREVIEW_CHARS - 3).collect();
        format!("{}...", cut)
    }
}
