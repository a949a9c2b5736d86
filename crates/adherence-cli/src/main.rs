mod config;
mod logs;

use adherence_core::{
    aggregate, build_calendar, chart_series, group_by_medication, logs_between, summarize_each,
    AggregateRollup, ChartFilter, ChartWindow, DoseLogEntry, MedicationId, MedicationSummary,
};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use config::AdherenceConfig;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "adherence")]
#[command(author, version, about = "Medication adherence analytics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Dose log export (JSON file or directory of JSON files)")]
    logs: Option<PathBuf>,

    #[arg(long, global = true, help = "Reference instant (RFC 3339 or YYYY-MM-DD, default: now)")]
    now: Option<String>,

    #[arg(long, global = true, help = "Output as JSON")]
    json: bool,

    #[arg(long, global = true, help = "Enable debug logging on stderr")]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Show rolling-window adherence per medication")]
    Summary {
        #[arg(long, help = "Only this medication")]
        medication: Option<String>,
        #[arg(long, allow_negative_numbers = true, help = "Window length in days")]
        window: Option<i64>,
    },
    #[command(about = "Show which of the last N days had a dose")]
    Calendar {
        #[arg(long, help = "Only this medication (default: any medication)")]
        medication: Option<String>,
        #[arg(long, allow_negative_numbers = true, help = "Number of days to show")]
        days: Option<i64>,
    },
    #[command(about = "Show adherence rolled up across all medications")]
    Rollup {
        #[arg(long, allow_negative_numbers = true, help = "Window length in days")]
        window: Option<i64>,
    },
    #[command(about = "Show daily dose counts for a week or month")]
    Chart {
        #[arg(long, default_value = "all", help = "Medication id or 'all'")]
        medication: String,
        #[arg(long, help = "Chart range: week or month")]
        range: Option<String>,
    },
    #[command(about = "List dose logs, newest first")]
    History {
        #[arg(long, help = "Only this medication")]
        medication: Option<String>,
        #[arg(long, help = "Earliest instant to include (RFC 3339 or YYYY-MM-DD)")]
        since: Option<String>,
        #[arg(long, help = "Latest instant to include (RFC 3339 or YYYY-MM-DD)")]
        until: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = AdherenceConfig::load();
    let now = match cli.now.as_deref() {
        Some(text) => parse_instant_arg("--now", text)?,
        None => Utc::now(),
    };
    let logs_path = config.logs_path(cli.logs.clone())?;
    let logs = logs::load_logs(&logs_path)
        .with_context(|| format!("failed to load dose logs from {}", logs_path.display()))?;

    match cli.command {
        Commands::Summary { medication, window } => {
            let window_days = config.window_days(window)?;
            run_summary(logs, medication.as_deref(), window_days, now, cli.json)
        }
        Commands::Calendar { medication, days } => {
            let days_to_show = config.calendar_days(days)?;
            run_calendar(logs, medication.as_deref(), days_to_show, now, cli.json)
        }
        Commands::Rollup { window } => {
            let window_days = config.window_days(window)?;
            run_rollup(logs, window_days, now, cli.json)
        }
        Commands::Chart { medication, range } => {
            let chart_window = config.chart_window(range.as_deref())?;
            let filter: ChartFilter = match medication.parse() {
                Ok(filter) => filter,
                Err(never) => match never {},
            };
            run_chart(logs, &filter, chart_window, now, cli.json)
        }
        Commands::History {
            medication,
            since,
            until,
        } => {
            let since = since
                .as_deref()
                .map(|text| parse_instant_arg("--since", text))
                .transpose()?;
            let until = until
                .as_deref()
                .map(|text| parse_instant_arg("--until", text))
                .transpose()?;
            run_history(logs, medication.as_deref(), since, until, cli.json)
        }
    }
}

fn parse_instant_arg(flag: &str, text: &str) -> Result<DateTime<Utc>> {
    logs::parse_instant(text)
        .ok_or_else(|| anyhow!("invalid {} value {:?}: expected RFC 3339 or YYYY-MM-DD", flag, text))
}

fn parse_medication(text: &str) -> MedicationId {
    match text.parse() {
        Ok(id) => id,
        Err(never) => match never {},
    }
}

fn only_medication(logs: Vec<DoseLogEntry>, medication: Option<&str>) -> Vec<DoseLogEntry> {
    match medication.map(parse_medication) {
        Some(id) => logs.into_iter().filter(|log| log.medication_id == id).collect(),
        None => logs,
    }
}

fn run_summary(
    logs: Vec<DoseLogEntry>,
    medication: Option<&str>,
    window_days: u32,
    now: DateTime<Utc>,
    json: bool,
) -> Result<()> {
    let mut grouped = group_by_medication(logs);
    if let Some(id) = medication.map(parse_medication) {
        // An unknown medication still gets a row, with no activity.
        let own = grouped.remove(&id).unwrap_or_default();
        grouped.clear();
        grouped.insert(id, own);
    }

    let summaries = summarize_each(&grouped, window_days, now);

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!(
        "\n  {}\n",
        format!("Adherence over {} days ending {}", window_days, now.format("%Y-%m-%d")).cyan()
    );

    if summaries.is_empty() {
        println!("  No dose logs found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Medication", "Doses", "Days", "Adherence", "Streak", "Longest"]);

    for entry in &summaries {
        let summary = &entry.summary;
        table.add_row(vec![
            entry.medication_id.to_string(),
            summary.total_doses.to_string(),
            format!("{}/{}", summary.days_with_dose, window_days),
            format_percent(summary.adherence_percent),
            format_days(summary.streak),
            format_days(summary.longest_streak),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn run_calendar(
    logs: Vec<DoseLogEntry>,
    medication: Option<&str>,
    days_to_show: u32,
    now: DateTime<Utc>,
    json: bool,
) -> Result<()> {
    let logs = only_medication(logs, medication);
    let calendar = build_calendar(&logs, days_to_show, now);

    if json {
        println!("{}", serde_json::to_string_pretty(&calendar)?);
        return Ok(());
    }

    let scope = match medication {
        Some(id) => format!("medication {}", id),
        None => "all medications".to_string(),
    };
    println!("\n  {}\n", format!("Last {} days, {}", days_to_show, scope).cyan());

    let strip: String = calendar
        .iter()
        .map(|day| if day.taken { "■" } else { "□" })
        .collect();
    println!("  {}\n", strip.green());

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Day", "Date", "Taken"]);

    for day in &calendar {
        let taken = if day.taken {
            "✓".green().to_string()
        } else {
            "·".bright_black().to_string()
        };
        table.add_row(vec![day.label.clone(), day.day_key.to_string(), taken]);
    }

    println!("{table}");
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RollupOutput<'a> {
    window_days: u32,
    rollup: &'a AggregateRollup,
    medications: &'a [MedicationSummary],
}

fn run_rollup(logs: Vec<DoseLogEntry>, window_days: u32, now: DateTime<Utc>, json: bool) -> Result<()> {
    let grouped = group_by_medication(logs);
    let rollup = aggregate(&grouped, window_days, now);
    let medications = summarize_each(&grouped, window_days, now);

    if json {
        let output = RollupOutput {
            window_days,
            rollup: &rollup,
            medications: &medications,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "\n  {}\n",
        format!("Rollup over {} days ending {}", window_days, now.format("%Y-%m-%d")).cyan()
    );

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Medication", "Doses", "Adherence", "Streak"]);

    for entry in &medications {
        table.add_row(vec![
            entry.medication_id.to_string(),
            entry.summary.total_doses.to_string(),
            format_percent(entry.summary.adherence_percent),
            format_days(entry.summary.streak),
        ]);
    }

    println!("{table}");
    println!(
        "\nActive medications: {} | Doses: {} | Adherence: {} | Best streak: {}",
        rollup.active_medication_count,
        rollup.total_doses,
        format_percent(rollup.adherence_percent),
        format_days(rollup.best_streak)
    );

    Ok(())
}

fn run_chart(
    logs: Vec<DoseLogEntry>,
    filter: &ChartFilter,
    chart_window: ChartWindow,
    now: DateTime<Utc>,
    json: bool,
) -> Result<()> {
    let grouped = group_by_medication(logs);
    let series = chart_series(&grouped, filter, chart_window, now);

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
        return Ok(());
    }

    println!(
        "\n  {}\n",
        format!("Doses per day, last {} ({})", chart_window.as_str(), filter).cyan()
    );

    let peak = series.iter().map(|p| p.doses).max().unwrap_or(0);

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Day", "Date", "Doses", ""]);

    for point in &series {
        table.add_row(vec![
            point.label.clone(),
            point.day_key.to_string(),
            point.doses.to_string(),
            format_bar(point.doses, peak),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn run_history(
    logs: Vec<DoseLogEntry>,
    medication: Option<&str>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    json: bool,
) -> Result<()> {
    let logs = only_medication(logs, medication);
    let listed = logs_between(&logs, since, until);

    if json {
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }

    if listed.is_empty() {
        println!("\n  No dose logs in range.\n");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Taken at (UTC)", "Medication", "Log", "Note"]);

    for log in &listed {
        table.add_row(vec![
            log.taken_at.format("%Y-%m-%d %H:%M").to_string(),
            log.medication_id.to_string(),
            log.id.to_string(),
            log.note.clone().unwrap_or_default(),
        ]);
    }

    println!("{table}");
    println!("\nTotal: {} doses", listed.len());
    Ok(())
}

fn format_percent(percent: u8) -> String {
    let text = format!("{}%", percent);
    match percent {
        80..=100 => text.green().to_string(),
        50..=79 => text.yellow().to_string(),
        _ => text.red().to_string(),
    }
}

fn format_days(days: u32) -> String {
    match days {
        1 => "1 day".to_string(),
        n => format!("{} days", n),
    }
}

const BAR_WIDTH: u64 = 24;

fn format_bar(doses: u32, peak: u32) -> String {
    if doses == 0 || peak == 0 {
        return String::new();
    }
    let width = (u64::from(doses) * BAR_WIDTH / u64::from(peak)).clamp(1, BAR_WIDTH);
    "█".repeat(width as usize).green().to_string()
}
