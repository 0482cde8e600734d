//! `slots` CLI: compute multi-resource availability from a JSON request.
//!
//! ## Usage
//!
//! ```sh
//! # Compute slots (stdin → stdout)
//! cat request.json | slots compute
//!
//! # Compute from file to file, keeping only slots of at least 30 minutes
//! slots compute -i request.json -o slots.json --min-minutes 30
//!
//! # Only the first slot long enough for a one-hour booking
//! slots compute -i request.json --first --min-minutes 60
//!
//! # Print a per-resource breakdown on stderr
//! slots compute -i request.json --stats
//!
//! # Check a request without computing
//! slots validate -i request.json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use slot_engine::record::ResourceReportRecord;
use slot_engine::{AvailabilityRequest, QueryLimits, SlotRecord};
use std::io::{self, Read};

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Multi-resource availability slot computation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute available slots for a request
    Compute {
        /// Input request JSON (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Drop slots shorter than this many minutes
        #[arg(long)]
        min_minutes: Option<i64>,
        /// Emit only the first qualifying slot (or null)
        #[arg(long)]
        first: bool,
        /// Print a per-resource breakdown to stderr
        #[arg(long)]
        stats: bool,
        /// Maximum number of required resources
        #[arg(long)]
        max_required: Option<usize>,
        /// Maximum number of or-groups
        #[arg(long)]
        max_groups: Option<usize>,
        /// Maximum number of members per or-group
        #[arg(long)]
        max_group_size: Option<usize>,
    },
    /// Validate a request and print a summary
    Validate {
        /// Input request JSON (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compute {
            input,
            output,
            min_minutes,
            first,
            stats,
            max_required,
            max_groups,
            max_group_size,
        } => {
            let json = read_input(input.as_deref())?;
            let request =
                AvailabilityRequest::from_json(&json).context("Failed to parse request JSON")?;
            let (query, inputs) = request.to_parts().context("Invalid request")?;

            let defaults = QueryLimits::default();
            let limits = QueryLimits {
                max_required: max_required.unwrap_or(defaults.max_required),
                max_groups: max_groups.unwrap_or(defaults.max_groups),
                max_group_size: max_group_size.unwrap_or(defaults.max_group_size),
            };

            if stats {
                let reports = slot_engine::explain_with_limits(&query, &inputs, &limits)
                    .context("Failed to explain availability")?;
                for report in reports.iter().map(ResourceReportRecord::from) {
                    eprintln!(
                        "resource {}: capacity {}, {} include / {} exclude matches, {} busy, {} min open, {} min available",
                        report.resource_id,
                        report.capacity,
                        report.include_candidates,
                        report.exclude_candidates,
                        report.busy_slots,
                        report.ruled_open_minutes,
                        report.available_minutes,
                    );
                }
            }

            let mut slots = slot_engine::compute_with_limits(&query, &inputs, &limits)
                .context("Failed to compute availability")?;
            if let Some(min) = min_minutes {
                slots = slot_engine::filter_min_duration(slots, min);
            }

            let rendered = if first {
                let slot = slots.first().map(SlotRecord::from);
                serde_json::to_string_pretty(&slot)?
            } else {
                let records: Vec<SlotRecord> = slots.iter().map(SlotRecord::from).collect();
                serde_json::to_string_pretty(&records)?
            };
            write_output(output.as_deref(), &rendered)?;
        }
        Commands::Validate { input } => {
            let json = read_input(input.as_deref())?;
            let request =
                AvailabilityRequest::from_json(&json).context("Failed to parse request JSON")?;
            let (query, inputs) = request.to_parts().context("Invalid request")?;
            query
                .check_limits(&QueryLimits::default())
                .context("Invalid request")?;

            println!("Request is valid");
            println!(
                "Period:     {} to {} ({} days)",
                query.period().from(),
                query.period().to(),
                query.period().len_days()
            );
            println!("Resources:  {}", query.resource_ids().len());
            println!("Or-groups:  {}", query.or_groups().len());
            println!(
                "Rules:      {} records, {} per-resource rules",
                request.rules.len(),
                inputs.rules.len()
            );
            println!("Busy slots: {}", inputs.busy.len());
        }
    }

    Ok(())
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
