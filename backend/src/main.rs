//! Disburse CLI - turn a salary schedule into a bank bulk-upload CSV
//!
//! # Main Commands
//!
//! ```bash
//! disburse serve                          # Start HTTP server (port 3000)
//! disburse transform march.xlsx -r "March payroll"
//! disburse check march.xlsx               # Sum validation only
//! ```
//!
//! # Inspection Commands
//!
//! ```bash
//! disburse preview march.csv              # Transformed rows as JSON
//! disburse banks                          # Active bank-code table
//! ```

use chrono::FixedOffset;
use clap::{Parser, Subcommand};
use disburse::api::logs::LOG_BROADCASTER;
use disburse::config::parse_utc_offset;
use disburse::{
    file_name_now, process_file, BankCodeTable, Config, PipelineResult, TransformOptions,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "disburse")]
#[command(about = "Validate disbursement schedules and encode bank bulk-upload CSVs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve {
        /// Port to listen on (default: DISBURSE_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// JSON bank-code table replacing the built-in one
        #[arg(long)]
        bank_codes: Option<PathBuf>,
    },

    /// Full pipeline: schedule → sum check → bulk-upload CSV
    Transform {
        /// Input schedule (.csv or .xlsx)
        input: PathBuf,

        /// Remark written on every row
        #[arg(short, long, default_value = "")]
        remark: String,

        /// Output file, `-` for stdout (default: timestamped file in --out-dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for the timestamped output file
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// JSON bank-code table replacing the built-in one
        #[arg(long)]
        bank_codes: Option<PathBuf>,

        /// Offset for the file-name timestamp, e.g. +01:00
        #[arg(long, value_parser = offset_arg)]
        utc_offset: Option<FixedOffset>,

        /// Exit non-zero on a total mismatch, dropped rows or unknown banks
        #[arg(long)]
        strict: bool,

        /// Do not echo pipeline logs
        #[arg(short, long)]
        quiet: bool,
    },

    /// Check that line items add up to the declared total
    Check {
        /// Input schedule (.csv or .xlsx)
        input: PathBuf,
    },

    /// Print the transformed rows as JSON
    Preview {
        /// Input schedule (.csv or .xlsx)
        input: PathBuf,

        /// Remark written on every row
        #[arg(short, long, default_value = "")]
        remark: String,

        /// JSON bank-code table replacing the built-in one
        #[arg(long)]
        bank_codes: Option<PathBuf>,
    },

    /// List the bank-code table
    Banks {
        /// JSON bank-code table replacing the built-in one
        #[arg(long)]
        bank_codes: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match Config::from_env() {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, mut config: Config) -> CliResult {
    match command {
        Commands::Serve { port, bank_codes } => {
            if let Some(port) = port {
                config.port = port;
            }
            override_bank_codes(&mut config, bank_codes);
            cmd_serve(config).await
        }

        Commands::Transform {
            input,
            remark,
            output,
            out_dir,
            bank_codes,
            utc_offset,
            strict,
            quiet,
        } => {
            if quiet {
                LOG_BROADCASTER.set_console_echo(false);
            }
            if let Some(offset) = utc_offset {
                config.utc_offset = offset;
            }
            override_bank_codes(&mut config, bank_codes);
            cmd_transform(&config, &input, remark, output.as_deref(), &out_dir, strict)
        }

        Commands::Check { input } => cmd_check(&config, &input),

        Commands::Preview {
            input,
            remark,
            bank_codes,
        } => {
            override_bank_codes(&mut config, bank_codes);
            cmd_preview(&config, &input, remark)
        }

        Commands::Banks { bank_codes } => {
            override_bank_codes(&mut config, bank_codes);
            cmd_banks(&config)
        }
    }
}

async fn cmd_serve(config: Config) -> CliResult {
    let bank_codes = config.load_bank_codes()?;
    disburse::server::start_server(config, bank_codes).await?;
    Ok(())
}

fn cmd_transform(
    config: &Config,
    input: &Path,
    remark: String,
    output: Option<&Path>,
    out_dir: &Path,
    strict: bool,
) -> CliResult {
    eprintln!("📄 Processing: {}", input.display());

    let result = run_pipeline(config, input, remark)?;
    let csv = result.encode()?;

    match output {
        Some(path) if path == Path::new("-") => {
            std::io::stdout().write_all(&csv)?;
        }
        Some(path) => {
            fs::write(path, &csv)?;
            eprintln!("💾 Output written to: {}", path.display());
        }
        None => {
            let path = out_dir.join(file_name_now(config.utc_offset));
            fs::write(&path, &csv)?;
            eprintln!("💾 Output written to: {}", path.display());
        }
    }

    if strict && (!result.check.matches || result.has_gaps()) {
        return Err(format!("strict mode: {}", strict_reason(&result)).into());
    }

    eprintln!("\n✨ Done! ({})", result.output.summary());
    Ok(())
}

fn cmd_check(config: &Config, input: &Path) -> CliResult {
    eprintln!("✔️  Checking: {}", input.display());

    let result = run_pipeline(config, input, String::new())?;

    match result.check.warning_message() {
        Some(warning) => Err(warning.into()),
        None => {
            println!("{}", result.check.success_message(&config.currency_symbol));
            Ok(())
        }
    }
}

fn cmd_preview(config: &Config, input: &Path, remark: String) -> CliResult {
    let result = run_pipeline(config, input, remark)?;
    println!("{}", serde_json::to_string_pretty(&result.output.rows)?);
    Ok(())
}

fn cmd_banks(config: &Config) -> CliResult {
    let table = config.load_bank_codes()?;

    eprintln!("🏦 Bank codes ({}):\n", table.len());
    for (name, code) in table.iter() {
        println!("  {:<32} {}", name, code);
    }
    Ok(())
}

fn run_pipeline(
    config: &Config,
    input: &Path,
    remark: String,
) -> Result<PipelineResult, Box<dyn std::error::Error>> {
    let bank_codes: BankCodeTable = config.load_bank_codes()?;
    let options = TransformOptions {
        remark,
        currency: config.currency_symbol.clone(),
    };
    Ok(process_file(input, &bank_codes, &options)?)
}

fn override_bank_codes(config: &mut Config, path: Option<PathBuf>) {
    if path.is_some() {
        config.bank_codes_path = path;
    }
}

fn strict_reason(result: &PipelineResult) -> String {
    let mut reasons = Vec::new();
    if !result.check.matches {
        reasons.push("total mismatch".to_string());
    }
    if !result.output.skipped.is_empty() {
        reasons.push(format!("{} rows dropped", result.output.skipped.len()));
    }
    if !result.output.unresolved.is_empty() {
        reasons.push(format!("{} unknown banks", result.output.unresolved.len()));
    }
    reasons.join(", ")
}

fn offset_arg(value: &str) -> Result<FixedOffset, String> {
    parse_utc_offset(value).ok_or_else(|| format!("invalid UTC offset '{}'", value))
}
