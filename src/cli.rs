use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{charts::DEFAULT_TOP_CATEGORIES, dashboard::DEFAULT_PREVIEW_ROWS};

pub const DEFAULT_INPUT: &str = "orders.csv";

#[derive(Debug, Parser)]
#[command(author, version, about = "Summarize a retail orders CSV as a dashboard", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render KPIs, the monthly sales trend, and the top categories
    Dashboard(DashboardArgs),
    /// Preview the first few rows of the normalized orders table
    Preview(PreviewArgs),
    /// Show which columns were chosen for sales, profit, quantity, category, and date
    Roles(RolesArgs),
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Orders CSV file
    #[arg(short = 'i', long = "input", default_value = DEFAULT_INPUT)]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// YAML file mapping roles to column names; unmapped roles are inferred
    #[arg(long = "roles")]
    pub roles: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
    /// Expand the raw data section in text output (JSON always includes it)
    #[arg(long = "show-data")]
    pub show_data: bool,
    /// Rows shown in the raw data section
    #[arg(long = "preview-rows", default_value_t = DEFAULT_PREVIEW_ROWS)]
    pub preview_rows: usize,
    /// Number of categories in the top categories chart
    #[arg(long, default_value_t = DEFAULT_TOP_CATEGORIES)]
    pub top: usize,
    /// Emit months without orders as zero-valued points
    #[arg(long = "fill-gaps")]
    pub fill_gaps: bool,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
}

#[derive(Debug, Args)]
pub struct RolesArgs {
    #[command(flatten)]
    pub source: InputArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
