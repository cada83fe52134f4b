pub mod cache;
pub mod charts;
pub mod cli;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod io_utils;
pub mod loader;
pub mod metrics;
pub mod render;
pub mod roles;

use std::{env, process::ExitCode, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cache::TableCache,
    charts::GapPolicy,
    cli::{Cli, Commands, InputArgs, OutputFormat},
    dashboard::{DashboardOptions, DashboardOutcome},
    roles::{ConfiguredStrategy, KeywordStrategy, RoleMapping, RoleStrategy},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("retail_insights", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();
    let mut cache = TableCache::new();
    match cli.command {
        Commands::Dashboard(args) => handle_dashboard(&mut cache, &args),
        Commands::Preview(args) => handle_preview(&mut cache, &args),
        Commands::Roles(args) => handle_roles(&mut cache, &args),
    }
}

fn handle_dashboard(cache: &mut TableCache, args: &cli::DashboardArgs) -> Result<ExitCode> {
    let delimiter = io_utils::resolve_input_delimiter(&args.source.input, args.source.delimiter);
    info!(
        "Rendering dashboard for '{}' with delimiter '{}'",
        args.source.input.display(),
        io_utils::printable_delimiter(delimiter)
    );
    let strategy = role_strategy(&args.source)?;
    let options = DashboardOptions {
        top: args.top,
        gap_policy: if args.fill_gaps {
            GapPolicy::ZeroFill
        } else {
            GapPolicy::Skip
        },
        // JSON always carries the raw data; text shows it only on request.
        preview_rows: (args.show_data || args.format == OutputFormat::Json)
            .then_some(args.preview_rows),
    };
    debug!("Dashboard options: {options:?}");

    let outcome = dashboard::build_dashboard(
        cache,
        &args.source.input,
        delimiter,
        strategy.as_ref(),
        &options,
    );
    let rendered = match args.format {
        OutputFormat::Text => render::render_text(&outcome),
        OutputFormat::Json => render::render_json(&outcome)? + "\n",
    };
    print!("{rendered}");

    Ok(match outcome {
        DashboardOutcome::Rendered(_) => ExitCode::SUCCESS,
        DashboardOutcome::Failed { .. } => ExitCode::FAILURE,
    })
}

fn handle_preview(cache: &mut TableCache, args: &cli::PreviewArgs) -> Result<ExitCode> {
    let delimiter = io_utils::resolve_input_delimiter(&args.source.input, args.source.delimiter);
    let table = cache
        .load(&args.source.input, delimiter)
        .with_context(|| format!("Loading {:?}", args.source.input))?;
    let rows = table.head(args.rows);
    print!("{}", render::render_rows(table.columns(), rows));
    info!(
        "Displayed {} of {} row(s) from {:?}",
        rows.len(),
        table.len(),
        args.source.input
    );
    Ok(ExitCode::SUCCESS)
}

fn handle_roles(cache: &mut TableCache, args: &cli::RolesArgs) -> Result<ExitCode> {
    let delimiter = io_utils::resolve_input_delimiter(&args.source.input, args.source.delimiter);
    let strategy = role_strategy(&args.source)?;
    let table = cache
        .load(&args.source.input, delimiter)
        .with_context(|| format!("Loading {:?}", args.source.input))?;
    let roles = strategy.assign(&table);

    let headers = vec!["role".to_string(), "column".to_string(), "type".to_string()];
    let rows = roles
        .iter()
        .map(|(role, column)| {
            let kind = column
                .and_then(|name| table.column(name))
                .map(|c| c.kind.to_string())
                .unwrap_or_default();
            vec![
                role.to_string(),
                column.unwrap_or("-").to_string(),
                kind,
            ]
        })
        .collect::<Vec<_>>();
    print!("{}", render::render_table(&headers, &rows));
    Ok(ExitCode::SUCCESS)
}

fn role_strategy(args: &InputArgs) -> Result<Box<dyn RoleStrategy>> {
    match &args.roles {
        Some(path) => {
            let mapping = RoleMapping::load(path)
                .with_context(|| format!("Loading role mapping from {path:?}"))?;
            info!("Using role mapping from {path:?}");
            Ok(Box::new(ConfiguredStrategy::new(mapping)))
        }
        None => Ok(Box::new(KeywordStrategy)),
    }
}
