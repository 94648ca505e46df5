//! views-migrate - copy cards and decks between views zones
//!
//! Usage:
//!   views-migrate                     # Run the migration (default)
//!   views-migrate run --clear-destination
//!   views-migrate inventory           # Count both sides, write nothing

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use views_migrate_core::config::{ConfigOverrides, MigrationConfig, load_config};
use views_migrate_core::http::ReqwestTransport;
use views_migrate_core::orchestration::{
    InventoryReport, MigrationOrchestrator, MigrationReport, OriginAssociation, ResourceReport,
};

#[derive(Parser)]
#[command(name = "views-migrate")]
#[command(about = "Migrate views cards and decks from one zone to another", long_about = None)]
struct Cli {
    /// Path to views-migrate.toml
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log every request (same as RUST_LOG=views_migrate=debug)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the migration
    Run(RunArgs),

    /// Count cards and decks in both zones without writing anything
    Inventory,
}

#[derive(Args, Default)]
struct RunArgs {
    /// Delete every destination card and deck before copying
    #[arg(long)]
    clear_destination: bool,

    /// Do not post deck membership back to the origin zone
    #[arg(long)]
    no_origin_association: bool,

    /// Maximum simultaneous per-item requests (0 = unbounded)
    #[arg(long, value_name = "N")]
    max_concurrency: Option<usize>,

    /// Authenticate and count both sides instead of migrating
    #[arg(long)]
    dry_run: bool,
}

impl RunArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            clear_destination: self.clear_destination.then_some(true),
            associate_origin: self.no_origin_association.then_some(false),
            max_concurrency: self.max_concurrency,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable summary
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
    /// Only errors
    Quiet,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "views_migrate=debug,info"
    } else {
        "views_migrate=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", style("✗ Migration failed:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let args = match cli.command {
        Some(Commands::Run(args)) => args,
        Some(Commands::Inventory) => RunArgs {
            dry_run: true,
            ..RunArgs::default()
        },
        None => RunArgs::default(),
    };

    let config = load_config(cli.config.as_deref(), &args.overrides())?;
    let orchestrator = build_orchestrator(config)?;

    if args.dry_run {
        let inventory = orchestrator.inventory().await?;
        print_inventory(cli.format, &inventory)?;
        return Ok(());
    }

    let report = orchestrator.run().await?;
    print_report(cli.format, &report)?;
    Ok(())
}

fn build_orchestrator(config: MigrationConfig) -> Result<MigrationOrchestrator> {
    tracing::info!(
        origin = %config.origin.zone_id,
        destination = %config.destination.zone_id,
        clear_destination = config.clear_destination,
        concurrency = ?config.concurrency,
        "starting"
    );
    let transport = ReqwestTransport::new().context("Failed to set up HTTP transport")?;
    Ok(MigrationOrchestrator::new(config, Arc::new(transport)))
}

fn print_report(format: OutputFormat, report: &MigrationReport) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", style("✓ Migration complete").green().bold());
            if let Some(cleared) = &report.cleared {
                println!(
                    "  Cleared:  {} card(s), {} deck(s)",
                    cleared.cards_deleted, cleared.decks_deleted
                );
            }
            print_resource("Cards", &report.cards);
            print_resource("Decks", &report.decks);
            println!(
                "  Linked:   {} deck(s) at destination",
                report.destination_associations
            );
            match &report.origin_association {
                OriginAssociation::Skipped => {}
                OriginAssociation::Completed(count) => {
                    println!("  Linked:   {} deck(s) at origin", count)
                }
                OriginAssociation::Failed(reason) => {
                    println!("  {} origin association failed: {}", style("⚠").yellow(), reason)
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

fn print_resource(label: &str, report: &ResourceReport) {
    println!(
        "  {:<9} {} fetched, {} created, {} tag post(s)",
        format!("{label}:"),
        report.fetched,
        report.created,
        report.tag_posts
    );
    if report.reassigned_ids > 0 {
        println!(
            "            {} id(s) reassigned by the destination",
            report.reassigned_ids
        );
    }
}

fn print_inventory(format: OutputFormat, inventory: &InventoryReport) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", style("  Inventory").bold());
            for (label, zone) in [("Origin", &inventory.origin), ("Destination", &inventory.destination)] {
                println!(
                    "  {:<12} {} card(s) ({} tagged), {} deck(s) ({} with cards)",
                    label, zone.cards, zone.tagged_cards, zone.decks, zone.decks_with_cards
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(inventory)?);
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}
