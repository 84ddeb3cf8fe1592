//! DNS Blocklist CLI
//!
//! CLI tool for normalizing blocklist catalogs and previewing what a catalog
//! selection would change.

mod dry_run;
mod files;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use indexmap::IndexMap;

use dbl_coordinator::{Coordinator, CoordinatorConfig, FormValues};
use dbl_core::catalog::split_key;
use dbl_core::{reconcile, FilteringState, ModalKind, SelectionSnapshot};

use crate::dry_run::DryRunEffects;

#[derive(Parser)]
#[command(name = "dbl-cli")]
#[command(about = "DNS blocklist catalog tools")]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flatten a nested catalog into a keyed table
    Normalize {
        /// Catalog JSON file
        #[arg(short, long)]
        catalog: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarize a catalog
    Info {
        /// Catalog JSON file
        #[arg(short, long)]
        catalog: PathBuf,
    },

    /// Compute the actions between two selections
    Reconcile {
        /// Catalog JSON file
        #[arg(short, long)]
        catalog: PathBuf,

        /// Selection the form started from
        #[arg(short, long)]
        before: PathBuf,

        /// Submitted selection
        #[arg(short, long)]
        after: PathBuf,
    },

    /// Run a catalog selection through the coordinator without side effects
    Apply {
        /// Catalog JSON file
        #[arg(short, long)]
        catalog: PathBuf,

        /// Current filtering status (no subscriptions when omitted)
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Submitted selection
        #[arg(long)]
        selection: PathBuf,

        /// Selection the form started from (derived from the status when omitted)
        #[arg(long)]
        initial: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Normalize { catalog, output } => cmd_normalize(&catalog, output.as_deref()),
        Commands::Info { catalog } => cmd_info(&catalog),
        Commands::Reconcile {
            catalog,
            before,
            after,
        } => cmd_reconcile(&catalog, &before, &after),
        Commands::Apply {
            catalog,
            state,
            selection,
            initial,
        } => cmd_apply(&catalog, state.as_deref(), &selection, initial.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn cmd_normalize(catalog_path: &Path, output: Option<&Path>) -> Result<(), String> {
    let catalog = files::read_catalog(catalog_path)?;
    log::info!("Normalized {} entries from '{}'", catalog.len(), catalog_path.display());
    files::write_json(&catalog, output)
}

fn cmd_info(catalog_path: &Path) -> Result<(), String> {
    let catalog = files::read_catalog(catalog_path)?;

    let mut groups: IndexMap<&str, usize> = IndexMap::new();
    for key in catalog.keys() {
        let group = split_key(key).next().unwrap_or_default();
        *groups.entry(group).or_default() += 1;
    }

    println!("Catalog: {}", catalog_path.display());
    println!("  Entries:     {}", catalog.len());
    println!("  Groups:      {}", groups.len());
    println!();
    for (group, count) in &groups {
        println!("  {:<20} {} list(s)", group, count);
    }

    Ok(())
}

fn cmd_reconcile(catalog_path: &Path, before_path: &Path, after_path: &Path) -> Result<(), String> {
    let catalog = files::read_catalog(catalog_path)?;
    let before: SelectionSnapshot = files::read_json(before_path)?;
    let after: SelectionSnapshot = files::read_json(after_path)?;

    let actions = reconcile(&before, &after, &catalog).map_err(|e| e.to_string())?;

    let added = actions.iter().filter(|action| action.is_add()).count();
    log::info!("{} to add, {} to remove", added, actions.len() - added);

    files::write_json(&actions, None)
}

fn cmd_apply(
    catalog_path: &Path,
    state_path: Option<&Path>,
    selection_path: &Path,
    initial_path: Option<&Path>,
) -> Result<(), String> {
    let catalog = Arc::new(files::read_catalog(catalog_path)?);
    let status: FilteringState = match state_path {
        Some(path) => files::read_json(path)?,
        None => FilteringState::default(),
    };
    let values: SelectionSnapshot = files::read_json(selection_path)?;
    let initial: Option<SelectionSnapshot> = initial_path.map(files::read_json::<SelectionSnapshot>).transpose()?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to start runtime: {}", e))?;

    runtime.block_on(async move {
        let effects = Arc::new(DryRunEffects::new(status));
        let coordinator = Coordinator::new(CoordinatorConfig::new(catalog), effects)
            .map_err(|e| e.to_string())?;

        coordinator.start().settled().await;
        coordinator.open_modal(ModalKind::ChooseFilteringList, None).settled().await;

        println!("Dry run against {} subscription(s):", coordinator.state().filters.len());
        let dispatch = coordinator
            .handle_submit(FormValues::Selection { initial, values })
            .map_err(|e| e.to_string())?;
        let count = dispatch.len();
        dispatch.settled().await;

        coordinator.close_modal().settled().await;
        println!("{} change(s)", count);
        Ok::<(), String>(())
    })
}
