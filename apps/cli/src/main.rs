#![deny(warnings)]

//! Headless CLI: evaluate a crafting request file and print the summary.

use anyhow::{bail, Context, Result};
use craft_core::{format_copper_as_gold, Copper};
use craft_runtime::{load_request, prepare, run, CraftConfig};
use item_catalog::{rarity_suggestions, ItemCatalog};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, PartialEq)]
struct Args {
    input: Option<PathBuf>,
    config: Option<PathBuf>,
    catalog: Option<PathBuf>,
    suggest: Option<String>,
    rarity: Option<String>,
    json: bool,
    version: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Args {
    let mut out = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--input" => out.input = it.next().map(PathBuf::from),
            "--config" => out.config = it.next().map(PathBuf::from),
            "--catalog" => out.catalog = it.next().map(PathBuf::from),
            "--suggest" => out.suggest = it.next(),
            "--rarity" => out.rarity = it.next(),
            "--json" => out.json = true,
            "--version" => out.version = true,
            _ => {}
        }
    }
    out
}

/// One line per catalog item whose name contains `query`.
fn render_suggestions(catalog: &ItemCatalog, query: &str) -> String {
    catalog
        .suggest(query)
        .into_iter()
        .map(|item| {
            format!(
                "{} (level {}, {}, {})\n",
                item.name,
                item.level,
                item.rarity,
                format_copper_as_gold(Copper::from_gold(item.cost))
            )
        })
        .collect()
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1));
    if args.version {
        println!(
            "crafter {} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    info!(input = ?args.input, config = ?args.config, "starting CLI");

    let config = match &args.config {
        Some(path) => CraftConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CraftConfig::default(),
    };
    let catalog = match args.catalog.as_ref().or(config.catalog.as_ref()) {
        Some(path) => Some(
            ItemCatalog::load(path)
                .with_context(|| format!("loading catalog {}", path.display()))?,
        ),
        None => None,
    };

    if let Some(prefix) = &args.rarity {
        for rarity in rarity_suggestions(prefix) {
            println!("{rarity}");
        }
        return Ok(());
    }
    if let Some(query) = &args.suggest {
        let Some(catalog) = &catalog else {
            bail!("--suggest needs a catalog (--catalog or `catalog` in the config)");
        };
        print!("{}", render_suggestions(catalog, query));
        return Ok(());
    }

    let Some(input_path) = &args.input else {
        bail!(
            "usage: crafter --input <request.yaml|json> [--config <file>] [--catalog <file>] [--json]\n\
             \x20      crafter --catalog <file> --suggest <name>\n\
             \x20      crafter --rarity <prefix>"
        );
    };
    let mut request = load_request(input_path)
        .with_context(|| format!("loading request {}", input_path.display()))?;
    if request.start_date.trim().is_empty() {
        request.start_date = craft_core::format_iso_date(chrono::Local::now().date_naive());
    }

    let input = prepare(&request, &config.batch, catalog.as_ref());
    let report = run(&input);
    info!(tier = %report.tier, end_date = %report.end_date, "calculation done");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.summary);
    }
    Ok(())
}
