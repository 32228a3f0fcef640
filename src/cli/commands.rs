use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, info};

use crate::cli::Cli;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::origin::Origin;
use crate::page::{apply_stored, PageFetcher, RemovalReport};
use crate::panel::{ControlPanel, FixedTab, PageSession};
use crate::storage::{SelectorStore, StoreFactory};

/// Initialize configuration and data directories
pub async fn init(config_path: Option<PathBuf>) -> Result<()> {
    info!("Initializing page-prune configuration");

    let config_dir = Config::config_dir()?;
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir).map_err(Error::Io)?;
        info!("Created configuration directory: {}", config_dir.display());
    }

    let config_file = match config_path {
        Some(path) => path,
        None => config_dir.join("config.toml"),
    };
    if !config_file.exists() {
        Config::default().save(&config_file)?;
        info!("Created default configuration: {}", config_file.display());
    } else {
        info!("Configuration file already exists: {}", config_file.display());
    }

    let data_dir = Config::data_dir()?;
    if !data_dir.exists() {
        fs::create_dir_all(&data_dir).map_err(Error::Io)?;
        info!("Created data directory: {}", data_dir.display());
    }

    println!("✅ page-prune initialized successfully!");
    println!("   Config file: {}", config_file.display());
    println!("   Data directory: {}", data_dir.display());
    println!();
    println!("Next steps:");
    println!("   1. Save selectors for a site: page-prune set <url> \"div.ad, #banner\"");
    println!("   2. Re-apply them on a visit:  page-prune apply <url>");

    Ok(())
}

/// Popup-open flow: load, populate, and apply the saved list for a page
pub async fn show(url: String, output: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let markup = fetch_markup(&config, &url).await?;

    let session = Arc::new(PageSession::new(markup));
    let panel = ControlPanel::new(
        Arc::new(FixedTab::new(url)),
        session.clone(),
        Arc::new(build_store(&config)?),
    );

    let view = panel.initialize().await?;

    println!("Origin: {}", view.origin);
    match &view.input {
        Some(input) if input.is_empty() => println!("📋 No selectors saved for this origin."),
        Some(input) => println!("Selectors: {}", input),
        None => println!("⚠️  Storage unavailable; saved selectors could not be read."),
    }
    print_report(&view.report);

    write_markup(output, &session.snapshot())?;
    Ok(())
}

/// Form-submit flow: parse, apply, and save a selector list for a page
pub async fn set(
    url: String,
    selectors: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let markup = fetch_markup(&config, &url).await?;

    let session = Arc::new(PageSession::new(markup));
    let panel = ControlPanel::new(
        Arc::new(FixedTab::new(url)),
        session.clone(),
        Arc::new(build_store(&config)?),
    );

    let origin = panel.origin().await?;
    let (list, report) = panel.submit(&origin, &selectors).await?;

    println!("✅ Saved {} selector(s) for {}", list.len(), origin);
    if !list.is_empty() {
        println!("   {}", list.join());
    }
    print_report(&report);

    write_markup(output, &session.snapshot())?;
    Ok(())
}

/// Delete the saved selector list for a page's origin
pub async fn clear(url: String, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let store = build_store(&config)?;
    let origin = Origin::from_url(&url);

    store.clear(&origin).await?;

    println!("✅ Cleared selectors for {}", origin);
    println!("   Nodes already removed from open pages stay removed.");
    Ok(())
}

/// Fresh-visit flow: apply stored selectors to a page and emit the markup
pub async fn apply(
    url: String,
    file: Option<PathBuf>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path)?;

    let markup = match file {
        Some(path) => {
            debug!("Reading page markup from {}", path.display());
            fs::read_to_string(&path).map_err(Error::Io)?
        }
        None => fetch_markup(&config, &url).await?,
    };

    let store = build_store(&config)?;
    let origin = Origin::from_url(&url);
    let (pruned, report) = apply_stored(&store, &origin, &markup).await?;

    match output {
        Some(path) => {
            fs::write(&path, &pruned).map_err(Error::Io)?;
            print_report(&report);
            println!("✅ Wrote pruned markup to {}", path.display());
        }
        None => {
            // Markup on stdout; diagnostics stay on stderr via tracing.
            print!("{}", pruned);
        }
    }

    Ok(())
}

/// List all origins with saved selectors
pub async fn list(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let store = build_store(&config)?;

    let origins = store.origins().await?;
    if origins.is_empty() {
        println!("📋 No selectors saved yet.");
        println!("   Save some with: page-prune set <url> \"div.ad, #banner\"");
        return Ok(());
    }

    println!("📋 Saved origins ({}):", origins.len());
    for key in origins {
        let origin = Origin::from_key(key);
        let list = store.load(&origin).await?;
        println!("   {} — {} selector(s)", origin, list.len());
    }

    Ok(())
}

/// Generate shell completion scripts
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "page-prune", &mut io::stdout());
}

pub fn init_logging(debug: bool, verbose: bool) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(debug)
        .with_line_number(debug)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized");
    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load_with_env(path),
        None => {
            let default_path = Config::config_dir()?.join("config.toml");
            if default_path.exists() {
                Config::load_with_env(default_path)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn build_store(config: &Config) -> Result<crate::storage::SelectorRepository> {
    StoreFactory::file(config.store_file()?)
}

async fn fetch_markup(config: &Config, url: &str) -> Result<String> {
    let fetcher = PageFetcher::from_settings(&config.settings);
    fetcher.fetch_page(url).await
}

fn print_report(report: &RemovalReport) {
    println!(
        "   Removed {} node(s) via {} selector(s).",
        report.nodes_removed, report.selectors_applied
    );
    for skipped in &report.selectors_skipped {
        println!("   ⚠️  Skipped unparseable selector: {}", skipped);
    }
}

fn write_markup(output: Option<PathBuf>, markup: &str) -> Result<()> {
    if let Some(path) = output {
        fs::write(&path, markup).map_err(Error::Io)?;
        println!("✅ Wrote pruned markup to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_missing_default_falls_back() {
        // With no explicit path and no file at the default location this
        // must not error; it yields the built-in defaults.
        let config = load_config(None);
        assert!(config.is_ok());
    }

    #[test]
    fn test_init_logging() {
        // Logging may already be initialized by another test; only verify
        // this does not panic.
        let _ = init_logging(false, false);
    }
}
