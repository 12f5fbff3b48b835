//! Command-line interface for selfhost-fonts.
//!
//! Runs the font localizer outside a web server: rewrite a document, inspect
//! how a font URL parses, print preload tags, and manage the cache.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use selfhost_fonts_config::Config;
use selfhost_fonts_net::HttpFetcher;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::admin::Admin;
use crate::cache::UrlCache;
use crate::catalog::FontCatalog;
use crate::fonts_url::parse_fonts_url;
use crate::preload::Preloader;
use crate::process::{Processor, RequestContext};
use crate::process_css::MarkupProcessor;

/// selfhost-fonts - Serve remote web fonts from your own server
#[derive(Parser)]
#[command(name = "selfhost-fonts")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: ~/.config/selfhost-fonts/config.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level; overrides DEBUG_LEVEL
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite an HTML document (file or stdin) and print the result
    Process {
        /// HTML file to read instead of stdin
        file: Option<PathBuf>,
    },

    /// Localize one registered stylesheet URL and print the URL to use instead
    Enqueue {
        url: String,
    },

    /// Show how a font-service URL is parsed
    Parse {
        url: String,
    },

    /// Print preload tags for the configured fonts
    Preload,

    /// Inspect or clear the URL cache
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },

    /// Write a default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Show entry counts
    Info,
    /// Remove every entry
    Clear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// The command-line operator is trusted with every action.
const OPERATOR: RequestContext = RequestContext {
    is_admin_area: false,
    is_customize_preview: false,
    can_manage_options: true,
};

/// Run the parsed command
pub fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.unwrap_or_else(Config::config_path);

    match cli.command {
        Commands::InitConfig { force } => init_config(&config_path, force),
        Commands::Cache { action } => {
            let config = load_config(&config_path)?;
            let cache = UrlCache::new(config.storage.cache_dir.clone());
            let admin = Admin::new(&cache);
            match action {
                CacheCommand::Info => println!("{}", admin.cache_info()),
                CacheCommand::Clear => println!("{}", admin.clear_cache(&OPERATOR)?),
            }
            Ok(())
        }
        Commands::Parse { url } => {
            let config = load_config(&config_path)?;
            let parsed = parse_fonts_url(&url, &config.options.force_subsets)
                .with_context(|| format!("Failed to parse {}", url))?;
            for family in &parsed.families {
                let variants: Vec<String> =
                    family.variants.iter().map(ToString::to_string).collect();
                println!("{}: {}", family.name, variants.join(", "));
            }
            println!("subsets: {}", parsed.subsets.join(", "));
            Ok(())
        }
        Commands::Preload => {
            let processor = build_processor(&config_path)?;
            let preloader = Preloader::new(
                processor.catalog(),
                processor.cache(),
                &processor.options().preload_fonts,
            );
            for tag in preloader.tags() {
                println!("{}", tag);
            }
            Ok(())
        }
        Commands::Enqueue { url } => {
            let processor = build_processor(&config_path)?;
            let url = if processor.should_process(&RequestContext::default()) {
                processor.process_enqueue(&url)
            } else {
                url
            };
            println!("{}", url);
            Ok(())
        }
        Commands::Process { file } => {
            let html = match &file {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {:?}", path))?,
                None => {
                    let mut html = String::new();
                    io::stdin()
                        .read_to_string(&mut html)
                        .context("Failed to read stdin")?;
                    html
                }
            };

            let processor = build_processor(&config_path)?;
            let html = if processor.should_process(&RequestContext::default())
                && processor.should_process_html()
            {
                MarkupProcessor::new(&processor).process(&html)
            } else {
                log::info!("Processing disabled, passing the document through");
                html
            };

            let mut stdout = io::stdout().lock();
            stdout.write_all(html.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).with_context(|| format!("Failed to load config from {:?}", path))
}

fn build_processor(config_path: &Path) -> Result<Processor> {
    let config = load_config(config_path)?;
    let catalog = FontCatalog::load(&config.storage.catalog_path)?;
    log::info!("Loaded {} font families", catalog.family_count());

    // Certificate checks are relaxed for font downloads; see selfhost-fonts-net
    let fetcher = Arc::new(HttpFetcher::relaxed_tls());
    Ok(Processor::new(config, Arc::new(catalog), fetcher))
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{:?} already exists; pass --force to overwrite", path);
    }
    Config::default()
        .save(path)
        .with_context(|| format!("Failed to write {:?}", path))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
