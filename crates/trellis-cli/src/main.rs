//! trellis CLI entrypoint.
//! Loads a template directory and renders a view to stdout.
#![deny(unsafe_code)]

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use trellis::{DirFs, Engine, EngineConfig, Options};

#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(author, version, about = "Render views from a template directory", long_about = None)]
struct Cli {
    /// Base directory that template paths are relative to
    #[arg(long, global = true, default_value = ".")]
    base: PathBuf,
    /// Template root, relative to the base
    #[arg(long, global = true)]
    root: Option<String>,
    /// Global partials directory, relative to the base
    #[arg(long, global = true)]
    partials: Option<String>,
    /// Template file extension
    #[arg(long, global = true)]
    ext: Option<String>,
    /// YAML configuration file; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Reload templates on every call
    #[arg(long, global = true)]
    dev: bool,
    /// Cache assembled template sets
    #[arg(long, global = true)]
    cache: bool,
    /// Log engine activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Render a view, optionally wrapped in a layout
    Render {
        /// View name, e.g. pages/home
        view: String,
        /// Layout name
        #[arg(long)]
        layout: Option<String>,
        /// Extra partial for this render (repeatable)
        #[arg(long = "partial")]
        partials: Vec<String>,
        /// Render data as inline JSON
        #[arg(long, conflicts_with = "data_file")]
        data: Option<String>,
        /// Render data from a JSON file
        #[arg(long)]
        data_file: Option<PathBuf>,
    },
    /// Check whether a view exists (exit code 1 if not)
    Exists {
        /// View name
        name: String,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .init();

    let options = build_options(&cli)?;
    let engine = Engine::new(DirFs::new(&cli.base), options);
    engine
        .load()
        .with_context(|| format!("failed to load templates from {}", cli.base.display()))?;

    match &cli.command {
        Commands::Render {
            view,
            layout,
            partials,
            data,
            data_file,
        } => {
            let data = read_data(data.as_deref(), data_file.as_deref())?;
            let partials: Vec<&str> = partials.iter().map(String::as_str).collect();
            let page = engine
                .compile(view, layout.as_deref().unwrap_or(""), &data, &partials)
                .with_context(|| format!("failed to render {}", view))?;

            let mut stdout = io::stdout().lock();
            stdout.write_all(&page).context("failed to write to stdout")?;
            stdout.flush().context("failed to write to stdout")?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Exists { name } => {
            let found = engine
                .exists(name)
                .with_context(|| format!("failed to check {}", name))?;
            println!("{}", found);
            Ok(if found {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// Config file values first, then command-line flags on top.
fn build_options(cli: &Cli) -> anyhow::Result<Options> {
    let mut options = Options::new().with_all_pipes();
    if let Some(path) = &cli.config {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        options = EngineConfig::from_yaml(&source)
            .and_then(|config| config.apply(options))
            .with_context(|| format!("invalid config {}", path.display()))?;
    }
    if let Some(root) = &cli.root {
        options = options.root(root);
    }
    if let Some(partials) = &cli.partials {
        options = options.partials(partials);
    }
    if let Some(ext) = &cli.ext {
        options = options.extension(ext);
    }
    if cli.dev {
        options = options.dev(true);
    }
    if cli.cache {
        options = options.cache(true);
    }
    Ok(options)
}

fn read_data(inline: Option<&str>, file: Option<&Path>) -> anyhow::Result<serde_json::Value> {
    let source = match (inline, file) {
        (Some(inline), _) => inline.to_string(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("failed to read data file {}", path.display()))?,
        (None, None) => return Ok(serde_json::Value::Null),
    };
    serde_json::from_str(&source).context("render data is not valid JSON")
}
