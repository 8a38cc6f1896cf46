// ABOUTME: Main entry point for the hyperslide program.
// ABOUTME: Provides the CLI for serving, scaffolding and exporting presentations.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use hyperslide::{AppState, ChangeWatcher, Config, ResourceFile, SlideServer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the slides with live reload and presenter sync
    Dev(DevArgs),

    /// Create a new presentation project
    Init(InitArgs),

    /// Write a standalone copy of the presentation
    Export(ExportArgs),
}

#[derive(Args)]
struct DevArgs {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to the slides markdown file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Extra CSS files to link (local paths or URLs)
    #[arg(long, value_delimiter = ',')]
    css: Option<Vec<String>>,

    /// Extra JavaScript files to link (local paths or URLs)
    #[arg(long, value_delimiter = ',')]
    js: Option<Vec<String>>,
}

#[derive(Args)]
struct InitArgs {
    /// Name of the project directory
    name: String,
}

#[derive(Args)]
struct ExportArgs {
    /// Path to the slides markdown file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = hyperslide::config::DEFAULT_EXPORT_DIR)]
    output: PathBuf,

    /// Extra CSS files to embed (local paths or URLs)
    #[arg(long, value_delimiter = ',')]
    css: Option<Vec<String>>,

    /// Extra JavaScript files to embed (local paths or URLs)
    #[arg(long, value_delimiter = ',')]
    js: Option<Vec<String>>,
}

fn resources(paths: &Option<Vec<String>>) -> Vec<ResourceFile> {
    paths
        .as_ref()
        .map(|files| files.iter().map(|path| ResourceFile::new(path)).collect())
        .unwrap_or_default()
}

fn dev(args: &DevArgs) -> anyhow::Result<()> {
    let mut config = Config::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(file) = &args.file {
        config.slides_file = file.clone();
    }
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    config.css_files = resources(&args.css);
    config.js_files = resources(&args.js);

    let state = Arc::new(AppState::new(config).context("Failed to prepare project")?);
    let server = SlideServer::bind(state.clone()).context("Failed to start HTTP server")?;

    let _watcher = ChangeWatcher::new(
        &state.root,
        &state.slides_path,
        state.config.debounce_ms,
        state.hub.clone(),
        state.layouts.clone(),
    )
    .spawn()
    .context("Failed to watch project files")?;

    let addr = server.local_addr()?;
    println!("HyperSlide running at http://{}", addr);
    println!("Presenter console at http://{}/speaker (Press Ctrl+C to stop)", addr);
    server.run();
    Ok(())
}

fn init(args: &InitArgs) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let dir = hyperslide::init_project(&cwd, &args.name)
        .with_context(|| format!("Failed to initialize project {}", args.name))?;
    println!("Created {}", dir.display());
    println!("Next: cd {} && hyperslide dev", args.name);
    Ok(())
}

fn export(args: &ExportArgs) -> anyhow::Result<()> {
    let mut config = Config::from_env();
    if let Some(file) = &args.file {
        config.slides_file = file.clone();
    }
    config.css_files = resources(&args.css);
    config.js_files = resources(&args.js);

    let summary = hyperslide::export_presentation(&config, &args.output)
        .context("Failed to export presentation")?;
    info!("Export finished: {:?}", summary);
    println!(
        "Exported {} slides to {} ({} assets copied)",
        summary.slides,
        summary.index.display(),
        summary.assets
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::Dev(args)) => dev(args),
        Some(Commands::Init(args)) => init(args),
        Some(Commands::Export(args)) => export(args),
        None => {
            println!("No command specified. Use --help for usage information.");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
