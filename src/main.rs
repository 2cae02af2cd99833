use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plex_rename::analyzer::MediaType;
use plex_rename::media_files::collect_paths;
use plex_rename::patterns::NamingRules;
use plex_rename::presenter::{AppPresenter, ApplyOutcome};
use plex_rename::tui::{App, run_tui};

/// Normalize film and TV episode filenames to `Title (Year) [- S##E##] [- Rest].ext`.
#[derive(Parser, Debug)]
#[command(name = "plex-rename", version)]
struct Cli {
    /// Treat the files as films
    #[arg(long, conflicts_with = "series")]
    film: bool,

    /// Treat the files as episodes of one series
    #[arg(long)]
    series: bool,

    /// Print the rename plan instead of opening the terminal UI
    #[arg(long)]
    print: bool,

    /// With --print: perform the renames after the plan is shown
    #[arg(long, requires = "print")]
    apply: bool,

    /// Year for series episodes whose names carry none
    #[arg(long)]
    year: Option<String>,

    /// Log file (the terminal belongs to the UI)
    #[arg(long, env = "PLEX_RENAME_LOG")]
    log_file: Option<PathBuf>,

    /// Video files, or a folder to scan (not recursive)
    paths: Vec<PathBuf>,
}

impl Cli {
    fn mode(&self) -> Option<MediaType> {
        if self.series {
            Some(MediaType::Series)
        } else if self.film {
            Some(MediaType::Film)
        } else {
            None
        }
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let path = log_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| std::env::temp_dir().join("plex-rename.log"));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Cannot open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let rules = NamingRules::new().context("Failed to build naming rules")?;
    let presenter = AppPresenter::new(rules);
    info!("plex-rename started with {} path arguments", cli.paths.len());

    if cli.print {
        return print_plan(presenter, &cli).await;
    }

    let app = match cli.mode() {
        Some(mode) if !cli.paths.is_empty() => {
            let paths = collect_paths(cli.paths.clone()).await?;
            let mut app = App::with_input(presenter, mode, String::new());
            app.load(paths);
            if let Some(year) = cli.year.as_deref() {
                if app.presenter.processor().needs_year_input() {
                    app.year_input = year.to_string();
                    app.submit_year();
                }
            }
            app
        }
        mode => {
            let input = cli
                .paths
                .first()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            App::with_input(presenter, mode.unwrap_or(MediaType::Film), input)
        }
    };

    run_tui(app).await
}

async fn print_plan(mut presenter: AppPresenter, cli: &Cli) -> Result<()> {
    let Some(mode) = cli.mode() else {
        bail!("--print needs --film or --series");
    };
    let paths = collect_paths(cli.paths.clone()).await?;
    let summary = presenter.load_files(mode, &paths)?;

    if summary.needs_year {
        match cli.year.as_deref() {
            Some(year) => {
                presenter.apply_series_year(year)?;
            }
            None => println!("Some episodes have no year; pass --year YYYY to fill it in.\n"),
        }
    }

    for item in presenter.items() {
        println!("[{:<10}] {}", item.status().label(), item.original_name());
        println!("             -> {}", item.new_name());
        if let Some(error) = item.error_message() {
            println!("             ! {}", error);
        }
    }
    println!("\n{}", presenter.statistics_message().text);

    if !cli.apply {
        return Ok(());
    }

    match presenter.apply_renames() {
        ApplyOutcome::NotAllowed => println!("Nothing ready to rename."),
        ApplyOutcome::Conflicts(names) => {
            println!("Not renaming: these targets already exist:");
            for name in names {
                println!("  {}", name);
            }
        }
        ApplyOutcome::Completed(report) => {
            println!("Renamed {} of {} files", report.succeeded, report.attempted);
            for error in &report.errors {
                println!("  {}", error);
            }
        }
    }
    Ok(())
}
