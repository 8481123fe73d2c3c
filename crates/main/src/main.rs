use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use exit_report::export::{self, DirectorySink, DownloadButton};
use exit_report::provider::{HttpReportSource, ReportProvider, DEFAULT_ENDPOINT};
use exit_report::{FileCache, LayoutConfig, Report};
use log::info;

/// Generates exit requirement reports as PDF files.
///
/// Set `RUST_LOG=debug` to trace cache lookups and layout decisions.
#[derive(Parser)]
#[command(author, version, about = "Exit requirement report generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a student's report (cache first, then the endpoint) and save it as PDF.
    Download {
        #[arg(long)]
        student_id: String,
        #[arg(long, env = "EXIT_REPORT_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
        endpoint: String,
        #[arg(long, env = "EXIT_REPORT_CACHE_DIR", default_value = ".exit_report_cache")]
        cache_dir: PathBuf,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// JSON file overriding layout constants.
        #[arg(long)]
        layout: Option<PathBuf>,
    },

    /// Render a report stored in a local JSON file without touching the network.
    Render {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        #[arg(long)]
        layout: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Download {
            student_id,
            endpoint,
            cache_dir,
            out_dir,
            layout,
        } => download(&student_id, endpoint, cache_dir, out_dir, layout.as_deref()).await,
        Commands::Render {
            input,
            out_dir,
            layout,
        } => render(&input, out_dir, layout.as_deref()),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(&*err);
        std::process::exit(1);
    }
}

async fn download(
    student_id: &str,
    endpoint: String,
    cache_dir: PathBuf,
    out_dir: PathBuf,
    layout: Option<&Path>,
) -> anyhow::Result<()> {
    let layout = load_layout(layout)?;
    let mut provider =
        ReportProvider::new(HttpReportSource::new(endpoint), FileCache::new(cache_dir));

    provider
        .resolve(Some(student_id))
        .await
        .with_context(|| format!("could not resolve report for {}", student_id))?;

    let button = DownloadButton::new(layout);
    info!("{} ({})", button.label(&provider), student_id);
    if !button.is_enabled(&provider) {
        bail!("no report data available for {}", student_id);
    }

    match button.press(&provider, &DirectorySink::new(out_dir))? {
        Some(outcome) => println!(
            "Wrote {} ({} pages)",
            outcome.path.display(),
            outcome.page_count
        ),
        None => bail!("no report data available for {}", student_id),
    }
    Ok(())
}

fn render(input: &Path, out_dir: PathBuf, layout: Option<&Path>) -> anyhow::Result<()> {
    let layout = load_layout(layout)?;
    let json = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let report = Report::from_json(&json)
        .with_context(|| format!("{} does not contain a valid report", input.display()))?;

    let outcome = export::export_report(&report, &layout, &DirectorySink::new(out_dir))?;
    println!(
        "Wrote {} ({} pages)",
        outcome.path.display(),
        outcome.page_count
    );
    Ok(())
}

fn load_layout(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    match path {
        Some(path) => LayoutConfig::from_json_file(path)
            .with_context(|| format!("invalid layout file {}", path.display())),
        None => Ok(LayoutConfig::default()),
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
