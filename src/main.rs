use anyhow::{bail, Context, Result};
use clap::Parser;
use std::{fs::File, io::BufWriter, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use tsmerge::{process, Settings};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Merge a folder of timestamped CSV files into one sorted CSV"
)]
struct Args {
    /// YAML config file
    config: PathBuf,
    /// Also write a JSON run summary (files, row counts, duplicate timestamps)
    #[arg(long)]
    report: Option<PathBuf>,
    /// Exit non-zero if any timestamp appears more than once (output is still written)
    #[arg(long)]
    fail_on_duplicates: bool,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();

    // ─── 2) load settings ────────────────────────────────────────────
    let settings = Settings::from_yaml_file(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;
    info!(
        input = %settings.input_folder.display(),
        output = %settings.output_file.display(),
        "startup"
    );

    // ─── 3) merge ────────────────────────────────────────────────────
    let summary = process::run(&settings).context("merge failed")?;

    // ─── 4) optional report ──────────────────────────────────────────
    if let Some(report) = &args.report {
        let file = File::create(report)
            .with_context(|| format!("creating report {}", report.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &summary)
            .with_context(|| format!("writing report {}", report.display()))?;
        info!("wrote report {}", report.display());
    }

    if args.fail_on_duplicates && !summary.duplicates.is_empty() {
        bail!(
            "{} timestamps appear more than once in {}",
            summary.duplicates.groups.len(),
            settings.output_file.display()
        );
    }

    info!("all done");
    Ok(())
}
