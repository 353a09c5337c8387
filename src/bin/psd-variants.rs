use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{ArgAction, Parser};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "psd-variants", version, about = "Render one JPEG per color option of a PSD")]
struct Cli {
    /// Input PSD file.
    psd: PathBuf,

    /// Output directory (default: `<tmp>/psd-variants-<stem>`).
    #[arg(long)]
    out: Option<PathBuf>,

    /// JPEG quality (1-100).
    #[arg(long)]
    quality: Option<u8>,

    /// File name suffix, as in `<stem>-<color>-<suffix>.jpg`.
    #[arg(long)]
    suffix: Option<String>,

    /// Process options JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the full report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut opts = match &cli.config {
        Some(path) => psd_variants::ProcessOpts::from_path(path)?,
        None => psd_variants::ProcessOpts::default(),
    };
    if let Some(q) = cli.quality {
        opts.quality = q;
    }
    if let Some(s) = cli.suffix.clone() {
        opts.filename_suffix = s;
    }

    let out_dir = cli.out.clone().unwrap_or_else(|| default_out_dir(&cli.psd));
    let outcome = psd_variants::process_with_opts(&cli.psd, &out_dir, opts);

    if cli.json {
        let s = serde_json::to_string_pretty(&outcome).context("serialize report")?;
        println!("{s}");
    } else if outcome.success {
        println!("generated {} variants:", outcome.variants.len());
        for v in &outcome.variants {
            println!("  - {} ({} bytes)", v.path.display(), v.file_size);
        }
        for d in &outcome.diagnostics.duplicates {
            eprintln!("warning: identical output for {}", d.colors.join(", "));
        }
    }

    if !outcome.success {
        anyhow::bail!("processing '{}' failed", cli.psd.display());
    }
    Ok(())
}

fn default_out_dir(psd: &Path) -> PathBuf {
    let stem = psd
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    std::env::temp_dir().join(format!("psd-variants-{stem}"))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
