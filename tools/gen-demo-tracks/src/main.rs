//! gen-demo-tracks - writes the demonstration LSTF light shows
//!
//! Each track is written as `<name>.lstf`, re-read through the regular
//! loader and checked before moving on to the next one.
//!
//! Usage:
//!   gen-demo-tracks [--out tracks] [--binary]

mod tracks;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use toypad_lstf::{encode_text, load_lstf};

use tracks::{LOOP_SECONDS, TRACKS, TrackSpec, loop_length_ok, loop_seconds};

#[derive(Parser)]
#[command(name = "gen-demo-tracks")]
#[command(about = "Generate the demonstration LSTF light show tracks")]
#[command(version)]
struct Cli {
    /// Output directory
    #[arg(short, long, default_value = "tracks")]
    out: PathBuf,

    /// Write raw binary containers instead of the LSTF-TEXT envelope
    #[arg(long)]
    binary: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let written = generate(&cli.out, cli.binary)?;
    tracing::info!(
        "Generated {} demo tracks in {}",
        written.len(),
        cli.out.display()
    );
    Ok(())
}

/// Write every demo track into `out`, returning the written paths
fn generate(out: &Path, binary: bool) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory {}", out.display()))?;

    TRACKS
        .iter()
        .map(|spec| write_track(spec, out, binary))
        .collect()
}

fn write_track(spec: &TrackSpec, out: &Path, binary: bool) -> Result<PathBuf> {
    let bytes = (spec.build)().with_context(|| format!("Failed to build {}", spec.name))?;
    let path = out.join(format!("{}.lstf", spec.name));

    if binary {
        fs::write(&path, &bytes)
    } else {
        fs::write(&path, encode_text(&bytes))
    }
    .with_context(|| format!("Failed to write {}", path.display()))?;

    let program =
        load_lstf(&path).with_context(|| format!("Failed to re-read {}", path.display()))?;
    if !program.is_full() {
        bail!("{} does not define all three pads", spec.name);
    }
    let seconds = loop_seconds(&program);
    if !loop_length_ok(seconds) {
        bail!(
            "{} loops every {:.2}s, expected {}-{}s",
            spec.name,
            seconds,
            LOOP_SECONDS.start(),
            LOOP_SECONDS.end()
        );
    }

    tracing::info!(
        "Wrote {} ({:.2}s) - {}",
        path.display(),
        seconds,
        spec.description
    );
    Ok(path)
}
