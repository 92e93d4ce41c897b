//! Render the portfolio backdrop to PPM snapshots.

use anyhow::{Context, Result};
use clap::Parser;
use folio_backdrop::{Backdrop, Surface, DEFAULT_INTENSITY};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[clap(name = "folio-backdrop", version, about = "Render the animated gradient background")]
struct Cli {
    #[clap(long, default_value = "960")]
    width: u32,

    #[clap(long, default_value = "540")]
    height: u32,

    #[clap(long, default_value_t = DEFAULT_INTENSITY, help = "Colour intensity from 0 to 1")]
    intensity: f32,

    #[clap(long, default_value = "4", help = "Number of snapshots to render")]
    frames: u32,

    #[clap(long, default_value = "1000", help = "Animation time between snapshots, in ms")]
    step_ms: f64,

    #[clap(long, default_value = "0", help = "Animation time of the first snapshot, in ms")]
    start_ms: f64,

    #[clap(long, help = "Seed for the grain texture")]
    seed: Option<u64>,

    #[clap(long, short, default_value = "backdrop-frames")]
    out_dir: PathBuf,

    #[clap(
        long,
        help = "Run the live animation for this many seconds and save the last frame"
    )]
    live: Option<u64>,

    #[clap(long, short, default_value = "info")]
    log_level: String,
}

fn save(surface: &Surface, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    surface.write_ppm(BufWriter::new(file))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

async fn run_live(mut backdrop: Backdrop, seconds: u64, out_dir: &Path) -> Result<()> {
    let token = CancellationToken::new();
    let (_resize_tx, resize_rx) = tokio::sync::mpsc::unbounded_channel();

    let stopper = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(seconds)) => {}
            _ = tokio::signal::ctrl_c() => {}
        }
        stopper.cancel();
    });

    let mut last_time = 0.0;
    let frames = backdrop
        .run(token, resize_rx, |_, time_ms| last_time = time_ms)
        .await?;

    log::info!(
        "Drew {} frames in {}s ({:.1} fps)",
        frames,
        seconds,
        frames as f64 / seconds.max(1) as f64
    );
    save(backdrop.surface(), &out_dir.join(format!("live-{:.0}.ppm", last_time)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let mut backdrop = Backdrop::new(cli.width, cli.height, cli.intensity)?;
    if let Some(seed) = cli.seed {
        backdrop = backdrop.with_noise_seed(seed)?;
    }

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("creating {}", cli.out_dir.display()))?;

    if let Some(seconds) = cli.live {
        return run_live(backdrop, seconds, &cli.out_dir).await;
    }

    for i in 0..cli.frames {
        let time_ms = cli.start_ms + i as f64 * cli.step_ms;
        backdrop.render(time_ms)?;
        save(
            backdrop.surface(),
            &cli.out_dir.join(format!("frame-{:04}.ppm", i)),
        )?;
    }

    Ok(())
}
