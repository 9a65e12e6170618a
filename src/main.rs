//! TraceVis-RS - command line frontend
//!
//! Decodes a trace and prints render-ready frames as JSON, one per line.
//!
//! # Usage
//!
//! ```bash
//! tracevis trace.json                  # frame for the first step
//! tracevis trace.json --step 3         # frame for step 3
//! tracevis trace.json --all            # every frame
//! tracevis trace.json --play --speed 2 # frames in real time at 2x
//! tracevis trace.json --focus nums --log-dir ./logs
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use tracevis_rs::{
    session::PlaybackEvent, Frame, FrameBuilder, PlaybackDriver, PlaybackSpeed, PlaybackState,
    Trace, TraceVisError, VisualizationConfig,
};

#[derive(Parser)]
#[command(name = "tracevis")]
#[command(author, version, about = "Step-through visualization of algorithm traces")]
struct Args {
    /// Trace document (JSON array of steps)
    trace: PathBuf,

    /// Config file (TOML, or JSON by extension). Defaults to the platform config dir.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Variable to visualize. Defaults to the most structural variable per step.
    #[arg(long, short = 'f')]
    focus: Option<String>,

    /// Step to render
    #[arg(long, short = 's', default_value = "0")]
    step: usize,

    /// Render every step
    #[arg(long, conflicts_with_all = ["step", "play"])]
    all: bool,

    /// Play the trace in real time, printing each frame as it is reached
    #[arg(long)]
    play: bool,

    /// Playback speed: 0.5, 1, 2 or 4
    #[arg(long, default_value = "1")]
    speed: PlaybackSpeed,

    /// Restart from the first step after the last one
    #[arg(long = "loop")]
    loop_playback: bool,

    /// Pretty-print JSON
    #[arg(long)]
    pretty: bool,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "tracevis.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tracevis_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

fn print_frame(frame: &Frame, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(frame)?
    } else {
        serde_json::to_string(frame)?
    };
    println!("{}", json);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(args.log_dir.as_deref());

    tracing::info!("Starting TraceVis-RS");

    let mut config = VisualizationConfig::load_or_default(args.config.as_deref());
    config.playback.loop_playback |= args.loop_playback;

    let trace = Trace::load_from_file(&args.trace, config.max_steps)
        .with_context(|| format!("Failed to load {}", args.trace.display()))?;
    for warning in trace.warnings() {
        tracing::warn!(
            step = ?warning.step_index,
            key = ?warning.key,
            "{:?}: {}",
            warning.kind,
            warning.message
        );
    }
    if trace.is_empty() {
        bail!("{} has no steps", args.trace.display());
    }

    let focus = args.focus.as_deref();
    let mut frames = FrameBuilder::new(config.clone());

    if args.play {
        return play(trace, &config, &mut frames, &args);
    }

    if args.all {
        for frame in frames.build_all(&trace, focus) {
            print_frame(&frame, args.pretty)?;
        }
    } else {
        let Some(frame) = frames.build(&trace, args.step, focus) else {
            bail!(
                "Step {} is out of range, the trace has {} steps",
                args.step,
                trace.len()
            );
        };
        print_frame(&frame, args.pretty)?;
    }

    tracing::debug!(
        "Layout cache: {} hits, {} misses",
        frames.cache().hits(),
        frames.cache().misses()
    );
    Ok(())
}

fn play(
    trace: Trace,
    config: &VisualizationConfig,
    frames: &mut FrameBuilder,
    args: &Args,
) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let trace = Arc::new(trace);

    let mut driver = PlaybackDriver::new(runtime.handle().clone(), &config.playback);
    driver.set_speed(args.speed);
    let events = driver.events();
    driver.load(Arc::clone(&trace));
    driver.seek(args.step);
    // Playback reports its own starting index
    for _ in events.try_iter() {}

    if !driver.play() {
        return Err(TraceVisError::Playback(format!(
            "Nothing to play: the trace has {} step(s)",
            trace.len()
        ))
        .into());
    }

    for event in events.iter() {
        match event {
            PlaybackEvent::IndexChanged(index) => {
                if let Some(frame) = frames.build(&trace, index, args.focus.as_deref()) {
                    print_frame(&frame, args.pretty)?;
                }
            }
            PlaybackEvent::StateChanged(PlaybackState::Paused) => break,
            PlaybackEvent::StateChanged(state) => {
                tracing::debug!("Playback state: {}", state.display_name());
            }
        }
    }

    tracing::info!("Playback finished at step {}", driver.current_index());
    Ok(())
}
