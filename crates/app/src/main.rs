use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{Parser, Subcommand, ValueEnum};
use cursor_trail_core::{
    open_source, replay, AppConfig, AssetCatalog, AssetSource, Compositor, FrameRecorder,
    PointerTrace, RecordingSettings, SwatchSource, TrailConfig, TrailController, Vec2,
};
use tracing_subscriber::EnvFilter;

/// Extra time after the last pointer sample so the trail can fade out.
const FADE_TAIL: Duration = Duration::from_secs(2);

/// Edge length of generated stand-in images.
const SWATCH_SIZE: u32 = 160;

fn main() -> cursor_trail_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate { trail } => run_simulate(&trail),
        Commands::Render {
            trail,
            output,
            assets,
            every_nth,
        } => run_render(&trail, output, assets, every_nth),
        Commands::Trace {
            output,
            shape,
            duration_ms,
        } => run_trace(&output, shape, duration_ms),
    }
}

fn run_simulate(args: &TrailArgs) -> cursor_trail_core::Result<()> {
    let config = args.load_config()?;
    let trace = args.load_trace(&config)?;
    tracing::info!(samples = trace.samples.len(), "simulating trail");

    let source = SwatchSource::new(1);
    let mut trail = TrailController::new(config.trail.clone(), config.assets.count, source)?;
    let frames = replay(
        &mut trail,
        &trace,
        config.render.frame_interval(),
        FADE_TAIL,
        |_, _| Ok(()),
    )?;

    let summary = serde_json::json!({
        "frames": frames,
        "variant": config.trail.variant,
        "max_elements": config.trail.max_elements,
        "stats": trail.stats(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_render(
    args: &TrailArgs,
    output: PathBuf,
    assets: Option<PathBuf>,
    every_nth: u32,
) -> cursor_trail_core::Result<()> {
    let mut config = args.load_config()?;
    if let Some(dir) = assets {
        config.assets.dir = dir.to_string_lossy().into_owned();
    }
    let trace = args.load_trace(&config)?;

    let source: Box<dyn AssetSource> = if args.swatches {
        Box::new(SwatchSource::new(SWATCH_SIZE))
    } else {
        open_source(AssetCatalog::from(&config.assets), SWATCH_SIZE)
    };

    let compositor = Compositor::from(&config.render);
    let mut recorder = FrameRecorder::new(RecordingSettings {
        output_dir: output,
        every_nth,
    });
    recorder.start()?;

    let mut trail = TrailController::new(config.trail.clone(), config.assets.count, source)?;
    replay(
        &mut trail,
        &trace,
        config.render.frame_interval(),
        FADE_TAIL,
        |trail, _clock| {
            let frame = compositor.draw(&trail.sprites());
            recorder.write_frame(&frame)?;
            Ok(())
        },
    )?;
    recorder.stop()?;

    tracing::info!(
        frames = recorder.frames_written(),
        dir = ?recorder.output_dir(),
        stats = ?trail.stats(),
        "render complete"
    );
    Ok(())
}

fn run_trace(output: &Path, shape: TraceShape, duration_ms: u64) -> cursor_trail_core::Result<()> {
    let render = AppConfig::default().render;
    let trace = shape.build(render.width, render.height, duration_ms);
    trace.write_json_file(output)?;
    tracing::info!(?output, samples = trace.samples.len(), "wrote pointer trace");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Pointer-driven image trail", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a pointer trace headlessly and print trail statistics.
    Simulate {
        #[command(flatten)]
        trail: TrailArgs,
    },
    /// Replay a pointer trace and write every frame as a PNG.
    Render {
        #[command(flatten)]
        trail: TrailArgs,
        /// Directory that receives `frame_NNNNN.png` files.
        #[arg(short, long)]
        output: PathBuf,
        /// Directory holding `0.jpeg` .. `7.jpeg`; overrides the config file.
        #[arg(long)]
        assets: Option<PathBuf>,
        /// Only keep every Nth frame.
        #[arg(long, default_value_t = 1)]
        every_nth: u32,
    },
    /// Generate a synthetic pointer trace.
    Trace {
        /// Output path for the trace JSON.
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, value_enum, default_value_t = TraceShape::Orbit)]
        shape: TraceShape,
        #[arg(long, default_value_t = 4_000)]
        duration_ms: u64,
    },
}

#[derive(clap::Args, Debug)]
struct TrailArgs {
    /// Pointer trace JSON; a generated orbit is used when omitted.
    #[arg(short, long)]
    trace: Option<PathBuf>,
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Named trail preset, applied over the config file's trail section.
    #[arg(short, long, value_enum)]
    preset: Option<Preset>,
    /// Render generated colour tiles instead of image files.
    #[arg(long)]
    swatches: bool,
}

impl TrailArgs {
    fn load_config(&self) -> cursor_trail_core::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_json_file(path)?,
            None => AppConfig::default(),
        };
        if let Some(preset) = self.preset {
            config.trail = preset.config();
        }
        Ok(config)
    }

    fn load_trace(&self, config: &AppConfig) -> cursor_trail_core::Result<PointerTrace> {
        match &self.trace {
            Some(path) => PointerTrace::from_json_file(path),
            None => Ok(TraceShape::Orbit.build(config.render.width, config.render.height, 4_000)),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preset {
    Classic,
    Motion,
}

impl Preset {
    fn config(self) -> TrailConfig {
        match self {
            Preset::Classic => TrailConfig::classic(),
            Preset::Motion => TrailConfig::motion(),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TraceShape {
    Orbit,
    Sweep,
}

impl TraceShape {
    fn build(self, width: u32, height: u32, duration_ms: u64) -> PointerTrace {
        let (w, h) = (width as f32, height as f32);
        match self {
            TraceShape::Orbit => {
                PointerTrace::orbit(Vec2::new(w / 2.0, h / 2.0), h / 3.0, duration_ms, 8)
            }
            TraceShape::Sweep => PointerTrace::sweep(
                Vec2::new(w * 0.1, h / 2.0),
                Vec2::new(w * 0.9, h / 2.0),
                duration_ms,
                8,
            ),
        }
    }
}
