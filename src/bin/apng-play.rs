use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use apng_playback::{
    Compositor, FrameStore, LoadOpts, PlayLimit, PlaybackControl, PlaybackEngine, PlaybackEvent,
    PlaybackLoop, PlaybackOpts, Preparation,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "apng-play", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print canvas, frame timing and play limit as JSON.
    Info(InputArgs),
    /// Drive the engine with fixed steps, without sleeping.
    Simulate(SimulateArgs),
    /// Play in real time on a timing thread.
    Play(PlayArgs),
    /// Composite a single frame and write it as PNG.
    Frame(FrameArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Input APNG file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Duration used for frames whose delay is zero.
    #[arg(long, default_value_t = 100)]
    zero_delay_ms: u32,
}

impl InputArgs {
    fn load(&self) -> anyhow::Result<Arc<FrameStore>> {
        let opts = LoadOpts {
            zero_delay_fallback_ms: self.zero_delay_ms,
            ..LoadOpts::default()
        };
        let store = FrameStore::from_path(&self.in_path, &opts)
            .with_context(|| format!("load '{}'", self.in_path.display()))?;
        Ok(Arc::new(store))
    }
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Playback options JSON.
    #[arg(long)]
    opts: Option<PathBuf>,

    /// Override the play limit (0 = infinite).
    #[arg(long)]
    plays: Option<u32>,

    /// Prepare frames on a worker thread.
    #[arg(long, default_value_t = false)]
    worker: bool,
}

impl EngineArgs {
    fn playback_opts(&self) -> anyhow::Result<PlaybackOpts> {
        let mut opts = match &self.opts {
            Some(path) => PlaybackOpts::from_path(path)?,
            None => PlaybackOpts::default(),
        };
        if let Some(plays) = self.plays {
            opts.play_limit = Some(match plays {
                0 => PlayLimit::Infinite,
                n => PlayLimit::finite(n)?,
            });
        }
        if self.worker {
            opts.preparation = Preparation::Worker;
        }
        Ok(opts)
    }
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    engine: EngineArgs,

    /// Elapsed time fed per tick.
    #[arg(long, default_value_t = 16)]
    step_ms: u64,

    /// Number of ticks.
    #[arg(long, default_value_t = 600)]
    steps: u32,
}

#[derive(Args, Debug)]
struct PlayArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    engine: EngineArgs,

    /// Refresh rate of the timing thread.
    #[arg(long, default_value_t = 60)]
    hz: u32,

    /// Give up after this many seconds.
    #[arg(long, default_value_t = 10.0)]
    seconds: f64,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Frame index (0-based).
    #[arg(long)]
    index: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Info(args) => cmd_info(args),
        Command::Simulate(args) => cmd_simulate(args),
        Command::Play(args) => cmd_play(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_info(args: InputArgs) -> anyhow::Result<()> {
    let store = args.load()?;
    let frames: Vec<_> = store
        .frames()
        .iter()
        .map(|f| {
            serde_json::json!({
                "index": f.index,
                "region": f.region,
                "duration": f.duration,
                "duration_ms": f.duration.as_secs_f64() * 1000.0,
                "dispose": f.dispose,
                "blend": f.blend,
            })
        })
        .collect();
    let info = serde_json::json!({
        "canvas": store.canvas(),
        "frame_count": store.len(),
        "total_ms": store.total_duration().as_secs_f64() * 1000.0,
        "play_limit": store.default_play_limit(),
        "frames": frames,
    });
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn print_event(event: &PlaybackEvent, _control: &mut PlaybackControl) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "serialize event"),
    }
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let store = args.input.load()?;
    let mut engine = PlaybackEngine::new(store, args.engine.playback_opts()?)?;
    engine.subscribe(print_event);
    if !engine.start() {
        anyhow::bail!("engine refused to start");
    }

    let step = Duration::from_millis(args.step_ms);
    let mut ticks = 0u32;
    let mut missed = 0u32;
    for _ in 0..args.steps {
        let out = engine.tick(step);
        ticks += 1;
        missed += u32::from(out.missed.is_some());
        if !engine.is_playing() {
            break;
        }
    }

    let summary = serde_json::json!({
        "ticks": ticks,
        "missed": missed,
        "displaying": engine.displaying_frame_index(),
        "loops": engine.loop_count(),
        "state": engine.state(),
        "finished": engine.is_finished(),
    });
    println!("{summary}");
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    if args.hz == 0 {
        anyhow::bail!("--hz must be > 0");
    }
    let limit = Duration::try_from_secs_f64(args.seconds.max(0.0))
        .with_context(|| format!("invalid --seconds {}", args.seconds))?;
    let deadline = Instant::now()
        .checked_add(limit)
        .with_context(|| format!("--seconds {} is too large", args.seconds))?;
    let store = args.input.load()?;
    let mut engine = PlaybackEngine::new(store, args.engine.playback_opts()?)?;
    engine.subscribe(|event: &PlaybackEvent, _: &mut PlaybackControl| match event {
        PlaybackEvent::FrameMissed { index } => tracing::warn!(index, "frame missed"),
        PlaybackEvent::OnePlayDone { loop_count } => tracing::info!(loop_count, "play done"),
        PlaybackEvent::AllPlaysDone => tracing::info!("all plays done"),
    });
    if !engine.start() {
        anyhow::bail!("engine refused to start");
    }

    let engine = Arc::new(Mutex::new(engine));
    let interval = Duration::from_secs_f64(1.0 / f64::from(args.hz));
    let handle = PlaybackLoop::spawn(Arc::clone(&engine), interval)?;

    while !handle.is_finished() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }
    handle.stop();

    let mut engine = engine
        .lock()
        .map_err(|_| anyhow::anyhow!("engine lock poisoned"))?;
    eprintln!(
        "stopped at frame {} after {} loop(s)",
        engine.displaying_frame_index(),
        engine.loop_count()
    );
    engine.teardown();
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let store = args.input.load()?;
    let img = Compositor::new(store).compose(args.index)?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    write_png(&img, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn write_png(img: &image::RgbaImage, path: &Path) -> anyhow::Result<()> {
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", path.display()))
}
