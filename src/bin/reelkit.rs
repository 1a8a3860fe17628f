use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reelkit::{
    CancelToken, Canvas, Compositor, CompositorOpts, Container, CpuSurface, FfmpegEncoder,
    FfmpegEncoderOpts, FrameIndex, FramePacer, OUTPUT_FPS, RealTime, RenderJob, StartedRender,
    TaskStatus, TextLayoutEngine, Unpaced, UriAssetLoader, UriAssetLoaderOpts, drive,
    find_system_font, parse_script_text,
};

#[derive(Parser, Debug)]
#[command(name = "reelkit", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a job to a video file (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Args, Debug)]
struct JobArgs {
    /// Input render job JSON.
    #[arg(long)]
    job: PathBuf,

    /// Replace the job's script with line-delimited text from this file.
    #[arg(long)]
    script_file: Option<PathBuf>,

    /// Bold font file for script text. Defaults to a system sans-serif font.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Base directory for relative media paths. Defaults to the job file's directory.
    #[arg(long)]
    assets_root: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    job: JobArgs,

    /// Output video path.
    #[arg(long)]
    out: PathBuf,

    /// Container format (`webm` or `mp4`). Defaults to the output extension, else WebM.
    #[arg(long)]
    container: Option<Container>,

    /// Target bitrate in bits per second.
    #[arg(long, default_value_t = reelkit::encode::encoder::DEFAULT_BITRATE_BPS)]
    bitrate: u64,

    /// Pace frames at the output frame rate instead of rendering as fast as possible.
    #[arg(long, default_value_t = false)]
    realtime: bool,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    job: JobArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn load_job(args: &JobArgs) -> anyhow::Result<RenderJob> {
    let text = std::fs::read_to_string(&args.job)
        .with_context(|| format!("read render job '{}'", args.job.display()))?;
    let mut job: RenderJob = serde_json::from_str(&text).context("parse render job JSON")?;
    if let Some(path) = &args.script_file {
        let script = std::fs::read_to_string(path)
            .with_context(|| format!("read script '{}'", path.display()))?;
        job.script = parse_script_text(&script);
    }
    job.validate()?;
    Ok(job)
}

fn assets_root(args: &JobArgs) -> PathBuf {
    args.assets_root.clone().unwrap_or_else(|| {
        args.job
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf()
    })
}

fn make_surface(args: &JobArgs, canvas: Canvas) -> anyhow::Result<CpuSurface> {
    let font_path = match &args.font {
        Some(p) => p.clone(),
        None => find_system_font()
            .context("no system font found; pass --font with a bold .ttf/.otf file")?,
    };
    tracing::debug!(font = %font_path.display(), "loading font");
    let engine = TextLayoutEngine::from_path(&font_path)?;
    tracing::debug!(family = engine.family_name(), "font registered");
    Ok(CpuSurface::new(canvas)?.with_text_engine(engine))
}

fn make_loader(args: &JobArgs, canvas: Canvas) -> anyhow::Result<UriAssetLoader> {
    Ok(UriAssetLoader::new(
        UriAssetLoaderOpts::default()
            .with_assets_root(assets_root(args))
            .with_canvas(canvas),
    )?)
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn container_for(out: &Path) -> Container {
    out.extension()
        .and_then(|e| e.to_str())
        .and_then(|e| e.parse().ok())
        .unwrap_or_default()
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let job = load_job(&args.job)?;
    let canvas = Canvas::PORTRAIT_1080;
    let container = args.container.unwrap_or_else(|| container_for(&args.out));

    let surface = make_surface(&args.job, canvas)?;
    let loader = make_loader(&args.job, canvas)?;
    let encoder = FfmpegEncoder::new(FfmpegEncoderOpts::default().with_container(container));
    let compositor = Compositor::new(CompositorOpts::default().with_bitrate(args.bitrate));

    let StartedRender {
        mut task,
        progress,
        result,
    } = compositor.start(job, Box::new(surface), Box::new(loader), Box::new(encoder))?;

    let logger = std::thread::spawn(move || {
        let mut last_message = String::new();
        for ev in progress {
            if ev.message != last_message {
                tracing::info!(percent = (ev.fraction * 100.0).round(), "{}", ev.message);
                last_message = ev.message;
            }
        }
    });

    let mut pacer: Box<dyn FramePacer> = if args.realtime {
        Box::new(RealTime::new(OUTPUT_FPS))
    } else {
        Box::new(Unpaced)
    };
    let status = drive(&mut task, pacer.as_mut(), &CancelToken::new());
    drop(task);
    let _ = logger.join();

    let video = result.wait()?;
    if status != TaskStatus::Completed {
        anyhow::bail!("render ended with status {status:?}");
    }

    ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, &video.payload)
        .with_context(|| format!("write video '{}'", args.out.display()))?;
    tracing::info!(
        path = %args.out.display(),
        bytes = video.payload.len(),
        mime = %video.mime_type,
        "wrote video"
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let job = load_job(&args.job)?;
    let canvas = Canvas::PORTRAIT_1080;
    let mut surface = make_surface(&args.job, canvas)?;
    let mut loader = make_loader(&args.job, canvas)?;

    let frame = Compositor::default().render_frame(
        &job,
        FrameIndex(args.frame),
        &mut surface,
        &mut loader,
    )?;

    ensure_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    tracing::info!(path = %args.out.display(), frame = args.frame, "wrote frame");
    Ok(())
}
