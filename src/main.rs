use anyhow::Context;
use bubblefield::{app, load_settings, BackdropKind, ContentMap};
use clap::Parser;
use std::{fs::File, path::PathBuf};

#[derive(Parser, Debug)]
#[command(about = "Throwable bubbles over a reactive particle backdrop")]
struct Args {
    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON content map shown in the detail view
    #[arg(long)]
    content: Option<PathBuf>,

    /// frame rate cap
    #[arg(long)]
    fps: Option<u32>,

    /// seed for reproducible layouts
    #[arg(long)]
    seed: Option<u64>,

    /// backdrop shown at start
    #[arg(long, value_enum)]
    backdrop: Option<BackdropKind>,

    /// draw in monochrome
    #[arg(long)]
    no_color: bool,

    /// write logs here (the screen belongs to the canvas)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: Option<&PathBuf>) -> anyhow::Result<()> {
    let Some(path) = path else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("could not create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(fps) = args.fps {
        settings.fps_cap = fps;
    }
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    if let Some(kind) = args.backdrop {
        settings.backdrop = kind;
    }
    if args.no_color {
        settings.enable_color = false;
    }
    if args.content.is_some() {
        settings.content = args.content;
    }
    settings.validate()?;

    let content = match &settings.content {
        Some(path) => ContentMap::load(path)?,
        None => ContentMap::builtin(),
    };

    app::run(settings, content)
}
