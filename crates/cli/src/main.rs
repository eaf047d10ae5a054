mod settings;

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use facecam_core::capture::domain::pipeline_context::PipelineContext;
use facecam_core::capture::domain::video_source::VideoSource;
use facecam_core::capture::infrastructure::ffmpeg_video_source::FfmpegVideoSource;
use facecam_core::capture::infrastructure::image_file_source::ImageFileSource;
use facecam_core::detection::infrastructure::process_worker::spawn_process_worker;
use facecam_core::overlay::domain::overlay_surface::OverlaySurface;
use facecam_core::overlay::infrastructure::json_overlay_surface::JsonOverlaySurface;
use facecam_core::overlay::infrastructure::svg_mask;
use facecam_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facecam_core::pipeline::pipeline_scheduler::{PipelineScheduler, StopReason};
use facecam_core::shared::constants::IMAGE_EXTENSIONS;

use crate::settings::{MaskMode, RearmMode, Settings};

/// Real-time face detection on a camera or video stream.
///
/// Overlay commands (highlight boxes and the cutout mask) are written as
/// JSON lines, one per drawing operation.
#[derive(Parser)]
#[command(name = "facecam")]
struct Cli {
    /// Camera device, video file, stream URL or still image.
    input: PathBuf,

    /// Width of the reduced frame sent to the detector.
    #[arg(long)]
    processing_width: Option<u32>,

    /// When to sample the next frame: after each result, or on a timer.
    #[arg(long, value_enum)]
    rearm: Option<RearmMode>,

    /// Timer interval for `--rearm tick`, in milliseconds.
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Abandon a detection request after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Cutout mask policy: off, replace or union.
    #[arg(long, value_enum)]
    mask: Option<MaskMode>,

    /// Write overlay commands here instead of stdout.
    #[arg(long)]
    overlay_out: Option<PathBuf>,

    /// Save the last applied mask as an SVG file on exit.
    #[arg(long)]
    mask_svg: Option<PathBuf>,

    /// Stop after this many detection results.
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Settings file (default: <config dir>/facecam/settings.json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Detector command, speaking JSON lines on stdin/stdout.
    #[arg(last = true)]
    detector: Vec<String>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    validate(&cli, &settings)?;

    let source = open_source(&cli.input)?;
    let context = PipelineContext::acquire(source, settings.processing_width)?;
    let channel = spawn_process_worker(&settings.detector)?;
    let surface = open_surface(cli.overlay_out.as_deref())?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))?;

    let mut scheduler = PipelineScheduler::new(
        context,
        channel,
        surface,
        Box::new(StdoutPipelineLogger::default()),
        settings.pipeline_config(cli.max_cycles),
    );
    let reason = scheduler.run(&shutdown);

    let stats = scheduler.stats();
    log::info!(
        "Sent {} requests, processed {} results ({} skipped cycles, {} timeouts, {} discarded)",
        stats.requests_sent,
        stats.results_received,
        stats.skipped_cycles,
        stats.timeouts,
        stats.discarded_results
    );

    if let Some(path) = &cli.mask_svg {
        match scheduler.renderer().last_mask() {
            Some(mask) => {
                svg_mask::write_svg(mask, path)?;
                log::info!("Mask written to {}", path.display());
            }
            None => log::warn!("No mask was applied; {} not written", path.display()),
        }
    }

    match reason {
        StopReason::Failed(e) => Err(e.into()),
        StopReason::Shutdown | StopReason::CycleLimit => Ok(()),
    }
}

/// Settings file first, then command-line overrides.
fn resolve_settings(cli: &Cli) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = match cli.config.clone().or_else(Settings::config_path) {
        Some(path) => Settings::load_from(&path)?,
        None => Settings::default(),
    };

    if let Some(width) = cli.processing_width {
        settings.processing_width = width;
    }
    if let Some(rearm) = cli.rearm {
        settings.rearm = rearm;
    }
    if let Some(tick_ms) = cli.tick_ms {
        settings.tick_ms = tick_ms;
    }
    if cli.timeout_ms.is_some() {
        settings.timeout_ms = cli.timeout_ms;
    }
    if let Some(mask) = cli.mask {
        settings.mask = mask;
    }
    if !cli.detector.is_empty() {
        settings.detector = cli.detector.clone();
    }
    Ok(settings)
}

fn validate(cli: &Cli, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let is_url = cli.input.to_string_lossy().contains("://");
    if !is_url && !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    if cli.max_cycles == Some(0) {
        return Err("--max-cycles must be positive".into());
    }
    settings.validate()
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn open_source(input: &Path) -> Result<Box<dyn VideoSource>, Box<dyn std::error::Error>> {
    if is_image(input) {
        Ok(Box::new(ImageFileSource::open(input)?))
    } else {
        Ok(Box::new(FfmpegVideoSource::open(input)?))
    }
}

fn open_surface(path: Option<&Path>) -> Result<Box<dyn OverlaySurface>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Box::new(JsonOverlaySurface::new(BufWriter::new(
            File::create(path)?,
        )))),
        None => Ok(Box::new(JsonOverlaySurface::new(io::stdout()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_detector_command_after_separator() {
        let cli = parse(&["facecam", "cam.mp4", "--", "python3", "detect.py", "--gpu"]);
        assert_eq!(cli.detector, vec!["python3", "detect.py", "--gpu"]);
    }

    #[test]
    fn test_flags_override_settings_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = dir.path().join("settings.json");
        std::fs::write(
            &config,
            r#"{"processing_width":320,"mask":"off","detector":["from-file"]}"#,
        )
        .unwrap();

        let cli = parse(&[
            "facecam",
            "cam.mp4",
            "--config",
            config.to_str().unwrap(),
            "--mask",
            "replace",
            "--rearm",
            "tick",
        ]);
        let settings = resolve_settings(&cli).unwrap();
        assert_eq!(settings.processing_width, 320);
        assert_eq!(settings.mask, MaskMode::Replace);
        assert_eq!(settings.rearm, RearmMode::Tick);
        assert_eq!(settings.detector, vec!["from-file"]);
    }

    #[test]
    fn test_validate_rejects_missing_input() {
        let cli = parse(&["facecam", "/nonexistent/cam.mp4", "--", "detect"]);
        let settings = Settings {
            detector: cli.detector.clone(),
            ..Settings::default()
        };
        assert!(validate(&cli, &settings).is_err());
    }

    #[test]
    fn test_urls_skip_existence_check() {
        let cli = parse(&["facecam", "rtsp://camera.local/stream", "--", "detect"]);
        let settings = Settings {
            detector: cli.detector.clone(),
            ..Settings::default()
        };
        assert!(validate(&cli, &settings).is_ok());
    }

    #[test]
    fn test_is_image_by_extension() {
        assert!(is_image(Path::new("still.PNG")));
        assert!(!is_image(Path::new("/dev/video0")));
        assert!(!is_image(Path::new("clip.mp4")));
    }
}
