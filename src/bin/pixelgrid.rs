use std::{path::PathBuf, sync::Arc};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use pixelgrid::{
    Channel, ConversionOptions, FfmpegLogLevel, FrameSkip, Interpolation, MediaProbe,
    ProgressCallback, ProgressInfo, StreamEnd, ValueTransform,
};
use serde_json::json;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const CLI_AFTER_HELP: &str = "Examples:\n  pixelgrid probe input.mp4\n  pixelgrid convert input.mp4 --out result.json --width 8 --height 6\n  pixelgrid convert input.mp4 --channel green --transform invert --skip-period 3 --skip-amount 1 --progress\n  pixelgrid completions zsh > _pixelgrid";

#[derive(Debug, Parser)]
#[command(
    name = "pixelgrid",
    version,
    about = "Downsample video frames to a small grid and write one color channel as JSON",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while converting.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, error, warning, info, verbose, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert a video to a JSON array of pixel grids.
    #[command(
        about = "Convert video frames to JSON pixel grids",
        after_help = "Examples:\n  pixelgrid convert input.mp4\n  pixelgrid convert input.mp4 --width 16 --height 9 --interpolation bilinear --transform threshold:128"
    )]
    Convert {
        /// Input video path.
        input: PathBuf,
        /// Output JSON path. Replaced if it exists.
        #[arg(long, default_value = "result.json")]
        out: PathBuf,
        /// Grid width; width/height must equal the video's aspect ratio.
        #[arg(long, default_value_t = 8)]
        width: u32,
        /// Grid height.
        #[arg(long, default_value_t = 6)]
        height: u32,
        /// Sampled channel: 0 | 1 | 2 (red | green | blue).
        #[arg(long, default_value = "0")]
        channel: String,
        /// Resize policy: nearest | area | bilinear | bicubic | lanczos.
        #[arg(long, default_value = "area")]
        interpolation: String,
        /// Skip frames whenever the frame index modulo this period is period - 1.
        #[arg(long)]
        skip_period: Option<u64>,
        /// Frames to jump over per skip.
        #[arg(long, default_value_t = 1)]
        skip_amount: u64,
        /// Value transform: identity | invert | threshold:T | linear:M,O | quantize:L.
        #[arg(long, default_value = "identity")]
        transform: String,
        /// Stop after this many frames.
        #[arg(long)]
        max_frames: Option<u64>,
        /// Fail on a mid-stream decode error instead of stopping quietly.
        #[arg(long)]
        strict: bool,
    },

    /// Print video metadata and matching grid sizes.
    #[command(
        about = "Print video metadata",
        visible_alias = "info",
        after_help = "Examples:\n  pixelgrid probe input.mp4\n  pixelgrid probe input.mp4 --json"
    )]
    Probe {
        /// Input video path.
        input: PathBuf,

        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Grid widths suggested by `probe` stop here.
const SUGGESTED_MAX_WIDTH: u32 = 64;

/// Filter directives for `--verbose`; otherwise `RUST_LOG` or `warn`.
const VERBOSE_FILTER: &str = "warn,pixelgrid=debug";

fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

fn init_logging(verbose: bool) {
    // Library records go through the `log` facade; the subscriber's
    // tracing-log bridge picks them up.
    let _ = tracing_subscriber::registry()
        .with(log_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

fn frame_skip_from_args(skip_period: Option<u64>, skip_amount: u64) -> FrameSkip {
    match skip_period {
        Some(period) => FrameSkip::periodic(period, skip_amount),
        None => FrameSkip::Disabled,
    }
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(global.verbose);

    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        pixelgrid::set_ffmpeg_log_level(parsed);
    }

    Ok(())
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::no_length();
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total.max(info.current));
        }
        self.bar.set_position(info.current);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Convert {
            input,
            out,
            width,
            height,
            channel,
            interpolation,
            skip_period,
            skip_amount,
            transform,
            max_frames,
            strict,
        } => {
            let mut options = ConversionOptions::new(width, height)
                .with_channel(channel.parse::<Channel>()?)
                .with_interpolation(interpolation.parse::<Interpolation>()?)
                .with_frame_skip(frame_skip_from_args(skip_period, skip_amount))
                .with_transform(transform.parse::<ValueTransform>()?)
                .with_max_frames(max_frames)
                .with_strict_decoding(strict);

            let progress = if cli.global.progress {
                let progress = Arc::new(TerminalProgress::new()?);
                options = options.with_progress(progress.clone());
                Some(progress)
            } else {
                None
            };

            let report = pixelgrid::convert_file(&input, &out, &options);

            if let Some(progress) = progress {
                progress.bar.finish_and_clear();
            }
            let report = report?;

            match &report.end {
                StreamEnd::DecodeFailure(reason) => eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("stopped at a decode error: {reason}").yellow()
                ),
                StreamEnd::PositionCeiling(ceiling) => eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("stopped at frame {ceiling}, past the reported frame count").yellow()
                ),
                _ => {}
            }

            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "wrote {} frame(s) of {}x{} to {}",
                    report.frames_written,
                    width,
                    height,
                    report.output.display()
                )
                .green()
            );
        }
        Commands::Probe { input, json } => {
            let metadata = MediaProbe::probe(&input)?;
            let video = metadata.video.as_ref();
            let ratio = video.map(|video| video.aspect_ratio());
            let grid_sizes = ratio
                .map(|ratio| ratio.grid_sizes(SUGGESTED_MAX_WIDTH))
                .unwrap_or_default();

            if json {
                let payload = json!({
                    "format": metadata.format,
                    "duration_seconds": metadata.duration.as_secs_f64(),
                    "video": video.map(|video| json!({
                        "width": video.width,
                        "height": video.height,
                        "fps": video.frames_per_second,
                        "frame_count": video.frame_count,
                        "codec": video.codec,
                        "aspect_ratio": ratio.map(|ratio| ratio.to_string()),
                    })),
                    "grid_sizes": grid_sizes,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", metadata.format);
                println!("Duration: {:?}", metadata.duration);
                match (video, ratio) {
                    (Some(video), Some(ratio)) => {
                        println!(
                            "Video: {}x{} @ {:.2} fps, ~{} frames [{}]",
                            video.width,
                            video.height,
                            video.frames_per_second,
                            video.frame_count,
                            video.codec,
                        );
                        println!("Aspect ratio: {ratio}");
                        let sizes: Vec<String> = grid_sizes
                            .iter()
                            .take(8)
                            .map(|(width, height)| format!("{width}x{height}"))
                            .collect();
                        println!("Grid sizes: {}", sizes.join(", "));
                    }
                    _ => println!("Video: none"),
                }
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "pixelgrid", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::{Cli, FrameSkip, frame_skip_from_args};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbose_filter_enables_crate_debug() {
        let filter = super::log_filter(true).to_string();
        assert!(filter.contains("pixelgrid=debug"), "{filter}");
    }

    #[test]
    fn skip_period_enables_skipping() {
        assert_eq!(frame_skip_from_args(None, 5), FrameSkip::Disabled);
        assert_eq!(
            frame_skip_from_args(Some(3), 1),
            FrameSkip::Periodic {
                period: 3,
                amount: 1
            }
        );
    }

    #[test]
    fn convert_defaults_match_classic_grid() {
        use clap::Parser;

        let cli = Cli::try_parse_from(["pixelgrid", "convert", "input.mp4"]).unwrap();
        match cli.command {
            super::Commands::Convert {
                out,
                width,
                height,
                channel,
                interpolation,
                transform,
                ..
            } => {
                assert_eq!(out.to_str(), Some("result.json"));
                assert_eq!((width, height), (8, 6));
                assert_eq!(channel, "0");
                assert_eq!(interpolation, "area");
                assert_eq!(transform, "identity");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
