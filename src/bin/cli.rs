use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use scramblery::detector::FixedLandmarks;
use scramblery::{Emitted, ScrambleConfig, ScrambleKind, Scrambler};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command. Flags override values from `--settings`.
#[derive(Args)]
struct ScrambleArgs {
    /// JSON file with a full or partial scramble configuration
    #[arg(long)]
    settings: Option<PathBuf>,
    /// classic, pixel, withinblocks, rotate, colormap, gradient, stack, fourier or noiseblur
    #[arg(short, long)]
    kind: Option<ScrambleKind>,
    /// Splits along the x axis
    #[arg(short = 'x', long)]
    x_blocks: Option<u32>,
    /// Splits along the y axis (strip count for stack)
    #[arg(short = 'y', long)]
    y_blocks: Option<u32>,
    /// Fourier scramble ratio in [0, 1]
    #[arg(short, long)]
    ratio: Option<f64>,
    /// Noise then blur rounds (noiseblur)
    #[arg(long)]
    cycles: Option<u32>,
    /// Odd Gaussian kernel size (noiseblur)
    #[arg(long)]
    kernel: Option<u32>,
    /// Gaussian sigma, 0 derives it from the kernel (noiseblur)
    #[arg(long)]
    sigma: Option<f64>,
    #[arg(short, long, env = "SCRAMBLERY_SEED")]
    seed: Option<u64>,
    /// Blend the scrambled face into the original
    #[arg(long)]
    seamless: bool,
    /// Replace the background with flat gray
    #[arg(long)]
    no_background: bool,
    /// Directory for face outputs
    #[arg(long, env = "SCRAMBLERY_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
}

impl ScrambleArgs {
    fn into_config(self) -> anyhow::Result<ScrambleConfig> {
        let mut config = match &self.settings {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading settings {}", path.display()))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("parsing settings {}", path.display()))?
            }
            None => ScrambleConfig::default(),
        };

        if let Some(kind) = self.kind {
            config.kind = kind;
        }
        if let Some(x) = self.x_blocks {
            config.x_blocks = x;
        }
        if let Some(y) = self.y_blocks {
            config.y_blocks = y;
        }
        if let Some(ratio) = self.ratio {
            config.ratio = ratio;
        }
        if let Some(cycles) = self.cycles {
            config.noise_blur.cycles = cycles;
        }
        if let Some(kernel) = self.kernel {
            config.noise_blur.kernel = kernel;
        }
        if let Some(sigma) = self.sigma {
            config.noise_blur.sigma = sigma;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.seamless {
            config.seamless = true;
        }
        if self.no_background {
            config.background = false;
        }
        if self.output_dir.is_some() {
            config.output_dir = self.output_dir;
        }
        config.write = true;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Scramble a whole image
    Image {
        #[arg(short, long)]
        input: PathBuf,
        #[command(flatten)]
        scramble: ScrambleArgs,
    },
    /// Scramble the first face of an image
    Face {
        #[arg(short, long)]
        input: PathBuf,
        /// JSON landmarks: {"faces": [[[x, y], ...]]}
        #[arg(short, long)]
        landmarks: PathBuf,
        #[command(flatten)]
        scramble: ScrambleArgs,
    },
    /// Scramble every image of a directory
    Batch {
        #[arg(long)]
        input_dir: PathBuf,
        #[arg(long)]
        target_dir: PathBuf,
        /// Scramble faces with these landmarks instead of whole images
        #[arg(short, long)]
        landmarks: Option<PathBuf>,
        #[command(flatten)]
        scramble: ScrambleArgs,
    },
    /// Scramble the face in every frame of a video
    #[cfg(feature = "ffmpeg")]
    Video {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        landmarks: PathBuf,
        #[command(flatten)]
        scramble: ScrambleArgs,
    },
}

fn init_logging() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(d) = "scramblery=info".parse() {
        filter = filter.add_directive(d);
    }
    fmt().with_env_filter(filter).init();
}

fn report(emitted: Emitted) {
    match emitted {
        Emitted::Written(path) => println!("{}", path.display()),
        Emitted::Returned(_) => {}
    }
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Image { input, scramble } => {
            let mut scrambler = Scrambler::new(scramble.into_config()?)?;
            report(scrambler.scramble_file(&input)?);
        }

        Commands::Face {
            input,
            landmarks,
            scramble,
        } => {
            let mut detector = FixedLandmarks::from_json_file(&landmarks)?;
            let mut scrambler = Scrambler::new(scramble.into_config()?)?;
            report(scrambler.scramble_face_file(&input, &mut detector)?);
        }

        Commands::Batch {
            input_dir,
            target_dir,
            landmarks,
            scramble,
        } => {
            let mut detector = landmarks
                .map(|path| FixedLandmarks::from_json_file(&path))
                .transpose()?;
            let mut scrambler = Scrambler::new(scramble.into_config()?)?;
            let results = scrambler.scramble_directory(
                &input_dir,
                &target_dir,
                detector.as_mut().map(|d| d as &mut dyn scramblery::LandmarkDetector),
            )?;
            for result in &results {
                match &result.error {
                    None => println!("{}", result.output.display()),
                    Some(e) => warn!(input = %result.input.display(), "{}", e),
                }
            }
            info!(
                succeeded = results.iter().filter(|r| r.is_success()).count(),
                total = results.len(),
                "batch done"
            );
        }

        #[cfg(feature = "ffmpeg")]
        Commands::Video {
            input,
            output,
            landmarks,
            scramble,
        } => {
            use scramblery::video::ffmpeg::{FfmpegSink, FfmpegSource};
            use scramblery::{FrameSource, scramble_video};

            let mut detector = FixedLandmarks::from_json_file(&landmarks)?;
            let config = ScrambleConfig {
                write: false,
                ..scramble.into_config()?
            };
            let mut source = FfmpegSource::open(&input)?;
            let (width, height) = source.dimensions();
            let mut sink = FfmpegSink::create(&output, width, height, source.frame_rate())?;
            let report = scramble_video(&mut source, Some(&mut sink), &mut detector, &config)?;
            println!(
                "{} frames, {} scrambled, {} passed through",
                report.frames, report.scrambled, report.passed_through
            );
        }
    }

    Ok(())
}
