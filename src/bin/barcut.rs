use std::{path::PathBuf, sync::Arc};

use barcut::{
    AnalysisOptions, Cut, CutDetector, DetectorConfig, FrameSource, ProgressCallback,
    ProgressInfo, SegmentSplitter, VideoSource, format_timestamp, plan_segments, save_json,
};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use colored::Colorize;
use ffmpeg_next::util::log::Level as FfmpegLogLevel;
use indicatif::{ProgressBar, ProgressStyle};

const CLI_AFTER_HELP: &str = "Examples:\n  barcut compilation.mp4\n  barcut compilation.mp4 --sample-rate 2 --output-json cuts.json\n  barcut compilation.mp4 --split-output segments --verbose\n  barcut --completions zsh > _barcut";

/// How many sampled frames pass between progress bar updates.
const PROGRESS_BATCH_SIZE: u64 = 10;

#[derive(Debug, Parser)]
#[command(
    name = "barcut",
    version,
    about = "Detect cuts in video compilations by analyzing black bar changes",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Path to the video file.
    #[arg(required_unless_present = "completions")]
    video_path: Option<PathBuf>,

    /// Maximum pixel value considered black.
    #[arg(long, default_value_t = 30)]
    black_threshold: u8,

    /// Minimum bar size in pixels.
    #[arg(long, default_value_t = 10)]
    min_bar_size: u32,

    /// Tolerance for bar size changes, in pixels.
    #[arg(long, default_value_t = 5)]
    tolerance: u32,

    /// Analyze every Nth frame.
    #[arg(long, default_value_t = 1)]
    sample_rate: u64,

    /// Save results to a JSON file.
    #[arg(long, value_name = "FILE")]
    output_json: Option<PathBuf>,

    /// Show bar geometry for every cut and enable debug logging.
    #[arg(long)]
    verbose: bool,

    /// Disable progress bars.
    #[arg(long)]
    no_progress: bool,

    /// Directory to save split video segments (enables splitting).
    #[arg(long, value_name = "DIR")]
    split_output: Option<PathBuf>,

    /// Keep black bars in split segments instead of cropping them.
    #[arg(long)]
    no_crop: bool,

    /// Print a shell completion script and exit.
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

impl Cli {
    fn detector_config(&self) -> DetectorConfig {
        DetectorConfig::new()
            .with_black_threshold(self.black_threshold)
            .with_min_bar_size(self.min_bar_size)
            .with_tolerance(self.tolerance)
            .with_sample_rate(self.sample_rate)
    }
}

/// Progress callback that drives an `indicatif` bar.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new(message: &'static str) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {msg} {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise} < {eta}]",
        )?;
        bar.set_style(style.progress_chars("##-"));
        bar.set_message(message);
        Ok(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let ffmpeg_level = if verbose {
        FfmpegLogLevel::Warning
    } else {
        FfmpegLogLevel::Error
    };
    ffmpeg_next::util::log::set_level(ffmpeg_level);
}

fn describe_cut(position: usize, cut: &Cut) -> String {
    format!(
        "Cut {position}: {} (frame {})",
        format_timestamp(cut.timestamp),
        cut.frame_number
    )
}

fn describe_bars(label: &str, cut_bars: &barcut::BarGeometry) -> String {
    format!(
        "  {label:<7} L={}, R={}, T={}, B={}",
        cut_bars.left, cut_bars.right, cut_bars.top, cut_bars.bottom
    )
}

fn print_results(cuts: &[Cut], verbose: bool) {
    println!(
        "{}",
        format!("Detected {} potential cuts:", cuts.len()).bold()
    );
    println!("{}", "-".repeat(80));

    for (position, cut) in cuts.iter().enumerate() {
        println!("{}", describe_cut(position + 1, cut));
        if verbose {
            println!("{}", describe_bars("Before:", &cut.transition.before));
            println!("{}", describe_bars("After:", &cut.transition.after));
            println!();
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "barcut", &mut std::io::stdout());
        return Ok(());
    }

    let video_path = cli
        .video_path
        .clone()
        .ok_or("a video path is required")?;

    init_logging(cli.verbose);

    // Reject bad settings before touching the file.
    let detector = CutDetector::new(cli.detector_config())?;

    println!("Analyzing video: {}", video_path.display());
    println!(
        "Settings: threshold={}, min_size={}, tolerance={}, sample_rate={}",
        cli.black_threshold, cli.min_bar_size, cli.tolerance, cli.sample_rate
    );
    println!();

    let mut source = VideoSource::open(&video_path)?;

    let analysis_progress = if cli.no_progress {
        None
    } else {
        Some(Arc::new(TerminalProgress::new("Analyzing video frames")?))
    };
    let mut options = AnalysisOptions::new().with_batch_size(PROGRESS_BATCH_SIZE);
    if let Some(progress) = &analysis_progress {
        options = options.with_progress(progress.clone());
    }

    let started = std::time::Instant::now();
    let result = detector.detect(&mut source, &options);
    if let Some(progress) = &analysis_progress {
        progress.finish();
    }
    let cuts = result?;

    if !cli.no_progress {
        println!(
            "{} Analysis completed in {:.2} seconds\n",
            "✓".green(),
            started.elapsed().as_secs_f64()
        );
    }

    // Detection already drained the stream, so this only reads the count.
    let total_frames = source.count_frames()?;
    let frames_per_second = source.frame_rate();
    let (width, height) = (source.metadata().width, source.metadata().height);
    drop(source);

    print_results(&cuts, cli.verbose);

    if let Some(json_path) = &cli.output_json {
        save_json(&cuts, json_path)?;
        println!("\nResults saved to {}", json_path.display());
    }

    if let Some(split_dir) = &cli.split_output {
        println!("\nSplitting video into segments...");

        let split_progress = if cli.no_progress {
            None
        } else {
            Some(Arc::new(TerminalProgress::new("Splitting video into segments")?))
        };
        let mut splitter = SegmentSplitter::new(&video_path, split_dir).crop_bars(!cli.no_crop);
        if let Some(progress) = &split_progress {
            splitter = splitter.progress(progress.clone());
        }

        let segments = plan_segments(&cuts, total_frames, frames_per_second);
        let result = splitter.run_segments(&segments, width, height);
        if let Some(progress) = &split_progress {
            progress.finish();
        }
        let files = result?;

        println!(
            "\n{} Created {} video segments in {}",
            "✓".green(),
            files.len(),
            split_dir.display()
        );
        if !cli.no_crop {
            println!("Black bars were cropped from each segment where detected");
        }
        if cli.verbose {
            for (position, file) in files.iter().enumerate() {
                println!("  {}: {}", position + 1, file.display());
            }
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
