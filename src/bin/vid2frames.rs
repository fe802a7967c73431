use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use clap::{CommandFactory, Parser, value_parser};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use vid2frames::{
    CancellationToken, ExtractOptions, ExtractionSummary, FfmpegLogLevel, FrameExtractor,
    ProgressCallback, ProgressInfo, Termination,
};

const CLI_AFTER_HELP: &str = "Examples:\n  vid2frames input.mp4 frames 1000\n  vid2frames input.mp4 frames 250 --progress --verbose\n  vid2frames input.mp4 frames 5000 --json\n  vid2frames --completions zsh > _vid2frames";

#[derive(Debug, Parser)]
#[command(
    name = "vid2frames",
    version,
    about = "Extract frames from a video at a fixed time interval",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Path to the input video.
    #[arg(required_unless_present = "completions")]
    source_file: Option<PathBuf>,

    /// Directory to write frame<N>.jpg files into (created if missing).
    #[arg(required_unless_present = "completions")]
    target_dir: Option<PathBuf>,

    /// Sampling interval in milliseconds.
    #[arg(
        required_unless_present = "completions",
        value_parser = value_parser!(u64).range(1..)
    )]
    msec_time_interval: Option<u64>,

    #[command(flatten)]
    global: GlobalOptions,

    /// Print a shell completion script and exit.
    #[arg(long, value_enum, exclusive = true)]
    completions: Option<Shell>,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output (info by default).
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// Print the extraction summary as JSON.
    #[arg(long)]
    json: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<FfmpegLogLevel>,
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
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        if let Some(timestamp) = info.requested_timestamp {
            self.bar.set_message(format!("@ {:.1}s", timestamp.as_secs_f64()));
        }
    }
}

fn log_level_filter(verbose: bool) -> log::LevelFilter {
    if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}

fn init_logging(global: &GlobalOptions) {
    env_logger::Builder::new()
        .filter_level(log_level_filter(global.verbose))
        .parse_default_env()
        .init();
}

fn print_summary(
    summary: &ExtractionSummary,
    target_dir: &Path,
    elapsed: Duration,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        let payload = json!({
            "frames": summary.frame_count,
            "target_dir": target_dir.display().to_string(),
            "interval_ms": summary.interval.as_millis() as u64,
            "last_frame_seconds": summary.last_frame_timestamp.map(|ts| ts.as_secs_f64()),
            "termination": summary.termination.to_string(),
            "elapsed_seconds": elapsed.as_secs_f64(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    match &summary.termination {
        Termination::Exhausted => {}
        other => eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("stopped early: {other}").yellow()
        ),
    }

    println!(
        "{} {}",
        "success:".green().bold(),
        format!(
            "Extracted {} frame(s) to {} in {:.2?}",
            summary.frame_count,
            target_dir.display(),
            elapsed
        )
        .green()
    );
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "vid2frames", &mut std::io::stdout());
        return Ok(());
    }

    init_logging(&cli.global);
    if let Some(level) = cli.global.log_level {
        vid2frames::set_ffmpeg_log_level(level);
    }

    let source_file = cli.source_file.ok_or("missing <SOURCE_FILE>")?;
    let target_dir = cli.target_dir.ok_or("missing <TARGET_DIR>")?;
    let interval = cli
        .msec_time_interval
        .ok_or("missing <MSEC_TIME_INTERVAL>")?;

    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel())?;

    let mut options = ExtractOptions::new().with_cancellation(token);
    let progress = if cli.global.progress {
        let progress = Arc::new(TerminalProgress::new()?);
        options = options.with_progress(progress.clone());
        Some(progress)
    } else {
        None
    };

    if !cli.global.json {
        println!("Extracting frames...");
    }

    let started = Instant::now();
    let summary = FrameExtractor::from_millis(interval)
        .with_options(options)
        .extract(&source_file, &target_dir)?;
    let elapsed = started.elapsed();

    if let Some(progress) = progress {
        progress.bar.finish_with_message("done");
    }

    print_summary(&summary, &target_dir, elapsed, cli.global.json)
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_positional_arguments() {
        let cli = Cli::try_parse_from(["vid2frames", "in.mp4", "out", "1500", "--json"]).unwrap();
        assert_eq!(cli.source_file, Some(PathBuf::from("in.mp4")));
        assert_eq!(cli.target_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.msec_time_interval, Some(1500));
        assert!(cli.global.json);
    }

    #[test]
    fn rejects_zero_and_non_integer_intervals() {
        assert!(Cli::try_parse_from(["vid2frames", "in.mp4", "out", "0"]).is_err());
        assert!(Cli::try_parse_from(["vid2frames", "in.mp4", "out", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["vid2frames", "in.mp4", "out"]).is_err());
    }

    #[test]
    fn default_logging_shows_open_and_finish_lines() {
        assert_eq!(log_level_filter(false), log::LevelFilter::Info);
        assert_eq!(log_level_filter(true), log::LevelFilter::Debug);
    }

    #[test]
    fn parses_ffmpeg_log_level() {
        let cli =
            Cli::try_parse_from(["vid2frames", "in.mp4", "out", "10", "--log-level", "warn"])
                .unwrap();
        assert_eq!(cli.global.log_level, Some(FfmpegLogLevel::Warning));
        assert!(
            Cli::try_parse_from(["vid2frames", "in.mp4", "out", "10", "--log-level", "loud"])
                .is_err()
        );
    }

    #[test]
    fn completions_need_no_positionals() {
        let cli = Cli::try_parse_from(["vid2frames", "--completions", "bash"]).unwrap();
        assert_eq!(cli.completions, Some(Shell::Bash));
        assert!(Cli::try_parse_from(["vid2frames", "in.mp4", "--completions", "bash"]).is_err());
    }
}
