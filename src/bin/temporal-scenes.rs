use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use temporal_scenes::{
    FilterSettings, ProgressCallback, ProgressInfo, SegmentationDocument, SegmentationOptions,
    TemporalSegmenter, artifacts, validate_inputs,
};

const CLI_AFTER_HELP: &str = "Examples:\n  temporal-scenes select-frames --hashes frameHash.json --segments segments.json --out framesegmentation.json\n  temporal-scenes scenes --frames framesegmentation.json --hashes frameHash.json --segments segments.json --embeddings embeddings.json --similarity similarity.json --out scenes --progress\n  temporal-scenes validate --hashes frameHash.json --segments segments.json\n  temporal-scenes completions zsh > _temporal-scenes";

#[derive(Debug, Parser)]
#[command(
    name = "temporal-scenes",
    version,
    about = "Select representative frames and group shots into scenes",
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
    /// Show additional output.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar where supported.
    #[arg(long)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long)]
    overwrite: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Pick representative frames from a frame-hash list.
    #[command(
        about = "Select representative frames",
        after_help = "Examples:\n  temporal-scenes select-frames --hashes frameHash.json --out framesegmentation.json\n  temporal-scenes select-frames --hashes frameHash.json --segments segments.json --out framesegmentation.json --json"
    )]
    SelectFrames {
        /// Frame-hash list.
        #[arg(long)]
        hashes: PathBuf,
        /// Shot and technical-cue segmentation.
        #[arg(long)]
        segments: Option<PathBuf>,
        /// Output file for the selected frames.
        #[arg(long)]
        out: PathBuf,
        /// Print a machine-readable summary.
        #[arg(long)]
        json: bool,
    },

    /// Detect scenes and write scene.json and scene.vtt.
    #[command(
        about = "Detect scenes",
        after_help = "Examples:\n  temporal-scenes scenes --frames framesegmentation.json --hashes frameHash.json --segments segments.json --embeddings embeddings.json --similarity similarity.json --out scenes\n  temporal-scenes scenes ... --out scenes --min-frame-similarity 0.85 --max-time-distance 4m"
    )]
    Scenes {
        /// Selected frames, as written by select-frames.
        #[arg(long)]
        frames: PathBuf,
        /// Full frame-hash list.
        #[arg(long)]
        hashes: PathBuf,
        /// Shot and technical-cue segmentation.
        #[arg(long)]
        segments: PathBuf,
        /// Embeddings, one row per selected frame.
        #[arg(long)]
        embeddings: PathBuf,
        /// Nearest neighbours, one row per selected frame.
        #[arg(long)]
        similarity: PathBuf,
        /// Output directory.
        #[arg(long)]
        out: PathBuf,
        /// Prefix recorded in scene.json for frame image lookup.
        #[arg(long, default_value = "")]
        frame_prefix: String,
        /// Minimum frame similarity relating two shots, in [0, 1).
        #[arg(long, value_parser = parse_similarity)]
        min_frame_similarity: Option<f64>,
        /// Maximum time distance between related frames (ms, or with s/m suffix).
        #[arg(long, value_parser = parse_time_distance)]
        max_time_distance: Option<f64>,
        /// Print scenes as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Validate input artifacts and print a report.
    #[command(
        about = "Validate input artifacts",
        after_help = "Examples:\n  temporal-scenes validate --hashes frameHash.json\n  temporal-scenes validate --hashes frameHash.json --segments segments.json"
    )]
    Validate {
        /// Frame-hash list.
        #[arg(long)]
        hashes: PathBuf,
        /// Shot and technical-cue segmentation.
        #[arg(long)]
        segments: Option<PathBuf>,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_similarity(value: &str) -> Result<f64, String> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("not a number: {value}"))?;
    if (0.0..1.0).contains(&parsed) {
        Ok(parsed)
    } else {
        Err(format!("must be in [0, 1): {parsed}"))
    }
}

fn parse_time_distance(value: &str) -> Result<f64, String> {
    let trimmed = value.trim();
    let (number, scale) = if let Some(millis) = trimmed.strip_suffix("ms") {
        (millis, 1.0)
    } else if let Some(minutes) = trimmed.strip_suffix('m') {
        (minutes, 60_000.0)
    } else if let Some(seconds) = trimmed.strip_suffix('s') {
        (seconds, 1_000.0)
    } else {
        (trimmed, 1.0)
    };

    let parsed: f64 = number
        .trim()
        .parse()
        .map_err(|_| format!("invalid time distance: {value}"))?;
    Ok(parsed * scale)
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn base_options(global: &GlobalOptions) -> Result<SegmentationOptions, Box<dyn std::error::Error>> {
    let mut options = SegmentationOptions::new();

    if global.progress {
        options = options
            .with_progress(Arc::new(TerminalProgress::new()?))
            .with_batch_size(10);
    }

    Ok(options)
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
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
        self.bar.set_message(format!("{:?}", info.operation));
        if info.total.is_some_and(|total| info.current >= total) {
            self.bar.finish_with_message("done");
            self.bar.reset();
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::SelectFrames {
            hashes,
            segments,
            out,
            json,
        } => {
            ensure_writable_path(&out, cli.global.overwrite)?;

            let frames = artifacts::load_frame_hashes(&hashes)?;
            let segments = match segments {
                Some(path) => match artifacts::load_segments(&path) {
                    Ok(segments) => Some(segments),
                    Err(error) => {
                        eprintln!(
                            "{} {}",
                            "warning:".yellow().bold(),
                            format!("{error}; selecting without segmentation").yellow()
                        );
                        None
                    }
                },
                None => None,
            };

            let segmenter = TemporalSegmenter::with_options(base_options(&cli.global)?);
            let selected = segmenter.select_frames(&frames, segments.as_ref());
            artifacts::save_json(&out, &selected)?;

            if json {
                let payload = json!({
                    "input_frames": frames.len(),
                    "selected_frames": selected.len(),
                    "segmented": segments.is_some(),
                    "output": out.display().to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                if cli.global.verbose {
                    for frame in &selected {
                        eprintln!("selected {} ({} ms)", frame.name, frame.timestamp);
                    }
                }
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!(
                        "Selected {} of {} frame(s) to {}",
                        selected.len(),
                        frames.len(),
                        out.display()
                    )
                    .green()
                );
            }
        }
        Commands::Scenes {
            frames,
            hashes,
            segments,
            embeddings,
            similarity,
            out,
            frame_prefix,
            min_frame_similarity,
            max_time_distance,
            json,
        } => {
            fs::create_dir_all(&out)?;
            let metadata_path = out.join("scene.json");
            let track_path = out.join("scene.vtt");
            ensure_writable_path(&metadata_path, cli.global.overwrite)?;
            ensure_writable_path(&track_path, cli.global.overwrite)?;

            let mut settings = FilterSettings::new();
            if let Some(value) = min_frame_similarity {
                settings = settings.with_min_frame_similarity(value);
            }
            if let Some(value) = max_time_distance {
                settings = settings.with_max_time_distance(value);
            }

            let inputs = artifacts::load_scene_inputs(
                &frames,
                &hashes,
                &segments,
                &embeddings,
                &similarity,
            )?;
            let options = base_options(&cli.global)?.with_filter_settings(settings);
            let report = TemporalSegmenter::with_options(options).detect_scenes(inputs, &frame_prefix)?;

            artifacts::save_json(&metadata_path, &report.metadata)?;
            artifacts::save_text(&track_path, &report.track.to_webvtt())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report.metadata)?);
            } else {
                if cli.global.verbose {
                    for cue in &report.track.cues {
                        eprintln!("{} [{} - {} ms]", cue.text, cue.start_ms, cue.end_ms);
                    }
                }
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!("Detected {} scene(s) in {}", report.scenes.len(), out.display())
                        .green()
                );
            }
        }
        Commands::Validate { hashes, segments } => {
            let frames = artifacts::load_frame_hashes(&hashes)?;
            let document = match segments {
                Some(path) => Some(artifacts::load_json::<SegmentationDocument>(&path)?),
                None => None,
            };
            let report = validate_inputs(&frames, document.as_ref());
            print!("{report}");
            if !report.is_valid() {
                return Err(format!("{} error(s) found", report.errors.len()).into());
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(
                shell,
                &mut command,
                "temporal-scenes",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_similarity, parse_time_distance};

    #[test]
    fn parse_similarity_bounds() {
        assert_eq!(parse_similarity("0.85").unwrap(), 0.85);
        assert_eq!(parse_similarity(" 0 ").unwrap(), 0.0);
        assert!(parse_similarity("1").is_err());
        assert!(parse_similarity("-0.1").is_err());
        assert!(parse_similarity("high").is_err());
    }

    #[test]
    fn parse_time_distance_units() {
        assert_eq!(parse_time_distance("180000").unwrap(), 180_000.0);
        assert_eq!(parse_time_distance("180000ms").unwrap(), 180_000.0);
        assert_eq!(parse_time_distance("90s").unwrap(), 90_000.0);
        assert_eq!(parse_time_distance("4m").unwrap(), 240_000.0);
        assert!(parse_time_distance("soon").is_err());
    }
}
