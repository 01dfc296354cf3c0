use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(
    name = "mediasort",
    version,
    about = "Sort media files into date folders using embedded metadata, filename patterns and mtime"
)]
struct Cli {
    /// Source directory to scan
    source: PathBuf,

    /// Destination root directory
    #[arg(short, long)]
    output: PathBuf,

    /// Also accept `YYYY-MM-DD - ` dates from folder names as a last resort
    #[arg(long)]
    match_folder_date: bool,

    /// Additional ignore patterns (regex, matched against the full path)
    #[arg(long = "ignore", value_name = "REGEX")]
    ignored: Vec<String>,

    /// Additional filter patterns (regex, matched against the full path)
    #[arg(long = "filter", value_name = "REGEX")]
    filtered: Vec<String>,

    /// Start from empty pattern lists instead of the built-in ones
    #[arg(long)]
    no_default_patterns: bool,

    /// Plan destinations without moving anything
    #[arg(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let t_total = std::time::Instant::now();

    let mut ignored = if cli.no_default_patterns {
        Vec::new()
    } else {
        mediasort_core::default_ignored_patterns()
    };
    ignored.extend(cli.ignored);

    let mut filtered = if cli.no_default_patterns {
        Vec::new()
    } else {
        mediasort_core::default_filtered_patterns()
    };
    filtered.extend(cli.filtered);

    let options = mediasort_core::SortOptions {
        source: cli.source,
        destination: cli.output,
        ignored_patterns: ignored,
        filtered_patterns: filtered,
        match_folder_date: cli.match_folder_date,
        dry_run: cli.dry_run,
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {pos} files {wide_msg}")
            .unwrap(),
    );

    let pb_cb = pb.clone();
    let result = mediasort_core::process(&options, &move |_stage, count, message| {
        pb_cb.set_position(count);
        pb_cb.set_message(message.to_string());
    })?;
    pb.finish_and_clear();

    for warning in &result.warnings {
        eprintln!("warning: {}", warning);
    }
    eprintln!(
        "Done! {} files: {} images, {} videos ({} dated), {} filtered, {} other, {} unknown ({:.2}s)",
        result.total,
        result.images,
        result.videos,
        result.dated,
        result.filtered,
        result.other,
        result.unknown,
        t_total.elapsed().as_secs_f64()
    );

    Ok(())
}
