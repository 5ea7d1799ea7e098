mod cli;

use hdsforge::{config, timeline};
use hdsforge_media::{parse_bootstrap, Packager, SourceBuffer};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, LayoutArgs};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "hdsforge=debug,hdsforge_media=debug".to_string()
        } else {
            "hdsforge=info,hdsforge_media=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Package {
            timeline,
            src,
            layout,
            dry_run,
        } => package(&timeline, &src, layout, cli.config.as_deref(), dry_run),
        Commands::Inspect { timeline, json } => inspect(&timeline, json),
        Commands::DumpBootstrap { file } => dump_bootstrap(&file),
        Commands::Version => {
            println!("hdsforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn package(
    timeline_path: &Path,
    src: &Path,
    layout: LayoutArgs,
    config_path: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    layout.apply(&mut config);
    let packager = Packager::new(config)?;

    // An upstream failure ends the run before the source is touched.
    let timeline = timeline::load_timeline(timeline_path)?.into_timeline()?;

    if !src.exists() {
        anyhow::bail!("Source file does not exist: {:?}", src);
    }
    let source = SourceBuffer::open(src)?;
    tracing::info!("Packaging {:?} ({} bytes)", src, source.len());

    if dry_run {
        let (report, sink) = packager.dry_run(&timeline, &source)?;
        println!(
            "[DRY RUN] Would write {} fragments ({} bytes) to {}",
            report.fragments.len(),
            sink.total_bytes(),
            packager.config().fragments_path().display()
        );
        for fragment in &report.fragments {
            println!(
                "  {}  start={:.3}s duration={:.3}s size={}",
                fragment.path.display(),
                fragment.start,
                fragment.duration,
                fragment.data_size + 8
            );
        }
        println!("[DRY RUN] Would write bootstrap to {}", report.bootstrap_path.display());
        println!("[DRY RUN] Would write manifest to {}", report.manifest_path.display());
        return Ok(());
    }

    let report = packager.package(&timeline, &source)?;

    println!("Fragments: {}", report.fragments.len());
    println!("Fragment data: {} bytes", report.fragment_bytes());
    println!("Duration: {}s", report.duration);
    println!("Bootstrap: {}", report.bootstrap_path.display());
    println!("Manifest: {}", report.manifest_path.display());

    Ok(())
}

fn inspect(timeline_path: &Path, json: bool) -> Result<()> {
    let timeline = timeline::load_timeline(timeline_path)?.into_timeline()?;
    let caps = &timeline.capabilities;
    let video = caps.video.clone().unwrap_or_default();
    let keyframes = timeline
        .samples
        .iter()
        .filter(|s| s.is_video_keyframe())
        .count();

    if json {
        let summary = serde_json::json!({
            "samples": timeline.sample_count(),
            "keyframes": keyframes,
            "has_video": caps.has_video(),
            "has_audio": caps.has_audio(),
            "width": video.width,
            "height": video.height,
            "pwidth": video.pwidth,
            "pheight": video.pheight,
            "bitrate": caps.bitrate,
            "duration": timeline.duration,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Samples: {}", timeline.sample_count());
        println!("Keyframes: {}", keyframes);
        println!("Has video: {}", caps.has_video());
        println!("Has audio: {}", caps.has_audio());
        if caps.has_video() {
            println!("Size: {}x{}", video.width, video.height);
            println!("Display size: {}x{}", video.pwidth, video.pheight);
        }
        println!("Bitrate: {}", caps.bitrate);
        println!("Duration: {}s", timeline.duration);
    }

    Ok(())
}

fn dump_bootstrap(file: &Path) -> Result<()> {
    let data = std::fs::read(file)
        .with_context(|| format!("Failed to read bootstrap file: {:?}", file))?;
    let index = parse_bootstrap(&data)
        .with_context(|| format!("Failed to parse bootstrap file: {:?}", file))?;

    println!("Bootstrap version: {}", index.bootstrap_version);
    println!("Timescale: {}", index.timescale);
    println!("Media time: {}", index.current_media_time);

    println!("\nSegment runs: {}", index.segment_runs.len());
    for run in &index.segment_runs {
        println!(
            "  first={} fragments={}",
            run.first_segment, run.fragments_per_segment
        );
    }

    println!(
        "\nFragment runs: {} (timescale {})",
        index.fragment_runs.len(),
        index.fragment_timescale
    );
    for entry in &index.fragment_runs {
        print!(
            "  [{}] start={} duration={}",
            entry.first_fragment, entry.timestamp, entry.duration
        );
        if let Some(discontinuity) = entry.discontinuity {
            print!(" discontinuity={}", discontinuity);
        }
        println!();
    }

    Ok(())
}
