use anyhow::{ensure, Context};
use clap::Parser;
use tracing::Level;

use bvh_motion::{load_bvh_from_file_with_options, EndSiteOffset, ImportOptions, PoseQuery, DEFAULT_MAX_DEPTH};

/// Print the hierarchy of a .bvh file and the world position of every joint at one frame.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The .bvh file to import
    input: String,
    /// Frame to evaluate
    #[arg(long, default_value_t = 0)]
    frame: usize,
    /// Skeleton (ROOT) to evaluate
    #[arg(long, default_value_t = 0)]
    skeleton: usize,
    /// Move the skeleton along its root trajectory
    #[arg(long)]
    root_offset: bool,
    /// Scale positions so the farthest joint of the first frame lies at this distance
    #[arg(long)]
    normalize: Option<f64>,
    /// Divide offsets by the longest offset of each skeleton while importing
    #[arg(long)]
    normalize_offsets: bool,
    /// Give End Sites their parent's offset instead of their own
    #[arg(long)]
    legacy_end_sites: bool,
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
    /// Print debug logs
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let end_site_offset = if cli.legacy_end_sites {
        EndSiteOffset::Parent
    } else {
        EndSiteOffset::Declared
    };
    let options = ImportOptions::default()
        .with_end_site_offset(end_site_offset)
        .with_normalized_offsets(cli.normalize_offsets)
        .with_max_depth(cli.max_depth);

    let mut motion = load_bvh_from_file_with_options(&cli.input, &options)
        .with_context(|| format!("failed to import {}", cli.input))?;

    ensure!(
        cli.frame < motion.frame_count(),
        "frame {} out of range, {} has {} frames",
        cli.frame,
        cli.input,
        motion.frame_count()
    );
    ensure!(
        cli.skeleton < motion.skeleton_count(),
        "skeleton {} out of range, {} has {} skeletons",
        cli.skeleton,
        cli.input,
        motion.skeleton_count()
    );

    if let Some(multiplier) = cli.normalize {
        motion
            .set_normalized_scale_with_multiplier(multiplier)
            .context("cannot normalize a skeleton with every joint at the origin")?;
    }

    println!("name: {}", motion.name());
    println!("frames: {}", motion.frame_count());
    println!("sampling rate: {} fps", motion.sampling_rate());
    println!("skeletons: {}", motion.skeleton_count());
    println!("scale: {}", motion.scale());
    println!();
    print!("{}", motion.hierarchy_dump());
    println!();

    let query = PoseQuery::new(cli.frame, cli.skeleton)
        .with_root_offset(cli.root_offset)
        .with_joint_positions();
    let pose = motion.query_skeletal_animation(&query);
    let positions = pose.joint_positions.unwrap_or_default();
    for (joint, position) in motion.root(cli.skeleton).iter().zip(positions) {
        println!(
            "{:<24} {:>12.4} {:>12.4} {:>12.4}",
            joint.name(),
            position.x,
            position.y,
            position.z
        );
    }

    Ok(())
}
