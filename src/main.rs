use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::{ info, error };

use voxel_optics::consts::{ NUM_THREADS, OUT_FILE };
use voxel_optics::error::SceneError;
use voxel_optics::parallel::parallel_render;
use voxel_optics::scene::{ Scene, Overrides };

/// Renders a JSON scene containing voxellated optical volumes to a PPM image.
#[derive(Parser, Debug)]
#[clap(name = "voxel-optics", version, about)]
struct Cli {
    /// Scene description (JSON)
    #[clap(parse(from_os_str))]
    scene: PathBuf,

    /// Where to write the rendered image
    #[clap(short, long, parse(from_os_str), default_value = OUT_FILE)]
    output: PathBuf,

    /// Number of render threads
    #[clap(short, long, default_value_t = NUM_THREADS)]
    threads: usize,

    /// Overrides the scene's recursion depth
    #[clap(short, long)]
    depth: Option<usize>,

    /// Overrides the step budget of every volume
    #[clap(short, long)]
    steps: Option<usize>,
}

fn run(cli: Cli) -> Result<(), SceneError> {
    let overrides = Overrides {
        recursion_depth: cli.depth,
        step_budget: cli.steps,
    };

    let scene = Scene::load(&cli.scene, &overrides)?;
    info!("Loaded {} objects from {}", scene.world.objects.len(), cli.scene.display());

    let canvas = parallel_render(
        scene.world, scene.camera, cli.threads, scene.recursion_depth
    )?;
    canvas.save(&cli.output)?;

    info!("Saved render to {}.", cli.output.display());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    if let Err(e) = run(Cli::parse()) {
        error!("{}", e);
        process::exit(1);
    }
}
