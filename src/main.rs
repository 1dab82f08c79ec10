//! deskfolio - interactive 3D portfolio viewer
//!
//! Opens a desk scene with named camera views, hoverable and clickable
//! objects and free-fly or orbit navigation. A hosted glTF scene can be
//! opened instead with `--hosted`.

mod app;
mod assets;
mod config;
mod controller;
mod interaction;
mod loading;
mod presentation;
mod render;
mod scene;
mod ui;

use assets::SceneSource;
use clap::Parser;
use controller::SceneRole;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug, Clone)]
#[command(name = "deskfolio")]
#[command(about = "Interactive 3D portfolio viewer", long_about = None)]
struct Cli {
    /// Portfolio scene (.gltf/.glb); defaults to the config's scene path
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Portfolio config JSON; the built-in config is used when missing or invalid
    #[arg(long)]
    config: Option<PathBuf>,

    /// URL of a hosted glTF/GLB scene, shown behind an enter gate
    #[arg(long, conflicts_with = "scene")]
    hosted: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let config = match config::load_or_builtin(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            log::error!("No usable config: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let (source, role) = match cli.hosted {
        Some(url) => (SceneSource::Remote(url), SceneRole::Hosted),
        None => {
            let path = cli
                .scene
                .unwrap_or_else(|| PathBuf::from(&config.scene_path));
            (SceneSource::File(path), SceneRole::Portfolio)
        }
    };

    match app::run(app::LaunchOptions {
        config,
        source,
        role,
    }) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
