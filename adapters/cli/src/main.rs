#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots Room for Change.

mod audio;
mod config;
mod game;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use room_for_change_rendering::{Color, Presentation, RenderingBackend};
use room_for_change_rendering_macroquad::MacroquadBackend;
use room_for_change_world::Catalog;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    audio::TracingAudioSink,
    config::{FileConfig, Overrides},
    game::Game,
};

const WINDOW_TITLE: &str = "Room for Change";
const BACKGROUND: Color = Color::from_rgb_u8(18, 14, 10);

#[derive(Debug, Parser)]
#[command(
    name = "room-for-change",
    about = "Wander a labyrinth of stone rooms that shift under your feet"
)]
struct Args {
    /// TOML file with `[labyrinth]` and `[simulation]` sections.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Seed for labyrinth generation. Defaults to the current time.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of piece columns.
    #[arg(long)]
    pieces_wide: Option<u32>,

    /// Number of piece rows.
    #[arg(long)]
    pieces_high: Option<u32>,

    /// Number of mummies roaming the labyrinth.
    #[arg(long)]
    mummies: Option<u32>,

    /// Synchronise presentation with the display refresh rate.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    vsync: bool,

    /// Log frame timing once per second.
    #[arg(long)]
    show_fps: bool,

    /// Draw coloured rectangles instead of loading sprite assets.
    #[arg(long)]
    no_sprites: bool,

    /// Sprite manifest to load instead of `assets/manifest.toml`.
    #[arg(long, value_name = "PATH", conflicts_with = "no_sprites")]
    sprite_manifest: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            pieces_wide: self.pieces_wide,
            pieces_high: self.pieces_high,
            seed: self.seed,
            mummies: self.mummies,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Entry point for the Room for Change command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let config = config::resolve(file, args.overrides(), config::seed_from_clock)?;
    info!(
        pieces_wide = config.labyrinth.pieces_wide(),
        pieces_high = config.labyrinth.pieces_high(),
        seed = config.labyrinth.seed(),
        mummies = config.labyrinth.mummies(),
        steps_per_second = config.steps_per_second,
        "configuration_resolved"
    );

    let catalog = Catalog::load_templates().context("built-in piece templates are invalid")?;
    let mut game = Game::new(&catalog, &config, TracingAudioSink)?;
    let scene = game.initial_scene()?;
    let presentation = Presentation::new(WINDOW_TITLE, BACKGROUND, scene);

    let mut backend = MacroquadBackend::new()
        .with_vsync(args.vsync)
        .with_show_fps(args.show_fps)
        .with_sprite_loading(!args.no_sprites);
    if let Some(manifest) = args.sprite_manifest {
        backend = backend.with_manifest_path(manifest);
    }

    backend.run(presentation, move |dt, input, scene| {
        game.frame(dt, input, scene);
    })
}
