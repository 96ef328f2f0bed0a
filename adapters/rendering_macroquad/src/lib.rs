#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Room for Change.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature. Sound cues are therefore handled by the caller.
//!
//! Scenes use a y-up world; this backend flips the axis when projecting onto
//! the screen.

mod sprites;

use anyhow::{Context, Result};
use glam::Vec2;
use macroquad::input::{is_key_down, is_key_pressed, KeyCode};
use room_for_change_core::{Direction, EntityKind};
use room_for_change_rendering::{
    Color, EntityPresentation, FrameInput, Presentation, RenderingBackend, Scene, SpriteKey,
    TileVisual,
};
use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::mpsc,
    time::{Duration, Instant},
};
use tracing::{info, warn};

use self::sprites::{DrawParams, SpriteAtlas};

const WINDOW_WIDTH: i32 = 960;
const WINDOW_HEIGHT: i32 = 640;
const MINIMAP_MAX_EXTENT: f32 = 180.0;
const MINIMAP_MARGIN: f32 = 12.0;
const ZOOM_STEP: f32 = 0.1;

const FLOOR_COLOR: Color = Color::new(0.76, 0.64, 0.42, 1.0);
const WALL_COLOR: Color = Color::new(0.29, 0.22, 0.16, 1.0);
const CLOSED_DOOR_COLOR: Color = Color::new(0.55, 0.12, 0.10, 1.0);
const OPEN_DOOR_COLOR: Color = Color::new(0.86, 0.74, 0.50, 1.0);
const PLAYER_COLOR: Color = Color::new(0.20, 0.45, 0.85, 1.0);
const MUMMY_COLOR: Color = Color::new(0.90, 0.88, 0.78, 1.0);
const FACING_COLOR: Color = Color::new(0.05, 0.05, 0.05, 1.0);
const PAUSE_VEIL_COLOR: Color = Color::new(0.0, 0.0, 0.0, 0.45);
const MINIMAP_FRAME_COLOR: Color = Color::new(1.0, 1.0, 1.0, 0.8);
const MINIMAP_VIEW_COLOR: Color = Color::new(1.0, 0.85, 0.2, 0.9);

/// Snapshot of keyboard state observed during a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct KeyObservations {
    /// `Q` or `Escape` quit the game loop.
    quit_requested: bool,
    up_held: bool,
    down_held: bool,
    left_held: bool,
    right_held: bool,
    /// `W`, `S`, `A`, `D` request a quake; the first in that order wins.
    quake_up: bool,
    quake_down: bool,
    quake_left: bool,
    quake_right: bool,
    /// `P` or `Space` toggles pause.
    pause_pressed: bool,
    /// `M` toggles the minimap.
    minimap_pressed: bool,
    zoom_in_held: bool,
    zoom_out_held: bool,
}

impl KeyObservations {
    fn poll() -> Self {
        Self {
            quit_requested: is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q),
            up_held: is_key_down(KeyCode::Up),
            down_held: is_key_down(KeyCode::Down),
            left_held: is_key_down(KeyCode::Left),
            right_held: is_key_down(KeyCode::Right),
            quake_up: is_key_pressed(KeyCode::W),
            quake_down: is_key_pressed(KeyCode::S),
            quake_left: is_key_pressed(KeyCode::A),
            quake_right: is_key_pressed(KeyCode::D),
            pause_pressed: is_key_pressed(KeyCode::P) || is_key_pressed(KeyCode::Space),
            minimap_pressed: is_key_pressed(KeyCode::M),
            zoom_in_held: is_key_down(KeyCode::Equal) || is_key_down(KeyCode::KpAdd),
            zoom_out_held: is_key_down(KeyCode::Minus) || is_key_down(KeyCode::KpSubtract),
        }
    }

    fn frame_input(&self) -> FrameInput {
        let quake = [
            (self.quake_up, Direction::Up),
            (self.quake_down, Direction::Down),
            (self.quake_left, Direction::Left),
            (self.quake_right, Direction::Right),
        ]
        .into_iter()
        .find_map(|(pressed, direction)| pressed.then_some(direction));

        FrameInput {
            up: self.up_held,
            down: self.down_held,
            left: self.left_held,
            right: self.right_held,
            quake,
            pause_toggle: self.pause_pressed,
            minimap_toggle: self.minimap_pressed,
            zoom_in: self.zoom_in_held,
            zoom_out: self.zoom_out_held,
        }
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
    load_sprites: bool,
    manifest_path: PathBuf,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            show_fps: false,
            load_sprites: true,
            manifest_path: SpriteAtlas::default_manifest_path(),
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }

    /// Configures whether the backend should attempt to load sprite assets.
    #[must_use]
    pub fn with_sprite_loading(mut self, enabled: bool) -> Self {
        self.load_sprites = enabled;
        self
    }

    /// Overrides the sprite manifest location.
    #[must_use]
    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = path.into();
        self
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct FrameBreakdown {
    frame: Duration,
    update: Duration,
    render: Duration,
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
    update_accum: Duration,
    render_accum: Duration,
}

#[derive(Clone, Copy, Debug)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
    avg_update: Duration,
    avg_render: Duration,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second and trailing ten-second averages once
    /// one second has elapsed.
    fn record_frame(&mut self, breakdown: FrameBreakdown) -> Option<FpsMetrics> {
        self.elapsed += breakdown.frame;
        self.frames = self.frames.saturating_add(1);
        self.update_accum += breakdown.update;
        self.render_accum += breakdown.render;

        self.frame_times.push_back(breakdown.frame);
        self.window_duration += breakdown.frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            let Some(removed) = self.frame_times.pop_front() else {
                break;
            };
            self.window_duration = self.window_duration.saturating_sub(removed);
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let frames = self.frames.max(1);
        let per_second = self.frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing_ten_seconds = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };
        let metrics = FpsMetrics {
            per_second,
            trailing_ten_seconds,
            avg_update: self.update_accum / frames,
            avg_render: self.render_accum / frames,
        };

        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.update_accum = Duration::ZERO;
        self.render_accum = Duration::ZERO;
        Some(metrics)
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
            load_sprites,
            manifest_path,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: WINDOW_WIDTH,
            window_height: WINDOW_HEIGHT,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        let (atlas_init_sender, atlas_init_receiver) = mpsc::channel::<Result<()>>();

        macroquad::Window::from_config(config, async move {
            let mut init_sender = Some(atlas_init_sender);
            let mut scene = scene;

            let sprite_atlas = if load_sprites {
                match SpriteAtlas::from_manifest_path(&manifest_path)
                    .context("failed to initialise sprite atlas")
                {
                    Ok(atlas) => {
                        info!(textures = atlas.texture_count(), "sprite_atlas_loaded");
                        Some(atlas)
                    }
                    Err(error) => {
                        if let Some(sender) = init_sender.take() {
                            let _ = sender.send(Err(error));
                        }
                        return;
                    }
                }
            } else {
                None
            };

            if let Some(sender) = init_sender.take() {
                let _ = sender.send(Ok(()));
            }

            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();

            loop {
                let keys = KeyObservations::poll();
                if keys.quit_requested {
                    break;
                }

                macroquad::window::clear_background(background);

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));

                let update_start = Instant::now();
                let frame_input = keys.frame_input();
                if frame_input.zoom_in {
                    scene.camera.adjust_zoom(-ZOOM_STEP);
                }
                if frame_input.zoom_out {
                    scene.camera.adjust_zoom(ZOOM_STEP);
                }
                update_scene(frame_dt, frame_input, &mut scene);
                let update_duration = update_start.elapsed();

                let screen = Vec2::new(
                    macroquad::window::screen_width(),
                    macroquad::window::screen_height(),
                );
                let view = ViewMetrics::from_scene(&scene, screen);

                let render_start = Instant::now();
                draw_labyrinth(&scene, &view, sprite_atlas.as_ref());
                draw_entities(&scene.entities, &view, sprite_atlas.as_ref());
                if scene.paused {
                    macroquad::shapes::draw_rectangle(
                        0.0,
                        0.0,
                        screen.x,
                        screen.y,
                        to_macroquad_color(PAUSE_VEIL_COLOR),
                    );
                }
                if scene.show_minimap {
                    draw_minimap(&scene, screen);
                }
                let render_duration = render_start.elapsed();

                let fps_metrics = fps_counter.record_frame(FrameBreakdown {
                    frame: frame_dt,
                    update: update_duration,
                    render: render_duration,
                });
                if show_fps {
                    if let Some(FpsMetrics {
                        per_second,
                        trailing_ten_seconds,
                        avg_update,
                        avg_render,
                    }) = fps_metrics
                    {
                        info!(
                            fps = per_second,
                            fps_10s = trailing_ten_seconds,
                            update_ms = avg_update.as_secs_f64() * 1_000.0,
                            render_ms = avg_render.as_secs_f64() * 1_000.0,
                            "frame_metrics"
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        atlas_init_receiver.recv().unwrap_or_else(|_| Ok(()))?;

        Ok(())
    }
}

/// Projection from y-up world units onto y-down screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ViewMetrics {
    scale: f32,
    screen_center: Vec2,
    camera_center: Vec2,
    map_offset: Vec2,
}

impl ViewMetrics {
    fn from_scene(scene: &Scene, screen: Vec2) -> Self {
        let visible = scene.camera.visible_size();
        let scale = if visible.x <= f32::EPSILON || visible.y <= f32::EPSILON {
            1.0
        } else {
            (screen.x / visible.x).min(screen.y / visible.y)
        };
        Self {
            scale,
            screen_center: screen * 0.5,
            camera_center: scene.camera.center,
            map_offset: scene.map_offset,
        }
    }

    /// Screen pixel for a world point, before the map offset is applied.
    fn world_to_screen(&self, point: Vec2) -> Vec2 {
        let relative = (point + self.map_offset - self.camera_center) * self.scale;
        Vec2::new(
            self.screen_center.x + relative.x,
            self.screen_center.y - relative.y,
        )
    }

    /// Screen rectangle `(top_left, size)` for a world rectangle anchored at
    /// its lower-left corner.
    fn rect_to_screen(&self, position: Vec2, size: Vec2) -> (Vec2, Vec2) {
        let top_left = self.world_to_screen(Vec2::new(position.x, position.y + size.y));
        (top_left, size * self.scale)
    }
}

fn tile_color(tile: TileVisual) -> Color {
    match tile {
        TileVisual::Floor => FLOOR_COLOR,
        TileVisual::Wall => WALL_COLOR,
        TileVisual::ClosedDoor => CLOSED_DOOR_COLOR,
        TileVisual::OpenDoor => OPEN_DOOR_COLOR,
    }
}

fn entity_color(kind: EntityKind) -> Color {
    match kind {
        EntityKind::Player => PLAYER_COLOR,
        EntityKind::Mummy => MUMMY_COLOR,
    }
}

fn draw_sprite_or_rect(
    atlas: Option<&SpriteAtlas>,
    key: SpriteKey,
    params: DrawParams,
    fallback: Color,
) {
    let (top_left, size) = (params.position(), params.size());
    if let Some(atlas) = atlas {
        match atlas.draw(key, params) {
            Ok(()) => return,
            Err(error) => warn!(?key, %error, "sprite_draw_failed"),
        }
    }
    macroquad::shapes::draw_rectangle(
        top_left.x,
        top_left.y,
        size.x,
        size.y,
        to_macroquad_color(fallback),
    );
}

fn draw_labyrinth(scene: &Scene, view: &ViewMetrics, sprite_atlas: Option<&SpriteAtlas>) {
    let (columns, rows) = scene.visible_tiles();
    for row in rows {
        for column in columns.clone() {
            let Some(tile) = scene.labyrinth.tile(column, row) else {
                continue;
            };
            let (top_left, size) =
                view.rect_to_screen(Vec2::new(column as f32, row as f32), Vec2::ONE);
            draw_sprite_or_rect(
                sprite_atlas,
                SpriteKey::for_tile(tile),
                DrawParams::new(top_left, size),
                tile_color(tile),
            );
        }
    }
}

/// Small square drawn on the side of an entity it is facing.
fn facing_marker(entity: &EntityPresentation) -> (Vec2, Vec2) {
    let marker = entity.size * 0.25;
    let center = entity.center();
    let reach = (entity.size - marker) * 0.5;
    let offset = match entity.facing {
        Direction::Up => Vec2::new(0.0, reach.y),
        Direction::Down => Vec2::new(0.0, -reach.y),
        Direction::Left => Vec2::new(-reach.x, 0.0),
        Direction::Right => Vec2::new(reach.x, 0.0),
    };
    (center + offset - marker * 0.5, marker)
}

fn draw_entities(
    entities: &[EntityPresentation],
    view: &ViewMetrics,
    sprite_atlas: Option<&SpriteAtlas>,
) {
    for entity in entities {
        let bob = if entity.walking {
            (entity.state_time * 12.0).sin().abs() * 0.05
        } else {
            0.0
        };
        let position = entity.position + Vec2::new(0.0, bob);
        let (top_left, size) = view.rect_to_screen(position, entity.size);
        draw_sprite_or_rect(
            sprite_atlas,
            SpriteKey::for_entity(entity.kind),
            DrawParams::new(top_left, size).with_flip_x(entity.facing == Direction::Left),
            entity_color(entity.kind),
        );

        if sprite_atlas.is_none() {
            let (marker_position, marker_size) = facing_marker(entity);
            let (marker_top_left, marker_screen_size) =
                view.rect_to_screen(marker_position + Vec2::new(0.0, bob), marker_size);
            macroquad::shapes::draw_rectangle(
                marker_top_left.x,
                marker_top_left.y,
                marker_screen_size.x,
                marker_screen_size.y,
                to_macroquad_color(FACING_COLOR),
            );
        }
    }
}

/// Overview of the whole labyrinth drawn in the top-right corner.
#[derive(Clone, Copy, Debug, PartialEq)]
struct MinimapMetrics {
    scale: f32,
    origin: Vec2,
    size: Vec2,
}

impl MinimapMetrics {
    fn from_scene(scene: &Scene, screen: Vec2) -> Option<Self> {
        let width = scene.labyrinth.width();
        let height = scene.labyrinth.height();
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let scale = (MINIMAP_MAX_EXTENT / width).min(MINIMAP_MAX_EXTENT / height);
        let size = Vec2::new(width, height) * scale;
        let origin = Vec2::new(screen.x - size.x - MINIMAP_MARGIN, MINIMAP_MARGIN);
        Some(Self {
            scale,
            origin,
            size,
        })
    }

    /// Screen pixel for a labyrinth point, ignoring the map offset.
    fn project(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            self.origin.x + point.x * self.scale,
            self.origin.y + self.size.y - point.y * self.scale,
        )
    }
}

fn draw_minimap(scene: &Scene, screen: Vec2) {
    let Some(minimap) = MinimapMetrics::from_scene(scene, screen) else {
        return;
    };

    for row in 0..scene.labyrinth.rows {
        for column in 0..scene.labyrinth.columns {
            let Some(tile) = scene.labyrinth.tile(column, row) else {
                continue;
            };
            if tile == TileVisual::Floor {
                continue;
            }
            let top_left = minimap.project(Vec2::new(column as f32, row as f32 + 1.0));
            macroquad::shapes::draw_rectangle(
                top_left.x,
                top_left.y,
                minimap.scale,
                minimap.scale,
                to_macroquad_color(tile_color(tile)),
            );
        }
    }

    for entity in &scene.entities {
        let center = minimap.project(entity.center());
        macroquad::shapes::draw_rectangle(
            center.x - 1.5,
            center.y - 1.5,
            3.0,
            3.0,
            to_macroquad_color(entity_color(entity.kind)),
        );
    }

    let (view_min, view_max) = scene.camera.visible_bounds();
    let view_top_left = minimap.project(Vec2::new(
        view_min.x - scene.map_offset.x,
        view_max.y - scene.map_offset.y,
    ));
    let view_size = (view_max - view_min) * minimap.scale;
    macroquad::shapes::draw_rectangle_lines(
        view_top_left.x,
        view_top_left.y,
        view_size.x,
        view_size.y,
        1.5,
        to_macroquad_color(MINIMAP_VIEW_COLOR),
    );
    macroquad::shapes::draw_rectangle_lines(
        minimap.origin.x,
        minimap.origin.y,
        minimap.size.x,
        minimap.size.y,
        1.0,
        to_macroquad_color(MINIMAP_FRAME_COLOR),
    );
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
