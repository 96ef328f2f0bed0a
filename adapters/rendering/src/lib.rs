#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Room for Change adapters.
//!
//! Scenes are described in world units with a y-up axis: one tile is one
//! unit and the labyrinth's lower-left corner sits at the origin before the
//! map offset is applied. Backends own the conversion to screen space.

use anyhow::Result as AnyResult;
use glam::Vec2;
use room_for_change_core::{Direction, EntityKind, EntitySnapshot, EntityState, LevelTile};
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }

    /// Returns the same color with a replaced alpha channel.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Whether the walk-up key is held.
    pub up: bool,
    /// Whether the walk-down key is held.
    pub down: bool,
    /// Whether the walk-left key is held.
    pub left: bool,
    /// Whether the walk-right key is held.
    pub right: bool,
    /// Screen quake requested on this frame, if any.
    pub quake: Option<Direction>,
    /// Whether the pause key was pressed on this frame.
    pub pause_toggle: bool,
    /// Whether the minimap key was pressed on this frame.
    pub minimap_toggle: bool,
    /// Whether the zoom-in key is held.
    pub zoom_in: bool,
    /// Whether the zoom-out key is held.
    pub zoom_out: bool,
}

impl FrameInput {
    /// Held walking directions in the order they are applied: vertical keys
    /// first, then right before left.
    pub fn held_directions(&self) -> impl Iterator<Item = Direction> {
        [
            (self.up, Direction::Up),
            (self.down, Direction::Down),
            (self.right, Direction::Right),
            (self.left, Direction::Left),
        ]
        .into_iter()
        .filter_map(|(held, direction)| held.then_some(direction))
    }
}

/// Visual classification of a labyrinth tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileVisual {
    /// Walkable ground.
    Floor,
    /// Solid masonry.
    Wall,
    /// Doorway that leads nowhere.
    ClosedDoor,
    /// Doorway connecting two pieces.
    OpenDoor,
}

impl From<LevelTile> for TileVisual {
    fn from(tile: LevelTile) -> Self {
        match tile {
            LevelTile::Floor => Self::Floor,
            LevelTile::Wall => Self::Wall,
            LevelTile::Door { open: false } => Self::ClosedDoor,
            LevelTile::Door { open: true } => Self::OpenDoor,
        }
    }
}

/// Identifiers of the textures a backend may load from its sprite manifest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteKey {
    /// Floor tile texture.
    Floor,
    /// Wall tile texture.
    Wall,
    /// Closed door texture.
    DoorClosed,
    /// Open door texture.
    DoorOpen,
    /// Player character texture.
    Player,
    /// Mummy texture.
    Mummy,
}

impl SpriteKey {
    /// Every sprite key in manifest order.
    pub const ALL: [SpriteKey; 6] = [
        SpriteKey::Floor,
        SpriteKey::Wall,
        SpriteKey::DoorClosed,
        SpriteKey::DoorOpen,
        SpriteKey::Player,
        SpriteKey::Mummy,
    ];

    /// Texture used for a tile.
    #[must_use]
    pub const fn for_tile(tile: TileVisual) -> Self {
        match tile {
            TileVisual::Floor => Self::Floor,
            TileVisual::Wall => Self::Wall,
            TileVisual::ClosedDoor => Self::DoorClosed,
            TileVisual::OpenDoor => Self::DoorOpen,
        }
    }

    /// Texture used for an entity.
    #[must_use]
    pub const fn for_entity(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Player => Self::Player,
            EntityKind::Mummy => Self::Mummy,
        }
    }

    /// Name of the key inside sprite manifests.
    #[must_use]
    pub const fn manifest_name(self) -> &'static str {
        match self {
            Self::Floor => "Floor",
            Self::Wall => "Wall",
            Self::DoorClosed => "DoorClosed",
            Self::DoorOpen => "DoorOpen",
            Self::Player => "Player",
            Self::Mummy => "Mummy",
        }
    }
}

/// Flattened labyrinth tiles ready for drawing, stored bottom row first.
#[derive(Clone, Debug, PartialEq)]
pub struct LabyrinthPresentation {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Tile columns spanned by one piece.
    pub piece_columns: u32,
    /// Tile rows spanned by one piece.
    pub piece_rows: u32,
    tiles: Vec<TileVisual>,
}

impl LabyrinthPresentation {
    /// Creates a new labyrinth descriptor.
    ///
    /// Returns an error when the tile count differs from `columns * rows` or
    /// when a piece has no area.
    pub fn new(
        columns: u32,
        rows: u32,
        piece_columns: u32,
        piece_rows: u32,
        tiles: Vec<TileVisual>,
    ) -> std::result::Result<Self, RenderingError> {
        if piece_columns == 0 || piece_rows == 0 {
            return Err(RenderingError::InvalidPieceSize {
                columns: piece_columns,
                rows: piece_rows,
            });
        }
        let expected = u64::from(columns) * u64::from(rows);
        if tiles.len() as u64 != expected {
            return Err(RenderingError::TileCountMismatch {
                expected,
                actual: tiles.len(),
            });
        }

        Ok(Self {
            columns,
            rows,
            piece_columns,
            piece_rows,
            tiles,
        })
    }

    /// Tile at the provided position, if it lies inside the labyrinth.
    #[must_use]
    pub fn tile(&self, column: u32, row: u32) -> Option<TileVisual> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        let index = usize::try_from(u64::from(row) * u64::from(self.columns) + u64::from(column))
            .ok()?;
        self.tiles.get(index).copied()
    }

    /// Total width in world units.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.columns as f32
    }

    /// Total height in world units.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.rows as f32
    }

    /// Size of a single piece in world units.
    #[must_use]
    pub fn piece_size(&self) -> Vec2 {
        Vec2::new(self.piece_columns as f32, self.piece_rows as f32)
    }

    /// Number of pieces along each axis.
    #[must_use]
    pub const fn piece_counts(&self) -> (u32, u32) {
        (self.columns / self.piece_columns, self.rows / self.piece_rows)
    }
}

/// Immutable snapshot describing an entity within the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityPresentation {
    /// Role of the entity.
    pub kind: EntityKind,
    /// Lower-left corner in world units, before the map offset.
    pub position: Vec2,
    /// Extent in world units.
    pub size: Vec2,
    /// Facing direction.
    pub facing: Direction,
    /// Whether the entity is walking.
    pub walking: bool,
    /// Animation clock in seconds.
    pub state_time: f32,
}

impl EntityPresentation {
    /// Centre point in world units, before the map offset.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.position + self.size * 0.5
    }
}

impl From<&EntitySnapshot> for EntityPresentation {
    fn from(snapshot: &EntitySnapshot) -> Self {
        Self {
            kind: snapshot.kind,
            position: Vec2::new(snapshot.bounds.x, snapshot.bounds.y),
            size: Vec2::new(snapshot.bounds.width, snapshot.bounds.height),
            facing: snapshot.direction,
            walking: snapshot.state == EntityState::Walking,
            state_time: snapshot.state_time,
        }
    }
}

/// Orthographic camera looking at the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPresentation {
    /// Point at the centre of the screen, in world units.
    pub center: Vec2,
    /// Area visible at zoom 1.0, in world units.
    pub view: Vec2,
    /// Multiplier applied to the visible area.
    pub zoom: f32,
}

impl CameraPresentation {
    /// Smallest supported zoom factor.
    pub const MIN_ZOOM: f32 = 0.5;

    /// Largest supported zoom factor.
    pub const MAX_ZOOM: f32 = 10.0;

    /// Creates a camera showing `view` world units around `center`.
    #[must_use]
    pub const fn new(center: Vec2, view: Vec2) -> Self {
        Self {
            center,
            view,
            zoom: 1.0,
        }
    }

    /// Area visible with the current zoom, in world units.
    #[must_use]
    pub fn visible_size(&self) -> Vec2 {
        self.view * self.zoom
    }

    /// Lower-left and upper-right corners of the visible area.
    #[must_use]
    pub fn visible_bounds(&self) -> (Vec2, Vec2) {
        let half = self.visible_size() * 0.5;
        (self.center - half, self.center + half)
    }

    /// Adjusts the zoom by `delta`, keeping it inside the supported range.
    pub fn adjust_zoom(&mut self, delta: f32) {
        self.zoom = (self.zoom + delta).clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
    }
}

/// Scene description combining the labyrinth, its inhabitants and the camera.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Tiles of the labyrinth.
    pub labyrinth: LabyrinthPresentation,
    /// Translation applied to tiles and entities, in world units.
    pub map_offset: Vec2,
    /// Entities currently alive.
    pub entities: Vec<EntityPresentation>,
    /// Camera used for the main view.
    pub camera: CameraPresentation,
    /// Whether the simulation is paused.
    pub paused: bool,
    /// Whether the overview minimap should be drawn.
    pub show_minimap: bool,
}

impl Scene {
    /// Creates a new scene descriptor without entities.
    #[must_use]
    pub fn new(labyrinth: LabyrinthPresentation, camera: CameraPresentation) -> Self {
        Self {
            labyrinth,
            map_offset: Vec2::ZERO,
            entities: Vec::new(),
            camera,
            paused: false,
            show_minimap: true,
        }
    }

    /// Range of tile columns and rows that intersect the camera view,
    /// expressed as half-open `(columns, rows)` ranges.
    #[must_use]
    pub fn visible_tiles(&self) -> (std::ops::Range<u32>, std::ops::Range<u32>) {
        let (min, max) = self.camera.visible_bounds();
        let min = min - self.map_offset;
        let max = max - self.map_offset;
        let clamp = |value: f32, limit: u32| value.max(0.0).min(limit as f32) as u32;
        (
            clamp(min.x.floor(), self.labyrinth.columns)..clamp(max.x.ceil(), self.labyrinth.columns),
            clamp(min.y.floor(), self.labyrinth.rows)..clamp(max.y.ceil(), self.labyrinth.rows),
        )
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Room for Change scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, and may mutate the scene before it is
    /// rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderingError {
    /// The tile vector does not cover the labyrinth exactly.
    TileCountMismatch {
        /// Number of tiles implied by the dimensions.
        expected: u64,
        /// Number of tiles supplied.
        actual: usize,
    },
    /// Pieces must span at least one tile in each direction.
    InvalidPieceSize {
        /// Provided piece width in tiles.
        columns: u32,
        /// Provided piece height in tiles.
        rows: u32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TileCountMismatch { expected, actual } => {
                write!(f, "expected {expected} tiles but received {actual}")
            }
            Self::InvalidPieceSize { columns, rows } => {
                write!(f, "piece size must be positive (received {columns}x{rows})")
            }
        }
    }
}

impl Error for RenderingError {}
