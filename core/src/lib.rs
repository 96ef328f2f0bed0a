#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Room for Change engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values.
//! Systems query immutable snapshots and respond exclusively with new command
//! batches.
//!
//! World space is y-up and measured in tiles: one tile is one world unit and
//! [`Direction::Up`] increases the `y` coordinate.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of tile columns spanned by a single labyrinth piece.
pub const PIECE_COLUMNS: u32 = 12;

/// Number of tile rows spanned by a single labyrinth piece.
pub const PIECE_ROWS: u32 = 8;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Advances the simulation by a single fixed step.
    Tick {
        /// Length of the fixed step.
        dt: Duration,
    },
    /// Requests that an entity accelerate toward the provided direction.
    Accelerate {
        /// Identifier of the entity expressing the intent.
        entity: EntityId,
        /// Direction of the requested acceleration.
        direction: Direction,
    },
    /// Freezes entity simulation until [`Command::ResumeEntities`] arrives.
    PauseEntities,
    /// Unfreezes entity simulation.
    ResumeEntities,
    /// Shifts the map offset by one piece in the provided direction.
    MoveLabyrinthPiece {
        /// Direction the labyrinth is shifted toward.
        direction: Direction,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the step.
        dt: Duration,
    },
    /// Reports that an entity slowed below walking speed and became idle.
    EntityStopped {
        /// Identifier of the entity that stopped.
        entity: EntityId,
    },
    /// Confirms that entity simulation was frozen.
    EntitiesPaused,
    /// Confirms that entity simulation resumed.
    EntitiesResumed,
    /// Confirms that the labyrinth map offset moved by one piece.
    LabyrinthPieceMoved {
        /// Direction of the shift.
        direction: Direction,
        /// Map offset after the shift was applied.
        offset: MapOffset,
    },
}

/// Cardinal directions used for movement intents and door sides.
///
/// The declaration order matches the door flag order of piece templates:
/// top, bottom, left, right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward increasing `y`.
    Up,
    /// Toward decreasing `y`.
    Down,
    /// Toward decreasing `x`.
    Left,
    /// Toward increasing `x`.
    Right,
}

impl Direction {
    /// Every direction in door flag order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Unit step along the x and y axes.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, 1),
            Self::Down => (0, -1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Position of the direction within [`Direction::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::Left => 2,
            Self::Right => 3,
        }
    }
}

/// Four-bit description of which sides of a piece carry a passable opening.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DoorPattern(u8);

impl DoorPattern {
    /// Pattern without any doors.
    pub const EMPTY: DoorPattern = DoorPattern(0);

    /// Builds a pattern from flags ordered top, bottom, left, right.
    #[must_use]
    pub const fn from_flags(flags: [bool; 4]) -> Self {
        let mut bits = 0;
        let mut index = 0;
        while index < 4 {
            if flags[index] {
                bits |= 1 << index;
            }
            index += 1;
        }
        Self(bits)
    }

    /// Builds a pattern with doors on exactly the provided sides.
    #[must_use]
    pub fn from_sides(sides: &[Direction]) -> Self {
        sides
            .iter()
            .fold(Self::EMPTY, |pattern, side| pattern.with(*side, true))
    }

    /// Returns a copy with the door on `side` set to `open`.
    #[must_use]
    pub const fn with(self, side: Direction, open: bool) -> Self {
        let mask = 1 << side.index();
        if open {
            Self(self.0 | mask)
        } else {
            Self(self.0 & !mask)
        }
    }

    /// Reports whether the pattern has a door on `side`.
    #[must_use]
    pub const fn is_open(self, side: Direction) -> bool {
        self.0 & (1 << side.index()) != 0
    }

    /// Door flags ordered top, bottom, left, right.
    #[must_use]
    pub const fn flags(self) -> [bool; 4] {
        [
            self.is_open(Direction::Up),
            self.is_open(Direction::Down),
            self.is_open(Direction::Left),
            self.is_open(Direction::Right),
        ]
    }

    /// Reports whether the pattern has no doors.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of open sides.
    #[must_use]
    pub const fn door_count(self) -> u32 {
        self.0.count_ones()
    }

    /// Raw bit representation, one bit per side in [`Direction::ALL`] order.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Iterates every pattern with at least one door.
    pub fn non_empty() -> impl Iterator<Item = DoorPattern> {
        (1_u8..16).map(DoorPattern)
    }
}

/// Location of a piece within the labyrinth's piece grid.
///
/// Row zero is the bottom row of the labyrinth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceCoord {
    column: u32,
    row: u32,
}

impl PieceCoord {
    /// Creates a new piece coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the piece.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the piece.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Neighbouring piece across `side`, if it lies inside a grid of the
    /// provided dimensions.
    #[must_use]
    pub fn neighbor(self, side: Direction, columns: u32, rows: u32) -> Option<PieceCoord> {
        let (dx, dy) = side.delta();
        let column = self.column.checked_add_signed(dx)?;
        let row = self.row.checked_add_signed(dy)?;
        (column < columns && row < rows).then_some(PieceCoord::new(column, row))
    }

    /// Piece containing the world point `(x, y)`, or `None` when the point
    /// lies left of or below the labyrinth origin.
    ///
    /// Points on a shared edge belong to the piece above or to the right.
    #[must_use]
    pub fn containing(x: f32, y: f32) -> Option<PieceCoord> {
        let column = (x / PIECE_COLUMNS as f32).floor();
        let row = (y / PIECE_ROWS as f32).floor();
        let representable = |value: f32| (0.0..=u32::MAX as f32).contains(&value);
        if !(representable(column) && representable(row)) {
            return None;
        }
        Some(PieceCoord::new(column as u32, row as u32))
    }

    /// Lower-left tile covered by the piece.
    #[must_use]
    pub const fn origin_tile(&self) -> TileCoord {
        TileCoord::new(self.column * PIECE_COLUMNS, self.row * PIECE_ROWS)
    }
}

/// Location of a single tile within the flattened level grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// One cell of the flattened level grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelTile {
    /// Walkable ground.
    Floor,
    /// Solid masonry.
    Wall,
    /// Doorway on a piece edge.
    Door {
        /// Whether the door connects to a facing door and can be walked through.
        open: bool,
    },
}

impl LevelTile {
    /// Reports whether entities collide with the tile.
    #[must_use]
    pub const fn is_collidable(&self) -> bool {
        match self {
            Self::Floor => false,
            Self::Wall => true,
            Self::Door { open } => !*open,
        }
    }

    /// Reports whether the tile is a door regardless of its state.
    #[must_use]
    pub const fn is_door(&self) -> bool {
        matches!(self, Self::Door { .. })
    }
}

/// Offset applied to the labyrinth when presenting it, measured in pieces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapOffset {
    /// Horizontal offset in pieces.
    pub columns: i32,
    /// Vertical offset in pieces.
    pub rows: i32,
}

impl MapOffset {
    /// Creates a new map offset.
    #[must_use]
    pub const fn new(columns: i32, rows: i32) -> Self {
        Self { columns, rows }
    }

    /// Returns the offset moved one piece toward `direction`.
    #[must_use]
    pub const fn shifted(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            columns: self.columns.saturating_add(dx),
            rows: self.rows.saturating_add(dy),
        }
    }
}

/// Two-component vector used for velocities and accelerations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Planar {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

impl Planar {
    /// Vector with both components set to zero.
    pub const ZERO: Planar = Planar { x: 0.0, y: 0.0 };

    /// Creates a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in world units anchored at its lower-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge.
    pub x: f32,
    /// Bottom edge.
    pub y: f32,
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Bounds {
    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Top edge.
    #[must_use]
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// Centre point as `(x, y)`.
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Reports whether the rectangles share interior area. Touching edges do
    /// not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.top()
            && self.top() > other.y
    }
}

/// Unique identifier assigned to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Role played by an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// The character steered by the player's input.
    Player,
    /// Wandering enemy that chases the player within a piece.
    Mummy,
}

impl EntityKind {
    /// Reports whether adapter input may steer entities of this kind.
    #[must_use]
    pub const fn accepts_input(self) -> bool {
        matches!(self, Self::Player)
    }
}

/// Discrete locomotion state of an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityState {
    /// Standing still.
    #[default]
    Idle,
    /// Moving under its own acceleration.
    Walking,
}

/// Immutable representation of a single entity used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Unique identifier assigned to the entity.
    pub id: EntityId,
    /// Role of the entity.
    pub kind: EntityKind,
    /// Locomotion state.
    pub state: EntityState,
    /// Facing direction derived from the latest movement intent.
    pub direction: Direction,
    /// Bounding box in world units.
    pub bounds: Bounds,
    /// Velocity expressed in world units per step.
    pub velocity: Planar,
    /// Animation clock in seconds.
    pub state_time: f32,
}

/// Read-only snapshot describing every entity in the level.
#[derive(Clone, Debug, Default)]
pub struct EntityView {
    snapshots: Vec<EntitySnapshot>,
}

impl EntityView {
    /// Creates a new entity view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EntitySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the first entity of the requested kind, if any.
    #[must_use]
    pub fn first_of(&self, kind: EntityKind) -> Option<&EntitySnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.kind == kind)
    }

}

/// Sounds the core can ask the audio collaborator to play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Grinding stone door played while the labyrinth shifts.
    StoneDoor,
}

/// Fire-and-forget request to play a sound.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoundCue {
    /// Sound to play.
    pub effect: SoundEffect,
    /// Playback volume in the range 0.0..=1.0.
    pub volume: f32,
    /// Playback pitch multiplier.
    pub pitch: f32,
}

impl SoundCue {
    /// Cue played when a screen quake starts.
    #[must_use]
    pub const fn stone_door() -> Self {
        Self {
            effect: SoundEffect::StoneDoor,
            volume: 0.5,
            pitch: 1.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containing_piece_floors_world_points() {
        assert_eq!(PieceCoord::containing(0.0, 0.0), Some(PieceCoord::new(0, 0)));
        assert_eq!(PieceCoord::containing(11.99, 7.99), Some(PieceCoord::new(0, 0)));
        assert_eq!(PieceCoord::containing(12.0, 8.0), Some(PieceCoord::new(1, 1)));
        assert_eq!(PieceCoord::containing(30.0, 4.0), Some(PieceCoord::new(2, 0)));
        assert_eq!(PieceCoord::containing(-0.5, 4.0), None);
        assert_eq!(PieceCoord::containing(4.0, -0.5), None);
        assert_eq!(PieceCoord::containing(f32::NAN, 4.0), None);
    }

    #[test]
    fn opposite_directions_pair_up() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            let (dx, dy) = direction.delta();
            let (ox, oy) = direction.opposite().delta();
            assert_eq!((dx + ox, dy + oy), (0, 0));
        }
    }

    #[test]
    fn door_pattern_flags_follow_direction_order() {
        let pattern = DoorPattern::from_flags([true, false, false, true]);
        assert!(pattern.is_open(Direction::Up));
        assert!(!pattern.is_open(Direction::Down));
        assert!(!pattern.is_open(Direction::Left));
        assert!(pattern.is_open(Direction::Right));
        assert_eq!(pattern.flags(), [true, false, false, true]);
        assert_eq!(
            pattern,
            DoorPattern::from_sides(&[Direction::Right, Direction::Up])
        );
    }

    #[test]
    fn non_empty_patterns_cover_fifteen_combinations() {
        let patterns: Vec<_> = DoorPattern::non_empty().collect();
        assert_eq!(patterns.len(), 15);
        assert!(patterns.iter().all(|pattern| !pattern.is_empty()));
        assert!(DoorPattern::EMPTY.is_empty());
        assert_eq!(DoorPattern::EMPTY.with(Direction::Left, true).door_count(), 1);
    }

    #[test]
    fn piece_neighbors_respect_grid_bounds() {
        let corner = PieceCoord::new(0, 0);
        assert_eq!(corner.neighbor(Direction::Down, 3, 2), None);
        assert_eq!(corner.neighbor(Direction::Left, 3, 2), None);
        assert_eq!(
            corner.neighbor(Direction::Up, 3, 2),
            Some(PieceCoord::new(0, 1))
        );
        assert_eq!(PieceCoord::new(0, 1).neighbor(Direction::Up, 3, 2), None);
        assert_eq!(
            PieceCoord::new(2, 1).origin_tile(),
            TileCoord::new(24, 8)
        );
    }

    #[test]
    fn door_tiles_collide_only_when_closed() {
        assert!(LevelTile::Wall.is_collidable());
        assert!(!LevelTile::Floor.is_collidable());
        assert!(LevelTile::Door { open: false }.is_collidable());
        assert!(!LevelTile::Door { open: true }.is_collidable());
    }

    #[test]
    fn touching_bounds_do_not_overlap() {
        let tile = Bounds::new(5.0, 2.0, 1.0, 1.0);
        let flush = Bounds::new(4.2, 2.0, 0.8, 0.8);
        let intruding = Bounds::new(4.3, 2.0, 0.8, 0.8);
        assert!(!flush.overlaps(&tile));
        assert!(intruding.overlaps(&tile));
    }

    #[test]
    fn commands_round_trip_through_bincode() {
        let command = Command::Accelerate {
            entity: EntityId::new(7),
            direction: Direction::Left,
        };
        let bytes = bincode::serialize(&command).expect("serialize");
        let restored: Command = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, command);
    }
}
