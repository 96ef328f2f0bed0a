//! Labyrinth assembly from piece templates.
//!
//! A random spanning tree over the piece grid decides which neighbours must
//! connect. Pieces are then placed row by row, each choosing a template whose
//! door pattern agrees with the neighbours placed before it, keeps the outer
//! boundary sealed and opens every tree edge. Because every cell owns at
//! least one tree edge the constraints always admit a non-empty pattern.

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use room_for_change_core::{
    Direction, DoorPattern, EntityKind, LevelTile, PieceCoord, Planar, TileCoord, PIECE_COLUMNS,
    PIECE_ROWS,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    catalog::{edge_side, Catalog, DoorConstraints, SideConstraint, TemplateId},
    tiles::TileGrid,
};

/// Largest number of pieces accepted along either axis.
pub const MAX_PIECES_PER_AXIS: u32 = 256;

const DEFAULT_SEED: u64 = 0x5eed_0f_1ab7_41e5;
const DEFAULT_PIECES_PER_AXIS: u32 = 4;
const DEFAULT_MUMMIES: u32 = 3;

/// Parameters controlling labyrinth generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabyrinthConfig {
    pieces_wide: u32,
    pieces_high: u32,
    seed: u64,
    mummies: u32,
}

impl LabyrinthConfig {
    /// Creates a configuration for a labyrinth of the provided size.
    #[must_use]
    pub const fn new(pieces_wide: u32, pieces_high: u32, seed: u64) -> Self {
        Self {
            pieces_wide,
            pieces_high,
            seed,
            mummies: DEFAULT_MUMMIES,
        }
    }

    /// Returns a copy requesting `mummies` enemies.
    #[must_use]
    pub const fn with_mummies(mut self, mummies: u32) -> Self {
        self.mummies = mummies;
        self
    }

    /// Number of piece columns.
    #[must_use]
    pub const fn pieces_wide(&self) -> u32 {
        self.pieces_wide
    }

    /// Number of piece rows.
    #[must_use]
    pub const fn pieces_high(&self) -> u32 {
        self.pieces_high
    }

    /// Seed driving every random choice.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Requested number of enemies.
    #[must_use]
    pub const fn mummies(&self) -> u32 {
        self.mummies
    }
}

impl Default for LabyrinthConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PIECES_PER_AXIS, DEFAULT_PIECES_PER_AXIS, DEFAULT_SEED)
    }
}

/// A template instantiated at a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacedPiece {
    coord: PieceCoord,
    template: TemplateId,
    doors: DoorPattern,
}

impl PlacedPiece {
    /// Grid cell occupied by the piece.
    #[must_use]
    pub const fn coord(&self) -> PieceCoord {
        self.coord
    }

    /// Template the piece was instantiated from.
    #[must_use]
    pub const fn template(&self) -> TemplateId {
        self.template
    }

    /// Door flags inherited from the template.
    #[must_use]
    pub const fn doors(&self) -> DoorPattern {
        self.doors
    }
}

/// Initial placement of an entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spawn {
    /// Role of the spawned entity.
    pub kind: EntityKind,
    /// Centre of the piece the entity starts in.
    pub center: Planar,
}

/// Fully assembled labyrinth ready to be simulated.
#[derive(Clone, Debug)]
pub struct Labyrinth {
    columns: u32,
    rows: u32,
    pieces: Vec<PlacedPiece>,
    tiles: TileGrid,
    spawns: Vec<Spawn>,
}

impl Labyrinth {
    /// Number of piece columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of piece rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Placed pieces in row-major order, bottom row first.
    #[must_use]
    pub fn pieces(&self) -> &[PlacedPiece] {
        &self.pieces
    }

    /// Piece placed at `coord`, if any.
    #[must_use]
    pub fn piece(&self, coord: PieceCoord) -> Option<&PlacedPiece> {
        piece_index(coord, self.columns, self.rows).and_then(|index| self.pieces.get(index))
    }

    /// Flattened tile grid.
    #[must_use]
    pub const fn tiles(&self) -> &TileGrid {
        &self.tiles
    }

    /// Entity spawn points, player first.
    #[must_use]
    pub fn spawns(&self) -> &[Spawn] {
        &self.spawns
    }
}

/// Errors raised while assembling a labyrinth.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// The requested grid is too small to connect or too large to address.
    #[error("cannot build a {pieces_wide}x{pieces_high} labyrinth")]
    InvalidDimensions {
        /// Requested number of piece columns.
        pieces_wide: u32,
        /// Requested number of piece rows.
        pieces_high: u32,
    },
    /// No catalog template satisfies the door constraints of a cell.
    #[error("no template satisfies the door constraints at piece {piece:?}")]
    UnsatisfiableConstraints {
        /// Cell that could not be filled.
        piece: PieceCoord,
    },
}

/// Builds a labyrinth from the catalog according to `config`.
pub fn generate(catalog: &Catalog, config: &LabyrinthConfig) -> Result<Labyrinth, GenerationError> {
    let columns = config.pieces_wide();
    let rows = config.pieces_high();
    let piece_count = u64::from(columns) * u64::from(rows);
    if columns == 0
        || rows == 0
        || piece_count < 2
        || columns > MAX_PIECES_PER_AXIS
        || rows > MAX_PIECES_PER_AXIS
    {
        return Err(GenerationError::InvalidDimensions {
            pieces_wide: columns,
            pieces_high: rows,
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed());
    let links = carve_spanning_tree(columns, rows, &mut rng);
    let pieces = place_pieces(catalog, columns, rows, &links, &mut rng)?;
    let tiles = stitch(catalog, columns, rows, &pieces);
    let spawns = choose_spawns(&pieces, config.mummies(), &mut rng);

    info!(
        pieces_wide = columns,
        pieces_high = rows,
        seed = config.seed(),
        pieces = pieces.len(),
        mummies = spawns.len().saturating_sub(1),
        "labyrinth_generated"
    );

    Ok(Labyrinth {
        columns,
        rows,
        pieces,
        tiles,
        spawns,
    })
}

fn piece_index(coord: PieceCoord, columns: u32, rows: u32) -> Option<usize> {
    if coord.column() >= columns || coord.row() >= rows {
        return None;
    }
    usize::try_from(coord.row() * columns + coord.column()).ok()
}

fn coord_at(index: usize, columns: u32) -> PieceCoord {
    let index = index as u32;
    PieceCoord::new(index % columns, index / columns)
}

/// Recursive backtracker over the piece grid. The result holds, per cell,
/// the sides that are spanning-tree edges.
fn carve_spanning_tree(columns: u32, rows: u32, rng: &mut ChaCha8Rng) -> Vec<DoorPattern> {
    let cell_count = (columns * rows) as usize;
    let mut links = vec![DoorPattern::EMPTY; cell_count];
    let mut visited = vec![false; cell_count];
    let start = PieceCoord::new(0, 0);
    visited[0] = true;
    let mut stack = vec![start];

    while let Some(&current) = stack.last() {
        let unvisited: Vec<(Direction, PieceCoord)> = Direction::ALL
            .iter()
            .filter_map(|side| {
                current
                    .neighbor(*side, columns, rows)
                    .filter(|next| {
                        piece_index(*next, columns, rows).is_some_and(|index| !visited[index])
                    })
                    .map(|next| (*side, next))
            })
            .collect();

        let Some(&(side, next)) = unvisited.choose(rng) else {
            let _ = stack.pop();
            continue;
        };

        if let (Some(from), Some(to)) = (
            piece_index(current, columns, rows),
            piece_index(next, columns, rows),
        ) {
            links[from] = links[from].with(side, true);
            links[to] = links[to].with(side.opposite(), true);
            visited[to] = true;
        }
        stack.push(next);
    }

    links
}

fn place_pieces(
    catalog: &Catalog,
    columns: u32,
    rows: u32,
    links: &[DoorPattern],
    rng: &mut ChaCha8Rng,
) -> Result<Vec<PlacedPiece>, GenerationError> {
    let mut pieces: Vec<PlacedPiece> = Vec::with_capacity(links.len());

    for (index, tree_links) in links.iter().enumerate() {
        let coord = coord_at(index, columns);
        let mut constraints = DoorConstraints::unconstrained();
        for side in Direction::ALL {
            let constraint = match coord.neighbor(side, columns, rows) {
                None => SideConstraint::Closed,
                Some(neighbor) => {
                    let placed = piece_index(neighbor, columns, rows)
                        .and_then(|neighbor_index| pieces.get(neighbor_index));
                    match placed {
                        Some(piece) if piece.doors.is_open(side.opposite()) => SideConstraint::Open,
                        Some(_) => SideConstraint::Closed,
                        None if tree_links.is_open(side) => SideConstraint::Open,
                        None => SideConstraint::Free,
                    }
                }
            };
            constraints = constraints.with(side, constraint);
        }

        let candidates = catalog.matching(&constraints);
        let template = candidates
            .choose(rng)
            .ok_or(GenerationError::UnsatisfiableConstraints { piece: coord })?;

        debug!(
            column = coord.column(),
            row = coord.row(),
            template = template.id().index(),
            doors = template.doors().bits(),
            "piece_placed"
        );

        pieces.push(PlacedPiece {
            coord,
            template: template.id(),
            doors: template.doors(),
        });
    }

    Ok(pieces)
}

fn stitch(catalog: &Catalog, columns: u32, rows: u32, pieces: &[PlacedPiece]) -> TileGrid {
    let mut tiles = TileGrid::filled(columns * PIECE_COLUMNS, rows * PIECE_ROWS, LevelTile::Wall);

    for piece in pieces {
        let Some(template) = catalog.get(piece.template) else {
            continue;
        };
        let origin = piece.coord.origin_tile();
        for row in 0..PIECE_ROWS {
            for column in 0..PIECE_COLUMNS {
                let Some(tile) = template.tile(column, row) else {
                    continue;
                };
                let tile = match tile {
                    LevelTile::Door { .. } => LevelTile::Door {
                        open: door_connects(piece, column, row, columns, rows, pieces),
                    },
                    other => other,
                };
                let _ = tiles.set(
                    TileCoord::new(origin.column() + column, origin.row() + row),
                    tile,
                );
            }
        }
    }

    tiles
}

fn door_connects(
    piece: &PlacedPiece,
    column: u32,
    row: u32,
    columns: u32,
    rows: u32,
    pieces: &[PlacedPiece],
) -> bool {
    let Some(side) = edge_side(column, row) else {
        return false;
    };
    if !piece.doors.is_open(side) {
        return false;
    }
    piece
        .coord
        .neighbor(side, columns, rows)
        .and_then(|neighbor| piece_index(neighbor, columns, rows))
        .and_then(|index| pieces.get(index))
        .is_some_and(|neighbor| neighbor.doors.is_open(side.opposite()))
}

fn piece_center(coord: PieceCoord) -> Planar {
    let origin = coord.origin_tile();
    Planar::new(
        origin.column() as f32 + PIECE_COLUMNS as f32 * 0.5,
        origin.row() as f32 + PIECE_ROWS as f32 * 0.5,
    )
}

fn choose_spawns(pieces: &[PlacedPiece], mummies: u32, rng: &mut ChaCha8Rng) -> Vec<Spawn> {
    let start = PieceCoord::new(0, 0);
    let mut spawns = vec![Spawn {
        kind: EntityKind::Player,
        center: piece_center(start),
    }];

    let others: Vec<PieceCoord> = pieces
        .iter()
        .map(PlacedPiece::coord)
        .filter(|coord| *coord != start)
        .collect();
    let amount = usize::try_from(mummies).unwrap_or(usize::MAX).min(others.len());
    spawns.extend(others.choose_multiple(rng, amount).map(|coord| Spawn {
        kind: EntityKind::Mummy,
        center: piece_center(*coord),
    }));

    spawns
}
