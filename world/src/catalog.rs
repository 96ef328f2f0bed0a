//! Piece template catalog.
//!
//! Templates are derived from bitmaps whose pixel colours encode tile types.
//! The catalog is an owned value: build it once with
//! [`Catalog::load_templates`] and hand it to the generator by reference.

use rand::{seq::SliceRandom, Rng};
use room_for_change_core::{Direction, DoorPattern, LevelTile, PIECE_COLUMNS, PIECE_ROWS};
use thiserror::Error;
use tracing::debug;

use crate::templates::builtin_bitmaps;

/// RGBA pixel as stored in a piece bitmap.
pub type Rgba = [u8; 4];

/// Pixel colour classified as solid masonry.
pub const WALL_PIXEL: Rgba = [0x00, 0x00, 0x00, 0xff];

/// Pixel colour classified as a doorway.
pub const DOOR_PIXEL: Rgba = [0xff, 0x00, 0x00, 0xff];

/// Pixel colour classified as floor. Any colour that is neither a wall nor a
/// door also counts as floor.
pub const FLOOR_PIXEL: Rgba = [0xff, 0xff, 0xff, 0xff];

/// Raw template source: a bitmap stored row by row, top row first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PieceBitmap {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl PieceBitmap {
    /// Creates a bitmap from its dimensions and top-first pixel rows.
    #[must_use]
    pub fn new(width: u32, height: u32, pixels: Vec<Rgba>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Width of the bitmap in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the bitmap in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at `column` within the row counted from the top.
    #[must_use]
    pub fn pixel(&self, column: u32, row_from_top: u32) -> Option<Rgba> {
        if column >= self.width || row_from_top >= self.height {
            return None;
        }
        let index = usize::try_from(row_from_top * self.width + column).ok()?;
        self.pixels.get(index).copied()
    }
}

/// Maps a bitmap pixel to the tile it describes.
#[must_use]
pub fn tile_for_pixel(pixel: Rgba) -> LevelTile {
    let [red, green, blue, _] = pixel;
    if red < 0x40 && green < 0x40 && blue < 0x40 {
        LevelTile::Wall
    } else if red >= 0xc0 && green < 0x40 && blue < 0x40 {
        LevelTile::Door { open: false }
    } else {
        LevelTile::Floor
    }
}

/// Position of a template inside its catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(usize);

impl TemplateId {
    /// Zero-based catalog index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }
}

/// Immutable room layout paired with its door configuration.
///
/// Tiles are stored y-up: row zero is the bottom edge of the piece.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PieceTemplate {
    id: TemplateId,
    doors: DoorPattern,
    tiles: Vec<LevelTile>,
}

impl PieceTemplate {
    /// Identifier of the template within its catalog.
    #[must_use]
    pub const fn id(&self) -> TemplateId {
        self.id
    }

    /// Sides of the piece that carry a door.
    #[must_use]
    pub const fn doors(&self) -> DoorPattern {
        self.doors
    }

    /// Tile at the piece-local position, if it lies inside the piece.
    #[must_use]
    pub fn tile(&self, column: u32, row: u32) -> Option<LevelTile> {
        if column >= PIECE_COLUMNS || row >= PIECE_ROWS {
            return None;
        }
        let index = usize::try_from(row * PIECE_COLUMNS + column).ok()?;
        self.tiles.get(index).copied()
    }

    fn from_bitmap(
        id: TemplateId,
        bitmap: &PieceBitmap,
        doors: DoorPattern,
    ) -> Result<Self, CatalogError> {
        let expected_pixels = usize::try_from(PIECE_COLUMNS * PIECE_ROWS).unwrap_or(usize::MAX);
        if bitmap.width() != PIECE_COLUMNS
            || bitmap.height() != PIECE_ROWS
            || bitmap.pixels.len() != expected_pixels
        {
            return Err(CatalogError::Dimensions {
                template: id.index(),
                width: bitmap.width(),
                height: bitmap.height(),
            });
        }

        let mut tiles = Vec::with_capacity(expected_pixels);
        for row in 0..PIECE_ROWS {
            let row_from_top = PIECE_ROWS - 1 - row;
            for column in 0..PIECE_COLUMNS {
                let pixel = bitmap
                    .pixel(column, row_from_top)
                    .ok_or(CatalogError::Dimensions {
                        template: id.index(),
                        width: bitmap.width(),
                        height: bitmap.height(),
                    })?;
                tiles.push(tile_for_pixel(pixel));
            }
        }

        let template = Self { id, doors, tiles };
        template.validate_doors()?;
        Ok(template)
    }

    fn validate_doors(&self) -> Result<(), CatalogError> {
        for row in 0..PIECE_ROWS {
            for column in 0..PIECE_COLUMNS {
                let is_door = self.tile(column, row).is_some_and(|tile| tile.is_door());
                if is_door && edge_side(column, row).is_none() {
                    return Err(CatalogError::StrayDoor {
                        template: self.id.index(),
                        column,
                        row,
                    });
                }
            }
        }

        for side in Direction::ALL {
            let has_door_tiles = edge_tiles(side)
                .any(|(column, row)| self.tile(column, row).is_some_and(|tile| tile.is_door()));
            if has_door_tiles != self.doors.is_open(side) {
                return Err(CatalogError::DoorMismatch {
                    template: self.id.index(),
                    side,
                    flagged: self.doors.is_open(side),
                });
            }
        }
        Ok(())
    }
}

/// Requirement placed on one side of a piece during generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SideConstraint {
    /// The side must carry a door.
    Open,
    /// The side must not carry a door.
    Closed,
    /// Either outcome is acceptable.
    Free,
}

impl SideConstraint {
    fn admits(self, open: bool) -> bool {
        match self {
            Self::Open => open,
            Self::Closed => !open,
            Self::Free => true,
        }
    }
}

/// Per-side constraints ordered like [`Direction::ALL`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DoorConstraints([SideConstraint; 4]);

impl DoorConstraints {
    /// Constraint set that accepts every pattern.
    #[must_use]
    pub const fn unconstrained() -> Self {
        Self([SideConstraint::Free; 4])
    }

    /// Returns a copy with `side` constrained as requested.
    #[must_use]
    pub const fn with(mut self, side: Direction, constraint: SideConstraint) -> Self {
        self.0[side.index()] = constraint;
        self
    }

    /// Constraint currently applied to `side`.
    #[must_use]
    pub const fn side(&self, side: Direction) -> SideConstraint {
        self.0[side.index()]
    }

    /// Reports whether `pattern` satisfies every side.
    #[must_use]
    pub fn admits(&self, pattern: DoorPattern) -> bool {
        Direction::ALL
            .iter()
            .all(|side| self.side(*side).admits(pattern.is_open(*side)))
    }
}

/// Owned collection of piece templates.
#[derive(Clone, Debug)]
pub struct Catalog {
    templates: Vec<PieceTemplate>,
}

impl Catalog {
    /// Loads the fifteen built-in templates, one per non-empty door pattern.
    pub fn load_templates() -> Result<Self, CatalogError> {
        Self::from_bitmaps(builtin_bitmaps())
    }

    /// Builds a catalog from bitmaps paired with their door flags.
    pub fn from_bitmaps(entries: Vec<(PieceBitmap, DoorPattern)>) -> Result<Self, CatalogError> {
        let mut templates: Vec<PieceTemplate> = Vec::with_capacity(entries.len());
        for (index, (bitmap, doors)) in entries.iter().enumerate() {
            if doors.is_empty() {
                return Err(CatalogError::EmptyPattern { template: index });
            }
            if let Some(existing) = templates.iter().find(|template| template.doors == *doors) {
                return Err(CatalogError::DuplicatePattern {
                    template: index,
                    existing: existing.id.index(),
                });
            }
            templates.push(PieceTemplate::from_bitmap(TemplateId(index), bitmap, *doors)?);
        }

        debug!(templates = templates.len(), "piece_catalog_loaded");
        Ok(Self { templates })
    }

    /// Number of templates in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Reports whether the catalog holds no templates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// All templates in load order.
    #[must_use]
    pub fn templates(&self) -> &[PieceTemplate] {
        &self.templates
    }

    /// Template with the provided identifier.
    #[must_use]
    pub fn get(&self, id: TemplateId) -> Option<&PieceTemplate> {
        self.templates.get(id.index())
    }

    /// Template whose door pattern equals `pattern`.
    #[must_use]
    pub fn template_for(&self, pattern: DoorPattern) -> Option<&PieceTemplate> {
        self.templates
            .iter()
            .find(|template| template.doors == pattern)
    }

    /// Templates whose door patterns satisfy `constraints`.
    #[must_use]
    pub fn matching(&self, constraints: &DoorConstraints) -> Vec<&PieceTemplate> {
        self.templates
            .iter()
            .filter(|template| constraints.admits(template.doors))
            .collect()
    }

    /// Uniformly samples a template. Repeats across calls are expected.
    pub fn random_template<R>(&self, rng: &mut R) -> Option<&PieceTemplate>
    where
        R: Rng + ?Sized,
    {
        self.templates.choose(rng)
    }

    /// Non-empty door patterns that no template provides.
    #[must_use]
    pub fn missing_patterns(&self) -> Vec<DoorPattern> {
        DoorPattern::non_empty()
            .filter(|pattern| self.template_for(*pattern).is_none())
            .collect()
    }
}

/// Errors raised while building a catalog from bitmaps.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// A bitmap does not match the fixed piece size.
    #[error("template {template} is {width}x{height}, expected 12x8")]
    Dimensions {
        /// Index of the offending template.
        template: usize,
        /// Width of the supplied bitmap.
        width: u32,
        /// Height of the supplied bitmap.
        height: u32,
    },
    /// A template declares no doors at all.
    #[error("template {template} has no doors")]
    EmptyPattern {
        /// Index of the offending template.
        template: usize,
    },
    /// Two templates share a door pattern.
    #[error("template {template} repeats the door pattern of template {existing}")]
    DuplicatePattern {
        /// Index of the offending template.
        template: usize,
        /// Index of the template that already owns the pattern.
        existing: usize,
    },
    /// Door pixels disagree with the declared door flags.
    #[error("template {template} door pixels on {side:?} disagree with flag {flagged}")]
    DoorMismatch {
        /// Index of the offending template.
        template: usize,
        /// Side whose pixels disagree.
        side: Direction,
        /// Flag declared for the side.
        flagged: bool,
    },
    /// A door pixel lies away from the piece border.
    #[error("template {template} has a door at ({column}, {row}) away from the border")]
    StrayDoor {
        /// Index of the offending template.
        template: usize,
        /// Piece-local column of the door.
        column: u32,
        /// Piece-local row of the door.
        row: u32,
    },
}

/// Border side a piece-local tile belongs to, ignoring corners.
pub(crate) fn edge_side(column: u32, row: u32) -> Option<Direction> {
    let last_column = PIECE_COLUMNS - 1;
    let last_row = PIECE_ROWS - 1;
    let on_vertical_edge = column == 0 || column == last_column;
    let on_horizontal_edge = row == 0 || row == last_row;
    match (on_horizontal_edge, on_vertical_edge) {
        (true, true) | (false, false) => None,
        (true, false) if row == last_row => Some(Direction::Up),
        (true, false) => Some(Direction::Down),
        (false, true) if column == 0 => Some(Direction::Left),
        (false, true) => Some(Direction::Right),
    }
}

/// Piece-local tiles along `side`, corners excluded.
pub(crate) fn edge_tiles(side: Direction) -> impl Iterator<Item = (u32, u32)> {
    let last_column = PIECE_COLUMNS - 1;
    let last_row = PIECE_ROWS - 1;
    let (columns, rows, fixed_column, fixed_row) = match side {
        Direction::Up => (1..last_column, 0..0, None, Some(last_row)),
        Direction::Down => (1..last_column, 0..0, None, Some(0)),
        Direction::Left => (0..0, 1..last_row, Some(0), None),
        Direction::Right => (0..0, 1..last_row, Some(last_column), None),
    };
    let horizontal = columns.filter_map(move |column| fixed_row.map(|row| (column, row)));
    let vertical = rows.filter_map(move |row| fixed_column.map(|column| (column, row)));
    horizontal.chain(vertical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    #[test]
    fn builtin_catalog_has_one_template_per_pattern() {
        let catalog = Catalog::load_templates().expect("built-in templates are valid");
        assert_eq!(catalog.len(), 15);

        let patterns: HashSet<DoorPattern> = catalog
            .templates()
            .iter()
            .map(PieceTemplate::doors)
            .collect();
        assert_eq!(patterns.len(), 15);
        for pattern in DoorPattern::non_empty() {
            let template = catalog
                .template_for(pattern)
                .expect("every non-empty pattern has a template");
            assert_eq!(template.doors(), pattern);
        }
        assert!(catalog.missing_patterns().is_empty());
    }

    #[test]
    fn builtin_templates_keep_source_order() {
        let catalog = Catalog::load_templates().expect("built-in templates are valid");
        let first = &catalog.templates()[0];
        assert_eq!(first.doors().flags(), [false, true, false, false]);
        let last = &catalog.templates()[14];
        assert_eq!(last.doors().flags(), [true, true, true, true]);
    }

    #[test]
    fn bitmap_rows_are_flipped_to_y_up() {
        let catalog = Catalog::load_templates().expect("built-in templates are valid");
        let bottom_only = catalog
            .template_for(DoorPattern::from_sides(&[Direction::Down]))
            .expect("bottom template");
        assert_eq!(bottom_only.tile(5, 0), Some(LevelTile::Door { open: false }));
        assert_eq!(bottom_only.tile(5, PIECE_ROWS - 1), Some(LevelTile::Wall));
        assert_eq!(bottom_only.tile(PIECE_COLUMNS, 0), None);
    }

    #[test]
    fn random_template_samples_with_replacement() {
        let catalog = Catalog::load_templates().expect("built-in templates are valid");
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..600 {
            let template = catalog.random_template(&mut rng).expect("catalog not empty");
            let _ = seen.insert(template.id());
        }
        assert_eq!(seen.len(), catalog.len());
    }

    #[test]
    fn constraints_filter_matching_templates() {
        let catalog = Catalog::load_templates().expect("built-in templates are valid");
        let constraints = DoorConstraints::unconstrained()
            .with(Direction::Up, SideConstraint::Closed)
            .with(Direction::Left, SideConstraint::Closed)
            .with(Direction::Right, SideConstraint::Open);
        let matching = catalog.matching(&constraints);
        assert_eq!(matching.len(), 2);
        assert!(matching
            .iter()
            .all(|template| template.doors().is_open(Direction::Right)
                && !template.doors().is_open(Direction::Up)
                && !template.doors().is_open(Direction::Left)));
    }

    #[test]
    fn mismatched_door_pixels_are_rejected() {
        let (bitmap, _) = builtin_bitmaps().remove(0);
        let wrong_flags = DoorPattern::from_sides(&[Direction::Up]);
        let error = Catalog::from_bitmaps(vec![(bitmap, wrong_flags)])
            .expect_err("door pixels sit on the bottom edge");
        assert!(matches!(error, CatalogError::DoorMismatch { .. }));
    }

    #[test]
    fn duplicate_and_empty_patterns_are_rejected() {
        let mut bitmaps = builtin_bitmaps();
        let (first, pattern) = bitmaps.remove(0);
        let error = Catalog::from_bitmaps(vec![(first.clone(), pattern), (first.clone(), pattern)])
            .expect_err("duplicate pattern");
        assert_eq!(
            error,
            CatalogError::DuplicatePattern {
                template: 1,
                existing: 0
            }
        );

        let error = Catalog::from_bitmaps(vec![(first, DoorPattern::EMPTY)])
            .expect_err("empty pattern");
        assert_eq!(error, CatalogError::EmptyPattern { template: 0 });
    }

    #[test]
    fn undersized_bitmaps_are_rejected() {
        let bitmap = PieceBitmap::new(2, 2, vec![FLOOR_PIXEL; 4]);
        let error = Catalog::from_bitmaps(vec![(bitmap, DoorPattern::from_sides(&[Direction::Up]))])
            .expect_err("wrong size");
        assert!(matches!(error, CatalogError::Dimensions { width: 2, .. }));
    }

    #[test]
    fn pixel_classification_matches_palette() {
        assert_eq!(tile_for_pixel(WALL_PIXEL), LevelTile::Wall);
        assert_eq!(tile_for_pixel(DOOR_PIXEL), LevelTile::Door { open: false });
        assert_eq!(tile_for_pixel(FLOOR_PIXEL), LevelTile::Floor);
        assert_eq!(tile_for_pixel([0x80, 0x60, 0x20, 0xff]), LevelTile::Floor);
    }

    #[test]
    fn edge_helpers_skip_corners() {
        assert_eq!(edge_side(0, 0), None);
        assert_eq!(edge_side(5, 0), Some(Direction::Down));
        assert_eq!(edge_side(5, PIECE_ROWS - 1), Some(Direction::Up));
        assert_eq!(edge_side(0, 3), Some(Direction::Left));
        assert_eq!(edge_side(PIECE_COLUMNS - 1, 3), Some(Direction::Right));
        assert_eq!(edge_side(4, 4), None);
        assert_eq!(edge_tiles(Direction::Up).count(), 10);
        assert_eq!(edge_tiles(Direction::Left).count(), 6);
    }
}
