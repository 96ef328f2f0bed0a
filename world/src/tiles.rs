//! Flattened tile grid assembled from placed pieces.

use room_for_change_core::{LevelTile, TileCoord};

/// Dense, fixed-size grid of level tiles stored bottom row first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tiles: Vec<LevelTile>,
}

impl TileGrid {
    /// Creates a grid of the provided size where every tile is `fill`.
    #[must_use]
    pub fn filled(columns: u32, rows: u32, fill: LevelTile) -> Self {
        let len = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        Self {
            columns,
            rows,
            tiles: vec![fill; len],
        }
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Tile stored at the coordinate, if it lies inside the grid.
    #[must_use]
    pub fn get(&self, coord: TileCoord) -> Option<LevelTile> {
        self.index(coord.column(), coord.row())
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Tile under signed world-space cell indices. Negative or oversized
    /// indices yield `None`.
    #[must_use]
    pub fn get_signed(&self, column: i64, row: i64) -> Option<LevelTile> {
        let column = u32::try_from(column).ok()?;
        let row = u32::try_from(row).ok()?;
        self.get(TileCoord::new(column, row))
    }

    /// Replaces the tile at `coord`. Returns `false` when the coordinate lies
    /// outside the grid.
    pub fn set(&mut self, coord: TileCoord, tile: LevelTile) -> bool {
        match self.index(coord.column(), coord.row()) {
            Some(index) => {
                self.tiles[index] = tile;
                true
            }
            None => false,
        }
    }

    /// Iterates every tile together with its coordinate, bottom row first.
    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, LevelTile)> + '_ {
        let columns = self.columns.max(1);
        self.tiles.iter().enumerate().map(move |(index, tile)| {
            let index = index as u32;
            (TileCoord::new(index % columns, index / columns), *tile)
        })
    }

    /// Raw tile storage, bottom row first.
    #[must_use]
    pub fn as_slice(&self) -> &[LevelTile] {
        &self.tiles
    }

    fn index(&self, column: u32, row: u32) -> Option<usize> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        usize::try_from(u64::from(row) * u64::from(self.columns) + u64::from(column)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_outside_the_grid_yield_none() {
        let grid = TileGrid::filled(3, 2, LevelTile::Floor);
        assert_eq!(grid.get(TileCoord::new(2, 1)), Some(LevelTile::Floor));
        assert_eq!(grid.get(TileCoord::new(3, 0)), None);
        assert_eq!(grid.get(TileCoord::new(0, 2)), None);
        assert_eq!(grid.get_signed(-1, 0), None);
        assert_eq!(grid.get_signed(0, -1), None);
    }

    #[test]
    fn set_updates_single_tile() {
        let mut grid = TileGrid::filled(3, 2, LevelTile::Floor);
        assert!(grid.set(TileCoord::new(1, 1), LevelTile::Wall));
        assert!(!grid.set(TileCoord::new(5, 5), LevelTile::Wall));
        assert_eq!(grid.get(TileCoord::new(1, 1)), Some(LevelTile::Wall));
        assert_eq!(
            grid.iter()
                .filter(|(_, tile)| tile.is_collidable())
                .map(|(coord, _)| coord)
                .collect::<Vec<_>>(),
            vec![TileCoord::new(1, 1)]
        );
    }
}
