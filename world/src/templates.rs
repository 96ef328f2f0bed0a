//! Built-in piece layouts.
//!
//! Each layout is a 12x8 glyph sheet written top row first: `#` is masonry,
//! `D` a doorway and `.` floor. The sheets are rasterised into
//! [`PieceBitmap`] values so the catalog classifies them exactly like
//! externally supplied bitmaps.

use room_for_change_core::DoorPattern;

use crate::catalog::{PieceBitmap, Rgba, DOOR_PIXEL, FLOOR_PIXEL, WALL_PIXEL};

type Layout = ([bool; 4], [&'static str; 8]);

const LAYOUTS: [Layout; 15] = [
    // bottom
    (
        [false, true, false, false],
        [
            "############",
            "#..........#",
            "#..........#",
            "#..........#",
            "#..........#",
            "#..........#",
            "#..........#",
            "#####DD#####",
        ],
    ),
    // bottom + right
    (
        [false, true, false, true],
        [
            "############",
            "#..........#",
            "#.#......#.#",
            "#..........D",
            "#..........D",
            "#.#......#.#",
            "#..........#",
            "#####DD#####",
        ],
    ),
    // right
    (
        [false, false, false, true],
        [
            "############",
            "#..#....#..#",
            "#..........#",
            "#..........D",
            "#..........D",
            "#..........#",
            "#..#....#..#",
            "############",
        ],
    ),
    // left
    (
        [false, false, true, false],
        [
            "############",
            "###......###",
            "#..........#",
            "D..........#",
            "D..........#",
            "#..........#",
            "###......###",
            "############",
        ],
    ),
    // top + left
    (
        [true, false, true, false],
        [
            "#####DD#####",
            "#..........#",
            "#...#..#...#",
            "D..........#",
            "D..........#",
            "#...#..#...#",
            "#..........#",
            "############",
        ],
    ),
    // top
    (
        [true, false, false, false],
        [
            "#####DD#####",
            "#..........#",
            "#.#......#.#",
            "#..........#",
            "#..........#",
            "#.#......#.#",
            "#..........#",
            "############",
        ],
    ),
    // top + bottom
    (
        [true, true, false, false],
        [
            "#####DD#####",
            "#..#....#..#",
            "#..........#",
            "#..........#",
            "#..........#",
            "#..........#",
            "#..#....#..#",
            "#####DD#####",
        ],
    ),
    // bottom + left
    (
        [false, true, true, false],
        [
            "############",
            "#..........#",
            "#...#..#...#",
            "D..........#",
            "D..........#",
            "#...#..#...#",
            "#..........#",
            "#####DD#####",
        ],
    ),
    // left + right
    (
        [false, false, true, true],
        [
            "############",
            "###......###",
            "#..........#",
            "D..........D",
            "D..........D",
            "#..........#",
            "###......###",
            "############",
        ],
    ),
    // top + right
    (
        [true, false, false, true],
        [
            "#####DD#####",
            "#..........#",
            "#..........#",
            "#..........D",
            "#..........D",
            "#..........#",
            "#..........#",
            "############",
        ],
    ),
    // top + bottom + right
    (
        [true, true, false, true],
        [
            "#####DD#####",
            "#..........#",
            "#...#..#...#",
            "#..........D",
            "#..........D",
            "#...#..#...#",
            "#..........#",
            "#####DD#####",
        ],
    ),
    // top + bottom + left
    (
        [true, true, true, false],
        [
            "#####DD#####",
            "#..........#",
            "#.#......#.#",
            "D..........#",
            "D..........#",
            "#.#......#.#",
            "#..........#",
            "#####DD#####",
        ],
    ),
    // bottom + left + right
    (
        [false, true, true, true],
        [
            "############",
            "#..#....#..#",
            "#..........#",
            "D..........D",
            "D..........D",
            "#..........#",
            "#..#....#..#",
            "#####DD#####",
        ],
    ),
    // top + left + right
    (
        [true, false, true, true],
        [
            "#####DD#####",
            "###......###",
            "#..........#",
            "D..........D",
            "D..........D",
            "#..........#",
            "###......###",
            "############",
        ],
    ),
    // all sides
    (
        [true, true, true, true],
        [
            "#####DD#####",
            "#..........#",
            "#..........#",
            "D..........D",
            "D..........D",
            "#..........#",
            "#..........#",
            "#####DD#####",
        ],
    ),
];

/// Rasterises every built-in layout together with its door flags.
pub(crate) fn builtin_bitmaps() -> Vec<(PieceBitmap, DoorPattern)> {
    LAYOUTS
        .iter()
        .map(|(flags, rows)| (rasterise(rows), DoorPattern::from_flags(*flags)))
        .collect()
}

fn rasterise(rows: &[&str]) -> PieceBitmap {
    let height = rows.len();
    let width = rows.first().map_or(0, |row| row.len());
    let pixels: Vec<Rgba> = rows
        .iter()
        .flat_map(|row| row.chars().map(glyph_pixel))
        .collect();
    PieceBitmap::new(width as u32, height as u32, pixels)
}

fn glyph_pixel(glyph: char) -> Rgba {
    match glyph {
        '#' => WALL_PIXEL,
        'D' => DOOR_PIXEL,
        _ => FLOOR_PIXEL,
    }
}
