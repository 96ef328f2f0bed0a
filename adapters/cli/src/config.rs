//! Layered game configuration: built-in defaults, an optional TOML file and
//! command-line overrides, in increasing priority.

use std::{
    fs,
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{bail, Context, Result};
use room_for_change_world::LabyrinthConfig;
use serde::Deserialize;

const DEFAULT_STEPS_PER_SECOND: u32 = 60;
const MAX_STEPS_PER_SECOND: u32 = 1_000;

/// Contents of a configuration file. Every key is optional.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    labyrinth: LabyrinthSection,
    simulation: SimulationSection,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
struct LabyrinthSection {
    pieces_wide: Option<u32>,
    pieces_high: Option<u32>,
    seed: Option<u64>,
    mummies: Option<u32>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
struct SimulationSection {
    steps_per_second: Option<u32>,
}

impl FileConfig {
    /// Reads and parses the configuration file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid configuration at {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse configuration toml contents")
    }
}

/// Values supplied on the command line; `None` defers to the file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Overrides {
    pub(crate) pieces_wide: Option<u32>,
    pub(crate) pieces_high: Option<u32>,
    pub(crate) seed: Option<u64>,
    pub(crate) mummies: Option<u32>,
}

/// Fully resolved settings for one game session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct GameConfig {
    pub(crate) labyrinth: LabyrinthConfig,
    pub(crate) steps_per_second: u32,
}

/// Combines defaults, the file and the overrides. `clock_seed` is only
/// consulted when neither source names a seed.
pub(crate) fn resolve(
    file: FileConfig,
    overrides: Overrides,
    clock_seed: impl FnOnce() -> u64,
) -> Result<GameConfig> {
    let defaults = LabyrinthConfig::default();
    let section = file.labyrinth;
    let pieces_wide = overrides
        .pieces_wide
        .or(section.pieces_wide)
        .unwrap_or(defaults.pieces_wide());
    let pieces_high = overrides
        .pieces_high
        .or(section.pieces_high)
        .unwrap_or(defaults.pieces_high());
    let mummies = overrides
        .mummies
        .or(section.mummies)
        .unwrap_or(defaults.mummies());
    let seed = overrides
        .seed
        .or(section.seed)
        .unwrap_or_else(clock_seed);

    let steps_per_second = file
        .simulation
        .steps_per_second
        .unwrap_or(DEFAULT_STEPS_PER_SECOND);
    if steps_per_second == 0 || steps_per_second > MAX_STEPS_PER_SECOND {
        bail!(
            "steps_per_second must be between 1 and {MAX_STEPS_PER_SECOND}, got {steps_per_second}"
        );
    }

    Ok(GameConfig {
        labyrinth: LabyrinthConfig::new(pieces_wide, pieces_high, seed).with_mummies(mummies),
        steps_per_second,
    })
}

/// Seed derived from the wall clock, for sessions that did not pick one.
pub(crate) fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_else(|_| LabyrinthConfig::default().seed())
}
