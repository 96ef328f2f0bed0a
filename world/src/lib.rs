#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level state for Room for Change.
//!
//! The world owns the flattened tile grid of a generated labyrinth together
//! with every entity moving through it. All mutation flows through [`apply`];
//! read access is provided by the [`query`] module.

pub mod catalog;
pub mod entity;
pub mod generator;
mod templates;
pub mod tiles;

use room_for_change_core::{
    Command, EntityId, EntityKind, EntityState, Event, MapOffset, PieceCoord,
};
use tracing::{debug, trace};

pub use catalog::{Catalog, CatalogError};
pub use entity::Entity;
pub use generator::{GenerationError, Labyrinth, LabyrinthConfig, PlacedPiece};
pub use tiles::TileGrid;

/// Represents the authoritative Room for Change level state.
#[derive(Debug)]
pub struct World {
    labyrinth: Labyrinth,
    entities: Vec<Entity>,
    player: EntityId,
    current_piece: Option<PieceCoord>,
    map_offset: MapOffset,
    paused: bool,
    tick_index: u64,
}

impl World {
    /// Generates a labyrinth from `catalog` and populates it with the player
    /// and its enemies.
    pub fn new(catalog: &Catalog, config: &LabyrinthConfig) -> Result<Self, GenerationError> {
        let labyrinth = generator::generate(catalog, config)?;
        Ok(Self::from_labyrinth(labyrinth))
    }

    /// Wraps an already generated labyrinth.
    #[must_use]
    pub fn from_labyrinth(labyrinth: Labyrinth) -> Self {
        let entities: Vec<Entity> = labyrinth
            .spawns()
            .iter()
            .enumerate()
            .map(|(index, spawn)| {
                let half = entity::ENTITY_SIZE * 0.5;
                Entity::new(
                    EntityId::new(index as u32),
                    spawn.kind,
                    spawn.center.x - half,
                    spawn.center.y - half,
                )
            })
            .collect();
        let player = entities
            .iter()
            .find(|entity| entity.kind() == EntityKind::Player)
            .map_or(EntityId::new(0), Entity::id);

        let mut world = Self {
            labyrinth,
            entities,
            player,
            current_piece: None,
            map_offset: MapOffset::default(),
            paused: false,
            tick_index: 0,
        };
        world.current_piece = world.find_current_piece();
        world
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id() == id)
    }

    fn player_entity(&self) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id() == self.player)
    }

    fn find_current_piece(&self) -> Option<PieceCoord> {
        let player = self.player_entity()?;
        let (x, y) = player.bounds().center();
        PieceCoord::containing(x, y).filter(|piece| {
            piece.column() < self.labyrinth.columns() && piece.row() < self.labyrinth.rows()
        })
    }

    fn step_entities(&mut self, step: f32, out_events: &mut Vec<Event>) {
        let tiles = self.labyrinth.tiles();
        for entity in &mut self.entities {
            entity.update(step, tiles);
        }
        for entity in &mut self.entities {
            let was_walking = entity.state() == EntityState::Walking;
            if entity.is_not_walking() && was_walking {
                out_events.push(Event::EntityStopped {
                    entity: entity.id(),
                });
            }
        }

        let previous = self.current_piece;
        self.current_piece = self.find_current_piece();
        if previous != self.current_piece {
            debug!(from = ?previous, to = ?self.current_piece, "player_changed_piece");
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            if !world.paused {
                world.step_entities(dt.as_secs_f32(), out_events);
            }
        }
        Command::Accelerate { entity, direction } => {
            if world.paused {
                trace!(entity = entity.get(), "acceleration_ignored_while_paused");
                return;
            }
            if let Some(target) = world.entity_mut(entity) {
                target.move_with_accel(direction);
            }
        }
        Command::PauseEntities => {
            if !world.paused {
                world.paused = true;
                out_events.push(Event::EntitiesPaused);
            }
        }
        Command::ResumeEntities => {
            if world.paused {
                world.paused = false;
                out_events.push(Event::EntitiesResumed);
            }
        }
        Command::MoveLabyrinthPiece { direction } => {
            world.map_offset = world.map_offset.shifted(direction);
            debug!(
                ?direction,
                columns = world.map_offset.columns,
                rows = world.map_offset.rows,
                "labyrinth_piece_moved"
            );
            out_events.push(Event::LabyrinthPieceMoved {
                direction,
                offset: world.map_offset,
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use room_for_change_core::{EntityId, EntitySnapshot, EntityView, MapOffset, PieceCoord};

    use super::{Labyrinth, PlacedPiece, TileGrid, World};

    /// Provides read-only access to the flattened tile grid.
    #[must_use]
    pub fn tiles(world: &World) -> &TileGrid {
        world.labyrinth.tiles()
    }

    /// Provides read-only access to the generated labyrinth.
    #[must_use]
    pub fn labyrinth(world: &World) -> &Labyrinth {
        &world.labyrinth
    }

    /// Placed pieces in row-major order, bottom row first.
    #[must_use]
    pub fn pieces(world: &World) -> &[PlacedPiece] {
        world.labyrinth.pieces()
    }

    /// Labyrinth size measured in pieces as `(columns, rows)`.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        (world.labyrinth.columns(), world.labyrinth.rows())
    }

    /// Captures a read-only view of every entity.
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        EntityView::from_snapshots(world.entities.iter().map(|entity| entity.snapshot()).collect())
    }

    /// Identifier of the player-controlled entity.
    #[must_use]
    pub fn player_id(world: &World) -> EntityId {
        world.player
    }

    /// Snapshot of the player-controlled entity.
    #[must_use]
    pub fn player(world: &World) -> Option<EntitySnapshot> {
        world.player_entity().map(|entity| entity.snapshot())
    }

    /// Piece occupied by the player as of the last completed step.
    #[must_use]
    pub fn current_piece(world: &World) -> Option<PieceCoord> {
        world.current_piece
    }

    /// Recomputes the piece under the player's centre from its position.
    #[must_use]
    pub fn find_current_piece(world: &World) -> Option<PieceCoord> {
        world.find_current_piece()
    }

    /// Presentation offset of the labyrinth measured in pieces.
    #[must_use]
    pub fn map_offset(world: &World) -> MapOffset {
        world.map_offset
    }

    /// Reports whether entity simulation is frozen.
    #[must_use]
    pub fn is_paused(world: &World) -> bool {
        world.paused
    }

    /// Number of ticks processed since creation.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use room_for_change_core::{Direction, EntityKind};

    use super::*;

    const STEP: Duration = Duration::from_micros(16_667);

    fn world() -> World {
        let catalog = Catalog::load_templates().expect("built-in templates are valid");
        World::new(&catalog, &LabyrinthConfig::new(3, 2, 21).with_mummies(2))
            .expect("valid labyrinth")
    }

    #[test]
    fn player_starts_in_the_first_piece() {
        let world = world();
        let player = query::player(&world).expect("player present");
        assert_eq!(player.kind, EntityKind::Player);
        let (x, y) = player.bounds.center();
        assert!((x - 6.0).abs() < 1e-4 && (y - 4.0).abs() < 1e-4);
        assert_eq!(query::current_piece(&world), Some(PieceCoord::new(0, 0)));
        assert_eq!(query::dimensions(&world), (3, 2));
        let mummies = query::entity_view(&world)
            .iter()
            .filter(|snapshot| snapshot.kind == EntityKind::Mummy)
            .count();
        assert_eq!(mummies, 2);
    }

    #[test]
    fn pause_and_resume_only_report_changes() {
        let mut world = world();
        let mut events = Vec::new();
        apply(&mut world, Command::PauseEntities, &mut events);
        apply(&mut world, Command::PauseEntities, &mut events);
        assert_eq!(events, vec![Event::EntitiesPaused]);
        assert!(query::is_paused(&world));

        events.clear();
        apply(&mut world, Command::ResumeEntities, &mut events);
        apply(&mut world, Command::ResumeEntities, &mut events);
        assert_eq!(events, vec![Event::EntitiesResumed]);
    }

    #[test]
    fn paused_world_ignores_acceleration_and_motion() {
        let mut world = world();
        let player = query::player_id(&world);
        let before = query::player(&world).expect("player");
        let mut events = Vec::new();
        apply(&mut world, Command::PauseEntities, &mut events);
        apply(
            &mut world,
            Command::Accelerate {
                entity: player,
                direction: Direction::Right,
            },
            &mut events,
        );
        apply(&mut world, Command::Tick { dt: STEP }, &mut events);

        let after = query::player(&world).expect("player");
        assert_eq!(after, before);
        assert!(events.contains(&Event::TimeAdvanced { dt: STEP }));
    }

    #[test]
    fn walking_player_eventually_stops() {
        let mut world = world();
        let player = query::player_id(&world);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Accelerate {
                entity: player,
                direction: Direction::Up,
            },
            &mut events,
        );
        for _ in 0..120 {
            apply(&mut world, Command::Tick { dt: STEP }, &mut events);
        }

        let stopped: Vec<_> = events
            .iter()
            .filter(|event| matches!(event, Event::EntityStopped { .. }))
            .collect();
        assert_eq!(stopped, vec![&Event::EntityStopped { entity: player }]);
        let snapshot = query::player(&world).expect("player");
        assert_eq!(snapshot.state, EntityState::Idle);
        assert!(snapshot.bounds.y > 3.6);
    }

    #[test]
    fn moving_the_labyrinth_shifts_the_offset() {
        let mut world = world();
        let tiles_before = query::tiles(&world).clone();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MoveLabyrinthPiece {
                direction: Direction::Left,
            },
            &mut events,
        );
        assert_eq!(query::map_offset(&world), MapOffset::new(-1, 0));
        assert_eq!(
            events,
            vec![Event::LabyrinthPieceMoved {
                direction: Direction::Left,
                offset: MapOffset::new(-1, 0),
            }]
        );
        assert_eq!(query::tiles(&world), &tiles_before);
    }
}
