#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that steers mummies toward the player within a shared piece.

use room_for_change_core::{
    Command, Direction, EntityKind, EntitySnapshot, EntityView, Event, PieceCoord,
};

/// Separation below which a mummy considers itself on top of the player.
pub const ARRIVAL_DISTANCE: f32 = 0.5;

/// Emits acceleration intents for mummies sharing the player's piece.
#[derive(Debug, Default)]
pub struct Pursuit {
    paused: bool,
}

impl Pursuit {
    /// Consumes world events and the entity view to emit movement commands.
    pub fn handle(&mut self, events: &[Event], entities: &EntityView, out: &mut Vec<Command>) {
        let mut advanced = false;
        for event in events {
            match event {
                Event::EntitiesPaused => self.paused = true,
                Event::EntitiesResumed => self.paused = false,
                Event::TimeAdvanced { .. } => advanced = true,
                _ => {}
            }
        }
        if self.paused || !advanced {
            return;
        }

        let Some(player) = entities.first_of(EntityKind::Player) else {
            return;
        };
        let Some(player_piece) = piece_of(player) else {
            return;
        };

        for mummy in entities
            .iter()
            .filter(|snapshot| snapshot.kind == EntityKind::Mummy)
        {
            if piece_of(mummy) != Some(player_piece) {
                continue;
            }
            if let Some(direction) = chase_direction(mummy, player) {
                out.push(Command::Accelerate {
                    entity: mummy.id,
                    direction,
                });
            }
        }
    }
}

fn piece_of(snapshot: &EntitySnapshot) -> Option<PieceCoord> {
    let (x, y) = snapshot.bounds.center();
    PieceCoord::containing(x, y)
}

fn chase_direction(hunter: &EntitySnapshot, prey: &EntitySnapshot) -> Option<Direction> {
    let (hunter_x, hunter_y) = hunter.bounds.center();
    let (prey_x, prey_y) = prey.bounds.center();
    let dx = prey_x - hunter_x;
    let dy = prey_y - hunter_y;

    if dx.abs() < ARRIVAL_DISTANCE && dy.abs() < ARRIVAL_DISTANCE {
        return None;
    }
    if dx.abs() >= dy.abs() {
        Some(if dx > 0.0 {
            Direction::Right
        } else {
            Direction::Left
        })
    } else {
        Some(if dy > 0.0 {
            Direction::Up
        } else {
            Direction::Down
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use room_for_change_core::{Bounds, EntityId, EntityState, Planar};

    use super::*;

    fn snapshot(id: u32, kind: EntityKind, x: f32, y: f32) -> EntitySnapshot {
        EntitySnapshot {
            id: EntityId::new(id),
            kind,
            state: EntityState::Idle,
            direction: Direction::Down,
            bounds: Bounds::new(x, y, 0.8, 0.8),
            velocity: Planar::ZERO,
            state_time: 0.0,
        }
    }

    fn tick() -> Vec<Event> {
        vec![Event::TimeAdvanced {
            dt: Duration::from_millis(16),
        }]
    }

    #[test]
    fn chases_along_the_dominant_axis() {
        let view = EntityView::from_snapshots(vec![
            snapshot(0, EntityKind::Player, 2.0, 2.0),
            snapshot(1, EntityKind::Mummy, 8.0, 3.0),
            snapshot(2, EntityKind::Mummy, 2.5, 6.0),
            snapshot(3, EntityKind::Mummy, 4.0, 4.0),
        ]);
        let mut out = Vec::new();
        Pursuit::default().handle(&tick(), &view, &mut out);
        assert_eq!(
            out,
            vec![
                Command::Accelerate {
                    entity: EntityId::new(1),
                    direction: Direction::Left,
                },
                Command::Accelerate {
                    entity: EntityId::new(2),
                    direction: Direction::Down,
                },
                Command::Accelerate {
                    entity: EntityId::new(3),
                    direction: Direction::Left,
                },
            ]
        );
    }

    #[test]
    fn ignores_mummies_in_other_pieces_and_arrivals() {
        let view = EntityView::from_snapshots(vec![
            snapshot(0, EntityKind::Player, 5.6, 3.6),
            snapshot(1, EntityKind::Mummy, 17.6, 3.6),
            snapshot(2, EntityKind::Mummy, 5.8, 3.4),
        ]);
        let mut out = Vec::new();
        Pursuit::default().handle(&tick(), &view, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn piece_edges_separate_player_and_mummy() {
        let view = EntityView::from_snapshots(vec![
            snapshot(0, EntityKind::Player, 11.1, 3.6),
            snapshot(1, EntityKind::Mummy, 11.7, 3.6),
        ]);
        let mut out = Vec::new();
        Pursuit::default().handle(&tick(), &view, &mut out);
        assert!(out.is_empty());

        let view = EntityView::from_snapshots(vec![
            snapshot(0, EntityKind::Player, -2.0, 3.6),
            snapshot(1, EntityKind::Mummy, 2.0, 3.6),
        ]);
        Pursuit::default().handle(&tick(), &view, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn stays_quiet_while_paused_or_without_time() {
        let view = EntityView::from_snapshots(vec![
            snapshot(0, EntityKind::Player, 2.0, 2.0),
            snapshot(1, EntityKind::Mummy, 8.0, 2.0),
        ]);
        let mut pursuit = Pursuit::default();
        let mut out = Vec::new();

        pursuit.handle(&[], &view, &mut out);
        assert!(out.is_empty());

        let mut events = vec![Event::EntitiesPaused];
        events.extend(tick());
        pursuit.handle(&events, &view, &mut out);
        assert!(out.is_empty());

        pursuit.handle(&tick(), &view, &mut out);
        assert!(out.is_empty());

        let mut events = vec![Event::EntitiesResumed];
        events.extend(tick());
        pursuit.handle(&events, &view, &mut out);
        assert_eq!(out.len(), 1);
    }
}
