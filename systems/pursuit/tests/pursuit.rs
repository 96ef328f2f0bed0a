use std::time::Duration;

use room_for_change_core::{Command, Direction, EntityKind, PieceCoord};
use room_for_change_system_pursuit::Pursuit;
use room_for_change_world::{self as world, query, Catalog, LabyrinthConfig, World};

const STEP: Duration = Duration::from_micros(16_667);

#[test]
fn mummy_wakes_when_the_player_enters_its_piece() {
    let catalog = Catalog::load_templates().expect("built-in templates are valid");
    let config = LabyrinthConfig::new(2, 1, 8).with_mummies(1);
    let mut world = World::new(&catalog, &config).expect("valid labyrinth");
    let player = query::player_id(&world);
    let mummy = query::entity_view(&world)
        .first_of(EntityKind::Mummy)
        .map(|snapshot| snapshot.id)
        .expect("one mummy spawned");
    let mut pursuit = Pursuit::default();
    let mut chased_before_entry = false;
    let mut chase_directions = Vec::new();

    for _ in 0..240 {
        let mut events = Vec::new();
        if query::current_piece(&world) == Some(PieceCoord::new(0, 0)) {
            world::apply(
                &mut world,
                Command::Accelerate {
                    entity: player,
                    direction: Direction::Right,
                },
                &mut events,
            );
        }
        world::apply(&mut world, Command::Tick { dt: STEP }, &mut events);

        let mut commands = Vec::new();
        pursuit.handle(&events, &query::entity_view(&world), &mut commands);
        let in_mummy_piece = query::current_piece(&world) == Some(PieceCoord::new(1, 0));
        for command in commands {
            if let Command::Accelerate { entity, direction } = command {
                assert_eq!(entity, mummy);
                if in_mummy_piece {
                    chase_directions.push(direction);
                } else {
                    chased_before_entry = true;
                }
                world::apply(&mut world, command, &mut Vec::new());
            }
        }
    }

    assert!(!chased_before_entry);
    assert!(!chase_directions.is_empty());
    assert_eq!(chase_directions[0], Direction::Left);
}
