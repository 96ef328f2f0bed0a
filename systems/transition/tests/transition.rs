use std::time::Duration;

use glam::Vec2;
use room_for_change_core::{Command, Direction, Event, MapOffset, PieceCoord};
use room_for_change_system_transition::{PieceTransition, TransitionEffect};
use room_for_change_world::{self as world, query, Catalog, LabyrinthConfig, World};

const STEP: Duration = Duration::from_micros(16_667);

fn retargets(effects: &[TransitionEffect]) -> Vec<(PieceCoord, Vec2)> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            TransitionEffect::CameraRetarget { piece, target } => Some((*piece, *target)),
            _ => None,
        })
        .collect()
}

fn tick_events() -> Vec<Event> {
    vec![Event::TimeAdvanced { dt: STEP }]
}

#[test]
fn entering_a_new_piece_retargets_exactly_once() {
    let mut transition = PieceTransition::new(PieceCoord::new(1, 1), MapOffset::default());
    let mut out = Vec::new();
    let mut effects = Vec::new();

    let path = [
        PieceCoord::new(1, 1),
        PieceCoord::new(1, 1),
        PieceCoord::new(2, 1),
        PieceCoord::new(2, 1),
        PieceCoord::new(2, 1),
    ];
    for piece in path {
        transition.handle(
            &tick_events(),
            Some(piece),
            MapOffset::default(),
            &mut out,
            &mut effects,
        );
    }

    assert_eq!(
        retargets(&effects),
        vec![(PieceCoord::new(2, 1), Vec2::new(30.0, 12.0))]
    );
    assert!(out.is_empty());
    assert_eq!(transition.followed_piece(), Some(PieceCoord::new(2, 1)));
}

#[test]
fn camera_glides_and_settles_on_the_new_piece() {
    let mut transition = PieceTransition::new(PieceCoord::new(0, 0), MapOffset::default());
    let mut out = Vec::new();
    let mut effects = Vec::new();

    transition.handle(
        &tick_events(),
        Some(PieceCoord::new(1, 0)),
        MapOffset::default(),
        &mut out,
        &mut effects,
    );
    let early = transition.camera_position();
    assert!(early.x > 6.0 && early.x < 18.0);

    for _ in 0..60 {
        transition.handle(
            &tick_events(),
            Some(PieceCoord::new(1, 0)),
            MapOffset::default(),
            &mut out,
            &mut effects,
        );
    }
    let settled = transition.camera_position();
    assert!((settled - Vec2::new(18.0, 4.0)).length() < 1e-3);
}

#[test]
fn walking_player_through_a_door_moves_the_camera_once() {
    let catalog = Catalog::load_templates().expect("built-in templates are valid");
    let config = LabyrinthConfig::new(2, 1, 8).with_mummies(0);
    let mut world = World::new(&catalog, &config).expect("valid labyrinth");
    let player = query::player_id(&world);
    let start = query::current_piece(&world).expect("player inside the labyrinth");
    let mut transition = PieceTransition::new(start, query::map_offset(&world));
    let mut effects = Vec::new();

    for _ in 0..400 {
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::Accelerate {
                entity: player,
                direction: Direction::Right,
            },
            &mut events,
        );
        world::apply(&mut world, Command::Tick { dt: STEP }, &mut events);
        let mut commands = Vec::new();
        transition.handle(
            &events,
            query::current_piece(&world),
            query::map_offset(&world),
            &mut commands,
            &mut effects,
        );
        assert!(commands.is_empty());
    }

    assert_eq!(query::current_piece(&world), Some(PieceCoord::new(1, 0)));
    assert_eq!(
        retargets(&effects),
        vec![(PieceCoord::new(1, 0), Vec2::new(18.0, 4.0))]
    );
}

#[test]
fn quake_freezes_entities_then_shifts_the_labyrinth() {
    let catalog = Catalog::load_templates().expect("built-in templates are valid");
    let mut world =
        World::new(&catalog, &LabyrinthConfig::new(3, 3, 2)).expect("valid labyrinth");
    let start = query::current_piece(&world).expect("player inside the labyrinth");
    let mut transition = PieceTransition::new(start, query::map_offset(&world));
    let mut effects = Vec::new();
    let mut pending = Vec::new();

    assert!(transition.request_quake(Direction::Up, &mut pending, &mut effects));

    let mut all_events = Vec::new();
    for _ in 0..240 {
        let mut events = Vec::new();
        for command in pending.drain(..) {
            world::apply(&mut world, command, &mut events);
        }
        if transition.is_quaking() {
            assert!(query::is_paused(&world));
        }
        world::apply(&mut world, Command::Tick { dt: STEP }, &mut events);
        transition.handle(
            &events,
            query::current_piece(&world),
            query::map_offset(&world),
            &mut pending,
            &mut effects,
        );
        all_events.extend(events);
    }

    assert!(!query::is_paused(&world));
    assert_eq!(query::map_offset(&world), MapOffset::new(0, 1));
    let shift_position = all_events
        .iter()
        .position(|event| matches!(event, Event::LabyrinthPieceMoved { .. }))
        .expect("labyrinth moved");
    let resume_position = all_events
        .iter()
        .position(|event| *event == Event::EntitiesResumed)
        .expect("entities resumed");
    assert!(shift_position < resume_position);

    assert!(effects.contains(&TransitionEffect::QuakeFinished {
        direction: Direction::Up
    }));
    assert_eq!(
        retargets(&effects),
        vec![(start, Vec2::new(6.0, 12.0))]
    );
}
