//! Frame driver wiring the world, the systems and the scene together.

use std::time::Duration;

use anyhow::{Context, Result};
use glam::Vec2;
use room_for_change_core::{Command, EntityId, PieceCoord, PIECE_COLUMNS, PIECE_ROWS};
use room_for_change_rendering::{
    CameraPresentation, EntityPresentation, FrameInput, LabyrinthPresentation, Scene, TileVisual,
};
use room_for_change_system_pursuit::Pursuit;
use room_for_change_system_transition::{PieceTransition, TransitionEffect};
use room_for_change_world::{self as world, query, Catalog, World};
use tracing::{debug, info, trace};

use crate::{audio::AudioSink, config::GameConfig};

/// Upper bound on simulation steps run for a single rendered frame.
const MAX_STEPS_PER_FRAME: u32 = 8;

/// Owns the simulation and turns frame input into world commands.
#[derive(Debug)]
pub(crate) struct Game<A> {
    world: World,
    transition: PieceTransition,
    pursuit: Pursuit,
    audio: A,
    step: Duration,
    accumulator: Duration,
    paused: bool,
    pending: Vec<Command>,
    effects: Vec<TransitionEffect>,
}

impl<A: AudioSink> Game<A> {
    pub(crate) fn new(catalog: &Catalog, config: &GameConfig, audio: A) -> Result<Self> {
        let world = World::new(catalog, &config.labyrinth).context("failed to generate labyrinth")?;
        let start = query::current_piece(&world).unwrap_or(PieceCoord::new(0, 0));
        let transition = PieceTransition::new(start, query::map_offset(&world));
        let labyrinth = query::labyrinth(&world);
        info!(
            pieces_wide = labyrinth.columns(),
            pieces_high = labyrinth.rows(),
            entities = query::entity_view(&world).iter().count(),
            "game_ready"
        );
        Ok(Self {
            world,
            transition,
            pursuit: Pursuit::default(),
            audio,
            step: Duration::from_secs(1) / config.steps_per_second,
            accumulator: Duration::ZERO,
            paused: false,
            pending: Vec::new(),
            effects: Vec::new(),
        })
    }

    /// Builds the scene shown on the first frame.
    pub(crate) fn initial_scene(&self) -> Result<Scene> {
        let tiles = query::tiles(&self.world);
        let visuals = tiles
            .as_slice()
            .iter()
            .copied()
            .map(TileVisual::from)
            .collect();
        let labyrinth = LabyrinthPresentation::new(
            tiles.columns(),
            tiles.rows(),
            PIECE_COLUMNS,
            PIECE_ROWS,
            visuals,
        )
        .context("failed to describe labyrinth tiles")?;
        let camera = CameraPresentation::new(
            self.transition.camera_position(),
            Vec2::new(PIECE_COLUMNS as f32, PIECE_ROWS as f32),
        );
        let mut scene = Scene::new(labyrinth, camera);
        self.sync_scene(&mut scene);
        Ok(scene)
    }

    /// Advances the game by one rendered frame.
    pub(crate) fn frame(&mut self, dt: Duration, input: FrameInput, scene: &mut Scene) {
        if input.pause_toggle {
            self.paused = !self.paused;
            info!(paused = self.paused, "game_pause_toggled");
        }
        if input.minimap_toggle {
            scene.show_minimap = !scene.show_minimap;
        }

        if !self.paused {
            if let Some(direction) = input.quake {
                let _ = self
                    .transition
                    .request_quake(direction, &mut self.pending, &mut self.effects);
            }

            self.accumulator += dt;
            let mut steps = 0;
            while self.accumulator >= self.step && steps < MAX_STEPS_PER_FRAME {
                self.accumulator -= self.step;
                self.run_step(&input);
                steps += 1;
            }
            if self.accumulator >= self.step {
                debug!(
                    dropped_ms = self.accumulator.as_secs_f64() * 1_000.0,
                    "simulation_behind"
                );
                self.accumulator = Duration::ZERO;
            }
        }

        self.dispatch_effects();
        self.sync_scene(scene);
    }

    fn run_step(&mut self, input: &FrameInput) {
        let mut events = Vec::new();
        for command in self.pending.drain(..) {
            world::apply(&mut self.world, command, &mut events);
        }

        let steered: Vec<EntityId> = query::entity_view(&self.world)
            .iter()
            .filter(|snapshot| snapshot.kind.accepts_input())
            .map(|snapshot| snapshot.id)
            .collect();
        for direction in input.held_directions() {
            for &entity in &steered {
                world::apply(
                    &mut self.world,
                    Command::Accelerate { entity, direction },
                    &mut events,
                );
            }
        }
        world::apply(&mut self.world, Command::Tick { dt: self.step }, &mut events);

        self.transition.handle(
            &events,
            query::current_piece(&self.world),
            query::map_offset(&self.world),
            &mut self.pending,
            &mut self.effects,
        );
        self.pursuit
            .handle(&events, &query::entity_view(&self.world), &mut self.pending);
    }

    fn dispatch_effects(&mut self) {
        for effect in self.effects.drain(..) {
            match effect {
                TransitionEffect::Sound(cue) => self.audio.play(cue),
                other => trace!(effect = ?other, "transition_effect"),
            }
        }
    }

    fn sync_scene(&self, scene: &mut Scene) {
        let offset = query::map_offset(&self.world);
        scene.map_offset = Vec2::new(
            (offset.columns as f32) * PIECE_COLUMNS as f32,
            (offset.rows as f32) * PIECE_ROWS as f32,
        );
        scene.entities.clear();
        scene.entities.extend(
            query::entity_view(&self.world)
                .iter()
                .map(EntityPresentation::from),
        );
        scene.camera.center = self.transition.camera_position();
        scene.paused = self.paused;
    }
}

#[cfg(test)]
mod tests {
    use room_for_change_core::{Direction, EntityKind, MapOffset, SoundCue, SoundEffect};
    use room_for_change_world::LabyrinthConfig;

    use super::*;

    #[derive(Debug, Default)]
    struct RecordingSink {
        played: Vec<SoundCue>,
    }

    impl AudioSink for RecordingSink {
        fn play(&mut self, cue: SoundCue) {
            self.played.push(cue);
        }
    }

    fn game() -> (Game<RecordingSink>, Scene) {
        let catalog = Catalog::load_templates().expect("built-in templates are valid");
        let config = GameConfig {
            labyrinth: LabyrinthConfig::new(3, 3, 2),
            steps_per_second: 60,
        };
        let game = Game::new(&catalog, &config, RecordingSink::default()).expect("game builds");
        let scene = game.initial_scene().expect("scene builds");
        (game, scene)
    }

    #[test]
    fn initial_scene_covers_the_whole_labyrinth() {
        let (_, scene) = game();
        assert_eq!(scene.labyrinth.columns, 36);
        assert_eq!(scene.labyrinth.rows, 24);
        assert_eq!(scene.entities.len(), 4);
        assert_eq!(scene.camera.center, Vec2::new(6.0, 4.0));
        assert_eq!(scene.map_offset, Vec2::ZERO);
    }

    #[test]
    fn frame_time_runs_whole_fixed_steps() {
        let (mut game, mut scene) = game();
        let idle = FrameInput::default();

        game.frame(Duration::from_millis(50), idle, &mut scene);
        assert_eq!(query::tick_index(&game.world), 3);
        game.frame(Duration::from_millis(10), idle, &mut scene);
        assert_eq!(query::tick_index(&game.world), 3);
        game.frame(Duration::from_millis(10), idle, &mut scene);
        assert_eq!(query::tick_index(&game.world), 4);
    }

    #[test]
    fn long_frames_are_capped() {
        let (mut game, mut scene) = game();
        game.frame(Duration::from_secs(1), FrameInput::default(), &mut scene);
        assert_eq!(query::tick_index(&game.world), u64::from(MAX_STEPS_PER_FRAME));
        game.frame(Duration::ZERO, FrameInput::default(), &mut scene);
        assert_eq!(query::tick_index(&game.world), u64::from(MAX_STEPS_PER_FRAME));
    }

    #[test]
    fn pause_toggle_freezes_the_simulation() {
        let (mut game, mut scene) = game();
        let toggle = FrameInput {
            pause_toggle: true,
            ..FrameInput::default()
        };

        game.frame(Duration::from_millis(100), toggle, &mut scene);
        assert!(scene.paused);
        assert_eq!(query::tick_index(&game.world), 0);

        game.frame(Duration::from_millis(100), toggle, &mut scene);
        assert!(!scene.paused);
        assert!(query::tick_index(&game.world) > 0);
    }

    #[test]
    fn held_arrows_steer_the_player() {
        let (mut game, mut scene) = game();
        let input = FrameInput {
            right: true,
            ..FrameInput::default()
        };
        game.frame(Duration::from_millis(100), input, &mut scene);
        let player = query::player(&game.world).expect("player exists");
        assert_eq!(player.direction, Direction::Right);
    }

    #[test]
    fn held_arrows_leave_mummies_alone() {
        let (mut game, mut scene) = game();
        let mummies_before: Vec<_> = query::entity_view(&game.world)
            .iter()
            .filter(|snapshot| snapshot.kind == EntityKind::Mummy)
            .copied()
            .collect();
        assert!(!mummies_before.is_empty());

        let input = FrameInput {
            up: true,
            left: true,
            ..FrameInput::default()
        };
        game.frame(Duration::from_millis(100), input, &mut scene);

        let view = query::entity_view(&game.world);
        for before in mummies_before {
            let after = view
                .iter()
                .find(|snapshot| snapshot.id == before.id)
                .expect("mummy still present");
            assert_eq!(after.direction, before.direction);
            assert_eq!(after.velocity, before.velocity);
            assert_eq!(after.bounds, before.bounds);
        }
        let player = query::player(&game.world).expect("player exists");
        assert_eq!(player.direction, Direction::Left);
    }

    #[test]
    fn quake_plays_once_and_shifts_the_labyrinth() {
        let (mut game, mut scene) = game();
        let quake = FrameInput {
            quake: Some(Direction::Up),
            ..FrameInput::default()
        };

        game.frame(Duration::ZERO, quake, &mut scene);
        game.frame(Duration::from_millis(50), quake, &mut scene);
        assert!(query::is_paused(&game.world));
        for _ in 0..70 {
            game.frame(Duration::from_millis(50), FrameInput::default(), &mut scene);
        }

        assert_eq!(game.audio.played.len(), 1);
        assert_eq!(game.audio.played[0].effect, SoundEffect::StoneDoor);
        assert!(!query::is_paused(&game.world));
        assert_eq!(query::map_offset(&game.world), MapOffset::new(0, 1));
        assert_eq!(scene.map_offset, Vec2::new(0.0, 8.0));
    }

    #[test]
    fn minimap_toggle_flips_the_overlay() {
        let (mut game, mut scene) = game();
        let shown = scene.show_minimap;
        let toggle = FrameInput {
            minimap_toggle: true,
            ..FrameInput::default()
        };
        game.frame(Duration::ZERO, toggle, &mut scene);
        assert_eq!(scene.show_minimap, !shown);
    }
}
