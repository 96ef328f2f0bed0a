#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Piece transition controller: camera follow and screen quakes.
//!
//! The controller watches the piece the player occupies and glides the
//! camera toward the centre of a newly entered piece. Quakes are requested
//! explicitly; they freeze entities, shake the camera and finally shift the
//! labyrinth by one piece. Timed effects are advanced from the
//! [`Event::TimeAdvanced`] events of each frame.

mod quake;
mod tween;

use glam::Vec2;
use room_for_change_core::{
    Command, Direction, Event, MapOffset, PieceCoord, SoundCue, PIECE_COLUMNS, PIECE_ROWS,
};
use tracing::{debug, info};

pub use quake::{ScreenQuake, QUAKE_SECONDS};
pub use tween::{quad_in_out, CameraTween, CAMERA_TWEEN_SECONDS};

/// Distance below which two camera targets are considered equal.
pub const CAMERA_TARGET_EPSILON: f32 = 0.1;

/// Presentation side effects produced by the controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransitionEffect {
    /// The camera started gliding toward a new piece.
    CameraRetarget {
        /// Piece the camera is now following.
        piece: PieceCoord,
        /// Camera centre the glide ends at.
        target: Vec2,
    },
    /// A screen quake started.
    QuakeStarted {
        /// Direction the labyrinth will shift once the quake ends.
        direction: Direction,
    },
    /// A screen quake ended and the labyrinth shift was requested.
    QuakeFinished {
        /// Direction of the requested shift.
        direction: Direction,
    },
    /// A sound should be played.
    Sound(SoundCue),
}

/// Per-frame state machine driving the camera.
#[derive(Debug)]
pub struct PieceTransition {
    tween: CameraTween,
    quake: ScreenQuake,
    followed: Option<(PieceCoord, Vec2)>,
}

impl PieceTransition {
    /// Creates a controller whose camera rests on `piece`.
    #[must_use]
    pub fn new(piece: PieceCoord, map_offset: MapOffset) -> Self {
        let target = camera_target(piece, map_offset);
        Self {
            tween: CameraTween::at_rest(target),
            quake: ScreenQuake::idle(),
            followed: Some((piece, target)),
        }
    }

    /// Consumes the frame's world events and the player's current piece.
    ///
    /// The follow check runs first, then the quake and the camera tween are
    /// advanced by the frame's simulated time.
    pub fn handle(
        &mut self,
        events: &[Event],
        current_piece: Option<PieceCoord>,
        map_offset: MapOffset,
        out: &mut Vec<Command>,
        effects: &mut Vec<TransitionEffect>,
    ) {
        if let Some(piece) = current_piece {
            self.follow(piece, map_offset, effects);
        }

        let dt: f32 = events
            .iter()
            .filter_map(|event| match event {
                Event::TimeAdvanced { dt } => Some(dt.as_secs_f32()),
                _ => None,
            })
            .sum();
        if dt <= 0.0 {
            return;
        }

        if let Some(direction) = self.quake.advance(dt) {
            info!(?direction, "screen_quake_finished");
            out.push(Command::MoveLabyrinthPiece { direction });
            out.push(Command::ResumeEntities);
            effects.push(TransitionEffect::QuakeFinished { direction });
        }
        self.tween.advance(dt);
    }

    /// Starts a screen quake that shifts the labyrinth toward `direction`.
    /// Returns `false` and emits nothing while another quake is running.
    pub fn request_quake(
        &mut self,
        direction: Direction,
        out: &mut Vec<Command>,
        effects: &mut Vec<TransitionEffect>,
    ) -> bool {
        if !self.quake.activate(direction) {
            debug!(?direction, "screen_quake_ignored");
            return false;
        }
        info!(?direction, seconds = QUAKE_SECONDS, "screen_quake_started");
        out.push(Command::PauseEntities);
        effects.push(TransitionEffect::QuakeStarted { direction });
        effects.push(TransitionEffect::Sound(SoundCue::stone_door()));
        true
    }

    /// Camera centre including any quake displacement.
    #[must_use]
    pub fn camera_position(&self) -> Vec2 {
        self.tween.position() + self.quake.shake_offset()
    }

    /// Piece the camera currently follows.
    #[must_use]
    pub fn followed_piece(&self) -> Option<PieceCoord> {
        self.followed.map(|(piece, _)| piece)
    }

    /// Reports whether a quake is in progress.
    #[must_use]
    pub const fn is_quaking(&self) -> bool {
        self.quake.is_running()
    }

    fn follow(
        &mut self,
        piece: PieceCoord,
        map_offset: MapOffset,
        effects: &mut Vec<TransitionEffect>,
    ) {
        let target = camera_target(piece, map_offset);
        let unchanged = self.followed.is_some_and(|(_, recorded)| {
            (recorded - target)
                .abs()
                .cmple(Vec2::splat(CAMERA_TARGET_EPSILON))
                .all()
        });
        if unchanged {
            return;
        }

        debug!(
            column = piece.column(),
            row = piece.row(),
            x = target.x,
            y = target.y,
            "camera_retarget"
        );
        self.followed = Some((piece, target));
        self.tween.retarget(target);
        effects.push(TransitionEffect::CameraRetarget { piece, target });
    }
}

/// Camera centre for `piece` once the labyrinth is shifted by `map_offset`.
#[must_use]
pub fn camera_target(piece: PieceCoord, map_offset: MapOffset) -> Vec2 {
    let size = Vec2::new(PIECE_COLUMNS as f32, PIECE_ROWS as f32);
    let cell = Vec2::new(
        piece.column() as f32 + map_offset.columns as f32,
        piece.row() as f32 + map_offset.rows as f32,
    );
    cell * size + size * 0.5
}
