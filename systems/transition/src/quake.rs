use glam::Vec2;
use room_for_change_core::Direction;

/// Length of a screen quake, in seconds.
pub const QUAKE_SECONDS: f32 = 2.8;

const SHAKE_AMPLITUDE: f32 = 0.12;
const SHAKE_FREQUENCY_X: f32 = 53.0;
const SHAKE_FREQUENCY_Y: f32 = 41.0;

#[derive(Clone, Copy, Debug, PartialEq)]
enum QuakeState {
    Idle,
    Running { direction: Direction, elapsed: f32 },
}

/// Timed camera shake that completes with a labyrinth shift.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenQuake {
    state: QuakeState,
}

impl ScreenQuake {
    /// Quake that is not running.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            state: QuakeState::Idle,
        }
    }

    /// Starts a quake toward `direction`. Returns `false` when one is
    /// already running.
    pub fn activate(&mut self, direction: Direction) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = QuakeState::Running {
            direction,
            elapsed: 0.0,
        };
        true
    }

    /// Advances the quake by `dt` seconds, yielding its direction on the
    /// frame it completes.
    pub fn advance(&mut self, dt: f32) -> Option<Direction> {
        let QuakeState::Running { direction, elapsed } = self.state else {
            return None;
        };
        let elapsed = elapsed + dt.max(0.0);
        if elapsed >= QUAKE_SECONDS {
            self.state = QuakeState::Idle;
            return Some(direction);
        }
        self.state = QuakeState::Running { direction, elapsed };
        None
    }

    /// Reports whether a quake is in progress.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.state, QuakeState::Running { .. })
    }

    /// Camera displacement for the current frame, fading out linearly.
    #[must_use]
    pub fn shake_offset(&self) -> Vec2 {
        match self.state {
            QuakeState::Idle => Vec2::ZERO,
            QuakeState::Running { elapsed, .. } => {
                let strength = SHAKE_AMPLITUDE * (1.0 - elapsed / QUAKE_SECONDS);
                Vec2::new(
                    (elapsed * SHAKE_FREQUENCY_X).sin(),
                    (elapsed * SHAKE_FREQUENCY_Y).cos(),
                ) * strength
            }
        }
    }
}

impl Default for ScreenQuake {
    fn default() -> Self {
        Self::idle()
    }
}
