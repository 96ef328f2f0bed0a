use glam::Vec2;

/// Duration of a camera glide between pieces, in seconds.
pub const CAMERA_TWEEN_SECONDS: f32 = 0.7;

/// Quadratic ease-in-out over `t` in `0.0..=1.0`.
#[must_use]
pub fn quad_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        let rest = -2.0 * t + 2.0;
        1.0 - rest * rest * 0.5
    }
}

/// Frame-advanced interpolation of the camera centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraTween {
    from: Vec2,
    to: Vec2,
    elapsed: f32,
    duration: f32,
}

impl CameraTween {
    /// Tween that rests at `position`.
    #[must_use]
    pub const fn at_rest(position: Vec2) -> Self {
        Self {
            from: position,
            to: position,
            elapsed: CAMERA_TWEEN_SECONDS,
            duration: CAMERA_TWEEN_SECONDS,
        }
    }

    /// Restarts the tween toward `target` from the current position.
    pub fn retarget(&mut self, target: Vec2) {
        self.from = self.position();
        self.to = target;
        self.elapsed = 0.0;
    }

    /// Advances the tween clock by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if dt > 0.0 {
            self.elapsed = (self.elapsed + dt).min(self.duration);
        }
    }

    /// Interpolated position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        let progress = if self.duration > 0.0 {
            self.elapsed / self.duration
        } else {
            1.0
        };
        self.from.lerp(self.to, quad_in_out(progress))
    }

    /// Destination of the running tween.
    #[must_use]
    pub const fn target(&self) -> Vec2 {
        self.to
    }

    /// Reports whether the tween reached its destination.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}
