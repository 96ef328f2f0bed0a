//! Movable actors and their tile collision response.
//!
//! Velocities are measured in world units per step. Each update first moves
//! the entity by the velocity it carried from the previous step and corrects
//! the result against the tile grid, vertical axis first, and only then
//! integrates the new acceleration.

use room_for_change_core::{
    Bounds, Direction, EntityId, EntityKind, EntitySnapshot, EntityState, Planar,
};

use crate::tiles::TileGrid;

/// Acceleration applied along one axis by a movement intent.
pub const ACCEL_MAX: f32 = 2.0;

/// Velocity clamp applied independently to each axis.
pub const VEL_MAX: f32 = 0.05;

/// Speed below which an entity counts as standing still.
pub const MIN_WALK_VELOCITY: f32 = 0.001;

/// Gap left between an entity and the tile it was pushed out of.
pub const COLLISION_EPSILON: f32 = 0.01;

/// Side length of an entity's bounding box.
pub const ENTITY_SIZE: f32 = 0.8;

const WALK_DAMPING_RATE: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// A movable actor with continuous position and velocity.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    bounds: Bounds,
    velocity: Planar,
    acceleration: Planar,
    state: EntityState,
    direction: Direction,
    state_time: f32,
}

impl Entity {
    /// Creates an idle entity of the default size with its lower-left corner
    /// at `(x, y)`.
    #[must_use]
    pub fn new(id: EntityId, kind: EntityKind, x: f32, y: f32) -> Self {
        Self::with_bounds(id, kind, Bounds::new(x, y, ENTITY_SIZE, ENTITY_SIZE))
    }

    /// Creates an idle entity occupying `bounds`.
    #[must_use]
    pub fn with_bounds(id: EntityId, kind: EntityKind, bounds: Bounds) -> Self {
        Self {
            id,
            kind,
            bounds,
            velocity: Planar::ZERO,
            acceleration: Planar::ZERO,
            state: EntityState::Idle,
            direction: Direction::Down,
            state_time: 0.0,
        }
    }

    /// Identifier of the entity.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Role of the entity.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Current bounding box.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Current velocity.
    #[must_use]
    pub const fn velocity(&self) -> Planar {
        self.velocity
    }

    /// Acceleration still pending for the next step.
    #[must_use]
    pub const fn acceleration(&self) -> Planar {
        self.acceleration
    }

    /// Locomotion state.
    #[must_use]
    pub const fn state(&self) -> EntityState {
        self.state
    }

    /// Facing direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Animation clock in seconds.
    #[must_use]
    pub const fn state_time(&self) -> f32 {
        self.state_time
    }

    /// Overrides the velocity carried into the next update.
    pub fn set_velocity(&mut self, velocity: Planar) {
        self.velocity = velocity;
    }

    /// Expresses the intent to walk toward `direction`. Motion happens on
    /// the next [`Entity::update`].
    pub fn move_with_accel(&mut self, direction: Direction) {
        match direction {
            Direction::Up => self.acceleration.y = ACCEL_MAX,
            Direction::Down => self.acceleration.y = -ACCEL_MAX,
            Direction::Left => self.acceleration.x = -ACCEL_MAX,
            Direction::Right => self.acceleration.x = ACCEL_MAX,
        }
        self.direction = direction;
        self.state = EntityState::Walking;
    }

    /// Advances the entity by one fixed step against the provided tiles.
    /// Non-positive steps leave the entity untouched.
    pub fn update(&mut self, step: f32, tiles: &TileGrid) {
        if step <= 0.0 {
            return;
        }

        self.try_move(tiles);

        self.velocity.x = (self.velocity.x + self.acceleration.x).clamp(-VEL_MAX, VEL_MAX);
        self.velocity.y = (self.velocity.y + self.acceleration.y).clamp(-VEL_MAX, VEL_MAX);
        self.acceleration.x *= step;
        self.acceleration.y *= step;

        let retained = match self.state {
            EntityState::Walking => 1.0 - (WALK_DAMPING_RATE * step).min(1.0),
            EntityState::Idle => step,
        };
        self.velocity.x *= retained;
        self.velocity.y *= retained;

        self.state_time += step;
    }

    /// Reports whether the entity is effectively stationary, forcing the
    /// state to [`EntityState::Idle`] when it is.
    pub fn is_not_walking(&mut self) -> bool {
        let still = self.velocity.x.abs() < MIN_WALK_VELOCITY
            && self.velocity.y.abs() < MIN_WALK_VELOCITY;
        if still {
            self.state = EntityState::Idle;
        }
        still
    }

    /// Captures a read-only snapshot of the entity.
    #[must_use]
    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id,
            kind: self.kind,
            state: self.state,
            direction: self.direction,
            bounds: self.bounds,
            velocity: self.velocity,
            state_time: self.state_time,
        }
    }

    fn try_move(&mut self, tiles: &TileGrid) {
        self.bounds.y += self.velocity.y;
        self.resolve(Axis::Vertical, tiles);

        self.bounds.x += self.velocity.x;
        self.resolve(Axis::Horizontal, tiles);
    }

    fn resolve(&mut self, axis: Axis, tiles: &TileGrid) {
        for obstacle in collidable_corners(&self.bounds, tiles).into_iter().flatten() {
            if !self.bounds.overlaps(&obstacle) {
                continue;
            }
            match axis {
                Axis::Vertical => {
                    self.bounds.y = if self.velocity.y < 0.0 {
                        obstacle.top() + COLLISION_EPSILON
                    } else {
                        obstacle.y - self.bounds.height - COLLISION_EPSILON
                    };
                    self.velocity.y = 0.0;
                }
                Axis::Horizontal => {
                    self.bounds.x = if self.velocity.x < 0.0 {
                        obstacle.right() + COLLISION_EPSILON
                    } else {
                        obstacle.x - self.bounds.width - COLLISION_EPSILON
                    };
                    self.velocity.x = 0.0;
                }
            }
        }
    }
}

/// Unit rectangles of the collidable tiles under the four corners of
/// `bounds`. Corners outside the grid contribute nothing.
fn collidable_corners(bounds: &Bounds, tiles: &TileGrid) -> [Option<Bounds>; 4] {
    let left = bounds.x.floor() as i64;
    let right = bounds.right().floor() as i64;
    let bottom = bounds.y.floor() as i64;
    let top = bounds.top().floor() as i64;

    [(left, bottom), (right, bottom), (right, top), (left, top)].map(|(column, row)| {
        tiles
            .get_signed(column, row)
            .filter(|tile| tile.is_collidable())
            .map(|_| Bounds::new(column as f32, row as f32, 1.0, 1.0))
    })
}
