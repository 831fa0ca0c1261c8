use super::{AiCar, Car, Vec2};
use crate::config::PlayerConfig;

/// Centre distance below which two cars overlap.
pub const COLLISION_DISTANCE: f32 = 1.0;
/// Speed kept by both cars after a contact.
pub const COLLISION_SPEED_FACTOR: f32 = 0.9;
/// Speed kept by the player after hitting the track edge.
pub const PLAYER_WALL_SPEED_FACTOR: f32 = 0.5;
pub const PLAYER_WHEEL_SPIN_RATE: f32 = 480.0;

/// Square envelope around the origin that stands in for the track edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackBounds {
    pub half_extent: f32,
}

impl TrackBounds {
    pub fn new(half_extent: f32) -> Self {
        Self { half_extent }
    }

    /// Points exactly on the edge are still inside.
    pub fn is_out_of_bounds(&self, x: f32, z: f32) -> bool {
        x.abs() > self.half_extent || z.abs() > self.half_extent
    }
}

impl Default for TrackBounds {
    fn default() -> Self {
        Self::new(19.0)
    }
}

pub fn check_track_bounds(car: &Car, bounds: &TrackBounds) -> bool {
    bounds.is_out_of_bounds(car.x, car.z)
}

/// Integrates the player car from whatever speed and steering the input
/// layer last set.
pub struct PlayerPhysics {
    bounds: TrackBounds,
    turn_rate: f32,
    friction: f32,
}

impl PlayerPhysics {
    pub fn new(config: &PlayerConfig, bounds: TrackBounds) -> Self {
        Self {
            bounds,
            turn_rate: config.turn_rate,
            friction: config.friction,
        }
    }

    /// Advance the player by `dt` seconds. Returns true if the move was
    /// rolled back at the track edge.
    pub fn update(&self, car: &mut Car, dt: f32) -> bool {
        let previous = car.ground_position();
        car.set_ground_position(previous + car.forward() * (car.speed * dt));

        let hit_wall = check_track_bounds(car, &self.bounds);
        if hit_wall {
            car.set_ground_position(previous);
            car.speed *= PLAYER_WALL_SPEED_FACTOR;
            log::debug!("Player hit the track edge at ({:.2}, {:.2})", previous.x, previous.y);
        }

        car.ry += car.steering * dt * self.turn_rate;
        car.spin_wheels(car.speed * dt * PLAYER_WHEEL_SPIN_RATE);
        car.speed *= self.friction;

        hit_wall
    }
}

/// Push two overlapping cars apart along the line joining them and scrub
/// 10% of their speed. Returns false when they were not touching.
///
/// Afterwards the centres sit exactly [`COLLISION_DISTANCE`] apart.
pub fn resolve_pair(a: &mut Car, b: &mut Car) -> bool {
    let offset = b.ground_position() - a.ground_position();
    let distance = offset.norm();
    if distance >= COLLISION_DISTANCE {
        return false;
    }

    // Coincident cars get an arbitrary but fixed axis.
    let axis = if distance > f32::EPSILON {
        offset / distance
    } else {
        Vec2::new(1.0, 0.0)
    };
    let push = axis * ((COLLISION_DISTANCE - distance) * 0.5);

    a.set_ground_position(a.ground_position() - push);
    b.set_ground_position(b.ground_position() + push);
    a.speed *= COLLISION_SPEED_FACTOR;
    b.speed *= COLLISION_SPEED_FACTOR;
    true
}

/// Resolve every overlapping pair once: the player against each AI car,
/// then AI pairs in index order. Later pairs see earlier corrections, so a
/// dense pile-up may need several ticks to settle.
pub fn resolve_car_collisions(player: &mut Car, ai_cars: &mut [AiCar]) -> usize {
    let mut contacts = 0;

    for ai in ai_cars.iter_mut() {
        if resolve_pair(player, &mut ai.car) {
            contacts += 1;
        }
    }

    for i in 0..ai_cars.len() {
        let (head, tail) = ai_cars.split_at_mut(i + 1);
        let first = &mut head[i].car;
        for other in tail.iter_mut() {
            if resolve_pair(first, &mut other.car) {
                contacts += 1;
            }
        }
    }

    contacts
}
