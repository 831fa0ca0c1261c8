use super::{Car, Point, SimulationState, TrackBounds};
use crate::track::Waypoint;

/// Within this distance of the current waypoint the target bearing starts
/// blending towards the next one.
pub const LOOKAHEAD_DISTANCE: f32 = 3.0;
/// A waypoint counts as reached inside this radius.
pub const ARRIVAL_DISTANCE: f32 = 1.0;
/// Inside this radius the driver eases off slightly.
pub const APPROACH_DISTANCE: f32 = 1.5;

pub const STEERING_KP: f32 = 0.015;
pub const STEERING_KD: f32 = 0.025;

/// Heading errors beyond this many degrees count as cornering.
pub const CORNER_ANGLE: f32 = 25.0;
pub const MIN_CORNER_SPEED_FACTOR: f32 = 0.6;
/// Braking is this much stronger than accelerating.
pub const BRAKE_RATIO: f32 = 1.2;

pub const AVOID_RADIUS: f32 = 1.2;
/// Other cars within this many degrees either side of the heading are "ahead".
pub const AVOID_CONE: f32 = 45.0;
pub const MAX_AVOID_SLOWDOWN: f32 = 0.6;
pub const EVADE_MIN_ANGLE: f32 = 5.0;
pub const EVADE_STEERING: f32 = 0.4;
pub const EVADE_BLEND: f32 = 0.7;

pub const WALL_SPEED_FACTOR: f32 = 0.7;
pub const WALL_STEERING_FACTOR: f32 = 0.7;

/// Degrees per second at full lock and standstill.
pub const AI_TURN_RATE: f32 = 80.0;
pub const TURN_RATE_FALLOFF: f32 = 0.4;
/// Degrees of wheel spin per unit travelled.
pub const WHEEL_SPIN_RATE: f32 = 480.0;

/// Wrap an angle in degrees into (-180, 180].
pub fn normalize_angle(degrees: f32) -> f32 {
    let wrapped = degrees % 360.0;
    if wrapped > 180.0 {
        wrapped - 360.0
    } else if wrapped <= -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Heading in degrees that points from `from` to `to` (0 = +z, 90 = +x).
/// Coincident points give 0.
pub fn bearing(from: Point, to: Point) -> f32 {
    let delta = to - from;
    delta.x.atan2(delta.y).to_degrees()
}

/// Move `from` towards `to` by `t` along the shorter way round the circle.
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    from + normalize_angle(to - from) * t
}

/// Per-car controller memory that persists between ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct AiDriver {
    pub current_waypoint: usize,
    /// Exponentially smoothed heading the driver is aiming for.
    pub target_angle: f32,
    /// Weight kept from the previous target each tick, in [0, 1).
    pub steering_damping: f32,
    pub last_error: f32,
    pub laps: u32,
}

impl AiDriver {
    pub fn new(steering_damping: f32) -> Self {
        Self {
            current_waypoint: 0,
            target_angle: 0.0,
            steering_damping,
            last_error: 0.0,
            laps: 0,
        }
    }

    pub fn reset(&mut self, heading: f32) {
        self.current_waypoint = 0;
        self.target_angle = heading;
        self.last_error = 0.0;
        self.laps = 0;
    }

    pub fn smooth_target(&mut self, raw_bearing: f32) -> f32 {
        self.target_angle = lerp_angle(self.target_angle, raw_bearing, 1.0 - self.steering_damping);
        self.target_angle
    }

    /// PD steering on the heading error (degrees). Output is clamped to [-1, 1].
    pub fn steer(&mut self, error: f32, dt: f32) -> f32 {
        let proportional = STEERING_KP * error;
        let derivative = if dt > 0.0 {
            STEERING_KD * (error - self.last_error) / dt
        } else {
            0.0
        };
        self.last_error = error;

        (proportional + derivative).clamp(-1.0, 1.0)
    }

    /// Move on to the next waypoint; returns true when that completes a lap.
    pub fn advance_waypoint(&mut self, waypoint_count: usize) -> bool {
        if waypoint_count == 0 {
            self.current_waypoint = 0;
            return false;
        }

        self.current_waypoint = (self.current_waypoint + 1) % waypoint_count;
        if self.current_waypoint == 0 {
            self.laps += 1;
            return true;
        }
        false
    }

    pub fn clamp_waypoint(&mut self, waypoint_count: usize) {
        self.current_waypoint = self.current_waypoint.min(waypoint_count.saturating_sub(1));
    }
}

/// Bearing the driver should aim for, and the distance to the current
/// waypoint. Close to the waypoint the bearing blends towards the next one.
pub fn target_bearing(position: Point, waypoints: &[Waypoint], index: usize) -> (f32, f32) {
    let count = waypoints.len();
    let target = waypoints[index].position();
    let distance = (target - position).norm();
    let mut raw = bearing(position, target);

    if distance < LOOKAHEAD_DISTANCE {
        let next = waypoints[(index + 1) % count].position();
        let blend = 1.0 - distance / LOOKAHEAD_DISTANCE;
        raw = lerp_angle(raw, bearing(position, next), blend);
    }

    (raw, distance)
}

/// Speed the driver wants given the heading error and waypoint distance.
pub fn target_speed(max_speed: f32, angle_error: f32, distance: f32) -> f32 {
    let mut factor = 1.0;

    if angle_error.abs() > CORNER_ANGLE {
        factor = (0.8 - (angle_error.abs() - CORNER_ANGLE) * 0.004).max(MIN_CORNER_SPEED_FACTOR);
    }

    if distance < APPROACH_DISTANCE {
        factor *= 0.95 + (distance / APPROACH_DISTANCE) * 0.05;
    }

    max_speed * factor
}

/// Accelerate or brake towards `target` without overshooting it.
pub fn approach_speed(current: f32, target: f32, acceleration: f32, dt: f32) -> f32 {
    if current < target {
        (current + acceleration * dt).min(target)
    } else {
        (current - acceleration * BRAKE_RATIO * dt).max(target)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveOutcome {
    pub reached_waypoint: bool,
    pub completed_lap: bool,
    pub hit_wall: bool,
}

/// One tick of AI driving for a single car.
///
/// `obstacles` are the other cars' positions; the caller decides whether
/// they come from a snapshot or live state.
pub fn drive_ai_car<I>(
    car: &mut Car,
    driver: &mut AiDriver,
    waypoints: &[Waypoint],
    obstacles: I,
    bounds: &TrackBounds,
    dt: f32,
) -> DriveOutcome
where
    I: IntoIterator<Item = Point>,
{
    let mut outcome = DriveOutcome::default();
    let position = car.ground_position();
    let mut arrived = false;

    if waypoints.is_empty() {
        car.steering = 0.0;
        car.speed = approach_speed(car.speed, 0.0, car.acceleration, dt);
    } else {
        driver.clamp_waypoint(waypoints.len());
        let (raw_bearing, distance) = target_bearing(position, waypoints, driver.current_waypoint);
        arrived = distance < ARRIVAL_DISTANCE;

        let target = driver.smooth_target(raw_bearing);
        let error = normalize_angle(target - car.ry);
        car.steering = driver.steer(error, dt);

        let wanted = target_speed(car.max_speed, error, distance);
        car.speed = approach_speed(car.speed, wanted, car.acceleration, dt);
    }

    for other in obstacles {
        let distance = (other - position).norm();
        if distance >= AVOID_RADIUS {
            continue;
        }

        let offset = normalize_angle(bearing(position, other) - car.ry);
        if offset.abs() < AVOID_CONE {
            car.speed *= 1.0 - ((AVOID_RADIUS - distance) / AVOID_RADIUS) * MAX_AVOID_SLOWDOWN;

            if offset.abs() > EVADE_MIN_ANGLE {
                let evade = if offset > 0.0 { -EVADE_STEERING } else { EVADE_STEERING };
                car.steering = car.steering * (1.0 - EVADE_BLEND) + evade * EVADE_BLEND;
            }
        }
    }

    car.set_ground_position(position + car.forward() * (car.speed * dt));
    if bounds.is_out_of_bounds(car.x, car.z) {
        car.set_ground_position(position);
        car.speed *= WALL_SPEED_FACTOR;
        car.steering = -car.steering * WALL_STEERING_FACTOR;
        outcome.hit_wall = true;
    }

    let turn_rate = AI_TURN_RATE / (1.0 + car.speed * TURN_RATE_FALLOFF);
    car.ry += car.steering * dt * turn_rate;
    car.spin_wheels(-car.speed * dt * WHEEL_SPIN_RATE);

    if arrived {
        outcome.reached_waypoint = true;
        outcome.completed_lap = driver.advance_waypoint(waypoints.len());
    }

    outcome
}

/// Drives every AI car for one tick.
///
/// Avoidance reads a snapshot of all positions taken before any AI car
/// moves, so the first and last car in the list see the same field.
pub struct NavigationEngine {
    bounds: TrackBounds,
    avoid_player: bool,
}

impl NavigationEngine {
    pub fn new(bounds: TrackBounds, avoid_player: bool) -> Self {
        Self {
            bounds,
            avoid_player,
        }
    }

    pub fn update(&self, state: &mut SimulationState, waypoints: &[Waypoint], dt: f32) {
        // Index 0 is the player, AI car i sits at i + 1.
        let snapshot = state.positions_snapshot();

        for (i, ai) in state.ai_cars.iter_mut().enumerate() {
            let obstacles = snapshot
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i + 1 && (self.avoid_player || *j != 0))
                .map(|(_, position)| *position);

            let outcome = drive_ai_car(&mut ai.car, &mut ai.driver, waypoints, obstacles, &self.bounds, dt);

            if outcome.hit_wall {
                log::debug!("AI car {} bounced off the track edge", ai.id.0);
            }
            if outcome.completed_lap {
                log::info!("AI car {} completed lap {}", ai.id.0, ai.driver.laps);
            }
        }
    }
}
