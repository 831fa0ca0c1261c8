use crate::config::{AiConfig, ParamRange, PlayerConfig};
use crate::track::Waypoint;
use nalgebra::{Point2, Vector2};
use rand::Rng;

pub mod navigation;
pub mod physics;

pub use navigation::*;
pub use physics::*;

/// Ground-plane vector: `x` is world x, `y` is world z.
pub type Vec2 = Vector2<f32>;
/// Ground-plane point: `x` is world x, `y` is world z.
pub type Point = Point2<f32>;

/// Body height of a car resting on the track surface.
pub const CAR_RIDE_HEIGHT: f32 = 0.06;
/// Gap between consecutive cars on the starting grid.
pub const GRID_SPACING: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

pub const PLAYER_COLOR: Color = Color::new(0.9, 0.1, 0.1);

/// Team colours handed out to AI cars in order.
pub const TEAM_COLORS: [Color; 5] = [
    Color::new(0.0, 0.0, 0.7),
    Color::new(0.0, 0.7, 0.0),
    Color::new(0.7, 0.7, 0.0),
    Color::new(0.7, 0.0, 0.7),
    Color::new(0.0, 0.7, 0.7),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CarId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Car {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Heading in degrees; 0 faces +z and positive angles turn towards +x.
    pub ry: f32,
    pub pitch: f32,
    pub roll: f32,
    pub speed: f32,
    pub acceleration: f32,
    pub max_speed: f32,
    /// -1 (full right) ..= 1 (full left).
    pub steering: f32,
    pub color: Color,
    /// Cosmetic wheel spin in degrees, kept in [0, 360).
    pub wheel_rotation: f32,
}

impl Car {
    pub fn new(x: f32, z: f32, heading: f32, max_speed: f32, acceleration: f32, color: Color) -> Self {
        Self {
            x,
            y: CAR_RIDE_HEIGHT,
            z,
            ry: heading,
            pitch: 0.0,
            roll: 0.0,
            speed: 0.0,
            acceleration,
            max_speed,
            steering: 0.0,
            color,
            wheel_rotation: 0.0,
        }
    }

    pub fn player(config: &PlayerConfig) -> Self {
        Self::new(0.0, 0.0, 0.0, config.max_speed, config.acceleration, PLAYER_COLOR)
    }

    pub fn ground_position(&self) -> Point {
        Point::new(self.x, self.z)
    }

    pub fn set_ground_position(&mut self, position: Point) {
        self.x = position.x;
        self.z = position.y;
    }

    /// Unit vector the car is pointing along.
    pub fn forward(&self) -> Vec2 {
        let heading = self.ry.to_radians();
        Vec2::new(heading.sin(), heading.cos())
    }

    pub fn distance_to(&self, other: &Car) -> f32 {
        (self.ground_position() - other.ground_position()).norm()
    }

    /// Advance the wheel spin by `degrees`, wrapping into [0, 360).
    pub fn spin_wheels(&mut self, degrees: f32) {
        let wrapped = (self.wheel_rotation + degrees).rem_euclid(360.0);
        // rem_euclid can round a tiny negative up to exactly 360.
        self.wheel_rotation = if wrapped >= 360.0 { 0.0 } else { wrapped };
    }
}

/// An AI-controlled car together with the controller state that drives it.
#[derive(Debug, Clone)]
pub struct AiCar {
    pub id: CarId,
    pub car: Car,
    pub driver: AiDriver,
}

/// Everything that moves: the player, the AI field and the race clock.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub player: Car,
    pub ai_cars: Vec<AiCar>,
    pub time: f32,
    pub ticks: u64,
}

impl SimulationState {
    pub fn new(player: Car) -> Self {
        Self {
            player,
            ai_cars: Vec::new(),
            time: 0.0,
            ticks: 0,
        }
    }

    /// Player plus `ai.car_count` opponents with randomised driving
    /// parameters, lined up on the grid behind the first waypoint.
    pub fn new_race<R: Rng>(
        player_config: &PlayerConfig,
        ai_config: &AiConfig,
        waypoints: &[Waypoint],
        bounds: &TrackBounds,
        rng: &mut R,
    ) -> Self {
        let mut state = Self::new(Car::player(player_config));

        for i in 0..ai_config.car_count {
            let car = Car::new(
                0.0,
                0.0,
                0.0,
                sample_range(rng, ai_config.max_speed),
                sample_range(rng, ai_config.acceleration),
                TEAM_COLORS[i % TEAM_COLORS.len()],
            );
            let driver = AiDriver::new(sample_range(rng, ai_config.steering_damping));
            state.add_ai_car(car, driver);
        }

        state.place_on_grid(waypoints, bounds);
        state
    }

    pub fn add_ai_car(&mut self, car: Car, driver: AiDriver) -> CarId {
        let id = CarId(self.ai_cars.len());
        self.ai_cars.push(AiCar { id, car, driver });
        id
    }

    pub fn get_ai_car(&self, id: CarId) -> Option<&AiCar> {
        self.ai_cars.iter().find(|c| c.id == id)
    }

    pub fn get_ai_car_mut(&mut self, id: CarId) -> Option<&mut AiCar> {
        self.ai_cars.iter_mut().find(|c| c.id == id)
    }

    /// Line the cars up behind waypoint 0, facing waypoint 1: the player
    /// first, then each AI car a further [`GRID_SPACING`] back. A column that
    /// reaches the track edge continues alongside, alternating sides. Without
    /// waypoints the cars queue behind the origin along -z.
    pub fn place_on_grid(&mut self, waypoints: &[Waypoint], bounds: &TrackBounds) {
        let (start, heading) = match waypoints {
            [] => (Point::origin(), 0.0),
            [only] => (only.position(), 0.0),
            [first, second, ..] => (first.position(), bearing(first.position(), second.position())),
        };
        let radians = heading.to_radians();
        let back = -Vec2::new(radians.sin(), radians.cos());
        let slots = grid_slots(start, back, self.ai_cars.len() + 1, bounds);

        let reset = |car: &mut Car, slot: Point| {
            car.set_ground_position(slot);
            car.y = CAR_RIDE_HEIGHT;
            car.ry = heading;
            car.speed = 0.0;
            car.steering = 0.0;
        };

        reset(&mut self.player, slots[0]);
        for (ai, slot) in self.ai_cars.iter_mut().zip(&slots[1..]) {
            reset(&mut ai.car, *slot);
            ai.driver.reset(heading);
        }
    }

    /// Keep every driver's waypoint index valid after the track changed.
    pub fn clamp_waypoint_indices(&mut self, waypoint_count: usize) {
        for ai in &mut self.ai_cars {
            ai.driver.clamp_waypoint(waypoint_count);
        }
    }

    /// Every car's ground position, player first, then AI cars in order.
    pub fn positions_snapshot(&self) -> Vec<Point> {
        std::iter::once(self.player.ground_position())
            .chain(self.ai_cars.iter().map(|ai| ai.car.ground_position()))
            .collect()
    }
}

/// `count` grid positions inside `bounds`, filling columns behind `start`
/// in the order centre, right, left, further right, and so on.
fn grid_slots(start: Point, back: Vec2, count: usize, bounds: &TrackBounds) -> Vec<Point> {
    let side = Vec2::new(back.y, -back.x);
    let max_columns = ((4.0 * bounds.half_extent / GRID_SPACING).ceil().max(0.0) as usize).saturating_add(1);
    let mut slots = Vec::with_capacity(count);

    'columns: for column in 0..max_columns {
        let offset = ((column + 1) / 2) as f32 * if column % 2 == 1 { 1.0 } else { -1.0 };
        let lateral = side * (offset * GRID_SPACING);

        for row in 1.. {
            if slots.len() == count {
                break 'columns;
            }
            let slot = start + lateral + back * (GRID_SPACING * row as f32);
            if bounds.is_out_of_bounds(slot.x, slot.y) {
                break;
            }
            slots.push(slot);
        }
    }

    // Only reachable when the start itself sits on or past the edge.
    let edge = bounds.half_extent;
    let fallback = Point::new(start.x.max(-edge).min(edge), start.y.max(-edge).min(edge));
    slots.resize(count, fallback);
    slots
}

fn sample_range<R: Rng>(rng: &mut R, range: ParamRange) -> f32 {
    if range.max > range.min {
        rng.gen_range(range.min..=range.max)
    } else {
        range.min
    }
}
