use super::{
    SegmentType, Track, TrackSegment, Waypoint, DEFAULT_TRACK_WIDTH, MAX_CURVATURE,
    MAX_SEGMENT_LENGTH, MIN_CURVATURE, MIN_SEGMENT_LENGTH,
};
use crate::config::{TrackConfig, WaypointGeneratorKind};
use nalgebra::{Point2, Vector2};
use rand::Rng;
use rand_distr::StandardNormal;
use std::f32::consts::TAU;
use std::fmt;
use std::sync::Arc;

/// Turns an authored segment list into the racing line cars follow.
///
/// Implementations must return an ordered sequence that is meant to be
/// followed cyclically (the last waypoint leads back to the first). They are
/// never called with an empty segment list.
pub trait WaypointGenerator: fmt::Debug + Send + Sync {
    fn generate(&self, segments: &[TrackSegment]) -> Vec<Waypoint>;

    fn name(&self) -> &'static str;
}

/// Walks the segments from the origin, heading +z, sampling a waypoint every
/// `spacing` units. Whatever gap remains between the end and the start is
/// spread linearly along the path so the loop closes, and the result is
/// centred and shrunk (never enlarged) to fit within `fit_extent`.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPathGenerator {
    pub spacing: f32,
    pub fit_extent: f32,
}

impl SegmentPathGenerator {
    /// Fraction of the bounds envelope the racing line may occupy.
    pub const FIT_RATIO: f32 = 0.8;

    pub fn new(spacing: f32, fit_extent: f32) -> Self {
        Self { spacing, fit_extent }
    }

    pub fn for_config(config: &TrackConfig) -> Self {
        Self::new(config.waypoint_spacing, config.half_extent * Self::FIT_RATIO)
    }
}

impl Default for SegmentPathGenerator {
    fn default() -> Self {
        Self::for_config(&TrackConfig::default())
    }
}

impl WaypointGenerator for SegmentPathGenerator {
    fn generate(&self, segments: &[TrackSegment]) -> Vec<Waypoint> {
        let spacing = self.spacing.max(0.1);

        // (position, width, distance travelled when the sample was taken)
        let mut samples: Vec<(Point2<f32>, f32, f32)> = Vec::new();
        let mut position = Point2::origin();
        let mut heading = 0.0f32;
        let mut travelled = 0.0f32;

        for segment in segments {
            let length = segment.length.max(0.0);
            // Two samples per segment at least, so even a lone short segment
            // gives a loop a mesh can be built from.
            let steps = ((length / spacing).ceil() as usize).max(2);
            let step_length = length / steps as f32;
            let turn_step = segment.turn_angle() / steps as f32;

            for _ in 0..steps {
                samples.push((position, segment.width, travelled));

                let mid_heading = heading + turn_step * 0.5;
                position += Vector2::new(mid_heading.sin(), mid_heading.cos()) * step_length;
                heading += turn_step;
                travelled += step_length;
            }
        }

        let gap = position.coords;
        if travelled > 0.0 {
            for (point, _, distance) in samples.iter_mut() {
                *point -= gap * (*distance / travelled);
            }
        }

        let mut min = Vector2::new(f32::INFINITY, f32::INFINITY);
        let mut max = Vector2::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for (point, _, _) in &samples {
            min = min.inf(&point.coords);
            max = max.sup(&point.coords);
        }
        let center = (min + max) * 0.5;
        let half_size = (max - min).max() * 0.5;
        let scale = if half_size > self.fit_extent && half_size > 0.0 {
            self.fit_extent / half_size
        } else {
            1.0
        };

        samples
            .into_iter()
            .map(|(point, width, _)| {
                let fitted = (point.coords - center) * scale;
                Waypoint::new(fitted.x, fitted.y, width)
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "segment-path"
    }
}

/// The fixed eight-point rectangular loop used as a reference circuit. It ignores
/// the segments entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReferenceLoopGenerator;

impl ReferenceLoopGenerator {
    pub const WAYPOINTS: [Waypoint; 8] = [
        Waypoint::new(0.0, 10.0, 5.0),
        Waypoint::new(10.0, 10.0, 5.0),
        Waypoint::new(15.0, 5.0, 5.0),
        Waypoint::new(15.0, -5.0, 5.0),
        Waypoint::new(10.0, -10.0, 5.0),
        Waypoint::new(0.0, -10.0, 5.0),
        Waypoint::new(-10.0, -10.0, 5.0),
        Waypoint::new(-10.0, 5.0, 5.0),
    ];
}

impl WaypointGenerator for ReferenceLoopGenerator {
    fn generate(&self, _segments: &[TrackSegment]) -> Vec<Waypoint> {
        Self::WAYPOINTS.to_vec()
    }

    fn name(&self) -> &'static str {
        "reference-loop"
    }
}

pub fn generator_for(config: &TrackConfig) -> Arc<dyn WaypointGenerator> {
    match config.waypoint_generator {
        WaypointGeneratorKind::SegmentPath => Arc::new(SegmentPathGenerator::for_config(config)),
        WaypointGeneratorKind::ReferenceLoop => Arc::new(ReferenceLoopGenerator),
    }
}

/// The built-in circuit: a rounded rectangle of four straights and four
/// right-hand curves, regenerated and considered saved.
pub fn default_circuit(name: &str, generator: Arc<dyn WaypointGenerator>) -> Track {
    let straight = |length| TrackSegment::new(SegmentType::Straight, length, 0.0, DEFAULT_TRACK_WIDTH);
    let right = TrackSegment::new(SegmentType::CurveRight, 15.0, 0.2, DEFAULT_TRACK_WIDTH);

    let mut track = Track::with_generator(name, generator);
    track.set_segments(vec![
        straight(20.0),
        right,
        straight(30.0),
        right,
        straight(20.0),
        right,
        straight(30.0),
        right,
    ]);
    track.regenerate();
    track.mark_saved();
    track
}

/// A random loop of `segment_count` segments (at least eight): straights
/// alternating with same-handed curves whose turns add up to a full circle.
pub fn generate_random_track<R: Rng>(
    name: &str,
    segment_count: usize,
    generator: Arc<dyn WaypointGenerator>,
    rng: &mut R,
) -> Track {
    let count = segment_count.max(8);
    let curve_count = count / 2;
    let turn_per_curve = TAU / curve_count as f32;
    let curve_kind = if rng.gen_bool(0.5) {
        SegmentType::CurveLeft
    } else {
        SegmentType::CurveRight
    };

    let mut normal = |mean: f32, deviation: f32| {
        let z: f32 = rng.sample(StandardNormal);
        (mean + deviation * z).clamp(MIN_SEGMENT_LENGTH, MAX_SEGMENT_LENGTH)
    };

    let mut segments = Vec::with_capacity(count);
    for i in 0..count {
        if i % 2 == 1 {
            let length = normal(15.0, 3.0);
            let curvature = (turn_per_curve / length).clamp(MIN_CURVATURE, MAX_CURVATURE);
            segments.push(TrackSegment::new(curve_kind, length, curvature, DEFAULT_TRACK_WIDTH));
        } else {
            let length = normal(20.0, 5.0);
            segments.push(TrackSegment::new(SegmentType::Straight, length, 0.0, DEFAULT_TRACK_WIDTH));
        }
    }

    let mut track = Track::with_generator(name, generator);
    track.set_segments(segments);
    track.regenerate();

    log::info!("Generated random track '{}' with {} segments", name, track.segment_count());
    track
}
