use anyhow::Result;
use f1_racing::track::{
    build_track_mesh, default_circuit, generate_random_track, MeshId, ReferenceLoopGenerator, SegmentPathGenerator,
    SegmentType, Track, TrackError, TrackSegment, Waypoint, WaypointGenerator, DEFAULT_TRACK_WIDTH,
    MAX_SEGMENT_LENGTH, MIN_CURVATURE, MIN_SEGMENT_LENGTH, MIN_TRACK_WIDTH,
};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;

fn segment_path() -> Arc<dyn WaypointGenerator> {
    Arc::new(SegmentPathGenerator::default())
}

fn assert_regenerated(track: &Track) {
    assert!(!track.needs_regeneration());
    let waypoints = track.waypoints().expect("waypoints readable after regeneration");
    if track.segment_count() > 0 {
        assert!(!waypoints.is_empty());
        let mesh = track.mesh().expect("mesh readable after regeneration");
        assert!(mesh.is_some());
    }
}

#[test]
fn test_empty_track() -> Result<()> {
    let track = Track::new("Empty");

    assert_eq!(track.name(), "Empty");
    assert_eq!(track.segment_count(), 0);
    assert!(track.is_modified());
    assert!(track.waypoints()?.is_empty());
    assert!(track.mesh()?.is_none());
    Ok(())
}

#[test]
fn test_segment_changes_make_derived_data_unreadable_until_regenerated() -> Result<()> {
    let mut track = Track::new("Stale");
    track.add_segment(SegmentType::Straight, 20.0, 0.0, 5.0)?;

    assert!(track.needs_regeneration());
    assert!(matches!(track.waypoints(), Err(TrackError::StaleDerivedData)));
    assert!(matches!(track.mesh(), Err(TrackError::StaleDerivedData)));

    track.generate_waypoints();
    assert!(!track.waypoints()?.is_empty());
    // The mesh still lags behind the new waypoints.
    assert!(matches!(track.mesh(), Err(TrackError::StaleDerivedData)));

    track.generate_track_mesh();
    assert_regenerated(&track);
    Ok(())
}

#[test]
fn test_regeneration_invariant_holds_after_every_edit() -> Result<()> {
    let mut track = default_circuit("Invariant", segment_path());
    assert_regenerated(&track);

    track.push_segment(TrackSegment::with_defaults(SegmentType::CurveLeft))?;
    track.regenerate();
    assert_regenerated(&track);

    track.insert_segment(0, TrackSegment::with_defaults(SegmentType::HairpinRight))?;
    track.regenerate();
    assert_regenerated(&track);

    track.remove_segment(3)?;
    track.regenerate();
    assert_regenerated(&track);

    track.update_segment(0, |s| s.width = 8.0)?;
    track.regenerate();
    assert_regenerated(&track);
    Ok(())
}

#[test]
fn test_mesh_is_replaced_with_a_new_id() -> Result<()> {
    let mut track = default_circuit("Mesh", segment_path());
    let first = track.mesh()?.map(|m| m.id).expect("mesh present");

    track.regenerate();
    let mesh = track.mesh()?.expect("mesh present");
    let waypoint_count = track.waypoints()?.len();

    assert_ne!(mesh.id, first);
    assert_eq!(mesh.vertices.len(), waypoint_count * 2);
    assert_eq!(mesh.indices.len(), waypoint_count * 6);
    assert_eq!(mesh.triangle_count(), waypoint_count * 2);
    assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    Ok(())
}

#[test]
fn test_mesh_ribbon_width_follows_waypoints() {
    let waypoints = [
        Waypoint::new(0.0, 0.0, 4.0),
        Waypoint::new(0.0, 10.0, 4.0),
        Waypoint::new(10.0, 10.0, 4.0),
    ];
    let mesh = build_track_mesh(&waypoints, MeshId(9)).expect("three waypoints make a mesh");

    for pair in mesh.vertices.chunks(2) {
        let dx = pair[0][0] - pair[1][0];
        let dz = pair[0][2] - pair[1][2];
        assert!(((dx * dx + dz * dz).sqrt() - 4.0).abs() < 1e-4);
        assert_eq!(pair[0][1], 0.0);
    }

    assert!(build_track_mesh(&waypoints[..1], MeshId(10)).is_none());
    // Coincident points fall back instead of producing NaN.
    let degenerate = [Waypoint::new(1.0, 1.0, 5.0); 3];
    let mesh = build_track_mesh(&degenerate, MeshId(11)).expect("mesh present");
    assert!(mesh.vertices.iter().flatten().all(|v| v.is_finite()));
}

#[test]
fn test_out_of_range_edits_leave_track_unchanged() -> Result<()> {
    let mut track = default_circuit("Ranges", segment_path());
    let before = track.segments().to_vec();

    assert!(matches!(
        track.remove_segment(99),
        Err(TrackError::IndexOutOfRange { index: 99, len: 8, .. })
    ));
    assert!(track
        .insert_segment(9, TrackSegment::with_defaults(SegmentType::Straight))
        .is_err());
    assert!(track.update_segment(8, |s| s.length = 10.0).is_err());
    assert!(track.move_waypoint(10_000, 0.0, 0.0).is_err());

    assert_eq!(track.segments(), &before[..]);
    assert!(!track.needs_regeneration());
    assert!(!track.is_modified());
    Ok(())
}

#[test]
fn test_segment_edits_are_clamped() -> Result<()> {
    let mut track = default_circuit("Clamp", segment_path());

    track.update_segment(0, |s| {
        s.length = 500.0;
        s.curvature = 0.7;
        s.width = 1.0;
    })?;
    let straight = track.segment(0).copied().expect("segment 0");
    assert_eq!(straight.length, MAX_SEGMENT_LENGTH);
    assert_eq!(straight.curvature, 0.0);
    assert_eq!(straight.width, 3.0);

    track.update_segment(1, |s| {
        s.length = 0.0;
        s.curvature = 5.0;
        s.width = 50.0;
    })?;
    let curve = track.segment(1).copied().expect("segment 1");
    assert_eq!(curve.length, MIN_SEGMENT_LENGTH);
    assert_eq!(curve.curvature, 1.0);
    assert_eq!(curve.width, 10.0);
    Ok(())
}

#[test]
fn test_no_op_edit_keeps_track_clean() -> Result<()> {
    let mut track = default_circuit("Clean", segment_path());
    track.update_segment(2, |s| s.length = s.length)?;

    assert!(!track.needs_regeneration());
    assert!(!track.is_modified());
    Ok(())
}

#[test]
fn test_reference_loop_ignores_segment_content() -> Result<()> {
    let generator: Arc<dyn WaypointGenerator> = Arc::new(ReferenceLoopGenerator);

    let mut short = Track::with_generator("Short", Arc::clone(&generator));
    short.add_segment(SegmentType::Straight, 5.0, 0.0, 3.0)?;
    short.regenerate();

    let mut long = default_circuit("Long", generator);
    long.add_segment(SegmentType::HairpinLeft, 40.0, 1.0, 9.0)?;
    long.regenerate();

    // Same eight points whatever the segments say.
    assert_eq!(short.waypoints()?, long.waypoints()?);
    assert_eq!(short.waypoints()?, &ReferenceLoopGenerator::WAYPOINTS[..]);
    Ok(())
}

#[test]
fn test_segment_path_depends_on_segments() -> Result<()> {
    let mut a = default_circuit("A", segment_path());
    let b = default_circuit("B", segment_path());
    assert_eq!(a.waypoints()?, b.waypoints()?);

    a.update_segment(0, |s| s.length = 40.0)?;
    a.regenerate();
    assert_ne!(a.waypoints()?.len(), b.waypoints()?.len());
    Ok(())
}

#[test]
fn test_default_circuit_closes_and_fits_the_envelope() -> Result<()> {
    let generator = SegmentPathGenerator::default();
    let track = default_circuit("Default", Arc::new(generator.clone()));
    let waypoints = track.waypoints()?;

    assert_eq!(track.segment_count(), 8);
    assert!(!track.is_modified());
    // 20 and 30 long straights and 15 long curves sampled every 2 units.
    assert_eq!(waypoints.len(), 10 + 8 + 15 + 8 + 10 + 8 + 15 + 8);

    for wp in waypoints {
        assert!(wp.x.abs() <= generator.fit_extent + 1e-3);
        assert!(wp.z.abs() <= generator.fit_extent + 1e-3);
        assert_eq!(wp.width, 5.0);
    }

    let first = waypoints[0].position();
    let last = waypoints[waypoints.len() - 1].position();
    assert!((first - last).norm() < 2.5, "loop does not close");
    Ok(())
}

#[test]
fn test_segment_anchor_tracks_arc_length() -> Result<()> {
    let track = default_circuit("Anchors", segment_path());

    assert_eq!(track.segment_anchor(0), Some(0));
    let anchor = track.segment_anchor(1).expect("anchor for segment 1");
    assert!((9..=11).contains(&anchor), "anchor {anchor}");
    assert_eq!(track.segment_anchor(8), None);
    Ok(())
}

#[test]
fn test_manual_waypoint_move_only_rebuilds_mesh() -> Result<()> {
    let mut track = default_circuit("Manual", segment_path());

    track.move_waypoint(3, 1.0, -2.0)?;
    assert!(track.is_modified());
    assert!(matches!(track.mesh(), Err(TrackError::StaleDerivedData)));
    assert_eq!(track.waypoints()?[3], Waypoint::new(1.0, -2.0, 5.0));

    track.generate_track_mesh();
    assert!(track.mesh()?.is_some());
    assert_eq!(track.waypoints()?[3].x, 1.0);

    // Regenerating from segments discards the manual placement.
    track.regenerate();
    assert_ne!(track.waypoints()?[3].x, 1.0);
    Ok(())
}

#[test]
fn test_random_track_is_a_closed_loop_of_alternating_segments() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(1234);
    let track = generate_random_track("Random", 10, segment_path(), &mut rng);

    assert_eq!(track.segment_count(), 10);
    assert_regenerated(&track);

    let curve_kind = track.segments()[1].kind;
    assert!(!curve_kind.is_straight());
    for (i, segment) in track.segments().iter().enumerate() {
        assert!((MIN_SEGMENT_LENGTH..=MAX_SEGMENT_LENGTH).contains(&segment.length));
        if i % 2 == 0 {
            assert_eq!(segment.kind, SegmentType::Straight);
        } else {
            assert_eq!(segment.kind, curve_kind);
        }
    }

    let total_turn: f32 = track.segments().iter().map(|s| s.turn_angle()).sum();
    assert!((total_turn.abs() - std::f32::consts::TAU).abs() < 1e-3);
    Ok(())
}

#[test]
fn test_random_track_has_at_least_eight_segments() {
    let mut rng = StdRng::seed_from_u64(5);
    let track = generate_random_track("Tiny", 3, segment_path(), &mut rng);
    assert_eq!(track.segment_count(), 8);
}

#[test]
fn test_segment_turn_angles() {
    use std::f32::consts::{FRAC_PI_2, PI};

    assert_eq!(TrackSegment::with_defaults(SegmentType::Straight).turn_angle(), 0.0);
    let gentle = TrackSegment::new(SegmentType::CurveLeft, 10.0, 0.1, 5.0);
    assert!((gentle.turn_angle() - 1.0).abs() < 1e-6);
    let tight = TrackSegment::new(SegmentType::CurveRight, 15.0, 0.2, 5.0);
    assert_eq!(tight.turn_angle(), -FRAC_PI_2);
    assert_eq!(TrackSegment::with_defaults(SegmentType::HairpinLeft).turn_angle(), PI);
}

#[test]
fn test_short_segments_still_produce_a_mesh() -> Result<()> {
    for length in [0.0, 1.0, 1.9] {
        let mut track = Track::new("Short");
        track.add_segment(SegmentType::Straight, length, 0.0, 5.0)?;
        track.regenerate();

        assert_eq!(track.segments()[0].length, MIN_SEGMENT_LENGTH);
        assert!(track.waypoints()?.len() >= 2);
        assert!(track.mesh()?.is_some(), "no mesh for length {length}");
    }

    // Even below the sampling spacing a segment yields two waypoints.
    let waypoints = SegmentPathGenerator::new(10.0, 15.0)
        .generate(&[TrackSegment::new(SegmentType::Straight, 1.0, 0.0, 5.0)]);
    assert_eq!(waypoints.len(), 2);
    assert!(build_track_mesh(&waypoints, MeshId(1)).is_some());
    Ok(())
}

#[test]
fn test_inserted_segments_are_clamped() -> Result<()> {
    let mut track = Track::new("Clamped");
    track.add_segment(SegmentType::CurveLeft, f32::NAN, -1.0, f32::INFINITY)?;
    track.push_segment(TrackSegment::new(SegmentType::Straight, 1e9, 0.5, 0.0))?;

    let curve = track.segments()[0];
    assert_eq!(curve.length, SegmentType::CurveLeft.default_length());
    assert_eq!(curve.curvature, MIN_CURVATURE);
    assert_eq!(curve.width, DEFAULT_TRACK_WIDTH);

    let straight = track.segments()[1];
    assert_eq!(straight.length, MAX_SEGMENT_LENGTH);
    assert_eq!(straight.curvature, 0.0);
    assert_eq!(straight.width, MIN_TRACK_WIDTH);

    assert_eq!(track.set_segments(vec![TrackSegment::with_defaults(SegmentType::Straight)]), 0);
    Ok(())
}
