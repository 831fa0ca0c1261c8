use anyhow::Result;
use approx::assert_abs_diff_eq;
use f1_racing::{
    compute::{CpuBackend, SimulationBackend},
    config::{GameConfig, WaypointGeneratorKind},
    game::Game,
    input::{EditorCommand, GameAction, InputOutcome, ViewMode},
    simulation::{resolve_pair, AiDriver, Car, SimulationState, TrackBounds, PLAYER_COLOR},
    track::{SegmentType, Track, TrackError},
};

fn seeded_config(seed: u64) -> GameConfig {
    let mut config = GameConfig::default();
    config.simulation.seed = Some(seed);
    config
}

#[test]
fn test_game_starts_on_default_circuit() -> Result<()> {
    let game = Game::new(seeded_config(1))?;

    assert_eq!(game.track().segment_count(), 8);
    assert!(!game.track().waypoints()?.is_empty());
    assert!(game.track().mesh()?.is_some());
    assert_eq!(game.state().ai_cars.len(), 3);
    assert_eq!(game.backend_name(), "CPU");
    assert!(!game.is_editing());
    Ok(())
}

#[test]
fn test_race_keeps_every_car_inside_limits() -> Result<()> {
    let mut game = Game::new(seeded_config(2))?;
    let bounds = TrackBounds::new(game.config().track.half_extent);
    game.state_mut().player.speed = 1.5;
    game.state_mut().player.steering = 0.3;

    for _ in 0..3600 {
        game.update(1.0 / 60.0)?;

        // Walls roll moves back; only a collision shove can poke past them.
        let state = game.state();
        let limit = bounds.half_extent + 2.0;
        assert!(state.player.x.abs() <= limit && state.player.z.abs() <= limit);
        for ai in &state.ai_cars {
            assert!(ai.car.speed >= 0.0 && ai.car.speed <= ai.car.max_speed);
            assert!(ai.car.x.abs() <= limit && ai.car.z.abs() <= limit);
        }
    }

    assert_eq!(game.state().ticks, 3600);
    assert_abs_diff_eq!(game.state().time, 60.0, epsilon = 0.05);
    Ok(())
}

#[test]
fn test_lone_ai_car_follows_the_racing_line() -> Result<()> {
    let mut config = seeded_config(3);
    config.ai.car_count = 1;
    let mut game = Game::new(config)?;
    // Park the player well away from the racing line.
    game.state_mut().player.x = -18.0;
    game.state_mut().player.z = -18.0;

    // Three simulated minutes is ample for one lap of the default circuit.
    for _ in 0..(180 * 60) {
        game.update(1.0 / 60.0)?;
    }

    let ai = &game.state().ai_cars[0];
    assert!(ai.driver.laps >= 1, "no lap completed, stuck at waypoint {}", ai.driver.current_waypoint);
    assert!(ai.car.speed > 0.0);
    Ok(())
}

#[test]
fn test_long_stall_is_clamped_and_zero_dt_skipped() -> Result<()> {
    let mut game = Game::new(seeded_config(4))?;

    game.update(5.0)?;
    assert_abs_diff_eq!(game.state().time, 0.1, epsilon = 1e-6);

    game.update(0.0)?;
    game.update(-1.0)?;
    assert_eq!(game.state().ticks, 1);
    Ok(())
}

#[test]
fn test_backend_refuses_stale_track() {
    let mut track = Track::new("Stale");
    track
        .add_segment(SegmentType::Straight, 20.0, 0.0, 5.0)
        .expect("segment added");

    let mut state = SimulationState::new(Car::new(0.0, 0.0, 0.0, 2.0, 0.1, PLAYER_COLOR));
    let mut backend = CpuBackend::new(&GameConfig::default());
    let error = backend
        .update(&mut state, &track, 0.016)
        .expect_err("stale track must not be simulated");

    assert!(matches!(error.downcast_ref::<TrackError>(), Some(TrackError::StaleDerivedData)));
    assert_eq!(state.ticks, 0);
}

#[test]
fn test_player_input() -> Result<()> {
    let mut game = Game::new(seeded_config(5))?;

    for _ in 0..40 {
        game.key_down(GameAction::Accelerate);
    }
    assert_eq!(game.state().player.speed, game.state().player.max_speed);

    for _ in 0..80 {
        game.key_down(GameAction::Brake);
    }
    assert_abs_diff_eq!(game.state().player.speed, -game.state().player.max_speed / 2.0);

    game.key_down(GameAction::SteerLeft);
    assert_eq!(game.state().player.steering, 1.0);
    game.key_down(GameAction::SteerRight);
    assert_eq!(game.state().player.steering, -1.0);
    game.key_up(GameAction::SteerLeft);
    assert_eq!(game.state().player.steering, 0.0);

    assert_eq!(game.view(), ViewMode::Chase);
    for _ in 0..3 {
        game.key_down(GameAction::ChangeView);
    }
    assert_eq!(game.view(), ViewMode::Top);
    game.key_down(GameAction::ChangeView);
    assert_eq!(game.view(), ViewMode::Chase);

    assert_eq!(game.key_down(GameAction::Quit), InputOutcome::Quit);
    assert!(game.quit_requested());
    Ok(())
}

#[test]
fn test_editor_round_trip_promotes_working_track() -> Result<()> {
    let mut game = Game::new(seeded_config(6))?;
    game.update(1.0 / 60.0)?;

    assert_eq!(game.key_down(GameAction::OpenEditor), InputOutcome::OpenEditor);
    assert!(game.is_editing());

    // The race is frozen and game keys are ignored while editing.
    let ticks = game.state().ticks;
    game.update(1.0 / 60.0)?;
    game.key_down(GameAction::Accelerate);
    assert_eq!(game.state().ticks, ticks);
    assert_eq!(game.state().player.speed, 0.0);

    let editor = game.editor_mut().expect("editor open");
    editor.select_segment(0);
    editor.delete_selected()?;
    editor.delete_selected()?;
    // The live track is untouched until the editor closes.
    assert_eq!(game.track().segment_count(), 8);

    game.state_mut().ai_cars[0].driver.current_waypoint = 10_000;
    game.editor_command(EditorCommand::Exit)?;

    assert!(!game.is_editing());
    assert_eq!(game.track().segment_count(), 6);
    let waypoint_count = game.track().waypoints()?.len();
    for ai in &game.state().ai_cars {
        assert!(ai.driver.current_waypoint < waypoint_count);
    }

    game.update(1.0 / 60.0)?;
    assert_eq!(game.state().ticks, ticks + 1);
    Ok(())
}

#[test]
fn test_editor_can_empty_the_live_track() -> Result<()> {
    let mut game = Game::new(seeded_config(7))?;
    game.enter_editor();
    game.editor_command(EditorCommand::New)?;
    game.exit_editor();

    assert_eq!(game.track().segment_count(), 0);
    // With no waypoints the AI simply rolls to a stop.
    for _ in 0..60 {
        game.update(1.0 / 60.0)?;
    }
    for ai in &game.state().ai_cars {
        assert_eq!(ai.driver.current_waypoint, 0);
    }
    Ok(())
}

#[test]
fn test_reference_loop_game() -> Result<()> {
    let mut config = seeded_config(8);
    config.track.waypoint_generator = WaypointGeneratorKind::ReferenceLoop;
    let game = Game::new(config)?;

    let waypoints = game.track().waypoints()?;
    assert_eq!(waypoints.len(), 8);
    // Grid lines up behind the first waypoint, facing the second.
    let player = &game.state().player;
    assert_abs_diff_eq!(player.ry, 90.0, epsilon = 1e-4);
    assert_abs_diff_eq!(player.x, -1.5, epsilon = 1e-4);
    assert_abs_diff_eq!(player.z, 10.0, epsilon = 1e-4);
    Ok(())
}

#[test]
fn test_scenario_bearing_and_first_tick() {
    use f1_racing::simulation::{bearing, drive_ai_car, Point};
    use f1_racing::track::Waypoint;

    let mut car = Car::new(0.0, 10.0, 0.0, 1.8, 0.1, PLAYER_COLOR);
    let target = Waypoint::new(10.0, 10.0, 5.0);
    assert_abs_diff_eq!(bearing(car.ground_position(), target.position()), 90.0, epsilon = 1e-4);

    let mut driver = AiDriver::new(0.9);
    drive_ai_car(
        &mut car,
        &mut driver,
        &[target, Waypoint::new(10.0, 0.0, 5.0)],
        std::iter::empty::<Point>(),
        &TrackBounds::default(),
        0.016,
    );
    assert!(driver.target_angle > 0.0 && driver.target_angle < 90.0);
}

#[test]
fn test_scenario_collision_pass() {
    let mut a = Car::new(0.0, 0.0, 0.0, 1.8, 0.1, PLAYER_COLOR);
    let mut b = Car::new(0.0, 0.5, 0.0, 1.8, 0.1, PLAYER_COLOR);
    a.speed = 1.2;
    b.speed = 0.8;

    resolve_pair(&mut a, &mut b);

    assert!(a.distance_to(&b) > 0.5);
    assert_abs_diff_eq!(a.speed, 1.2 * 0.9, epsilon = 1e-6);
    assert_abs_diff_eq!(b.speed, 0.8 * 0.9, epsilon = 1e-6);
}
