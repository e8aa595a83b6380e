//! Integration tests for the motion controller.
//!
//! These drive the full public API against the mock hardware, covering the
//! busy/rejection semantics, step bookkeeping, reference seeking, restarts,
//! and the persisted configuration.

use rotaplate::hal::{MockDelay, MockPulse, MockReference, PulseOp};
use rotaplate::{
    CommandOutcome, Direction, Microstep, MotionCommand, MotionController, MotionKind,
    PlatformConfig, RejectReason, DEFAULT_REFERENCE_POSITION, DIRECTION_SETTLE_MS, RUN_DUTY,
    SEEK_FREQUENCY_HZ,
};

type TestController = MotionController<MockPulse, MockReference, MockDelay>;

fn controller() -> TestController {
    // captured per test so the controller's warn/debug events show up in
    // failure output
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    MotionController::new(MockPulse::new(), MockReference::new(), MockDelay::new()).unwrap()
}

/// Feed step edges until the pending budget drains, then finalize.
fn run_move_to_completion(c: &mut TestController) {
    while c.pending_steps() > 0 {
        c.on_step_edge();
    }
    assert!(c.poll().unwrap());
}

// ============================================================================
// Motion exclusivity
// ============================================================================

#[test]
fn only_one_motion_at_a_time() {
    let mut c = controller();
    assert!(c.move_to(100.0).unwrap().is_accepted());

    // every motion demand bounces while the move is in flight
    for cmd in [
        MotionCommand::MoveTo(50.0),
        MotionCommand::AdvanceOneUnit,
        MotionCommand::SeekReference,
        MotionCommand::StartContinuous,
    ] {
        let outcome = c.apply_command(cmd).unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Rejected(RejectReason::Busy),
            "{cmd:?} should be rejected while moving"
        );
    }
    assert_eq!(c.motion_kind(), MotionKind::MoveTo);
}

#[test]
fn rejected_command_leaves_state_untouched() {
    let mut c = controller();
    c.move_to(100.0).unwrap();
    let before = c.status();
    let ops_before = c.pulse().ops.len();

    c.move_to(10.0).unwrap();
    c.seek_reference().unwrap();

    assert_eq!(c.status(), before);
    assert_eq!(c.pulse().ops.len(), ops_before, "no pulse traffic on rejection");
}

#[test]
fn motion_accepted_again_after_completion() {
    let mut c = controller();
    c.move_to(91.0).unwrap();
    run_move_to_completion(&mut c);

    assert!(c.move_to(92.0).unwrap().is_accepted());
}

// ============================================================================
// Bounded moves
// ============================================================================

#[test]
fn ten_degree_move_at_max_microstep_is_177_steps() {
    let mut c = controller();
    // 10 / (360 / (200 * 32)) = 177.78, floored
    c.move_to(100.0).unwrap();
    assert_eq!(c.pending_steps(), 177);
}

#[test]
fn target_within_resolution_is_accepted_noop() {
    let mut c = controller();
    let resolution = c.microstep().step_resolution_degrees();

    let outcome = c.move_to(90.0 + resolution * 0.9).unwrap();
    assert_eq!(outcome, CommandOutcome::AlreadyAtTarget);
    assert_eq!(c.motion_kind(), MotionKind::Idle);
    assert_eq!(c.pulse().enable_count(), 0);
}

#[test]
fn move_ends_within_one_resolution_of_target() {
    let mut c = controller();
    for target in [95.5, 123.4, 45.0, 90.2] {
        c.move_to(target).unwrap();
        if c.motion_kind() == MotionKind::MoveTo {
            run_move_to_completion(&mut c);
        }
        let resolution = c.microstep().step_resolution_degrees();
        assert!(
            (c.position() - target).abs() <= resolution,
            "position {} should be within {resolution} of {target}",
            c.position()
        );
    }
}

#[test]
fn backward_move_decreases_position() {
    let mut c = controller();
    c.move_to(45.0).unwrap();
    assert_eq!(c.direction(), Direction::Backward);
    run_move_to_completion(&mut c);
    assert!(c.position() < 90.0);
}

#[test]
fn extra_edges_never_drive_count_negative() {
    let mut c = controller();
    c.move_to(90.5).unwrap();
    let steps = c.pending_steps();

    for _ in 0..(steps * 2 + 5) {
        c.on_step_edge();
    }
    assert_eq!(c.pending_steps(), 0);
}

#[test]
fn move_start_sequence_latches_direction_before_enable() {
    let mut c = controller();
    let mark = c.pulse().ops.len();
    c.move_to(45.0).unwrap();

    let ops = &c.pulse().ops[mark..];
    assert_eq!(
        ops,
        &[
            PulseOp::SetDirection(Direction::Backward),
            PulseOp::SetFrequency(1920),
            PulseOp::Enable(RUN_DUTY),
        ]
    );
}

// ============================================================================
// Reference seeking
// ============================================================================

#[test]
fn seek_runs_forward_at_seek_rate() {
    let mut c = controller();
    c.switch_direction().unwrap();
    c.seek_reference().unwrap();

    assert_eq!(c.direction(), Direction::Forward);
    assert_eq!(c.pulse().frequency_hz, SEEK_FREQUENCY_HZ);
    assert_eq!(c.pulse().duty, RUN_DUTY);
}

#[test]
fn seek_resets_position_when_sensor_fires() {
    let mut c = controller();
    c.seek_reference().unwrap();

    // wander off the anchor while the sensor stays quiet
    for _ in 0..500 {
        c.on_step_edge();
    }
    assert!(!c.poll().unwrap());
    assert_ne!(c.position(), DEFAULT_REFERENCE_POSITION);

    c.sensor_mut().set_active(true);
    assert!(c.poll().unwrap());
    assert_eq!(c.position(), DEFAULT_REFERENCE_POSITION);
    assert_eq!(c.motion_kind(), MotionKind::Idle);
    assert!(!c.pulse().enabled);
}

#[test]
fn seek_ignores_stale_pending_count_semantics() {
    let mut c = controller();
    c.seek_reference().unwrap();
    assert_eq!(c.pending_steps(), 0);
    // edges during a seek must not underflow any counter
    for _ in 0..10 {
        c.on_step_edge();
    }
    assert_eq!(c.pending_steps(), 0);
}

// ============================================================================
// Stop and direction
// ============================================================================

#[test]
fn stop_from_idle_is_accepted() {
    let mut c = controller();
    assert_eq!(c.stop().unwrap(), CommandOutcome::Applied);
    assert_eq!(c.pulse().disable_count(), 0, "nothing to disable while idle");
}

#[test]
fn stop_mid_move_keeps_partial_progress() {
    let mut c = controller();
    c.move_to(100.0).unwrap();
    let budget = c.pending_steps();
    for _ in 0..(budget / 2) {
        c.on_step_edge();
    }
    c.stop().unwrap();

    assert_eq!(c.motion_kind(), MotionKind::Idle);
    assert!(c.position() > 90.0 && c.position() < 100.0);
    // a later move starts from the partial position
    c.move_to(100.0).unwrap();
    assert!(c.pending_steps() < budget);
}

#[test]
fn switch_direction_while_running_settles_before_restart() {
    let mut c = controller();
    c.start_continuous().unwrap();
    c.switch_direction().unwrap();

    assert_eq!(c.pulse().direction, Direction::Backward);
    assert!(c.pulse().enabled);
    assert_eq!(c.motion_kind(), MotionKind::Continuous);
    assert_eq!(c.delay().delays_ms, [DIRECTION_SETTLE_MS]);
}

#[test]
fn double_switch_restores_direction() {
    let mut c = controller();
    c.switch_direction().unwrap();
    c.switch_direction().unwrap();
    assert_eq!(c.direction(), Direction::Forward);
}

// ============================================================================
// Speed and microstep
// ============================================================================

#[test]
fn speed_change_while_stopped_applies_to_next_run() {
    let mut c = controller();
    c.set_speed(30.0).unwrap();
    c.start_continuous().unwrap();
    assert_eq!(c.pulse().frequency_hz, 3200);
}

#[test]
fn speed_change_mid_move_keeps_step_budget() {
    let mut c = controller();
    c.move_to(100.0).unwrap();
    let budget = c.pending_steps();

    c.set_speed(10.0).unwrap();

    assert_eq!(c.pending_steps(), budget);
    assert_eq!(c.motion_kind(), MotionKind::MoveTo);
    assert!(c.pulse().enabled);
}

#[test]
fn microstep_change_rescales_moves() {
    let mut c = controller();
    c.set_microstep(Microstep::X1).unwrap();
    // full steps: 1.8 degrees each, 10 degrees => 5 steps
    c.move_to(100.0).unwrap();
    assert_eq!(c.pending_steps(), 5);
}

#[test]
fn microstep_locked_during_every_motion_kind() {
    let mut c = controller();

    c.start_continuous().unwrap();
    assert_eq!(
        c.set_microstep(Microstep::X1).unwrap(),
        CommandOutcome::Rejected(RejectReason::ConfigLocked)
    );
    c.stop().unwrap();

    c.seek_reference().unwrap();
    assert_eq!(
        c.set_microstep(Microstep::X1).unwrap(),
        CommandOutcome::Rejected(RejectReason::ConfigLocked)
    );
    c.stop().unwrap();

    c.move_to(100.0).unwrap();
    assert_eq!(
        c.set_microstep(Microstep::X1).unwrap(),
        CommandOutcome::Rejected(RejectReason::ConfigLocked)
    );
}

#[test]
fn microstep_change_resets_default_speed() {
    let mut c = controller();
    c.set_speed(40.0).unwrap();
    c.set_microstep(Microstep::X16).unwrap();
    // back at the ratio default of 18 RPM
    assert!((c.rpm() - 18.0).abs() < 0.01);
    assert_eq!(c.pulse().frequency_hz, Microstep::X16.default_frequency_hz());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn apply_config_programs_all_three_settings() {
    let mut c = controller();
    let config = PlatformConfig::default()
        .with_direction(Direction::Backward)
        .with_rpm(25)
        .with_microstep(Microstep::X8);

    c.apply_config(&config).unwrap();

    assert_eq!(c.direction(), Direction::Backward);
    assert_eq!(c.microstep(), Microstep::X8);
    assert!((c.rpm() - 25.0).abs() < 0.01, "loaded rpm must win over the microstep default");
    assert_eq!(c.pulse().direction, Direction::Backward);
}

#[test]
fn config_survives_serialization() {
    let config = PlatformConfig::default()
        .with_direction(Direction::Backward)
        .with_rpm(33)
        .with_microstep(Microstep::X2);

    let restored = PlatformConfig::from_file_string(&config.to_file_string());
    assert_eq!(restored, config);
}

#[test]
fn corrupt_config_falls_back_per_field() {
    let restored = PlatformConfig::from_file_string("1\nnot-a-number\n2\n");
    assert_eq!(restored.direction, Direction::Forward);
    assert_eq!(restored.rpm, PlatformConfig::default().rpm);
    assert_eq!(restored.microstep, Microstep::X2);
}

// ============================================================================
// Status reporting
// ============================================================================

#[test]
fn status_reflects_motion_lifecycle() {
    let mut c = controller();

    let idle = c.status();
    assert_eq!(idle.motion, MotionKind::Idle);
    assert_eq!(idle.position_degrees, 90.0);

    c.move_to(100.0).unwrap();
    let moving = c.status();
    assert_eq!(moving.motion, MotionKind::MoveTo);
    assert_eq!(moving.pending_steps, 177);

    run_move_to_completion(&mut c);
    assert_eq!(c.status().motion, MotionKind::Idle);
}

#[test]
fn params_line_tracks_position_and_speed() {
    let mut c = controller();
    c.set_speed(25.0).unwrap();
    c.move_to(120.0).unwrap();
    run_move_to_completion(&mut c);

    let line = c.status().params_line();
    assert!(line.as_str().starts_with("Position: 119"));
    assert!(line.as_str().ends_with("Speed (RPM): 25.00"));
}

// ============================================================================
// Settle delays
// ============================================================================

#[test]
fn restart_paths_all_wait_for_settle() {
    let mut c = controller();
    c.start_continuous().unwrap();
    c.switch_direction().unwrap();
    c.set_speed(25.0).unwrap();
    c.stop().unwrap();

    // idle paths never pay the delay
    c.switch_direction().unwrap();
    c.set_speed(30.0).unwrap();

    assert_eq!(
        c.delay().delays_ms,
        [DIRECTION_SETTLE_MS, DIRECTION_SETTLE_MS],
        "exactly one settle wait per running restart"
    );
    assert_eq!(c.pulse().disable_count(), 3); // 2 restarts + stop
}
