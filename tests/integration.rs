// Integration tests (native) for the `quick-sketch` crate.
// These tests avoid wasm-specific functionality and exercise pure Rust logic so
// they can run under `cargo test` on the host.

use quick_sketch::api::{NewRound, Prediction, RoundOutcome};
use quick_sketch::canvas::{SurfacePoint, map_to_surface, rgba_is_blank};
use quick_sketch::error::GameError;
use quick_sketch::round::{Command, Msg, RoundController, Screen};
use quick_sketch::timer::{Countdown, LOW_TIME_THRESHOLD, ROUND_SECONDS, Tick};

fn new_round() -> NewRound {
    NewRound {
        target_class: "cat".to_string(),
        session_id: "session-1".to_string(),
    }
}

fn sample_outcome() -> RoundOutcome {
    RoundOutcome {
        target_class: "cat".to_string(),
        matched: true,
        predictions: vec![
            Prediction {
                class_name: "cat".to_string(),
                probability: 0.92,
            },
            Prediction {
                class_name: "dog".to_string(),
                probability: 0.05,
            },
        ],
    }
}

/// Drive a controller to the point where a class has arrived and the
/// countdown is running.
fn controller_in_prompt() -> RoundController {
    let mut ctrl = RoundController::new();
    ctrl.handle(Msg::NewRoundRequested);
    let epoch = ctrl.epoch();
    ctrl.handle(Msg::ClassArrived {
        epoch,
        result: Ok(new_round()),
    });
    ctrl
}

// --- Countdown ---------------------------------------------------------------

#[test]
fn countdown_starts_at_forty_seconds() {
    let countdown = Countdown::new();
    assert_eq!(countdown.remaining(), ROUND_SECONDS);
    assert_eq!(ROUND_SECONDS, 40);
    assert!(!countdown.is_low());
}

#[test]
fn countdown_warns_at_threshold() {
    let mut countdown = Countdown::new();
    while countdown.remaining() > LOW_TIME_THRESHOLD + 1 {
        assert_eq!(countdown.tick(), Tick::Running);
        assert!(!countdown.is_low(), "warned at {}", countdown.remaining());
    }
    assert_eq!(countdown.tick(), Tick::Running);
    assert_eq!(countdown.remaining(), LOW_TIME_THRESHOLD);
    assert!(countdown.is_low());
}

#[test]
fn countdown_expires_exactly_once() {
    let mut countdown = Countdown::new();
    let mut expirations = 0;
    for _ in 0..ROUND_SECONDS + 5 {
        if countdown.tick() == Tick::Expired {
            expirations += 1;
        }
    }
    assert_eq!(expirations, 1);
    assert_eq!(countdown.remaining(), 0);
}

#[test]
fn countdown_reset_restores_full_duration() {
    let mut countdown = Countdown::new();
    for _ in 0..7 {
        countdown.tick();
    }
    countdown.reset();
    assert_eq!(countdown.remaining(), ROUND_SECONDS);
}

// --- Round lifecycle ---------------------------------------------------------

#[test]
fn new_round_clears_canvas_and_resets_timer_before_prompt() {
    let mut ctrl = RoundController::new();
    let commands = ctrl.handle(Msg::NewRoundRequested);

    let clear_at = commands
        .iter()
        .position(|c| *c == Command::ClearSurface)
        .expect("no clear command");
    let timer_at = commands
        .iter()
        .position(|c| {
            *c == Command::UpdateTimer {
                seconds: 40,
                warning: false,
            }
        })
        .expect("no timer reset command");
    let prompt_at = commands
        .iter()
        .position(|c| *c == Command::ShowScreen(Screen::Prompt))
        .expect("no prompt screen command");
    assert!(clear_at < prompt_at);
    assert!(timer_at < prompt_at);

    assert!(commands.contains(&Command::RequestClass { epoch: 1 }));
    assert_eq!(ctrl.screen(), Screen::Prompt);
    assert_eq!(ctrl.seconds_remaining(), 40);
}

#[test]
fn class_arrival_sets_prompt_and_starts_ticking() {
    let mut ctrl = RoundController::new();
    ctrl.handle(Msg::NewRoundRequested);
    let commands = ctrl.handle(Msg::ClassArrived {
        epoch: ctrl.epoch(),
        result: Ok(new_round()),
    });
    assert!(commands.contains(&Command::SetPrompt("cat".to_string())));
    assert!(commands.contains(&Command::StartTicking));
    assert_eq!(ctrl.target_class(), Some("cat"));
    assert_eq!(ctrl.session_id(), Some("session-1"));
}

#[test]
fn class_failure_goes_straight_to_error_screen() {
    let mut ctrl = RoundController::new();
    ctrl.handle(Msg::NewRoundRequested);
    let commands = ctrl.handle(Msg::ClassArrived {
        epoch: ctrl.epoch(),
        result: Err(GameError::class_request_failed(Some(
            "model offline".to_string(),
        ))),
    });
    assert_eq!(ctrl.screen(), Screen::Error);
    assert!(commands.contains(&Command::ShowError(
        "Failed to get a drawing prompt: model offline".to_string()
    )));
    assert!(commands.contains(&Command::ShowScreen(Screen::Error)));
    assert!(!commands.iter().any(|c| matches!(c, Command::StartTicking)));
}

#[test]
fn stale_class_response_is_discarded() {
    let mut ctrl = RoundController::new();
    ctrl.handle(Msg::NewRoundRequested);
    let stale_epoch = ctrl.epoch();
    ctrl.handle(Msg::NewRoundRequested);

    let commands = ctrl.handle(Msg::ClassArrived {
        epoch: stale_epoch,
        result: Ok(new_round()),
    });
    assert!(commands.is_empty());
    assert_eq!(ctrl.target_class(), None);
    assert_eq!(ctrl.session_id(), None);
}

// --- Submission --------------------------------------------------------------

#[test]
fn blank_submit_never_sends_and_shows_exact_message() {
    let mut ctrl = controller_in_prompt();
    let commands = ctrl.handle(Msg::SubmitRequested {
        surface_blank: true,
    });
    assert_eq!(ctrl.screen(), Screen::Error);
    assert!(commands.contains(&Command::ShowError(
        "Please draw something before submitting!".to_string()
    )));
    assert!(commands.contains(&Command::StopTicking));
    assert!(
        !commands
            .iter()
            .any(|c| matches!(c, Command::SendDrawing { .. }))
    );
}

#[test]
fn submit_stops_timer_and_enters_loading() {
    let mut ctrl = controller_in_prompt();
    let commands = ctrl.handle(Msg::SubmitRequested {
        surface_blank: false,
    });
    assert_eq!(ctrl.screen(), Screen::Loading);
    assert_eq!(
        commands,
        vec![
            Command::StopTicking,
            Command::ShowScreen(Screen::Loading),
            Command::SendDrawing {
                epoch: ctrl.epoch(),
                session_id: Some("session-1".to_string()),
            },
        ]
    );
}

#[test]
fn manual_and_expiry_submissions_share_one_path() {
    // Manual: the submit button asks the glue to sample the surface.
    let mut manual = controller_in_prompt();
    let click = manual.handle(Msg::SubmitClicked);
    assert_eq!(click, vec![Command::BeginSubmit]);

    // Expiry: ticking down to zero ends with the same request to sample.
    let mut expiry = controller_in_prompt();
    let mut expiry_commands = Vec::new();
    for _ in 0..40 {
        expiry_commands = expiry.handle(Msg::TimerTick);
    }
    assert!(expiry_commands.contains(&Command::BeginSubmit));

    // From there both run the identical transition.
    let manual_submit = manual.handle(Msg::SubmitRequested {
        surface_blank: false,
    });
    let expiry_submit = expiry.handle(Msg::SubmitRequested {
        surface_blank: false,
    });
    assert_eq!(manual_submit, expiry_submit);
}

#[test]
fn stray_tick_after_expiry_does_not_resubmit() {
    let mut ctrl = controller_in_prompt();
    for _ in 0..40 {
        ctrl.handle(Msg::TimerTick);
    }
    let commands = ctrl.handle(Msg::TimerTick);
    assert!(!commands.iter().any(|c| matches!(c, Command::BeginSubmit)));
}

#[test]
fn submit_is_ignored_outside_prompt_screen() {
    let mut ctrl = controller_in_prompt();
    ctrl.handle(Msg::SubmitRequested {
        surface_blank: false,
    });
    assert_eq!(ctrl.screen(), Screen::Loading);
    let commands = ctrl.handle(Msg::SubmitRequested {
        surface_blank: false,
    });
    assert!(commands.is_empty());
}

#[test]
fn timer_ticks_update_display_with_warning_flag() {
    let mut ctrl = controller_in_prompt();
    let commands = ctrl.handle(Msg::TimerTick);
    assert_eq!(
        commands,
        vec![Command::UpdateTimer {
            seconds: 39,
            warning: false,
        }]
    );

    for _ in 0..28 {
        ctrl.handle(Msg::TimerTick);
    }
    let commands = ctrl.handle(Msg::TimerTick);
    assert_eq!(
        commands,
        vec![Command::UpdateTimer {
            seconds: 10,
            warning: true,
        }]
    );
}

// --- Outcome -----------------------------------------------------------------

#[test]
fn successful_outcome_renders_result_screen() {
    let mut ctrl = controller_in_prompt();
    ctrl.handle(Msg::SubmitRequested {
        surface_blank: false,
    });
    let outcome = sample_outcome();
    let commands = ctrl.handle(Msg::OutcomeArrived {
        epoch: ctrl.epoch(),
        result: Ok(outcome.clone()),
    });
    assert_eq!(ctrl.screen(), Screen::Result);
    assert_eq!(
        commands,
        vec![
            Command::RenderOutcome(outcome),
            Command::ShowScreen(Screen::Result),
        ]
    );
}

#[test]
fn outcome_failure_shows_server_message() {
    let mut ctrl = controller_in_prompt();
    ctrl.handle(Msg::SubmitRequested {
        surface_blank: false,
    });
    let commands = ctrl.handle(Msg::OutcomeArrived {
        epoch: ctrl.epoch(),
        result: Err(GameError::Server("bad image".to_string())),
    });
    assert_eq!(ctrl.screen(), Screen::Error);
    assert!(commands.contains(&Command::ShowError("bad image".to_string())));
}

#[test]
fn stale_outcome_cannot_overwrite_new_round() {
    let mut ctrl = controller_in_prompt();
    ctrl.handle(Msg::SubmitRequested {
        surface_blank: false,
    });
    let stale_epoch = ctrl.epoch();

    // Player starts over while the classification is still in flight.
    ctrl.handle(Msg::NewRoundRequested);
    assert_eq!(ctrl.screen(), Screen::Prompt);

    let commands = ctrl.handle(Msg::OutcomeArrived {
        epoch: stale_epoch,
        result: Ok(sample_outcome()),
    });
    assert!(commands.is_empty());
    assert_eq!(ctrl.screen(), Screen::Prompt);
}

// --- Screen exclusivity ------------------------------------------------------

#[test]
fn transitions_show_at_most_one_screen_each() {
    let mut ctrl = RoundController::new();
    let script = vec![
        Msg::NewRoundRequested,
        Msg::ClassArrived {
            epoch: 1,
            result: Ok(new_round()),
        },
        Msg::TimerTick,
        Msg::SubmitClicked,
        Msg::SubmitRequested {
            surface_blank: false,
        },
        Msg::OutcomeArrived {
            epoch: 1,
            result: Ok(sample_outcome()),
        },
        Msg::NewRoundRequested,
        Msg::SubmitRequested {
            surface_blank: true,
        },
        Msg::NewRoundRequested,
    ];
    for msg in script {
        let shows = ctrl
            .handle(msg.clone())
            .iter()
            .filter(|c| matches!(c, Command::ShowScreen(_)))
            .count();
        assert!(shows <= 1, "{msg:?} produced {shows} screen switches");
    }
}

// --- Drawing messages --------------------------------------------------------

#[test]
fn pointer_messages_map_to_stroke_commands() {
    let mut ctrl = controller_in_prompt();
    let p1 = SurfacePoint { x: 10.0, y: 20.0 };
    let p2 = SurfacePoint { x: 14.0, y: 26.0 };
    assert_eq!(
        ctrl.handle(Msg::PointerDown(p1)),
        vec![Command::BeginStroke(p1)]
    );
    assert_eq!(
        ctrl.handle(Msg::PointerMove(p2)),
        vec![Command::ExtendStroke(p2)]
    );
    assert_eq!(ctrl.handle(Msg::PointerUp), vec![Command::EndStroke]);
}

#[test]
fn clear_button_only_clears_the_surface() {
    let mut ctrl = controller_in_prompt();
    let before = ctrl.screen();
    assert_eq!(ctrl.handle(Msg::ClearClicked), vec![Command::ClearSurface]);
    assert_eq!(ctrl.screen(), before);
}

// --- Canvas pixel helpers ----------------------------------------------------

#[test]
fn fresh_white_buffer_is_blank() {
    let data = vec![255u8; 16 * 16 * 4];
    assert!(rgba_is_blank(&data));
}

#[test]
fn any_inked_pixel_makes_buffer_non_blank() {
    let mut data = vec![255u8; 16 * 16 * 4];
    // one black pixel in the middle
    let offset = (8 * 16 + 8) * 4;
    data[offset] = 0;
    data[offset + 1] = 0;
    data[offset + 2] = 0;
    assert!(!rgba_is_blank(&data));
}

#[test]
fn blank_tolerance_absorbs_antialiased_edges() {
    // 250 on a single channel is still background, 249 is ink.
    let mut data = vec![255u8; 4 * 4];
    data[1] = 250;
    assert!(rgba_is_blank(&data));
    data[1] = 249;
    assert!(!rgba_is_blank(&data));
}

#[test]
fn surface_mapping_translates_and_scales() {
    // Canvas rendered at half its native size, offset inside the viewport.
    let point = map_to_surface(120.0, 90.0, 100.0, 50.0, 250.0, 200.0, 500.0, 400.0);
    assert_eq!(point, SurfacePoint { x: 40.0, y: 80.0 });
}

#[test]
fn surface_mapping_is_identity_at_native_size() {
    let point = map_to_surface(37.0, 11.0, 0.0, 0.0, 500.0, 400.0, 500.0, 400.0);
    assert_eq!(point, SurfacePoint { x: 37.0, y: 11.0 });
}
