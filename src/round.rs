//! Round controller: the game's state machine.
//!
//! Every input, timer and network event is routed through [`RoundController::handle`]
//! as a [`Msg`]; the controller mutates its own state and answers with the
//! [`Command`]s the page glue must execute. Keeping the transition table in
//! one pure function makes the machine auditable and testable on the host.
//!
//! In-flight requests are tagged with a round epoch. A response that comes
//! back under a stale epoch (the player already moved on to a new round) is
//! discarded instead of overwriting the fresh round's state.

use crate::api::{NewRound, RoundOutcome};
use crate::canvas::SurfacePoint;
use crate::error::GameError;
use crate::timer::{Countdown, Tick};

/// The four mutually exclusive screens. Exactly one is visible at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Prompt,
    Loading,
    Result,
    Error,
}

/// Every event the page can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Initial start, and the continue/retry buttons.
    NewRoundRequested,
    /// Pointer pressed on the canvas (mouse or first touch), surface space.
    PointerDown(SurfacePoint),
    PointerMove(SurfacePoint),
    PointerUp,
    ClearClicked,
    SubmitClicked,
    /// One second of the countdown elapsed.
    TimerTick,
    /// Submission entry point shared by the submit button and timer expiry;
    /// the glue samples the surface and reports whether it is still blank.
    SubmitRequested { surface_blank: bool },
    /// `/get_random_class` finished for the round started at `epoch`.
    ClassArrived {
        epoch: u64,
        result: Result<NewRound, GameError>,
    },
    /// `/submit_drawing` finished for the round started at `epoch`.
    OutcomeArrived {
        epoch: u64,
        result: Result<RoundOutcome, GameError>,
    },
}

/// Side effects for the page glue.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ShowScreen(Screen),
    SetPrompt(String),
    UpdateTimer { seconds: u32, warning: bool },
    StartTicking,
    StopTicking,
    ClearSurface,
    BeginStroke(SurfacePoint),
    ExtendStroke(SurfacePoint),
    EndStroke,
    /// Sample the surface and re-dispatch as `SubmitRequested`.
    BeginSubmit,
    /// Issue the random-class request, tagged with the round epoch.
    RequestClass { epoch: u64 },
    /// Export the raster and POST it, tagged with the round epoch.
    SendDrawing {
        epoch: u64,
        session_id: Option<String>,
    },
    RenderOutcome(RoundOutcome),
    ShowError(String),
}

pub struct RoundController {
    screen: Screen,
    session_id: Option<String>,
    target_class: Option<String>,
    countdown: Countdown,
    epoch: u64,
}

impl RoundController {
    pub fn new() -> Self {
        Self {
            screen: Screen::Prompt,
            session_id: None,
            target_class: None,
            countdown: Countdown::new(),
            epoch: 0,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn target_class(&self) -> Option<&str> {
        self.target_class.as_deref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn handle(&mut self, msg: Msg) -> Vec<Command> {
        match msg {
            Msg::NewRoundRequested => self.start_round(),
            Msg::PointerDown(point) => vec![Command::BeginStroke(point)],
            Msg::PointerMove(point) => vec![Command::ExtendStroke(point)],
            Msg::PointerUp => vec![Command::EndStroke],
            Msg::ClearClicked => vec![Command::ClearSurface],
            Msg::SubmitClicked => vec![Command::BeginSubmit],
            Msg::TimerTick => self.tick(),
            Msg::SubmitRequested { surface_blank } => self.submit(surface_blank),
            Msg::ClassArrived { epoch, result } => self.class_arrived(epoch, result),
            Msg::OutcomeArrived { epoch, result } => self.outcome_arrived(epoch, result),
        }
    }

    /// Begin a fresh round: invalidate in-flight work, clear the surface,
    /// reset the countdown display and ask the server for a target class.
    /// The countdown only starts ticking once the class arrives.
    fn start_round(&mut self) -> Vec<Command> {
        self.epoch += 1;
        self.session_id = None;
        self.target_class = None;
        self.countdown.reset();
        self.screen = Screen::Prompt;
        log::info!("starting round {}", self.epoch);
        vec![
            Command::StopTicking,
            Command::ClearSurface,
            Command::UpdateTimer {
                seconds: self.countdown.remaining(),
                warning: false,
            },
            Command::ShowScreen(Screen::Prompt),
            Command::RequestClass { epoch: self.epoch },
        ]
    }

    fn class_arrived(
        &mut self,
        epoch: u64,
        result: Result<NewRound, GameError>,
    ) -> Vec<Command> {
        if epoch != self.epoch {
            log::debug!("discarding class response for stale round {epoch}");
            return Vec::new();
        }
        match result {
            Ok(round) => {
                log::info!("target class: {}", round.target_class);
                self.target_class = Some(round.target_class.clone());
                self.session_id = Some(round.session_id);
                vec![Command::SetPrompt(round.target_class), Command::StartTicking]
            }
            Err(err) => self.fail(err),
        }
    }

    fn tick(&mut self) -> Vec<Command> {
        if self.screen != Screen::Prompt {
            // A tick that raced a transition; the interval is already being
            // torn down.
            return Vec::new();
        }
        let outcome = self.countdown.tick();
        let mut commands = vec![Command::UpdateTimer {
            seconds: self.countdown.remaining(),
            warning: self.countdown.is_low(),
        }];
        if outcome == Tick::Expired {
            log::info!("time expired, auto-submitting");
            commands.push(Command::BeginSubmit);
        }
        commands
    }

    /// Shared submission path for the submit button and timer expiry.
    fn submit(&mut self, surface_blank: bool) -> Vec<Command> {
        if self.screen != Screen::Prompt {
            return Vec::new();
        }
        if surface_blank {
            return self.fail(GameError::EmptyDrawing);
        }
        self.screen = Screen::Loading;
        vec![
            Command::StopTicking,
            Command::ShowScreen(Screen::Loading),
            Command::SendDrawing {
                epoch: self.epoch,
                session_id: self.session_id.clone(),
            },
        ]
    }

    fn outcome_arrived(
        &mut self,
        epoch: u64,
        result: Result<RoundOutcome, GameError>,
    ) -> Vec<Command> {
        if epoch != self.epoch {
            log::debug!("discarding classification response for stale round {epoch}");
            return Vec::new();
        }
        match result {
            Ok(outcome) => {
                self.screen = Screen::Result;
                vec![
                    Command::RenderOutcome(outcome),
                    Command::ShowScreen(Screen::Result),
                ]
            }
            Err(err) => self.fail(err),
        }
    }

    fn fail(&mut self, err: GameError) -> Vec<Command> {
        log::warn!("round failed: {err}");
        self.screen = Screen::Error;
        vec![
            Command::StopTicking,
            Command::ShowError(err.to_string()),
            Command::ShowScreen(Screen::Error),
        ]
    }
}

impl Default for RoundController {
    fn default() -> Self {
        Self::new()
    }
}
