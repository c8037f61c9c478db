use super::{
    deferred::DeferredAction,
    ring_course::RingCourse,
    session_event::SessionEvent,
    session_state::{GameOverCause, PauseCause, SceneRequest, SessionPhase},
};
use crate::config::SessionConfig;
use crate::flight_control::FlightModel;
use crate::gesture_link::LinkStatus;
use crate::{event, game, info};
use glam::Vec3;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// State machine of one playthrough: countdown, running, game over.
///
/// `Session` decides, the presentation layers react. Every decision that is visible to
/// the player is sent as a [`SessionEvent`] over the channel returned by [`Session::new`].
/// The session never blocks; it is advanced from the frame tick
/// ([`Session::frame_update`]) and the fixed tick ([`Session::fixed_update`]).
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    phase: SessionPhase,
    paused_by: HashSet<PauseCause>,
    game_over: Option<GameOverCause>,
    /// Seconds of running time.
    elapsed: f32,
    /// Seconds until the run starts.
    countdown: f32,
    passed_rings: usize,
    total_rings: usize,
    countdown_text: Option<String>,
    highlighted_ring: Option<usize>,
    stall_cue: bool,
    pending_scene: Option<DeferredAction<SceneRequest>>,
    c_tok: CancellationToken,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl Session {
    /// Time scale while no pause is active.
    const RUNNING_TIME_SCALE: f32 = 1.0;
    const GO_TEXT: &'static str = "Go!";

    /// Creates a session for a course of `course.len()` rings.
    ///
    /// # Returns
    /// A tuple of:
    /// - The new `Session` in `Pregame` with the full countdown ahead.
    /// - The receiving end of its event channel.
    pub fn new(
        config: SessionConfig,
        course: &RingCourse,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let countdown = config.countdown;
        let session = Self {
            config,
            phase: SessionPhase::Pregame,
            paused_by: HashSet::new(),
            game_over: None,
            elapsed: 0.0,
            countdown,
            passed_rings: 0,
            total_rings: course.len(),
            countdown_text: None,
            highlighted_ring: None,
            stall_cue: false,
            pending_scene: None,
            c_tok: CancellationToken::new(),
            event_tx,
        };
        (session, event_rx)
    }

    pub fn config(&self) -> &SessionConfig { &self.config }
    pub fn phase(&self) -> SessionPhase { self.phase }
    pub fn is_running(&self) -> bool { self.phase == SessionPhase::Running }
    pub fn is_paused(&self) -> bool { !self.paused_by.is_empty() }
    pub fn is_paused_by(&self, cause: PauseCause) -> bool { self.paused_by.contains(&cause) }
    pub fn game_over_cause(&self) -> Option<GameOverCause> { self.game_over }
    pub fn elapsed(&self) -> f32 { self.elapsed }
    pub fn countdown(&self) -> f32 { self.countdown }
    pub fn passed_rings(&self) -> usize { self.passed_rings }
    pub fn total_rings(&self) -> usize { self.total_rings }
    pub fn time_left(&self) -> f32 { (self.config.time_limit - self.elapsed).max(0.0) }

    /// Scale applied to simulated time. Zero while any pause cause is active.
    pub fn time_scale(&self) -> f32 {
        if self.is_paused() { 0.0 } else { Self::RUNNING_TIME_SCALE }
    }

    /// Token that is cancelled when the session is torn down. Deferred actions of the
    /// session are bound to child tokens of it.
    pub fn cancel_token(&self) -> CancellationToken { self.c_tok.clone() }

    /// Whether a scene change has been requested and not yet handed out.
    pub fn has_pending_scene(&self) -> bool {
        self.pending_scene.as_ref().is_some_and(DeferredAction::is_pending)
    }

    /// Per-frame step.
    ///
    /// Advances deferred actions on the unscaled `dt`, tracks the gesture link and runs the
    /// countdown. `dt` is wall-clock time; the session applies its own time scale.
    ///
    /// # Arguments
    /// - `dt`: Seconds since the last frame, unscaled.
    /// - `link`: Current status of the gesture link.
    /// - `aircraft`: The vehicle, made controllable when the countdown ends.
    pub fn frame_update(&mut self, dt: f32, link: LinkStatus, aircraft: &mut FlightModel) {
        self.poll_deferred(dt);
        if self.phase == SessionPhase::Idle {
            return;
        }
        self.track_link(link);

        if self.is_paused() || self.phase != SessionPhase::Pregame {
            return;
        }
        self.run_countdown(dt * self.time_scale(), aircraft);
    }

    /// Applies the gesture link status to the `LostTracking` pause cause: a lost link
    /// pauses a running session, any other status clears the cause.
    pub fn track_link(&mut self, link: LinkStatus) {
        if self.phase == SessionPhase::Idle {
            return;
        }
        if link == LinkStatus::Lost && self.is_running() {
            self.pause(PauseCause::LostTracking);
        } else {
            self.resume(PauseCause::LostTracking);
        }
    }

    /// Fixed-step game rules: stall cue, ring order, elapsed time and the end conditions.
    /// Does nothing unless the session is running and unpaused.
    ///
    /// # Arguments
    /// - `dt`: Fixed step in seconds.
    /// - `course`: The rings, whose passed flags are read and reset here.
    /// - `aircraft`: The vehicle, locked when the run ends.
    pub fn fixed_update(&mut self, dt: f32, course: &mut RingCourse, aircraft: &mut FlightModel) {
        if !self.is_running() || self.is_paused() {
            return;
        }

        let stalled = aircraft.is_stalled();
        if stalled != self.stall_cue {
            self.stall_cue = stalled;
            self.emit(SessionEvent::StallCue(stalled));
        }
        self.highlight_next_ring();

        self.elapsed += dt;

        course.enforce_order(self.passed_rings);
        if course.take_passage(self.passed_rings) {
            let index = self.passed_rings;
            self.passed_rings += 1;
            game!("Ring {}/{} passed.", self.passed_rings, self.total_rings);
            self.emit(SessionEvent::RingPassed {
                index,
                passed: self.passed_rings,
                total: self.total_rings,
            });
            self.highlight_next_ring();
        }

        if self.elapsed >= self.config.time_limit {
            self.over(GameOverCause::TimeOver, aircraft);
        } else if self.passed_rings >= self.total_rings {
            self.over(GameOverCause::Complete, aircraft);
        }
    }

    /// Adds a pause cause. A user pause is only accepted while running.
    ///
    /// # Returns
    /// - `true` if the cause was not active before.
    pub fn pause(&mut self, cause: PauseCause) -> bool {
        if !self.is_running() || !self.paused_by.insert(cause) {
            return false;
        }
        info!("Session paused ({cause}).");
        self.emit(SessionEvent::Paused(cause));
        if cause == PauseCause::User {
            self.emit(SessionEvent::HudVisible(false));
        }
        self.emit(SessionEvent::StopAllAudio);
        true
    }

    /// Removes a pause cause. Other active causes keep the session paused.
    ///
    /// # Returns
    /// - `true` if the cause was active.
    pub fn resume(&mut self, cause: PauseCause) -> bool {
        if !self.paused_by.remove(&cause) {
            return false;
        }
        info!("Session resumed ({cause}).");
        self.emit(SessionEvent::Resumed(cause));
        if cause == PauseCause::User {
            self.emit(SessionEvent::HudVisible(true));
        }
        true
    }

    /// Pause key handler.
    pub fn toggle_user_pause(&mut self) -> bool {
        if self.is_paused_by(PauseCause::User) {
            self.resume(PauseCause::User)
        } else {
            self.pause(PauseCause::User)
        }
    }

    /// Where a respawn puts the vehicle: behind the most recently passed ring, or at the
    /// spawn point if no ring has been passed yet.
    pub fn respawn_point(&self, course: &RingCourse, aircraft: &FlightModel) -> Vec3 {
        let last_passed = self.passed_rings.checked_sub(1).and_then(|i| course.ring(i));
        match last_passed {
            Some(ring) => {
                let scale = Vec3::new(1.0, aircraft.config().vehicle_scale.y, 1.0);
                ring.position() + self.config.respawn_offset * scale
            }
            None => aircraft.config().spawn_point,
        }
    }

    /// Puts the vehicle back on the course. Only honored while running.
    ///
    /// # Returns
    /// - `true` if the vehicle was respawned.
    pub fn respawn(&mut self, course: &RingCourse, aircraft: &mut FlightModel) -> bool {
        if !self.is_running() {
            return false;
        }
        let point = self.respawn_point(course, aircraft);
        aircraft.respawn(point);
        game!("Respawned at ({:.1}, {:.1}, {:.1}).", point.x, point.y, point.z);
        if self.stall_cue {
            self.stall_cue = false;
            self.emit(SessionEvent::StallCue(false));
        }
        true
    }

    /// Schedules a scene change after the configured delay. A newer request replaces a
    /// pending one.
    pub fn request_scene(&mut self, request: SceneRequest) {
        if let Some(previous) = self.pending_scene.take() {
            previous.cancel();
        }
        info!("Scene change to {request} in {:.2}s.", self.config.scene_change_delay);
        self.pending_scene = Some(DeferredAction::new(
            self.config.scene_change_delay,
            request,
            self.c_tok.child_token(),
        ));
    }

    /// Cancels everything the session still has scheduled.
    pub fn teardown(&mut self) {
        self.c_tok.cancel();
        self.pending_scene = None;
    }

    fn run_countdown(&mut self, dt: f32, aircraft: &mut FlightModel) {
        let text = if self.countdown < self.config.imminent_start {
            Self::GO_TEXT.to_string()
        } else {
            format!("{:.0}", self.countdown.round())
        };
        if self.countdown_text.as_deref() != Some(text.as_str()) {
            self.emit(SessionEvent::CountdownText(text.clone()));
            self.countdown_text = Some(text);
        }

        if self.countdown < 0.0 {
            self.phase = SessionPhase::Running;
            aircraft.set_controllable(true);
            game!("Countdown over, the run has started.");
            self.emit(SessionEvent::CountdownHidden);
            self.emit(SessionEvent::PhaseChanged(SessionPhase::Running));
            return;
        }
        self.countdown -= dt;
    }

    fn highlight_next_ring(&mut self) {
        if self.passed_rings < self.total_rings && self.highlighted_ring != Some(self.passed_rings) {
            self.highlighted_ring = Some(self.passed_rings);
            self.emit(SessionEvent::NextRing(self.passed_rings));
        }
    }

    fn over(&mut self, cause: GameOverCause, aircraft: &mut FlightModel) {
        self.phase = SessionPhase::Idle;
        self.game_over = Some(cause);
        aircraft.set_controllable(false);
        game!(
            "{cause} {}/{} rings in {:.2}s.",
            self.passed_rings,
            self.total_rings,
            self.elapsed
        );
        self.emit(SessionEvent::HudVisible(false));
        self.emit(SessionEvent::StopAllAudio);
        self.emit(SessionEvent::GameOver(cause));
        self.emit(SessionEvent::PhaseChanged(SessionPhase::Idle));
    }

    fn poll_deferred(&mut self, dt: f32) {
        let Some(pending) = self.pending_scene.as_mut() else { return };
        if let Some(request) = pending.tick(dt) {
            self.pending_scene = None;
            self.emit(SessionEvent::SceneRequested(request));
        } else if !pending.is_pending() {
            self.pending_scene = None;
        }
    }

    fn emit(&self, session_event: SessionEvent) {
        event!("Session event: {session_event:?}");
        // A dropped receiver means nobody presents the session anymore.
        self.event_tx.send(session_event).ok();
    }
}

impl Drop for Session {
    fn drop(&mut self) { self.c_tok.cancel(); }
}
