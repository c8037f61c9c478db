use crate::commands::Command;
use crate::config::GameConfig;
use crate::flight_control::{FlightModel, ThrottleSign};
use crate::gesture_link::{GestureLink, InputSource, LinkStatus, LocalAxes};
use crate::session::{
    GameOverCause, PauseCause, RingCourse, SceneRequest, Session, SessionEvent, SessionPhase,
};
use crate::{event, game, info, log, warn};
use std::ops::ControlFlow;
use tokio::sync::mpsc;

/// Owns every component of a running game and drives them in tick order.
///
/// The gesture link and the input selection outlive scene reloads. The vehicle, the
/// course and the session are rebuilt on every reload.
pub struct Keychain {
    /// The validated configuration everything is built from.
    config: GameConfig,
    /// TCP link to the gesture tracker.
    link: GestureLink,
    /// Chooses between tracker frames and local axes.
    input: InputSource,
    /// Operator stand-in for keyboard and gamepad axes.
    local: LocalAxes,
    /// The controlled vehicle.
    aircraft: FlightModel,
    /// Rings of the current level.
    course: RingCourse,
    /// Game rules of the current playthrough.
    session: Session,
    /// Receiving end of the session's events.
    session_rx: mpsc::UnboundedReceiver<SessionEvent>,
    /// Link status seen on the previous frame.
    last_link_status: LinkStatus,
}

impl Keychain {
    /// Builds all components and makes the single startup connection attempt.
    ///
    /// # Arguments
    /// - `config`: The validated game configuration.
    ///
    /// # Returns
    /// A new `Keychain` with the session in `Pregame`.
    pub async fn new(config: GameConfig) -> Self {
        let link = GestureLink::connect(config.link.clone()).await;
        let input = InputSource::new(config.link.axes.clone(), config.link.throttle_sentinel);
        let (aircraft, course, session, session_rx) = Self::build_scene(&config);
        let last_link_status = link.status();
        info!("Gesture link is {last_link_status}. Course has {} rings.", course.len());
        Self {
            config,
            link,
            input,
            local: LocalAxes::default(),
            aircraft,
            course,
            session,
            session_rx,
            last_link_status,
        }
    }

    pub fn config(&self) -> &GameConfig { &self.config }
    pub fn link(&self) -> &GestureLink { &self.link }
    pub fn aircraft(&self) -> &FlightModel { &self.aircraft }
    pub fn course(&self) -> &RingCourse { &self.course }
    pub fn session(&self) -> &Session { &self.session }

    fn build_scene(
        config: &GameConfig,
    ) -> (FlightModel, RingCourse, Session, mpsc::UnboundedReceiver<SessionEvent>) {
        let aircraft = FlightModel::new(config.flight);
        let course = RingCourse::new(&config.course.rings);
        let (session, session_rx) = Session::new(config.session, &course);
        (aircraft, course, session, session_rx)
    }

    /// One fixed step: link poll and liveness, input sample, flight update, ring and ground
    /// contacts, then the session rules. While the session is paused only the link is
    /// polled.
    pub fn fixed_tick(&mut self) {
        let dt = self.config.timing.fixed_dt;
        self.link.poll();
        self.session.track_link(self.link.status());
        if self.session.is_paused() {
            return;
        }

        let sample = self.input.sample(&self.link, &self.local);
        let state = self.aircraft.update(sample, dt);

        for index in self.course.trigger_at(state.position()) {
            event!("Vehicle inside the trigger of ring {index}");
        }
        if self.session.is_running() && state.position().y <= 0.0 {
            warn!("Ground contact at speed {:.1}", state.current_speed());
            self.session.respawn(&self.course, &mut self.aircraft);
        }

        self.session.fixed_update(dt, &mut self.course, &mut self.aircraft);
    }

    /// One frame: session frame update on wall-clock `dt`, then presentation of the
    /// session's events.
    ///
    /// # Returns
    /// - `ControlFlow::Break` once the main menu has been requested, which ends a
    ///   headless run.
    pub fn frame_tick(&mut self, dt: f32) -> ControlFlow<()> {
        let status = self.link.status();
        if status != self.last_link_status {
            info!("Gesture link {} -> {status}", self.last_link_status);
            self.last_link_status = status;
        }
        self.session.frame_update(dt, status, &mut self.aircraft);

        while let Ok(session_event) = self.session_rx.try_recv() {
            match session_event {
                SessionEvent::SceneRequested(SceneRequest::Reload) => {
                    self.reload();
                    return ControlFlow::Continue(());
                }
                SessionEvent::SceneRequested(SceneRequest::MainMenu) => {
                    info!("Main menu requested, leaving the level.");
                    return ControlFlow::Break(());
                }
                other => Self::present(&other),
            }
        }
        ControlFlow::Continue(())
    }

    /// Applies an operator command.
    ///
    /// # Returns
    /// - `ControlFlow::Break` if the command ends the run.
    pub fn handle(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Pause => {
                if !self.session.toggle_user_pause() {
                    log!("Pause is only available while the run is on.");
                }
            }
            Command::Respawn => {
                if !self.session.respawn(&self.course, &mut self.aircraft) {
                    log!("Respawn is only available while the run is on.");
                }
            }
            Command::Scene(request) => self.session.request_scene(request),
            Command::Quit => return ControlFlow::Break(()),
            Command::Axes { vertical, horizontal } => self.local.set_axes(vertical, horizontal),
            Command::Throttle(sign) => self.local.set_throttle_keys(
                sign == ThrottleSign::Accelerate,
                sign == ThrottleSign::Decelerate,
            ),
        }
        ControlFlow::Continue(())
    }

    /// Rebuilds the vehicle, course and session. The link stays as it is.
    pub fn reload(&mut self) {
        self.session.teardown();
        let (aircraft, course, session, session_rx) = Self::build_scene(&self.config);
        self.aircraft = aircraft;
        self.course = course;
        self.session = session;
        self.session_rx = session_rx;
        self.local = LocalAxes::default();
        info!("Level reloaded.");
    }

    /// Logs the state of the run, for the periodic status line.
    pub fn report(&self) {
        let state = self.aircraft.state();
        let attitude = state.attitude_deg();
        match self.session.phase() {
            SessionPhase::Pregame => log!("Starting in {:.1}s", self.session.countdown().max(0.0)),
            SessionPhase::Running => log!(
                "t={:.1}s left={:.1}s rings={}/{} speed={:.1} pitch={:.0} yaw={:.0} roll={:.0} \
                 engine={} link={}{}",
                self.session.elapsed(),
                self.session.time_left(),
                self.session.passed_rings(),
                self.session.total_rings(),
                state.current_speed(),
                attitude.x,
                attitude.y,
                attitude.z,
                if state.engine_active() { "on" } else { "off" },
                self.link.status(),
                if self.session.is_paused() { " [paused]" } else { "" },
            ),
            SessionPhase::Idle => {}
        }
    }

    /// Cancels scheduled actions and closes the link.
    pub fn shutdown(&mut self) {
        self.session.teardown();
        self.link.close();
        info!("Shut down after {} discarded tracker frames.", self.link.discarded_frames());
    }

    fn present(session_event: &SessionEvent) {
        match session_event {
            SessionEvent::CountdownText(text) => game!("{text}"),
            SessionEvent::PhaseChanged(phase) => info!("Session is now {phase}."),
            SessionEvent::Paused(PauseCause::LostTracking) => {
                warn!("Tracking lost. Show your hand to the tracker to continue.");
            }
            SessionEvent::Resumed(PauseCause::LostTracking) => info!("Tracking restored."),
            SessionEvent::StallCue(true) => warn!("Stall!"),
            SessionEvent::NextRing(index) => log!("Next ring: {}", index + 1),
            SessionEvent::GameOver(GameOverCause::Complete) => {
                game!("All rings passed. Type 'restart' or 'menu'.");
            }
            SessionEvent::GameOver(GameOverCause::TimeOver) => {
                game!("Out of time. Type 'restart' or 'menu'.");
            }
            other => event!("{other:?}"),
        }
    }
}
