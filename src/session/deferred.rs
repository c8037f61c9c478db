use tokio_util::sync::CancellationToken;

/// An action that becomes due after a delay measured in tick time.
///
/// The owner advances it from the tick loop; there is no background task. Cancelling the
/// token (or the parent token it was derived from) drops the action for good.
#[derive(Debug)]
pub struct DeferredAction<T> {
    remaining: f32,
    action: Option<T>,
    c_tok: CancellationToken,
}

impl<T> DeferredAction<T> {
    pub fn new(delay: f32, action: T, c_tok: CancellationToken) -> Self {
        Self { remaining: delay.max(0.0), action: Some(action), c_tok }
    }

    pub fn time_left(&self) -> f32 { self.remaining.max(0.0) }
    pub fn is_cancelled(&self) -> bool { self.c_tok.is_cancelled() }
    pub fn cancel(&self) { self.c_tok.cancel(); }

    /// Whether the action will still fire.
    pub fn is_pending(&self) -> bool { self.action.is_some() && !self.is_cancelled() }

    /// Advances the timer by `dt`.
    ///
    /// # Returns
    /// - The action exactly once, on the tick the delay runs out. `None` before that,
    ///   afterwards, and at any point once cancelled.
    pub fn tick(&mut self, dt: f32) -> Option<T> {
        if self.is_cancelled() {
            self.action = None;
            return None;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 { self.action.take() } else { None }
    }
}
