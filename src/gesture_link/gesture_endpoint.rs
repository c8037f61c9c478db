use super::gesture_messages::{FrameDecoder, GestureFrame};
use crate::config::LinkConfig;
use crate::{error, event, info, warn};
use std::{io::ErrorKind, str::FromStr, time::Duration};
use strum_macros::Display;
use tokio::{
    net::TcpStream,
    sync::oneshot::{self, error::TryRecvError},
    time::{Instant, timeout},
};

/// Liveness of the tracker connection as seen by the tick loop.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy)]
pub enum LinkStatus {
    /// Never connected; local input drives the vehicle.
    Offline,
    Connected,
    /// Was connected, the stream has since closed.
    Lost,
}

#[derive(Debug, Display)]
pub enum LinkError {
    Connect(std::io::Error),
    Timeout,
    Closed,
}

impl std::error::Error for LinkError {}

impl From<std::io::Error> for LinkError {
    fn from(value: std::io::Error) -> Self { LinkError::Connect(value) }
}

/// What to do after the initial connect failed or the stream was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconnectPolicy {
    #[default]
    Never,
    Backoff { initial_ms: u64, max_ms: u64 },
}

impl ReconnectPolicy {
    const DEF_INITIAL_MS: u64 = 500;
    const DEF_MAX_MS: u64 = 8000;
}

impl FromStr for ReconnectPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "never" => Ok(ReconnectPolicy::Never),
            "backoff" => Ok(ReconnectPolicy::Backoff {
                initial_ms: Self::DEF_INITIAL_MS,
                max_ms: Self::DEF_MAX_MS,
            }),
            other => Err(format!("unknown reconnect policy '{other}'")),
        }
    }
}

type ConnectResult = Result<TcpStream, LinkError>;

/// Client side of the gesture tracker connection.
///
/// All reads are non-blocking: `poll` only consumes bytes that are already buffered, so a
/// silent or stalled tracker never holds up the tick it is polled from.
#[derive(Debug)]
pub struct GestureLink {
    config: LinkConfig,
    stream: Option<TcpStream>,
    status: LinkStatus,
    decoder: FrameDecoder,
    last_frame: Option<GestureFrame>,
    pending_connect: Option<oneshot::Receiver<ConnectResult>>,
    next_attempt: Option<Instant>,
    backoff: Duration,
}

impl GestureLink {
    const READ_CHUNK: usize = 4096;
    /// Upper bound of reads per poll, so a flooding tracker cannot starve the tick.
    const MAX_READS_PER_POLL: usize = 16;

    /// Creates a link that has not tried to connect yet.
    pub fn offline(config: LinkConfig) -> Self {
        let backoff = match config.reconnect {
            ReconnectPolicy::Backoff { initial_ms, .. } => Duration::from_millis(initial_ms),
            ReconnectPolicy::Never => Duration::ZERO,
        };
        Self {
            config,
            stream: None,
            status: LinkStatus::Offline,
            decoder: FrameDecoder::new(),
            last_frame: None,
            pending_connect: None,
            next_attempt: None,
            backoff,
        }
    }

    /// Performs the single startup connection attempt.
    ///
    /// A failure is not fatal: the link stays `Offline` and local input is used. Further
    /// attempts happen only if the configured `ReconnectPolicy` asks for them.
    pub async fn connect(config: LinkConfig) -> Self {
        let mut link = Self::offline(config);
        match Self::open(link.config.address(), link.config.connect_timeout()).await {
            Ok(stream) => link.attach(stream),
            Err(e) => {
                warn!("Failed to connect to the gesture tracker at {}: {e:?}", link.config.address());
                link.schedule_retry();
            }
        }
        link
    }

    pub fn status(&self) -> LinkStatus { self.status }
    pub fn is_connected(&self) -> bool { self.status == LinkStatus::Connected }
    pub fn last_frame(&self) -> Option<&GestureFrame> { self.last_frame.as_ref() }
    pub fn config(&self) -> &LinkConfig { &self.config }
    pub fn discarded_frames(&self) -> u64 { self.decoder.discarded_frames() }

    /// Consumes whatever the tracker has sent since the last call.
    ///
    /// # Returns
    /// - The newest frame decoded in this call, or `None` if no complete, valid frame
    ///   arrived. `last_frame` keeps the previous value in that case.
    pub fn poll(&mut self) -> Option<GestureFrame> {
        self.poll_reconnect();
        let stream = self.stream.as_ref()?;

        let mut newest = None;
        let mut buf = [0u8; Self::READ_CHUNK];
        let mut closed = None;
        for _ in 0..Self::MAX_READS_PER_POLL {
            match stream.try_read(&mut buf) {
                Ok(0) => {
                    closed = Some(LinkError::Closed);
                    break;
                }
                Ok(n) => {
                    if let Some(frame) = self.decoder.push(&buf[..n]) {
                        newest = Some(frame);
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => (),
                Err(e) => {
                    closed = Some(LinkError::Connect(e));
                    break;
                }
            }
        }

        if let Some(frame) = newest {
            event!("Gesture frame: {frame:?}");
            self.last_frame = Some(frame);
        }
        if let Some(reason) = closed {
            self.lose(&reason);
        }
        newest
    }

    /// Shuts the connection down. The link counts as `Lost` afterwards if it was
    /// connected, and no reconnect is attempted.
    pub fn close(&mut self) {
        self.pending_connect = None;
        self.next_attempt = None;
        if self.stream.take().is_some() {
            info!("Closed the gesture tracker connection");
            self.status = LinkStatus::Lost;
        }
        self.decoder.clear();
    }

    async fn open(address: String, limit: Duration) -> ConnectResult {
        let stream = timeout(limit, TcpStream::connect(address))
            .await
            .map_err(|_| LinkError::Timeout)??;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn attach(&mut self, stream: TcpStream) {
        info!("Connected to the gesture tracker at {}", self.config.address());
        self.stream = Some(stream);
        self.status = LinkStatus::Connected;
        self.decoder.clear();
        self.next_attempt = None;
        if let ReconnectPolicy::Backoff { initial_ms, .. } = self.config.reconnect {
            self.backoff = Duration::from_millis(initial_ms);
        }
    }

    fn lose(&mut self, reason: &LinkError) {
        match reason {
            LinkError::Connect(e) => error!("Gesture tracker connection failed: {e}"),
            LinkError::Timeout | LinkError::Closed => {
                warn!("Lost the gesture tracker connection: {reason}");
            }
        }
        self.stream = None;
        self.status = LinkStatus::Lost;
        self.decoder.clear();
        self.schedule_retry();
    }

    fn schedule_retry(&mut self) {
        if let ReconnectPolicy::Backoff { .. } = self.config.reconnect {
            self.next_attempt = Some(Instant::now() + self.backoff);
        }
    }

    fn poll_reconnect(&mut self) {
        if self.stream.is_some() {
            return;
        }
        if let Some(rx) = self.pending_connect.as_mut() {
            match rx.try_recv() {
                Ok(Ok(stream)) => {
                    self.pending_connect = None;
                    self.attach(stream);
                }
                Ok(Err(e)) => {
                    self.pending_connect = None;
                    event!("Gesture tracker reconnect failed: {e:?}");
                    self.grow_backoff();
                    self.schedule_retry();
                }
                Err(TryRecvError::Empty) => (),
                Err(TryRecvError::Closed) => {
                    self.pending_connect = None;
                    self.schedule_retry();
                }
            }
            return;
        }
        let Some(at) = self.next_attempt else { return };
        if Instant::now() < at {
            return;
        }
        self.next_attempt = None;
        let (tx, rx) = oneshot::channel();
        let address = self.config.address();
        let limit = self.config.connect_timeout();
        info!("Trying to reconnect to the gesture tracker at {address}");
        tokio::spawn(async move {
            let _ = tx.send(Self::open(address, limit).await);
        });
        self.pending_connect = Some(rx);
    }

    fn grow_backoff(&mut self) {
        if let ReconnectPolicy::Backoff { max_ms, .. } = self.config.reconnect {
            self.backoff = (self.backoff * 2).min(Duration::from_millis(max_ms));
        }
    }
}
