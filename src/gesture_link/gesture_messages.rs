use crate::event;

/// One attitude report from the gesture tracker.
///
/// Wire form is a UTF-8 JSON object: `{"pitch": f, "roll": f, "yaw": f, "throttle": i}`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub struct GestureFrame {
    pitch: f32,
    roll: f32,
    yaw: f32,
    throttle: i64,
}

impl GestureFrame {
    pub fn new(pitch: f32, roll: f32, yaw: f32, throttle: i64) -> Self {
        Self { pitch, roll, yaw, throttle }
    }

    pub fn pitch(&self) -> f32 { self.pitch }
    pub fn roll(&self) -> f32 { self.roll }
    pub fn yaw(&self) -> f32 { self.yaw }
    pub fn throttle(&self) -> i64 { self.throttle }
}

/// Reassembles `GestureFrame`s from arbitrary chunks of the byte stream.
///
/// Frames are expected to be newline terminated, but back-to-back objects without a
/// delimiter decode as well. An incomplete trailing object is kept until the rest
/// arrives. A malformed frame is dropped up to the next newline.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending: Vec<u8>,
    discarded: u64,
}

impl FrameDecoder {
    /// Upper bound for buffered bytes that have not formed a frame yet.
    pub const MAX_PENDING: usize = 64 * 1024;

    pub fn new() -> Self { Self::default() }

    /// Number of frames dropped as malformed or oversized since creation.
    pub fn discarded_frames(&self) -> u64 { self.discarded }

    pub fn pending_len(&self) -> usize { self.pending.len() }

    /// Appends `chunk` and decodes every frame that is complete.
    ///
    /// # Arguments
    /// - `chunk`: Bytes as they came off the socket.
    ///
    /// # Returns
    /// - The most recent valid frame completed by this chunk, if any.
    pub fn push(&mut self, chunk: &[u8]) -> Option<GestureFrame> {
        if self.pending.len() + chunk.len() > Self::MAX_PENDING {
            event!(
                "Dropping {} pending gesture bytes, no frame boundary within {} bytes",
                self.pending.len() + chunk.len(),
                Self::MAX_PENDING
            );
            self.pending.clear();
            self.discarded += 1;
            if chunk.len() > Self::MAX_PENDING {
                return None;
            }
        }
        self.pending.extend_from_slice(chunk);
        self.drain()
    }

    pub fn clear(&mut self) { self.pending.clear(); }

    fn drain(&mut self) -> Option<GestureFrame> {
        let mut latest = None;
        loop {
            let (next, used) = {
                let mut stream =
                    serde_json::Deserializer::from_slice(&self.pending).into_iter::<GestureFrame>();
                let next = stream.next();
                (next, stream.byte_offset())
            };
            match next {
                None => {
                    // nothing but whitespace left
                    self.pending.clear();
                    break;
                }
                Some(Ok(frame)) => {
                    self.pending.drain(..used);
                    latest = Some(frame);
                }
                Some(Err(e)) if e.is_eof() => break,
                Some(Err(e)) => {
                    event!("Discarding malformed gesture frame: {e}");
                    self.discarded += 1;
                    self.skip_line();
                }
            }
        }
        latest
    }

    fn skip_line(&mut self) {
        match self.pending.iter().position(|b| *b == b'\n') {
            Some(newline) => {
                self.pending.drain(..=newline);
            }
            None => self.pending.clear(),
        }
    }
}
