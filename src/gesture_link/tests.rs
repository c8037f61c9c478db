use super::*;
use crate::config::LinkConfig;
use crate::flight_control::{ControlSample, ThrottleSign};
use rand::{Rng, rng};
use std::time::Duration;
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
};

const FRAME: &str = r#"{"pitch": 0.5, "roll": -0.25, "yaw": 0.75, "throttle": 1}"#;

fn encode_line(frame: &GestureFrame) -> Vec<u8> {
    let mut line = serde_json::to_vec(frame).unwrap();
    line.push(b'\n');
    line
}

async fn listener_config(reconnect: ReconnectPolicy) -> (TcpListener, LinkConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = LinkConfig { port, reconnect, ..LinkConfig::default() };
    (listener, config)
}

async fn connected_pair(reconnect: ReconnectPolicy) -> (GestureLink, TcpStream, TcpListener) {
    let (listener, config) = listener_config(reconnect).await;
    let (link, accepted) = tokio::join!(GestureLink::connect(config), listener.accept());
    let (server, _) = accepted.unwrap();
    (link, server, listener)
}

/// Polls until a frame arrives, yielding to the IO driver in between.
async fn poll_frame(link: &mut GestureLink) -> Option<GestureFrame> {
    for _ in 0..200 {
        if let Some(frame) = link.poll() {
            return Some(frame);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    None
}

async fn poll_until(link: &mut GestureLink, status: LinkStatus) -> bool {
    for _ in 0..400 {
        link.poll();
        if link.status() == status {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

#[test]
fn test_decoder_reassembles_split_frames() {
    let mut decoder = FrameDecoder::new();
    let line = format!("{FRAME}\n");
    let (head, tail) = line.split_at(17);
    assert_eq!(decoder.push(head.as_bytes()), None);
    assert!(decoder.pending_len() > 0);
    let frame = decoder.push(tail.as_bytes()).unwrap();
    assert!((frame.pitch() - 0.5).abs() < f32::EPSILON);
    assert_eq!(frame.throttle(), 1);
    assert_eq!(decoder.pending_len(), 0);
}

#[test]
fn test_decoder_random_chunking() {
    let mut rng = rng();
    let frames: Vec<GestureFrame> = (0..50)
        .map(|i| GestureFrame::new(i as f32 / 50.0, 0.0, 0.0, i64::from(i % 2 == 0)))
        .collect();
    let bytes: Vec<u8> = frames.iter().flat_map(encode_line).collect();

    let mut decoder = FrameDecoder::new();
    let mut seen = Vec::new();
    let mut rest = bytes.as_slice();
    while !rest.is_empty() {
        let take = rng.random_range(1..=rest.len().min(40));
        let (chunk, tail) = rest.split_at(take);
        if let Some(frame) = decoder.push(chunk) {
            seen.push(frame);
        }
        rest = tail;
    }
    assert_eq!(seen.last(), frames.last());
    assert_eq!(decoder.discarded_frames(), 0);
    assert_eq!(decoder.pending_len(), 0);
}

#[test]
fn test_decoder_accepts_back_to_back_objects() {
    let mut decoder = FrameDecoder::new();
    let raw = format!(
        "{FRAME}{}",
        r#"{"pitch": -1.0, "roll": 0.0, "yaw": 0.0, "throttle": 0}"#
    );
    let frame = decoder.push(raw.as_bytes()).unwrap();
    assert!((frame.pitch() + 1.0).abs() < f32::EPSILON);
}

#[test]
fn test_decoder_drops_malformed_line_and_keeps_going() {
    let mut decoder = FrameDecoder::new();
    assert_eq!(decoder.push(b"{\"pitch\": oops}\n"), None);
    assert_eq!(decoder.discarded_frames(), 1);
    assert_eq!(decoder.push(b"{\"pitch\": 0.1}\n"), None);
    assert_eq!(decoder.discarded_frames(), 2);
    let frame = decoder.push(format!("{FRAME}\n").as_bytes()).unwrap();
    assert!((frame.yaw() - 0.75).abs() < f32::EPSILON);
}

#[test]
fn test_decoder_caps_pending_bytes() {
    let mut decoder = FrameDecoder::new();
    let mut open = b"{\"pitch\": ".to_vec();
    open.extend(std::iter::repeat_n(b' ', FrameDecoder::MAX_PENDING));
    assert_eq!(decoder.push(&open), None);
    assert!(decoder.pending_len() <= FrameDecoder::MAX_PENDING);
    assert_eq!(decoder.discarded_frames(), 1);
}

#[test]
fn test_axis_mask_parsing() {
    let mask: AxisMask = "pitch, Roll,throttle".parse().unwrap();
    assert!(mask.contains(LinkAxis::Pitch));
    assert!(mask.contains(LinkAxis::Roll));
    assert!(mask.contains(LinkAxis::Throttle));
    assert!(!mask.contains(LinkAxis::Yaw));
    assert!("pitch,heading".parse::<AxisMask>().is_err());
    assert_eq!(AxisMask::default(), "pitch".parse::<AxisMask>().unwrap());
}

#[test]
fn test_default_mask_forwards_pitch_only() {
    let frame = GestureFrame::new(0.5, -0.25, 0.75, 1);
    let source = InputSource::new(AxisMask::default(), 1);
    let sample = source.masked(&frame).control_sample();
    assert_eq!(sample, ControlSample::new(0.5, 0.0, 0.0, ThrottleSign::None));

    let source = InputSource::new(AxisMask::all(), 1);
    let sample = source.masked(&frame).control_sample();
    assert_eq!(sample, ControlSample::new(0.5, 0.75, -0.25, ThrottleSign::Accelerate));

    let idle = GestureFrame::new(0.0, 0.0, 0.0, 2);
    assert_eq!(source.masked(&idle).control_sample().throttle(), ThrottleSign::None);
}

#[test]
fn test_local_axes_mapping() {
    let mut local = LocalAxes::default();
    local.set_axes(0.5, -1.0);
    local.set_throttle_keys(false, true);
    let sample = local.control_sample();
    assert_eq!(sample, ControlSample::new(0.5, -1.0, 1.0, ThrottleSign::Decelerate));
}

#[tokio::test]
async fn test_failed_connect_falls_back_to_local_input() {
    let (listener, config) = listener_config(ReconnectPolicy::Never).await;
    drop(listener);
    let mut link = GestureLink::connect(config).await;
    assert_eq!(link.status(), LinkStatus::Offline);
    assert_eq!(link.poll(), None);

    let mut local = LocalAxes::default();
    local.set_axes(1.0, 0.0);
    let source = InputSource::new(AxisMask::default(), 1);
    assert!((source.sample(&link, &local).pitch() - 1.0).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_connected_link_decodes_frames() {
    let (mut link, mut server, _listener) = connected_pair(ReconnectPolicy::Never).await;
    assert_eq!(link.status(), LinkStatus::Connected);
    assert_eq!(link.poll(), None);

    server.write_all(format!("{FRAME}\n").as_bytes()).await.unwrap();
    let frame = poll_frame(&mut link).await.unwrap();
    assert_eq!(link.last_frame(), Some(&frame));

    let local = LocalAxes::default();
    let source = InputSource::new(AxisMask::default(), 1);
    assert!((source.sample(&link, &local).pitch() - 0.5).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_malformed_payload_keeps_previous_frame() {
    let (mut link, mut server, _listener) = connected_pair(ReconnectPolicy::Never).await;
    server.write_all(format!("{FRAME}\n").as_bytes()).await.unwrap();
    let first = poll_frame(&mut link).await.unwrap();

    server.write_all(b"not json at all\n").await.unwrap();
    for _ in 0..100 {
        assert_eq!(link.poll(), None);
        if link.discarded_frames() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(link.discarded_frames(), 1);
    assert_eq!(link.last_frame(), Some(&first));
    assert_eq!(link.status(), LinkStatus::Connected);
}

#[tokio::test]
async fn test_remote_close_is_reported_as_lost() {
    let (mut link, server, _listener) = connected_pair(ReconnectPolicy::Never).await;
    drop(server);
    assert!(poll_until(&mut link, LinkStatus::Lost).await);

    let mut local = LocalAxes::default();
    local.set_axes(1.0, 1.0);
    let source = InputSource::new(AxisMask::all(), 1);
    assert_eq!(source.sample(&link, &local), ControlSample::neutral());
}

#[tokio::test]
async fn test_backoff_policy_reconnects() {
    let policy = ReconnectPolicy::Backoff { initial_ms: 10, max_ms: 40 };
    let (mut link, server, listener) = connected_pair(policy).await;
    drop(server);
    assert!(poll_until(&mut link, LinkStatus::Lost).await);

    let accept = tokio::spawn(async move { listener.accept().await.map(|(socket, _)| socket) });
    assert!(poll_until(&mut link, LinkStatus::Connected).await);
    let mut server = accept.await.unwrap().unwrap();

    server.write_all(format!("{FRAME}\n").as_bytes()).await.unwrap();
    assert!(poll_frame(&mut link).await.is_some());
}

#[test]
fn test_reconnect_policy_parsing() {
    assert_eq!("never".parse::<ReconnectPolicy>().unwrap(), ReconnectPolicy::Never);
    assert!(matches!("Backoff".parse::<ReconnectPolicy>().unwrap(), ReconnectPolicy::Backoff { .. }));
    assert!("sometimes".parse::<ReconnectPolicy>().is_err());
}
