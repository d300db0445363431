//! 指令 API 集成测试（Mock 传输）
//!
//! 覆盖：零幅度指令、载荷布局、方向折叠、重传次数、写入失败、
//! 并发请求互斥、延迟完成、释放。

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use stubby_sdk::prelude::*;
use stubby_sdk::protocol::encoding::angle_to_byte;
use stubby_sdk::{Message, ProtocolEvent, RequestCode, SendOutcome};
use stubby_transport::{MockBehavior, MockTransport};

const ACK_TIMEOUT: Duration = Duration::from_millis(40);

fn fast_config() -> ProtocolConfig {
    ProtocolConfig::default().with_ack_timeout(ACK_TIMEOUT)
}

fn setup(behavior: MockBehavior) -> (Arc<MockTransport>, Stubby) {
    let transport = Arc::new(MockTransport::new(behavior));
    let stubby = Stubby::builder()
        .transport(transport.clone())
        .config(fast_config())
        .build()
        .expect("build should succeed with a mock transport");
    (transport, stubby)
}

#[test]
fn test_zero_distance_move_is_free() {
    let (transport, stubby) = setup(MockBehavior::Silent);

    assert!(stubby.move_by(0, 0, 255, 0, 0));
    assert!(stubby.move_backward(0));
    assert_eq!(transport.write_count(), 0);
}

#[test]
fn test_zero_angle_turn_is_free() {
    let (transport, stubby) = setup(MockBehavior::Silent);

    assert!(stubby.turn(0, 128));
    assert_eq!(transport.write_count(), 0);
}

#[test]
fn test_move_forward_frame_layout() {
    let (transport, stubby) = setup(MockBehavior::AckAndComplete);

    assert!(stubby.move_by(0, 0, 255, 0, 100));

    let expected = [
        0x22,
        angle_to_byte(std::f64::consts::FRAC_PI_2),
        angle_to_byte(0.0),
        255,
        0,
        0,
        100,
    ];
    assert_eq!(transport.written_frames(), vec![expected.to_vec()]);
}

#[test]
fn test_negative_distance_reverses_heading() {
    let (transport, stubby) = setup(MockBehavior::AckAndComplete);

    assert!(stubby.move_by(0, 0, 255, 0, -50));

    let frame = &transport.written_frames()[0];
    assert_eq!(
        frame[1],
        angle_to_byte(std::f64::consts::FRAC_PI_2 + std::f64::consts::PI)
    );
    assert_eq!(&frame[5..], &[0, 50]);
}

#[test]
fn test_move_toward_matches_move_by() {
    let (transport, stubby) = setup(MockBehavior::AckAndComplete);

    assert!(stubby.move_toward(45, 300));
    assert!(stubby.move_by(45, 0, 255, 0, 300));

    let frames = transport.written_frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], frames[1]);
}

#[test]
fn test_turn_shortcuts_match_explicit_turns() {
    let (transport, stubby) = setup(MockBehavior::AckAndComplete);

    let pairs: [(fn(&Stubby) -> bool, i32); 4] = [
        (Stubby::turn_left, 90),
        (Stubby::turn_right, -90),
        (Stubby::turn_around, 180),
        (Stubby::turn_around_clockwise, -180),
    ];
    for (shortcut, angle) in pairs {
        assert!(shortcut(&stubby));
        assert!(stubby.turn(angle, 255));
    }

    let frames = transport.written_frames();
    assert_eq!(frames.len(), 8);
    for pair in frames.chunks(2) {
        assert_eq!(pair[0], pair[1]);
        assert_eq!(pair[0].len(), 6);
    }
}

#[test]
fn test_no_ack_exhausts_retries() {
    let (transport, stubby) = setup(MockBehavior::Silent);

    let start = Instant::now();
    assert!(!stubby.turn_on());
    assert_eq!(transport.write_count(), 3);
    assert!(start.elapsed() >= ACK_TIMEOUT * 3);

    let metrics = stubby.metrics();
    assert_eq!(metrics.frames_written, 3);
    assert_eq!(metrics.retransmissions, 2);
}

#[test]
fn test_motion_not_acknowledged_does_not_wait_for_completion() {
    let (transport, stubby) = setup(MockBehavior::Silent);

    // 没有截止时间的 COMPLETE 等待若被进入会永远阻塞
    assert!(!stubby.move_forward(10));
    assert_eq!(transport.write_count(), 3);
}

#[test]
fn test_ack_after_retransmission() {
    let (transport, stubby) = setup(MockBehavior::AckAndComplete);
    transport.ignore_first_writes(2);

    assert!(stubby.turn_left());
    assert_eq!(transport.write_count(), 3);
}

#[test]
fn test_write_failure_reported() {
    let (transport, stubby) = setup(MockBehavior::FailWrites);

    let outcome = stubby.protocol().send_message_detailed(
        &Message::power_on(),
        Duration::from_secs(10),
        2,
    );
    assert_eq!(outcome, SendOutcome::TransportError { attempts: 3 });
    assert_eq!(transport.write_count(), 3);
    assert!(!stubby.turn_off());
}

#[test]
fn test_delayed_completion_blocks_until_complete() {
    let (transport, stubby) = setup(MockBehavior::AckAndComplete);
    transport.set_complete_delay(Duration::from_millis(80));

    let start = Instant::now();
    assert!(stubby.move_left(20));
    assert!(start.elapsed() >= Duration::from_millis(80));
}

#[test]
fn test_completion_for_other_code_is_ignored() {
    let transport = Arc::new(MockTransport::new(MockBehavior::AckOnly));
    let stubby = Stubby::builder()
        .transport(transport.clone())
        .config(fast_config().with_completion_timeout(Some(Duration::from_millis(200))))
        .build()
        .unwrap();

    let injector = {
        let transport = transport.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            transport.inject(ProtocolEvent::complete(RequestCode::Move));
            thread::sleep(Duration::from_millis(20));
            transport.inject(ProtocolEvent::complete(RequestCode::Turn));
        })
    };

    assert!(stubby.turn_right());
    injector.join().unwrap();
    assert_eq!(stubby.metrics().events_discarded, 1);
}

#[test]
fn test_concurrent_commands_do_not_interleave() {
    let (transport, stubby) = setup(MockBehavior::Silent);
    transport.set_write_latency(Duration::from_millis(3));
    let stubby = Arc::new(stubby);

    let a = {
        let stubby = Arc::clone(&stubby);
        thread::spawn(move || stubby.turn_on())
    };
    let b = {
        let stubby = Arc::clone(&stubby);
        thread::spawn(move || stubby.enable_debug())
    };
    assert!(!a.join().unwrap());
    assert!(!b.join().unwrap());

    let codes: Vec<u8> = transport.written_frames().iter().map(|f| f[0]).collect();
    assert_eq!(codes.len(), 6);
    let (first, second) = codes.split_at(3);
    assert!(first.iter().all(|&c| c == first[0]));
    assert!(second.iter().all(|&c| c == second[0]));
    assert_ne!(first[0], second[0]);
}

#[test]
fn test_disable_debug_sends_disable_code() {
    let (transport, stubby) = setup(MockBehavior::AckOnly);

    assert!(stubby.disable_debug());
    assert_eq!(transport.written_frames(), vec![vec![0x04]]);
}

#[test]
fn test_dispose_closes_transport_once() {
    let (transport, stubby) = setup(MockBehavior::AckAndComplete);
    assert!(stubby.turn_on());

    stubby.dispose().unwrap();
    assert_eq!(transport.close_count(), 1);
}

#[test]
fn test_builder_requires_transport() {
    let err = Stubby::builder().build().unwrap_err();
    assert!(matches!(err, DriverError::InvalidConfiguration(_)));
}

#[test]
fn test_config_from_toml_drives_retries() {
    let config = ProtocolConfig::from_toml_str("ack_timeout_ms = 20\nmax_retries = 0").unwrap();
    let transport = Arc::new(MockTransport::new(MockBehavior::Silent));
    let stubby = Stubby::builder()
        .transport(transport.clone())
        .config(config)
        .build()
        .unwrap();

    assert!(!stubby.turn_on());
    assert_eq!(transport.write_count(), 1);
}
