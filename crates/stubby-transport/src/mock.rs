//! Mock 传输（无硬件依赖）
//!
//! 记录所有写出的帧，并按配置的行为模拟设备应答。

use crate::{EventSink, Transport, TransportError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use stubby_protocol::{ProtocolEvent, RequestCode};

/// 模拟设备的应答行为
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockBehavior {
    /// 不应答任何请求
    Silent,
    /// 只应答 ACK，运动指令永远不会 COMPLETE
    AckOnly,
    /// 应答 ACK，运动指令随后 COMPLETE（默认）
    #[default]
    AckAndComplete,
    /// 写入失败
    FailWrites,
}

/// Mock 传输
#[derive(Debug, Default)]
pub struct MockTransport {
    behavior: Mutex<MockBehavior>,
    sink: Mutex<Option<EventSink>>,
    written: Mutex<Vec<Vec<u8>>>,
    /// 前 N 次写入不应答（用于测试重传）
    ignore_first: AtomicUsize,
    /// COMPLETE 延迟（`None` 表示在写入时立即投递）
    complete_delay: Mutex<Option<Duration>>,
    /// 每次写入的模拟耗时
    write_latency: Mutex<Option<Duration>>,
    close_count: AtomicUsize,
}

impl MockTransport {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            ..Self::default()
        }
    }

    /// 切换应答行为
    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock() = behavior;
    }

    /// 前 `n` 次写入不应答
    pub fn ignore_first_writes(&self, n: usize) {
        self.ignore_first.store(n, Ordering::SeqCst);
    }

    /// COMPLETE 在 ACK 之后延迟 `delay` 到达
    pub fn set_complete_delay(&self, delay: Duration) {
        *self.complete_delay.lock() = Some(delay);
    }

    /// 每次写入耗时 `latency`
    pub fn set_write_latency(&self, latency: Duration) {
        *self.write_latency.lock() = Some(latency);
    }

    /// 直接投递事件（模拟设备主动发出的事件）
    pub fn inject(&self, event: ProtocolEvent) -> bool {
        self.sink.lock().as_ref().map(|sink| sink.deliver(event)).unwrap_or(false)
    }

    /// 已写出的帧（包括写入失败的尝试）
    pub fn written_frames(&self) -> Vec<Vec<u8>> {
        self.written.lock().clone()
    }

    /// 写入次数
    pub fn write_count(&self) -> usize {
        self.written.lock().len()
    }

    /// `close()` 被调用的次数
    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    /// 是否已注册事件接收端
    pub fn is_registered(&self) -> bool {
        self.sink.lock().is_some()
    }

    fn respond(&self, frame: &[u8]) {
        let Some(sink) = self.sink.lock().clone() else {
            return;
        };
        let Some(code) = frame.first().and_then(|&b| RequestCode::from_u8(b).ok()) else {
            return;
        };

        let behavior = *self.behavior.lock();
        if matches!(behavior, MockBehavior::Silent | MockBehavior::FailWrites) {
            return;
        }

        sink.deliver(ProtocolEvent::ack(code));

        if behavior == MockBehavior::AckAndComplete && code.is_motion() {
            match *self.complete_delay.lock() {
                Some(delay) => {
                    std::thread::spawn(move || {
                        std::thread::sleep(delay);
                        sink.deliver(ProtocolEvent::complete(code));
                    });
                },
                None => {
                    sink.deliver(ProtocolEvent::complete(code));
                },
            }
        }
    }
}

impl Transport for MockTransport {
    fn write(&self, frame: &[u8]) -> Result<(), TransportError> {
        if let Some(latency) = *self.write_latency.lock() {
            std::thread::sleep(latency);
        }

        self.written.lock().push(frame.to_vec());

        if *self.behavior.lock() == MockBehavior::FailWrites {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }

        let skip = self
            .ignore_first
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !skip {
            self.respond(frame);
        }
        Ok(())
    }

    fn register(&self, sink: EventSink) -> Result<(), TransportError> {
        let mut slot = self.sink.lock();
        if slot.is_some() {
            return Err(TransportError::AlreadyRegistered);
        }
        *slot = Some(sink);
        Ok(())
    }

    fn close(&self) -> Result<(), TransportError> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered(behavior: MockBehavior) -> (MockTransport, crossbeam_channel::Receiver<ProtocolEvent>) {
        let transport = MockTransport::new(behavior);
        let (tx, rx) = crossbeam_channel::unbounded();
        transport.register(EventSink::new(tx)).unwrap();
        (transport, rx)
    }

    #[test]
    fn test_ack_and_complete() {
        let (transport, rx) = registered(MockBehavior::AckAndComplete);
        transport.write(&[0x23, 255, 0, 0, 0, 0]).unwrap();

        assert_eq!(rx.try_recv().unwrap(), ProtocolEvent::ack(RequestCode::Turn));
        assert_eq!(rx.try_recv().unwrap(), ProtocolEvent::complete(RequestCode::Turn));
        assert_eq!(transport.write_count(), 1);
    }

    #[test]
    fn test_power_commands_never_complete() {
        let (transport, rx) = registered(MockBehavior::AckAndComplete);
        transport.write(&[0x20]).unwrap();

        assert_eq!(rx.try_recv().unwrap(), ProtocolEvent::ack(RequestCode::PowerOn));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_silent_and_fail_writes() {
        let (transport, rx) = registered(MockBehavior::Silent);
        transport.write(&[0x20]).unwrap();
        assert!(rx.try_recv().is_err());

        transport.set_behavior(MockBehavior::FailWrites);
        assert!(transport.write(&[0x20]).is_err());
        assert_eq!(transport.write_count(), 2);
    }

    #[test]
    fn test_ignore_first_writes() {
        let (transport, rx) = registered(MockBehavior::AckOnly);
        transport.ignore_first_writes(2);

        transport.write(&[0x20]).unwrap();
        transport.write(&[0x20]).unwrap();
        assert!(rx.try_recv().is_err());

        transport.write(&[0x20]).unwrap();
        assert_eq!(rx.try_recv().unwrap(), ProtocolEvent::ack(RequestCode::PowerOn));
    }

    #[test]
    fn test_register_once_and_close_count() {
        let (transport, _rx) = registered(MockBehavior::Silent);
        let (tx, _rx2) = crossbeam_channel::unbounded();
        assert!(transport.register(EventSink::new(tx)).is_err());

        transport.close().unwrap();
        assert_eq!(transport.close_count(), 1);
    }
}
