//! 请求/应答/完成 协议状态机
//!
//! 每个请求的生命周期：
//!
//! ```text
//! Idle → Sending ──ACK──→ Acked ──(运动指令)──→ AwaitingCompletion ──COMPLETE──→ Completed
//!           │
//!           └──超时/写入失败，预算耗尽──→ Failed
//! ```
//!
//! 设备事件只携带请求码，没有逐次请求的关联 ID，
//! 因此同一个 [`Protocol`] 实例同一时刻只允许一个未完成的请求：
//! 所有操作都在实例级的请求锁下执行。
//!
//! 运动指令被 ACK 后，其 COMPLETE 记为"待完成"。在 `send_message` 与
//! `wait_for_complete` 分开调用时，中间插入的其他请求不会丢弃该 COMPLETE：
//! 它会被记下，交给之后的等待。

use crate::error::DriverError;
use crate::metrics::{MetricsSnapshot, ProtocolMetrics};
use crate::outcome::{CompletionOutcome, MotionOutcome, SendOutcome};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use stubby_protocol::{Message, ProtocolEvent, RequestCode};
use stubby_transport::{EventSink, Transport};
use tracing::{debug, error, info, warn};

/// 协议引擎
///
/// 持有传输层句柄和事件接收端。构造时向传输层注册 [`EventSink`]，
/// 之后传输层读线程解码出的 ACK / COMPLETE 事件都会进入内部的无界通道。
///
/// 所有方法都是**阻塞的**，请不要在 `async` 上下文中直接调用。
///
/// # 示例
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use stubby_driver::Protocol;
/// use stubby_protocol::Message;
/// use stubby_transport::MockTransport;
///
/// let transport = Arc::new(MockTransport::default());
/// let protocol = Protocol::new(transport).unwrap();
///
/// assert!(protocol.send_message(&Message::power_on(), Duration::from_millis(100), 2));
/// ```
pub struct Protocol {
    transport: Arc<dyn Transport>,
    events: Receiver<ProtocolEvent>,
    /// 实例级请求锁，保证同一时刻只有一个未完成的发送/等待
    request_lock: Mutex<()>,
    /// 已 ACK、尚未被等待取走的运动请求（每个请求码至多一项）
    owed: Mutex<Vec<PendingCompletion>>,
    metrics: Arc<ProtocolMetrics>,
}

impl Protocol {
    /// 创建协议引擎并向传输层注册事件接收端
    ///
    /// # 错误
    ///
    /// - `DriverError::Transport`: 传输层拒绝注册（例如已被其他实例注册）
    pub fn new(transport: Arc<dyn Transport>) -> Result<Self, DriverError> {
        let (tx, rx) = crossbeam_channel::unbounded();
        transport.register(EventSink::new(tx))?;
        debug!("Protocol registered event sink on transport");

        Ok(Self {
            transport,
            events: rx,
            request_lock: Mutex::new(()),
            owed: Mutex::new(Vec::new()),
            metrics: Arc::new(ProtocolMetrics::new()),
        })
    }

    /// 底层传输
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// 指标快照
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// 共享的指标句柄（可在其他线程周期性读取）
    pub fn metrics_handle(&self) -> Arc<ProtocolMetrics> {
        Arc::clone(&self.metrics)
    }

    /// 发送消息并等待 ACK
    ///
    /// 等价于 `send_message_detailed(..).is_acknowledged()`。
    ///
    /// # 参数
    ///
    /// - `message`: 待发送的请求
    /// - `timeout`: 每次尝试等待 ACK 的时间
    /// - `max_retries`: 首次发送之后允许的重传次数（总尝试次数 = `max_retries + 1`）
    pub fn send_message(&self, message: &Message, timeout: Duration, max_retries: u32) -> bool {
        self.send_message_detailed(message, timeout, max_retries).is_acknowledged()
    }

    /// 发送消息并等待 ACK，返回详细结果
    pub fn send_message_detailed(
        &self,
        message: &Message,
        timeout: Duration,
        max_retries: u32,
    ) -> SendOutcome {
        let _guard = self.request_lock.lock();
        self.send_locked(message, timeout, max_retries)
    }

    /// 无限期等待指定请求码的 COMPLETE
    ///
    /// 设备不发送 COMPLETE 时调用线程会一直阻塞。
    /// 需要截止时间的场景请使用 [`wait_for_complete_timeout`](Self::wait_for_complete_timeout)。
    ///
    /// 事件源断开（传输层读线程退出）时返回 `false`。
    pub fn wait_for_complete(&self, code: RequestCode) -> bool {
        let _guard = self.request_lock.lock();
        self.await_complete(code, None).is_completed()
    }

    /// 在截止时间内等待指定请求码的 COMPLETE
    pub fn wait_for_complete_timeout(
        &self,
        code: RequestCode,
        timeout: Duration,
    ) -> CompletionOutcome {
        let _guard = self.request_lock.lock();
        self.await_complete(code, Some(Instant::now() + timeout))
    }

    /// 执行运动指令：发送、等待 ACK，再等待 COMPLETE
    ///
    /// 整个过程只获取一次请求锁，其他线程的请求不会插入 ACK 与 COMPLETE 之间。
    /// 未收到 ACK 时不进入等待完成阶段。
    ///
    /// # 参数
    ///
    /// - `completion_timeout`: `None` 表示无限等待 COMPLETE
    pub fn execute_motion(
        &self,
        message: &Message,
        timeout: Duration,
        max_retries: u32,
        completion_timeout: Option<Duration>,
    ) -> MotionOutcome {
        let _guard = self.request_lock.lock();

        let send = self.send_locked(message, timeout, max_retries);
        if !send.is_acknowledged() {
            return MotionOutcome::NotAcknowledged(send);
        }

        let deadline = completion_timeout.map(|t| Instant::now() + t);
        let completion = self.await_complete(message.code(), deadline);
        MotionOutcome::Acknowledged { send, completion }
    }

    fn send_locked(&self, message: &Message, timeout: Duration, max_retries: u32) -> SendOutcome {
        let frame = message.to_bytes();
        let total_attempts = max_retries.saturating_add(1);

        self.drain_stale();

        let mut pending = PendingSend::new(message.code(), total_attempts);
        let mut last_write_failed = false;
        while let Some(attempt) = pending.begin_attempt(timeout) {
            let code = pending.code;
            if attempt > 1 {
                ProtocolMetrics::bump(&self.metrics.retransmissions);
                warn!(%code, attempt, total_attempts, "Retransmitting request");
            }

            match self.transport.write(&frame) {
                Ok(()) => {
                    last_write_failed = false;
                    ProtocolMetrics::bump(&self.metrics.frames_written);
                    debug!(%code, attempt, frame = ?frame.as_slice(), "Frame written");

                    if self.await_ack(&pending) {
                        info!(%code, attempt, "Request acknowledged");
                        if code.is_motion() {
                            self.owe_completion(code);
                        }
                        return SendOutcome::Acknowledged { attempts: attempt };
                    }
                    warn!(%code, attempt, timeout_ms = timeout.as_millis() as u64, "No ACK before deadline");
                },
                Err(e) => {
                    last_write_failed = true;
                    ProtocolMetrics::bump(&self.metrics.write_failures);
                    warn!(%code, attempt, error = %e, "Transport write failed");
                },
            }
        }

        let code = pending.code;
        ProtocolMetrics::bump(&self.metrics.send_failures);
        if last_write_failed {
            warn!(%code, total_attempts, "Giving up: last attempt failed to write");
            SendOutcome::TransportError {
                attempts: total_attempts,
            }
        } else {
            warn!(%code, total_attempts, "Giving up: no ACK received");
            SendOutcome::TimedOut {
                attempts: total_attempts,
            }
        }
    }

    /// 丢弃上一个请求遗留的事件，避免迟到的 ACK 被算到新请求头上
    ///
    /// 待完成运动请求的 COMPLETE 不丢弃，而是记到对应的 [`PendingCompletion`] 上。
    fn drain_stale(&self) {
        for event in self.events.try_iter() {
            if self.settle_owed(&event) {
                debug!(%event, "Holding COMPLETE for a later wait");
                continue;
            }
            ProtocolMetrics::bump(&self.metrics.events_discarded);
            debug!(%event, "Discarding stale event");
        }
    }

    /// 记录一个已 ACK 的运动请求；同码的旧记录被新请求取代
    fn owe_completion(&self, code: RequestCode) {
        let mut owed = self.owed.lock();
        match owed.iter_mut().find(|p| p.code == code) {
            Some(existing) => existing.satisfied = false,
            None => owed.push(PendingCompletion::new(code)),
        }
    }

    /// 用事件满足尚未完成的待完成记录，返回事件是否被记下
    fn settle_owed(&self, event: &ProtocolEvent) -> bool {
        self.owed
            .lock()
            .iter_mut()
            .find(|p| !p.satisfied && p.code == event.code)
            .is_some_and(|p| p.observe(event))
    }

    /// 取走指定请求码的待完成记录，返回其 COMPLETE 是否已经到达
    fn take_owed(&self, code: RequestCode, require_satisfied: bool) -> bool {
        let mut owed = self.owed.lock();
        match owed.iter().position(|p| p.code == code) {
            Some(index) if !require_satisfied || owed[index].satisfied => {
                owed.swap_remove(index).satisfied
            },
            _ => false,
        }
    }

    /// 等待匹配的 ACK，返回是否在本次尝试的截止时间前收到
    fn await_ack(&self, pending: &PendingSend) -> bool {
        let code = pending.code;
        loop {
            match self.events.recv_deadline(pending.deadline) {
                Ok(event) if event.is_ack_for(code) => {
                    ProtocolMetrics::bump(&self.metrics.acks_received);
                    return true;
                },
                Ok(event) if self.settle_owed(&event) => {
                    debug!(%event, awaiting = %code, "Holding COMPLETE for a later wait");
                },
                Ok(event) => {
                    ProtocolMetrics::bump(&self.metrics.events_discarded);
                    debug!(%event, awaiting = %code, "Discarding unrelated event while awaiting ACK");
                },
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => {
                    error!(%code, "Event source disconnected while awaiting ACK");
                    return false;
                },
            }
        }
    }

    /// 等待匹配的 COMPLETE，`deadline` 为 `None` 时无限等待
    ///
    /// 已经记下的 COMPLETE 直接返回 `Completed`。
    fn await_complete(&self, code: RequestCode, deadline: Option<Instant>) -> CompletionOutcome {
        if self.take_owed(code, true) {
            ProtocolMetrics::bump(&self.metrics.completions_received);
            info!(%code, "Request completed");
            return CompletionOutcome::Completed;
        }

        let mut pending = PendingCompletion::new(code);
        while !pending.satisfied {
            let received = match deadline {
                Some(deadline) => self.events.recv_deadline(deadline),
                None => self.events.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(event) => {
                    if pending.observe(&event) {
                        self.take_owed(code, false);
                        ProtocolMetrics::bump(&self.metrics.completions_received);
                        info!(%code, "Request completed");
                    } else if self.settle_owed(&event) {
                        debug!(%event, awaiting = %code, "Holding COMPLETE for a later wait");
                    } else {
                        ProtocolMetrics::bump(&self.metrics.events_discarded);
                        debug!(%event, awaiting = %code, "Discarding unrelated event while awaiting COMPLETE");
                    }
                },
                Err(RecvTimeoutError::Timeout) => {
                    ProtocolMetrics::bump(&self.metrics.completion_timeouts);
                    warn!(%code, "No COMPLETE before deadline");
                    return CompletionOutcome::TimedOut;
                },
                Err(RecvTimeoutError::Disconnected) => {
                    error!(%code, "Event source disconnected while awaiting COMPLETE");
                    return CompletionOutcome::Disconnected;
                },
            }
        }
        CompletionOutcome::Completed
    }
}

/// 发送中的请求（从进入发送到收到 ACK 或重试耗尽）
#[derive(Debug)]
struct PendingSend {
    code: RequestCode,
    total_attempts: u32,
    attempts_remaining: u32,
    /// 当前尝试的 ACK 截止时间
    deadline: Instant,
}

impl PendingSend {
    fn new(code: RequestCode, total_attempts: u32) -> Self {
        Self {
            code,
            total_attempts,
            attempts_remaining: total_attempts,
            deadline: Instant::now(),
        }
    }

    /// 消耗一次尝试并重置截止时间，返回尝试序号（从 1 开始）
    fn begin_attempt(&mut self, timeout: Duration) -> Option<u32> {
        self.attempts_remaining = self.attempts_remaining.checked_sub(1)?;
        self.deadline = Instant::now() + timeout;
        Some(self.total_attempts - self.attempts_remaining)
    }
}

/// 已 ACK、等待 COMPLETE 的运动请求
#[derive(Debug)]
struct PendingCompletion {
    code: RequestCode,
    satisfied: bool,
}

impl PendingCompletion {
    fn new(code: RequestCode) -> Self {
        Self {
            code,
            satisfied: false,
        }
    }

    /// 事件是否满足本次等待
    fn observe(&mut self, event: &ProtocolEvent) -> bool {
        if event.is_complete_for(self.code) {
            self.satisfied = true;
        }
        self.satisfied
    }
}

impl fmt::Debug for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Protocol")
            .field("pending_events", &self.events.len())
            .field("metrics", &self.metrics.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stubby_transport::{MockBehavior, MockTransport, TransportError};

    const SHORT: Duration = Duration::from_millis(30);

    fn protocol_with(behavior: MockBehavior) -> (Arc<MockTransport>, Protocol) {
        let transport = Arc::new(MockTransport::new(behavior));
        let protocol = Protocol::new(transport.clone()).unwrap();
        (transport, protocol)
    }

    fn turn_message() -> Message {
        Message::new(RequestCode::Turn, &[255, 0x3F, 0xC9, 0x0F, 0xDB]).unwrap()
    }

    /// 注册时直接丢弃接收端的传输（模拟读线程已退出）
    struct DisconnectedTransport;

    impl Transport for DisconnectedTransport {
        fn write(&self, _frame: &[u8]) -> Result<(), TransportError> {
            Ok(())
        }

        fn register(&self, _sink: EventSink) -> Result<(), TransportError> {
            Ok(())
        }

        fn close(&self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[test]
    fn test_pending_send_attempt_budget() {
        let mut pending = PendingSend::new(RequestCode::Move, 3);
        let attempts: Vec<u32> =
            std::iter::from_fn(|| pending.begin_attempt(SHORT)).collect();
        assert_eq!(attempts, vec![1, 2, 3]);
        assert_eq!(pending.attempts_remaining, 0);
    }

    #[test]
    fn test_pending_completion_matches_code_and_kind() {
        let mut pending = PendingCompletion::new(RequestCode::Turn);
        assert!(!pending.observe(&ProtocolEvent::ack(RequestCode::Turn)));
        assert!(!pending.observe(&ProtocolEvent::complete(RequestCode::Move)));
        assert!(pending.observe(&ProtocolEvent::complete(RequestCode::Turn)));
        assert!(pending.satisfied);
    }

    #[test]
    fn test_ack_on_first_attempt() {
        let (transport, protocol) = protocol_with(MockBehavior::AckOnly);

        let outcome = protocol.send_message_detailed(&Message::power_on(), SHORT, 2);
        assert_eq!(outcome, SendOutcome::Acknowledged { attempts: 1 });
        assert_eq!(transport.written_frames(), vec![vec![0x20]]);

        let metrics = protocol.metrics();
        assert_eq!(metrics.frames_written, 1);
        assert_eq!(metrics.acks_received, 1);
        assert_eq!(metrics.retransmissions, 0);
    }

    #[test]
    fn test_no_ack_sends_max_retries_plus_one_frames() {
        let (transport, protocol) = protocol_with(MockBehavior::Silent);

        assert!(!protocol.send_message(&Message::power_on(), SHORT, 2));
        assert_eq!(transport.write_count(), 3);
        assert!(transport.written_frames().iter().all(|f| f == &[0x20]));

        let metrics = protocol.metrics();
        assert_eq!(metrics.retransmissions, 2);
        assert_eq!(metrics.send_failures, 1);
    }

    #[test]
    fn test_zero_retries_single_attempt() {
        let (transport, protocol) = protocol_with(MockBehavior::Silent);

        let outcome = protocol.send_message_detailed(&Message::power_off(), SHORT, 0);
        assert_eq!(outcome, SendOutcome::TimedOut { attempts: 1 });
        assert_eq!(transport.write_count(), 1);
    }

    #[test]
    fn test_ack_on_retransmission() {
        let (transport, protocol) = protocol_with(MockBehavior::AckOnly);
        transport.ignore_first_writes(1);

        let outcome = protocol.send_message_detailed(&Message::enable_debug(), SHORT, 2);
        assert_eq!(outcome, SendOutcome::Acknowledged { attempts: 2 });
        assert_eq!(transport.write_count(), 2);
    }

    #[test]
    fn test_write_failures_consume_attempts() {
        let (transport, protocol) = protocol_with(MockBehavior::FailWrites);

        let start = Instant::now();
        let outcome = protocol.send_message_detailed(&Message::power_on(), Duration::from_secs(5), 2);
        assert_eq!(outcome, SendOutcome::TransportError { attempts: 3 });
        assert_eq!(transport.write_count(), 3);
        // 写入失败不等待 ACK 超时
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(protocol.metrics().write_failures, 3);
    }

    #[test]
    fn test_stale_ack_is_drained_before_send() {
        let (transport, protocol) = protocol_with(MockBehavior::Silent);
        assert!(transport.inject(ProtocolEvent::ack(RequestCode::PowerOn)));

        assert!(!protocol.send_message(&Message::power_on(), SHORT, 0));
        assert_eq!(protocol.metrics().events_discarded, 1);
    }

    #[test]
    fn test_unrelated_events_are_discarded() {
        let (transport, protocol) = protocol_with(MockBehavior::Silent);

        let injector = {
            let transport = transport.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                transport.inject(ProtocolEvent::ack(RequestCode::PowerOff));
                transport.inject(ProtocolEvent::complete(RequestCode::PowerOn));
                transport.inject(ProtocolEvent::ack(RequestCode::PowerOn));
            })
        };

        assert!(protocol.send_message(&Message::power_on(), Duration::from_secs(2), 0));
        injector.join().unwrap();
        assert_eq!(protocol.metrics().events_discarded, 2);
    }

    #[test]
    fn test_execute_motion_completes() {
        let (transport, protocol) = protocol_with(MockBehavior::AckAndComplete);

        let outcome = protocol.execute_motion(&turn_message(), SHORT, 2, None);
        assert!(outcome.is_completed());
        assert_eq!(transport.write_count(), 1);
        assert_eq!(protocol.metrics().completions_received, 1);
    }

    #[test]
    fn test_execute_motion_skips_wait_without_ack() {
        let (_transport, protocol) = protocol_with(MockBehavior::Silent);

        let outcome = protocol.execute_motion(&turn_message(), SHORT, 1, None);
        assert_eq!(
            outcome,
            MotionOutcome::NotAcknowledged(SendOutcome::TimedOut { attempts: 2 })
        );
    }

    #[test]
    fn test_execute_motion_completion_timeout() {
        let (_transport, protocol) = protocol_with(MockBehavior::AckOnly);

        let outcome = protocol.execute_motion(&turn_message(), SHORT, 2, Some(SHORT));
        assert_eq!(
            outcome,
            MotionOutcome::Acknowledged {
                send: SendOutcome::Acknowledged { attempts: 1 },
                completion: CompletionOutcome::TimedOut,
            }
        );
        assert_eq!(protocol.metrics().completion_timeouts, 1);
    }

    #[test]
    fn test_wait_for_complete_after_send() {
        let (transport, protocol) = protocol_with(MockBehavior::AckAndComplete);
        transport.set_complete_delay(Duration::from_millis(50));

        assert!(protocol.send_message(&turn_message(), SHORT, 2));
        assert!(protocol.wait_for_complete(RequestCode::Turn));
    }

    #[test]
    fn test_completion_survives_intervening_send() {
        let (_transport, protocol) = protocol_with(MockBehavior::AckAndComplete);

        assert!(protocol.send_message(&turn_message(), SHORT, 2));
        // COMPLETE(Turn) 已在通道中，下一次发送的排空不能把它丢掉
        assert!(protocol.send_message(&Message::power_on(), SHORT, 2));

        assert_eq!(
            protocol.wait_for_complete_timeout(RequestCode::Turn, Duration::from_millis(300)),
            CompletionOutcome::Completed
        );
        let metrics = protocol.metrics();
        assert_eq!(metrics.events_discarded, 0);
        assert_eq!(metrics.completions_received, 1);
    }

    #[test]
    fn test_completion_arriving_during_other_send_is_kept() {
        let (transport, protocol) = protocol_with(MockBehavior::AckAndComplete);
        transport.set_complete_delay(Duration::from_millis(30));

        assert!(protocol.send_message(&turn_message(), SHORT, 2));
        // COMPLETE(Turn) 在 PowerOn 发送期间到达
        transport.set_write_latency(Duration::from_millis(60));
        assert!(protocol.send_message(&Message::power_on(), Duration::from_millis(200), 0));

        assert!(protocol.wait_for_complete(RequestCode::Turn));
        assert_eq!(protocol.metrics().events_discarded, 0);
    }

    #[test]
    fn test_held_completion_is_consumed_once() {
        let (_transport, protocol) = protocol_with(MockBehavior::AckAndComplete);

        assert!(protocol.send_message(&turn_message(), SHORT, 2));
        assert!(protocol.send_message(&Message::power_on(), SHORT, 2));

        assert!(protocol.wait_for_complete(RequestCode::Turn));
        assert_eq!(
            protocol.wait_for_complete_timeout(RequestCode::Turn, SHORT),
            CompletionOutcome::TimedOut
        );
    }

    #[test]
    fn test_unowed_completion_is_still_drained() {
        let (transport, protocol) = protocol_with(MockBehavior::AckOnly);
        transport.inject(ProtocolEvent::complete(RequestCode::Move));

        assert!(protocol.send_message(&Message::power_on(), SHORT, 0));
        assert_eq!(protocol.metrics().events_discarded, 1);
        assert_eq!(
            protocol.wait_for_complete_timeout(RequestCode::Move, SHORT),
            CompletionOutcome::TimedOut
        );
    }

    #[test]
    fn test_wait_for_complete_ignores_other_codes() {
        let (transport, protocol) = protocol_with(MockBehavior::Silent);
        transport.inject(ProtocolEvent::complete(RequestCode::Move));
        transport.inject(ProtocolEvent::complete(RequestCode::Turn));

        assert!(protocol.wait_for_complete(RequestCode::Turn));
        assert_eq!(protocol.metrics().events_discarded, 1);
    }

    #[test]
    fn test_wait_for_complete_timeout() {
        let (_transport, protocol) = protocol_with(MockBehavior::Silent);

        let outcome = protocol.wait_for_complete_timeout(RequestCode::Move, SHORT);
        assert_eq!(outcome, CompletionOutcome::TimedOut);
    }

    #[test]
    fn test_disconnected_event_source() {
        let protocol = Protocol::new(Arc::new(DisconnectedTransport)).unwrap();

        let outcome = protocol.send_message_detailed(&Message::power_on(), Duration::from_secs(5), 1);
        assert_eq!(outcome, SendOutcome::TimedOut { attempts: 2 });
        assert!(!protocol.wait_for_complete(RequestCode::Move));
        assert_eq!(
            protocol.wait_for_complete_timeout(RequestCode::Move, SHORT),
            CompletionOutcome::Disconnected
        );
    }

    #[test]
    fn test_second_registration_rejected() {
        let (transport, _protocol) = protocol_with(MockBehavior::Silent);
        let err = Protocol::new(transport).unwrap_err();
        assert!(matches!(
            err,
            DriverError::Transport(TransportError::AlreadyRegistered)
        ));
    }

    #[test]
    fn test_concurrent_sends_do_not_interleave() {
        let (transport, protocol) = protocol_with(MockBehavior::Silent);
        transport.set_write_latency(Duration::from_millis(2));
        let protocol = Arc::new(protocol);

        let handles: Vec<_> = [Message::power_on(), Message::power_off()]
            .into_iter()
            .map(|msg| {
                let protocol = Arc::clone(&protocol);
                std::thread::spawn(move || protocol.send_message(&msg, Duration::from_millis(10), 2))
            })
            .collect();
        for handle in handles {
            assert!(!handle.join().unwrap());
        }

        let codes: Vec<u8> = transport.written_frames().iter().map(|f| f[0]).collect();
        assert_eq!(codes.len(), 6);
        assert!(codes[..3].iter().all(|&c| c == codes[0]));
        assert!(codes[3..].iter().all(|&c| c == codes[3]));
        assert_ne!(codes[0], codes[3]);
    }
}
