//! 协议指标模块
//!
//! 原子计数器，用于监控请求/应答链路的健康状态。
//! 所有计数器都可以在任何线程安全地读取，不会引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 协议实时指标
///
/// # 使用示例
///
/// ```rust
/// use stubby_driver::ProtocolMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = ProtocolMetrics::new();
/// metrics.frames_written.fetch_add(1, Ordering::Relaxed);
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.frames_written, 1);
/// ```
#[derive(Debug, Default)]
pub struct ProtocolMetrics {
    /// 成功写出的帧数（包括重传）
    pub frames_written: AtomicU64,

    /// 重传次数（超时或写入失败后的再次发送）
    pub retransmissions: AtomicU64,

    /// 传输层写入失败次数
    pub write_failures: AtomicU64,

    /// 收到的匹配 ACK 数
    pub acks_received: AtomicU64,

    /// 收到的匹配 COMPLETE 数
    pub completions_received: AtomicU64,

    /// 重试预算耗尽的发送次数
    pub send_failures: AtomicU64,

    /// 等待 COMPLETE 超时次数（仅带截止时间的等待）
    pub completion_timeouts: AtomicU64,

    /// 被丢弃的不匹配/过期事件数
    ///
    /// 持续增长说明设备在发送无人等待的应答，
    /// 通常是上一次请求的迟到 ACK。
    pub events_discarded: AtomicU64,
}

impl ProtocolMetrics {
    /// 创建新的指标实例（所有计数器初始化为 0）
    pub fn new() -> Self {
        Self::default()
    }

    /// 计数器 +1
    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// 获取指标快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_written: self.frames_written.load(Ordering::Relaxed),
            retransmissions: self.retransmissions.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            acks_received: self.acks_received.load(Ordering::Relaxed),
            completions_received: self.completions_received.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            completion_timeouts: self.completion_timeouts.load(Ordering::Relaxed),
            events_discarded: self.events_discarded.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        self.frames_written.store(0, Ordering::Relaxed);
        self.retransmissions.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
        self.acks_received.store(0, Ordering::Relaxed);
        self.completions_received.store(0, Ordering::Relaxed);
        self.send_failures.store(0, Ordering::Relaxed);
        self.completion_timeouts.store(0, Ordering::Relaxed);
        self.events_discarded.store(0, Ordering::Relaxed);
    }
}

/// 指标快照（不可变）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub frames_written: u64,
    pub retransmissions: u64,
    pub write_failures: u64,
    pub acks_received: u64,
    pub completions_received: u64,
    pub send_failures: u64,
    pub completion_timeouts: u64,
    pub events_discarded: u64,
}

impl MetricsSnapshot {
    /// 发送尝试总数（成功写出 + 写入失败）
    pub fn attempts_total(&self) -> u64 {
        self.frames_written + self.write_failures
    }

    /// 重传率（百分比）
    ///
    /// 返回 0.0 到 100.0 之间的值。没有任何尝试时返回 0.0。
    pub fn retransmission_rate(&self) -> f64 {
        let attempts = self.attempts_total();
        if attempts == 0 {
            return 0.0;
        }
        (self.retransmissions as f64 / attempts as f64) * 100.0
    }
}
