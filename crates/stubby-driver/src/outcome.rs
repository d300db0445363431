//! 请求结果类型
//!
//! 公共 API 返回 `bool`，这里的枚举保留失败原因，布尔值只是它们的投影。

use std::fmt;

/// 一次 `send_message` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// 收到匹配的 ACK
    Acknowledged { attempts: u32 },
    /// 所有尝试都在等待 ACK 时超时
    TimedOut { attempts: u32 },
    /// 最后一次尝试写入失败
    TransportError { attempts: u32 },
}

impl SendOutcome {
    pub fn is_acknowledged(&self) -> bool {
        matches!(self, SendOutcome::Acknowledged { .. })
    }

    /// 实际进行的尝试次数（含首次发送）
    pub fn attempts(&self) -> u32 {
        match *self {
            SendOutcome::Acknowledged { attempts }
            | SendOutcome::TimedOut { attempts }
            | SendOutcome::TransportError { attempts } => attempts,
        }
    }
}

impl From<SendOutcome> for bool {
    fn from(outcome: SendOutcome) -> bool {
        outcome.is_acknowledged()
    }
}

impl fmt::Display for SendOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendOutcome::Acknowledged { attempts } => {
                write!(f, "acknowledged after {} attempt(s)", attempts)
            },
            SendOutcome::TimedOut { attempts } => {
                write!(f, "timed out after {} attempt(s)", attempts)
            },
            SendOutcome::TransportError { attempts } => {
                write!(f, "transport error after {} attempt(s)", attempts)
            },
        }
    }
}

/// 等待 COMPLETE 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// 收到匹配的 COMPLETE
    Completed,
    /// 截止时间已过
    TimedOut,
    /// 事件源已断开（传输层读线程退出）
    Disconnected,
}

impl CompletionOutcome {
    pub fn is_completed(&self) -> bool {
        *self == CompletionOutcome::Completed
    }
}

impl From<CompletionOutcome> for bool {
    fn from(outcome: CompletionOutcome) -> bool {
        outcome.is_completed()
    }
}

/// 运动指令（发送 + 等待完成）的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    /// 未收到 ACK，未进入等待完成阶段
    NotAcknowledged(SendOutcome),
    /// 已 ACK，附带等待 COMPLETE 的结果
    Acknowledged {
        send: SendOutcome,
        completion: CompletionOutcome,
    },
}

impl MotionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            MotionOutcome::Acknowledged {
                completion: CompletionOutcome::Completed,
                ..
            }
        )
    }
}

impl From<MotionOutcome> for bool {
    fn from(outcome: MotionOutcome) -> bool {
        outcome.is_completed()
    }
}
