//! 设备事件（设备 -> 主机）
//!
//! 传输层去掉封帧后得到 `[tag, code]` 两字节，
//! `tag` 为 ACK / COMPLETE，`code` 为被应答的请求码。

use crate::ProtocolError;
use crate::ids::RequestCode;

/// 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// 请求帧已被设备接收
    Ack,
    /// 运动指令物理执行完成
    Complete,
}

impl EventKind {
    /// 对应的应答标签
    pub fn tag(self) -> RequestCode {
        match self {
            Self::Ack => RequestCode::Ack,
            Self::Complete => RequestCode::Complete,
        }
    }
}

/// 已解码的设备事件
///
/// 事件只携带请求码，没有逐次请求的关联 ID。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProtocolEvent {
    pub kind: EventKind,
    pub code: RequestCode,
}

impl ProtocolEvent {
    /// 创建 ACK 事件
    pub fn ack(code: RequestCode) -> Self {
        Self {
            kind: EventKind::Ack,
            code,
        }
    }

    /// 创建 COMPLETE 事件
    pub fn complete(code: RequestCode) -> Self {
        Self {
            kind: EventKind::Complete,
            code,
        }
    }

    /// 是否为指定请求码的 ACK
    pub fn is_ack_for(&self, code: RequestCode) -> bool {
        self.kind == EventKind::Ack && self.code == code
    }

    /// 是否为指定请求码的 COMPLETE
    pub fn is_complete_for(&self, code: RequestCode) -> bool {
        self.kind == EventKind::Complete && self.code == code
    }

    /// 从去封帧后的字节解析
    ///
    /// # 错误
    /// - `ProtocolError::InvalidLength`: 长度不是 2
    /// - `ProtocolError::UnknownRequestCode`: 未知字节
    /// - `ProtocolError::InvalidEvent`: 标签不是 ACK / COMPLETE
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let &[tag, code] = bytes else {
            return Err(ProtocolError::InvalidLength {
                expected: 2,
                actual: bytes.len(),
            });
        };

        let kind = match RequestCode::from_u8(tag)? {
            RequestCode::Ack => EventKind::Ack,
            RequestCode::Complete => EventKind::Complete,
            other => return Err(ProtocolError::InvalidEvent(other)),
        };

        Ok(Self {
            kind,
            code: RequestCode::from_u8(code)?,
        })
    }

    /// 编码为去封帧后的字节（用于模拟设备端）
    pub fn encode(&self) -> [u8; 2] {
        [self.kind.tag().as_u8(), self.code.as_u8()]
    }
}

impl TryFrom<&[u8]> for ProtocolEvent {
    type Error = ProtocolError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::decode(bytes)
    }
}

impl std::fmt::Display for ProtocolEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            EventKind::Ack => write!(f, "ACK({})", self.code),
            EventKind::Complete => write!(f, "COMPLETE({})", self.code),
        }
    }
}
