//! 请求消息
//!
//! `Message` = 请求码 + 固定长度载荷，构造时校验载荷长度。

use crate::ProtocolError;
use crate::ids::RequestCode;
use smallvec::SmallVec;

/// 载荷缓冲区（最长载荷为 MOVE 的 6 字节，栈上分配）
pub type Payload = SmallVec<[u8; 6]>;

/// 线上请求帧字节（请求码 + 载荷，不含传输层封帧）
pub type RequestBytes = SmallVec<[u8; 8]>;

/// 请求消息（构造后不可变）
///
/// # 不变量
///
/// `payload.len() == code.payload_len()`，且 `code` 不是应答标签。
///
/// # 示例
///
/// ```
/// use stubby_protocol::{Message, RequestCode};
///
/// let msg = Message::new(RequestCode::Move, &[64, 0, 255, 0, 0, 100]).unwrap();
/// assert_eq!(msg.to_bytes().as_slice(), &[0x22, 64, 0, 255, 0, 0, 100]);
///
/// assert!(Message::new(RequestCode::Move, &[1, 2, 3]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawMessage"))]
pub struct Message {
    code: RequestCode,
    payload: Payload,
}

impl Message {
    /// 创建消息，校验载荷长度
    ///
    /// # 错误
    /// - `ProtocolError::NotARequest`: `code` 为 ACK / COMPLETE
    /// - `ProtocolError::InvalidPayload`: 载荷长度与请求码不匹配
    pub fn new(code: RequestCode, payload: &[u8]) -> Result<Self, ProtocolError> {
        if code.is_reply() {
            return Err(ProtocolError::NotARequest(code));
        }

        let expected = code.payload_len();
        if payload.len() != expected {
            return Err(ProtocolError::InvalidPayload {
                code,
                expected,
                actual: payload.len(),
            });
        }

        Ok(Self {
            code,
            payload: Payload::from_slice(payload),
        })
    }

    /// 创建无载荷消息（上电/断电/调试开关）
    fn empty(code: RequestCode) -> Self {
        Self {
            code,
            payload: Payload::new(),
        }
    }

    /// 舵机上电
    pub fn power_on() -> Self {
        Self::empty(RequestCode::PowerOn)
    }

    /// 舵机断电
    pub fn power_off() -> Self {
        Self::empty(RequestCode::PowerOff)
    }

    /// 开启调试输出
    pub fn enable_debug() -> Self {
        Self::empty(RequestCode::EnableDebug)
    }

    /// 关闭调试输出
    pub fn disable_debug() -> Self {
        Self::empty(RequestCode::DisableDebug)
    }

    /// 请求码
    pub fn code(&self) -> RequestCode {
        self.code
    }

    /// 载荷
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// 序列化为线上字节：`[code, payload...]`
    ///
    /// 传输层的封帧/校验不在此处理。
    pub fn to_bytes(&self) -> RequestBytes {
        let mut bytes = RequestBytes::new();
        bytes.push(self.code.as_u8());
        bytes.extend_from_slice(&self.payload);
        bytes
    }
}

impl TryFrom<&[u8]> for Message {
    type Error = ProtocolError;

    /// 从 `[code, payload...]` 解析（用于模拟设备端和录制回放）
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let (&code, payload) = bytes.split_first().ok_or(ProtocolError::InvalidLength {
            expected: 1,
            actual: 0,
        })?;
        Self::new(RequestCode::from_u8(code)?, payload)
    }
}

/// 反序列化的中间形式，经 [`Message::new`] 校验后才成为 `Message`
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawMessage {
    code: RequestCode,
    payload: Vec<u8>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawMessage> for Message {
    type Error = ProtocolError;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        Self::new(raw.code, &raw.payload)
    }
}
