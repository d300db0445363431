//! # Stubby Protocol
//!
//! Stubby 六足机器人串口指令协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `ids`: 请求码常量与 [`RequestCode`] 枚举
//! - `encoding`: 角度/速度/距离的线上编码
//! - `message`: 请求消息（请求码 + 固定长度载荷）
//! - `event`: 设备事件（ACK / COMPLETE）解码
//!
//! ## 字节序
//!
//! 多字节字段统一使用大端字节序（高位在前）。
//! 传输层的封帧和校验不属于本 crate。

pub mod encoding;
pub mod event;
pub mod ids;
pub mod message;

// 重新导出常用类型
pub use encoding::{AngleCodec, FixedQ16BigEndian, Float32BigEndian};
pub use event::{EventKind, ProtocolEvent};
pub use ids::*;
pub use message::{Message, Payload, RequestBytes};

use thiserror::Error;

/// 协议错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid payload for {code}: expected {expected} bytes, got {actual}")]
    InvalidPayload {
        code: RequestCode,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown request code: 0x{0:02X}")]
    UnknownRequestCode(u8),

    #[error("{0} is a reply tag, not a request")]
    NotARequest(RequestCode),

    #[error("Invalid event tag: {0}")]
    InvalidEvent(RequestCode),

    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
