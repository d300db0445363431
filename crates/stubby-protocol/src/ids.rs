//! 请求码常量定义和枚举
//!
//! 定义所有协议帧的请求码（单字节），并提供载荷长度映射。

use crate::ProtocolError;

// ============================================================================
// 应答帧请求码常量（设备 -> 主机）
// ============================================================================

/// 请求已收到应答
pub const CODE_ACK: u8 = 0x01;

/// 运动指令执行完成通知
pub const CODE_COMPLETE: u8 = 0x02;

// ============================================================================
// 通用指令请求码常量（主机 -> 设备）
// ============================================================================

/// 开启调试输出
pub const CODE_ENABLE_DEBUG: u8 = 0x03;

/// 关闭调试输出
pub const CODE_DISABLE_DEBUG: u8 = 0x04;

// ============================================================================
// Stubby 指令请求码常量（主机 -> 设备）
// ============================================================================

/// 舵机上电
pub const CODE_POWER_ON: u8 = 0x20;

/// 舵机断电
pub const CODE_POWER_OFF: u8 = 0x21;

/// 平移（可叠加旋转）
pub const CODE_MOVE: u8 = 0x22;

/// 原地旋转
pub const CODE_TURN: u8 = 0x23;

/// MOVE 载荷长度
pub const MOVE_PAYLOAD_LEN: usize = 6;

/// TURN 载荷长度
pub const TURN_PAYLOAD_LEN: usize = 5;

/// 应答帧载荷长度（被应答的请求码）
pub const REPLY_PAYLOAD_LEN: usize = 1;

/// 请求码（封闭集合）
///
/// 包含 6 个面向用户的指令和 2 个协议内部的应答标签（ACK / COMPLETE）。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    num_enum::TryFromPrimitive,
    num_enum::IntoPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum RequestCode {
    Ack = 0x01,
    Complete = 0x02,
    EnableDebug = 0x03,
    DisableDebug = 0x04,
    PowerOn = 0x20,
    PowerOff = 0x21,
    Move = 0x22,
    Turn = 0x23,
}

impl RequestCode {
    /// 从线上字节解析
    pub fn from_u8(byte: u8) -> Result<Self, ProtocolError> {
        Self::try_from(byte).map_err(|e| ProtocolError::UnknownRequestCode(e.number))
    }

    /// 转换为线上字节
    pub fn as_u8(self) -> u8 {
        self.into()
    }

    /// 该请求码对应的固定载荷长度
    pub fn payload_len(self) -> usize {
        match self {
            Self::PowerOn | Self::PowerOff | Self::EnableDebug | Self::DisableDebug => 0,
            Self::Move => MOVE_PAYLOAD_LEN,
            Self::Turn => TURN_PAYLOAD_LEN,
            Self::Ack | Self::Complete => REPLY_PAYLOAD_LEN,
        }
    }

    /// 是否为应答标签（设备 -> 主机）
    pub fn is_reply(self) -> bool {
        matches!(self, Self::Ack | Self::Complete)
    }

    /// 是否为运动指令（ACK 之后还需等待 COMPLETE）
    pub fn is_motion(self) -> bool {
        matches!(self, Self::Move | Self::Turn)
    }
}

impl std::fmt::Display for RequestCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ack => "ACK",
            Self::Complete => "COMPLETE",
            Self::EnableDebug => "ENABLE_DEBUG",
            Self::DisableDebug => "DISABLE_DEBUG",
            Self::PowerOn => "POWER_ON",
            Self::PowerOff => "POWER_OFF",
            Self::Move => "MOVE",
            Self::Turn => "TURN",
        };
        write!(f, "{}(0x{:02X})", name, self.as_u8())
    }
}
