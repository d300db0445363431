//! 运动指令值类型
//!
//! [`MoveCommand`] / [`TurnCommand`] 只负责把用户单位（度、速度、距离）
//! 翻译成线上消息，不涉及任何 IO，可以单独测试。

use std::f64::consts::{FRAC_PI_2, PI};
use stubby_protocol::encoding::{
    angle_to_byte, angle_to_fixed_bytes_with, degrees_to_radians, distance_to_bytes,
    velocity_to_byte,
};
use stubby_protocol::{
    AngleCodec, Float32BigEndian, MOVE_PAYLOAD_LEN, Message, ProtocolError, RequestCode,
    TURN_PAYLOAD_LEN,
};

/// 满速（线速度和角速度字段的最大值）
pub const FULL_SPEED: i32 = 255;

/// 平移指令
///
/// 角度单位为度，`linear_angle = 0` 表示正前方；
/// `distance` 为负时反向行走（方向折叠进线性角度，距离字段只编码绝对值）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveCommand {
    pub linear_angle: i32,
    pub rotational_angle: i32,
    pub linear_velocity: i32,
    pub rotational_velocity: i32,
    pub distance: i32,
}

impl MoveCommand {
    pub fn new(
        linear_angle: i32,
        rotational_angle: i32,
        linear_velocity: i32,
        rotational_velocity: i32,
        distance: i32,
    ) -> Self {
        Self {
            linear_angle,
            rotational_angle,
            linear_velocity,
            rotational_velocity,
            distance,
        }
    }

    /// 满速、不旋转地朝 `linear_angle` 方向移动
    pub fn toward(linear_angle: i32, distance: i32) -> Self {
        Self::new(linear_angle, 0, FULL_SPEED, 0, distance)
    }

    /// 距离为 0 的指令不产生任何通信
    pub fn is_noop(&self) -> bool {
        self.distance == 0
    }

    /// 6 字节 MOVE 载荷，no-op 时返回 `None`
    ///
    /// 布局：`[线性角度, 旋转角度, 线速度, 角速度, 距离高字节, 距离低字节]`
    pub fn payload(&self) -> Option<[u8; MOVE_PAYLOAD_LEN]> {
        if self.is_noop() {
            return None;
        }

        // 设备的 0 角度朝向与用户坐标系相差 90°
        let mut linear = degrees_to_radians(self.linear_angle) + FRAC_PI_2;
        if self.distance < 0 {
            linear += PI;
        }
        let rotational = degrees_to_radians(self.rotational_angle);
        let [dist_hi, dist_lo] = distance_to_bytes(self.distance);

        Some([
            angle_to_byte(linear),
            angle_to_byte(rotational),
            velocity_to_byte(self.linear_velocity),
            velocity_to_byte(self.rotational_velocity),
            dist_hi,
            dist_lo,
        ])
    }

    /// 翻译为 MOVE 消息，`Ok(None)` 表示 no-op
    pub fn to_message(&self) -> Result<Option<Message>, ProtocolError> {
        self.payload()
            .map(|payload| Message::new(RequestCode::Move, &payload))
            .transpose()
    }
}

/// 原地旋转指令
///
/// `angle` 单位为度，正值为逆时针（向左）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnCommand {
    pub angle: i32,
    pub rotational_velocity: i32,
}

impl TurnCommand {
    pub fn new(angle: i32, rotational_velocity: i32) -> Self {
        Self {
            angle,
            rotational_velocity,
        }
    }

    /// 角度为 0 的指令不产生任何通信
    pub fn is_noop(&self) -> bool {
        self.angle == 0
    }

    /// 线上使用的弧度值（设备的旋转方向与用户约定相反）
    pub fn radians(&self) -> f64 {
        self.angle as f64 * PI / -180.0
    }

    /// 5 字节 TURN 载荷：`[角速度, 4 字节角度]`
    ///
    /// # 错误
    /// - `ProtocolError::InvalidLength`: 仅在编码器实现违反字段长度时出现
    pub fn payload_with(
        &self,
        codec: &dyn AngleCodec,
    ) -> Result<Option<[u8; TURN_PAYLOAD_LEN]>, ProtocolError> {
        if self.is_noop() {
            return Ok(None);
        }

        let mut payload = [0u8; TURN_PAYLOAD_LEN];
        payload[0] = velocity_to_byte(self.rotational_velocity);
        angle_to_fixed_bytes_with(codec, self.radians(), &mut payload, 1)?;
        Ok(Some(payload))
    }

    /// 使用指定角度编码器翻译为 TURN 消息，`Ok(None)` 表示 no-op
    pub fn to_message_with(
        &self,
        codec: &dyn AngleCodec,
    ) -> Result<Option<Message>, ProtocolError> {
        self.payload_with(codec)?
            .map(|payload| Message::new(RequestCode::Turn, &payload))
            .transpose()
    }

    /// 使用默认角度编码器（[`Float32BigEndian`]）翻译为 TURN 消息
    pub fn to_message(&self) -> Result<Option<Message>, ProtocolError> {
        self.to_message_with(&Float32BigEndian)
    }
}
