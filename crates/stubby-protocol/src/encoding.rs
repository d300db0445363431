//! 数值编码工具
//!
//! 将连续的角度/速度/距离转换为固定宽度的线上整数。
//!
//! ## 约定
//!
//! - 角度字节：一整圈（2π）量化为 256 级，四舍五入（远离零），对 256 取模
//! - 速度字节：按位截断为 8 位（溢出回绕，不做饱和）
//! - 距离：取绝对值后截断为 16 位，高字节在前
//! - 角度定点字段：4 字节，具体布局由 [`AngleCodec`] 决定（固件契约）

use crate::ProtocolError;
use std::f64::consts::{PI, TAU};

/// 一整圈的量化级数
pub const ANGLE_STEPS: f64 = 256.0;

/// 定点角度字段宽度（字节）
pub const ANGLE_FIELD_LEN: usize = 4;

/// 弧度 -> 单字节角度
///
/// 结果恒在 `[0, 255]` 内，且以 2π 为周期：
/// `angle_to_byte(a) == angle_to_byte(a + 2πk)`。
/// 非有限值（NaN / ∞）编码为 0。
///
/// # 示例
///
/// ```
/// use stubby_protocol::encoding::angle_to_byte;
/// use std::f64::consts::{FRAC_PI_2, PI};
///
/// assert_eq!(angle_to_byte(0.0), 0);
/// assert_eq!(angle_to_byte(FRAC_PI_2), 64);
/// assert_eq!(angle_to_byte(-FRAC_PI_2), 192);
/// assert_eq!(angle_to_byte(3.0 * PI), 128);
/// ```
pub fn angle_to_byte(radians: f64) -> u8 {
    if !radians.is_finite() {
        return 0;
    }
    // f64::round 对 .5 远离零取整
    let steps = (radians * ANGLE_STEPS / TAU).round();
    steps.rem_euclid(ANGLE_STEPS) as u8
}

/// 角度（度）-> 弧度
#[inline]
pub fn degrees_to_radians(degrees: i32) -> f64 {
    degrees as f64 * PI / 180.0
}

/// 速度 -> 单字节
///
/// 按位截断（`v & 0xFF`），超出范围的输入回绕而不是被钳制。
#[inline]
pub fn velocity_to_byte(velocity: i32) -> u8 {
    (velocity & 0xFF) as u8
}

/// 距离 -> 两字节（高字节在前）
///
/// 只编码绝对值的低 16 位；方向由调用方折叠进角度。
#[inline]
pub fn distance_to_bytes(distance: i32) -> [u8; 2] {
    let magnitude = distance.unsigned_abs();
    [((magnitude >> 8) & 0xFF) as u8, (magnitude & 0xFF) as u8]
}

/// 定点角度字段编码器
///
/// 4 字节角度字段的位布局是固件契约，不同固件版本可能不同，
/// 因此以 trait 形式提供，允许调用方替换。
pub trait AngleCodec: Send + Sync + std::fmt::Debug {
    /// 将有符号弧度编码为 4 字节
    fn encode(&self, radians: f64) -> [u8; ANGLE_FIELD_LEN];
}

/// IEEE-754 单精度浮点，大端字节序（默认）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Float32BigEndian;

impl AngleCodec for Float32BigEndian {
    fn encode(&self, radians: f64) -> [u8; ANGLE_FIELD_LEN] {
        (radians as f32).to_bits().to_be_bytes()
    }
}

/// 有符号 Q16.16 定点数，大端字节序
///
/// 超出 i32 表示范围的值饱和到边界。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedQ16BigEndian;

impl FixedQ16BigEndian {
    /// 小数位数
    pub const FRACTION_BITS: u32 = 16;
}

impl AngleCodec for FixedQ16BigEndian {
    fn encode(&self, radians: f64) -> [u8; ANGLE_FIELD_LEN] {
        let scaled = (radians * (1u32 << Self::FRACTION_BITS) as f64).round();
        // `as` 对 f64 -> i32 做饱和转换，NaN 得到 0
        (scaled as i32).to_be_bytes()
    }
}

/// 使用默认编码器（[`Float32BigEndian`]）将角度写入 `buffer[offset..offset + 4]`
pub fn angle_to_fixed_bytes(
    radians: f64,
    buffer: &mut [u8],
    offset: usize,
) -> Result<(), ProtocolError> {
    angle_to_fixed_bytes_with(&Float32BigEndian, radians, buffer, offset)
}

/// 使用指定编码器将角度写入 `buffer[offset..offset + 4]`
///
/// # 错误
/// - `ProtocolError::InvalidLength`: 缓冲区不足以容纳 4 字节字段
pub fn angle_to_fixed_bytes_with(
    codec: &dyn AngleCodec,
    radians: f64,
    buffer: &mut [u8],
    offset: usize,
) -> Result<(), ProtocolError> {
    let end = offset.checked_add(ANGLE_FIELD_LEN).unwrap_or(usize::MAX);
    let actual = buffer.len();
    let field = buffer.get_mut(offset..end).ok_or(ProtocolError::InvalidLength {
        expected: end,
        actual,
    })?;
    field.copy_from_slice(&codec.encode(radians));
    Ok(())
}
