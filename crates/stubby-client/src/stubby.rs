//! 机器人指令 API
//!
//! [`Stubby`] 是协议引擎之上的纯翻译层：
//! 把用户单位的指令翻译成消息，交给 [`Protocol`] 执行，自身不保存任何运动状态。

use crate::builder::StubbyBuilder;
use crate::command::{FULL_SPEED, MoveCommand, TurnCommand};
use std::sync::Arc;
use stubby_driver::{DriverError, MetricsSnapshot, MotionOutcome, Protocol, ProtocolConfig};
use stubby_protocol::{AngleCodec, Message, ProtocolError};
use tracing::{debug, error, info};

/// Stubby 六足机器人
///
/// 所有指令都是**阻塞的**：零载荷指令在收到 ACK 或重试耗尽后返回；
/// 运动指令在收到 ACK 后继续等待 COMPLETE。
/// 默认配置下等待 COMPLETE 没有截止时间，可通过
/// [`ProtocolConfig::completion_timeout_ms`] 设置。
///
/// # 示例
///
/// ```
/// use stubby_client::Stubby;
/// use stubby_transport::MockTransport;
///
/// let stubby = Stubby::builder()
///     .transport(MockTransport::default())
///     .build()
///     .unwrap();
///
/// assert!(stubby.turn_on());
/// assert!(stubby.move_forward(100));
/// assert!(stubby.turn_left());
/// stubby.dispose().unwrap();
/// ```
pub struct Stubby {
    protocol: Protocol,
    config: ProtocolConfig,
    angle_codec: Arc<dyn AngleCodec>,
}

impl Stubby {
    pub(crate) fn from_parts(
        protocol: Protocol,
        config: ProtocolConfig,
        angle_codec: Arc<dyn AngleCodec>,
    ) -> Self {
        Self {
            protocol,
            config,
            angle_codec,
        }
    }

    /// 创建 Builder
    pub fn builder() -> StubbyBuilder {
        StubbyBuilder::new()
    }

    /// 底层协议引擎
    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// 协议指标快照
    pub fn metrics(&self) -> MetricsSnapshot {
        self.protocol.metrics()
    }

    /// 平移（可同时旋转机身朝向）
    ///
    /// # 参数
    ///
    /// - `linear_angle`: 行进方向（度，0 为正前方，正值向左）
    /// - `rotational_angle`: 机身旋转角度（度）
    /// - `linear_velocity` / `rotational_velocity`: 速度，按低 8 位编码
    /// - `distance`: 距离，负值表示反向；为 0 时直接返回 `true`，不产生任何通信
    pub fn move_by(
        &self,
        linear_angle: i32,
        rotational_angle: i32,
        linear_velocity: i32,
        rotational_velocity: i32,
        distance: i32,
    ) -> bool {
        self.execute_move(&MoveCommand::new(
            linear_angle,
            rotational_angle,
            linear_velocity,
            rotational_velocity,
            distance,
        ))
    }

    /// 满速朝 `linear_angle` 方向移动 `distance`
    pub fn move_toward(&self, linear_angle: i32, distance: i32) -> bool {
        self.execute_move(&MoveCommand::toward(linear_angle, distance))
    }

    pub fn move_forward(&self, distance: i32) -> bool {
        self.move_toward(0, distance)
    }

    pub fn move_backward(&self, distance: i32) -> bool {
        self.move_toward(180, distance)
    }

    pub fn move_right(&self, distance: i32) -> bool {
        self.move_toward(-90, distance)
    }

    pub fn move_left(&self, distance: i32) -> bool {
        self.move_toward(90, distance)
    }

    /// 原地旋转 `angle` 度（正值向左），为 0 时直接返回 `true`
    pub fn turn(&self, angle: i32, rotational_velocity: i32) -> bool {
        self.execute_turn(&TurnCommand::new(angle, rotational_velocity))
    }

    pub fn turn_left(&self) -> bool {
        self.turn(90, FULL_SPEED)
    }

    pub fn turn_right(&self) -> bool {
        self.turn(-90, FULL_SPEED)
    }

    pub fn turn_around(&self) -> bool {
        self.turn(180, FULL_SPEED)
    }

    pub fn turn_around_clockwise(&self) -> bool {
        self.turn(-180, FULL_SPEED)
    }

    /// 执行平移指令
    pub fn execute_move(&self, command: &MoveCommand) -> bool {
        self.run_motion(command.to_message())
    }

    /// 执行旋转指令（使用构造时选定的角度编码器）
    pub fn execute_turn(&self, command: &TurnCommand) -> bool {
        self.run_motion(command.to_message_with(self.angle_codec.as_ref()))
    }

    /// 上电
    pub fn turn_on(&self) -> bool {
        self.send(&Message::power_on())
    }

    /// 断电
    pub fn turn_off(&self) -> bool {
        self.send(&Message::power_off())
    }

    pub fn enable_debug(&self) -> bool {
        self.send(&Message::enable_debug())
    }

    pub fn disable_debug(&self) -> bool {
        self.send(&Message::disable_debug())
    }

    /// 关闭底层传输，实例随之销毁
    ///
    /// # 错误
    /// - `DriverError::Transport`: 传输层关闭失败
    pub fn dispose(self) -> Result<(), DriverError> {
        info!("Disposing Stubby, closing transport");
        self.protocol.transport().close()?;
        Ok(())
    }

    fn send(&self, message: &Message) -> bool {
        self.protocol
            .send_message(message, self.config.ack_timeout(), self.config.max_retries)
    }

    fn run_motion(&self, message: Result<Option<Message>, ProtocolError>) -> bool {
        let message = match message {
            Ok(Some(message)) => message,
            Ok(None) => {
                debug!("Zero-magnitude motion, nothing to send");
                return true;
            },
            Err(e) => {
                error!(error = %e, "Failed to encode motion command");
                return false;
            },
        };

        let outcome = self.protocol.execute_motion(
            &message,
            self.config.ack_timeout(),
            self.config.max_retries,
            self.config.completion_timeout(),
        );
        match outcome {
            MotionOutcome::Acknowledged { completion, .. } if !completion.is_completed() => {
                debug!(code = %message.code(), ?completion, "Motion acknowledged but not completed");
            },
            _ => {},
        }
        outcome.is_completed()
    }
}

impl std::fmt::Debug for Stubby {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stubby")
            .field("config", &self.config)
            .field("angle_codec", &self.angle_codec)
            .field("protocol", &self.protocol)
            .finish()
    }
}
