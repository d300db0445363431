//! Builder 模式实现
//!
//! 提供链式构造 [`Stubby`] 实例的便捷方式。

use crate::stubby::Stubby;
use std::sync::Arc;
use stubby_driver::{DriverError, Protocol, ProtocolConfig};
use stubby_protocol::{AngleCodec, Float32BigEndian};
use stubby_transport::Transport;
use tracing::info;

/// Stubby Builder（链式构造）
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use stubby_client::StubbyBuilder;
/// use stubby_driver::ProtocolConfig;
/// use stubby_protocol::FixedQ16BigEndian;
/// use stubby_transport::MockTransport;
///
/// let config = ProtocolConfig::default()
///     .with_ack_timeout(Duration::from_millis(500))
///     .with_completion_timeout(Some(Duration::from_secs(30)));
///
/// let stubby = StubbyBuilder::new()
///     .transport(MockTransport::default())
///     .config(config)
///     .angle_codec(FixedQ16BigEndian)
///     .build()
///     .unwrap();
/// ```
pub struct StubbyBuilder {
    transport: Option<Arc<dyn Transport>>,
    config: ProtocolConfig,
    angle_codec: Arc<dyn AngleCodec>,
}

impl StubbyBuilder {
    pub fn new() -> Self {
        Self {
            transport: None,
            config: ProtocolConfig::default(),
            angle_codec: Arc::new(Float32BigEndian),
        }
    }

    /// 设置传输层（必需）
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// 设置已共享的传输层
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// 设置协议配置（可选，默认 1000 ms ACK 超时、2 次重试、无限等待 COMPLETE）
    pub fn config(mut self, config: ProtocolConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置 TURN 指令角度字段的编码器（可选，默认 [`Float32BigEndian`]）
    pub fn angle_codec(mut self, codec: impl AngleCodec + 'static) -> Self {
        self.angle_codec = Arc::new(codec);
        self
    }

    /// 构建 Stubby 实例
    ///
    /// # Errors
    /// - `DriverError::InvalidConfiguration`: 未提供传输层、配置非法，或传输层拒绝注册事件接收端
    pub fn build(self) -> Result<Stubby, DriverError> {
        let transport = self.transport.ok_or_else(|| {
            DriverError::InvalidConfiguration("no transport supplied".to_string())
        })?;
        self.config.validate()?;

        let protocol = Protocol::new(transport).map_err(|e| {
            DriverError::InvalidConfiguration(format!("failed to register event sink: {e}"))
        })?;

        info!(
            ack_timeout_ms = self.config.ack_timeout_ms,
            max_retries = self.config.max_retries,
            completion_timeout_ms = ?self.config.completion_timeout_ms,
            angle_codec = ?self.angle_codec,
            "Stubby ready"
        );
        Ok(Stubby::from_parts(protocol, self.config, self.angle_codec))
    }
}

impl Default for StubbyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
