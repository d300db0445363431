//! 协议配置
//!
//! 支持从 TOML 加载：
//!
//! ```toml
//! ack_timeout_ms = 1000
//! max_retries = 2
//! # completion_timeout_ms = 30000
//! ```

use crate::DriverError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 默认单次尝试的 ACK 超时（毫秒）
pub const DEFAULT_ACK_TIMEOUT_MS: u64 = 1000;

/// 默认最大重试次数（总尝试次数 = `max_retries + 1`）
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// 协议配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// 单次尝试等待 ACK 的时间（毫秒）
    pub ack_timeout_ms: u64,
    /// 首次发送之后允许的重传次数
    pub max_retries: u32,
    /// 等待 COMPLETE 的截止时间（毫秒）
    ///
    /// `None` 表示无限等待，设备不发 COMPLETE 时调用线程会一直阻塞。
    pub completion_timeout_ms: Option<u64>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: DEFAULT_ACK_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            completion_timeout_ms: None,
        }
    }
}

impl ProtocolConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(s: &str) -> Result<Self, DriverError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载
    ///
    /// # 错误
    ///
    /// - `DriverError::Io`: 文件无法读取
    /// - `DriverError::Config`: TOML 格式错误
    /// - `DriverError::InvalidConfiguration`: 字段取值非法
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.ack_timeout_ms == 0 {
            return Err(DriverError::InvalidConfiguration(
                "ack_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.completion_timeout_ms == Some(0) {
            return Err(DriverError::InvalidConfiguration(
                "completion_timeout_ms must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    pub fn completion_timeout(&self) -> Option<Duration> {
        self.completion_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_completion_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.completion_timeout_ms =
            timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }
}
