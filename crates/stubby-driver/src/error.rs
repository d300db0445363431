//! 驱动层错误类型定义

use stubby_protocol::ProtocolError;
use stubby_transport::TransportError;
use thiserror::Error;

/// 驱动层错误类型
///
/// 协议层面的失败（超时、写入失败）不会以错误形式出现，
/// 而是被收敛为 [`SendOutcome`](crate::SendOutcome) / 布尔结果；
/// 只有构造期的配置错误会作为硬错误上抛。
#[derive(Error, Debug)]
pub enum DriverError {
    /// 传输层错误
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// 协议错误（如载荷长度不匹配）
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 无法建立可用的传输或配置非法（不可通过重试恢复）
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// 配置文件解析失败
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// 配置文件读取失败
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
