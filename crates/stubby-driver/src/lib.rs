//! # Stubby Driver
//!
//! 协议引擎：在 [`Transport`](stubby_transport::Transport) 之上实现
//! 发送 → 等待 ACK → 超时重传 → 等待 COMPLETE 的请求状态机。
//!
//! ## 模块
//!
//! - `protocol`: [`Protocol`] 状态机
//! - `outcome`: 发送/完成结果（公共 API 的布尔值是它们的投影）
//! - `config`: [`ProtocolConfig`]（TOML 加载）
//! - `metrics`: 原子计数器指标
//! - `error`: [`DriverError`]

pub mod config;
pub mod error;
pub mod metrics;
pub mod outcome;
pub mod protocol;

pub use config::{DEFAULT_ACK_TIMEOUT_MS, DEFAULT_MAX_RETRIES, ProtocolConfig};
pub use error::DriverError;
pub use metrics::{MetricsSnapshot, ProtocolMetrics};
pub use outcome::{CompletionOutcome, MotionOutcome, SendOutcome};
pub use protocol::Protocol;
