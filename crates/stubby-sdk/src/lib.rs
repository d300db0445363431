//! Stubby SDK - Stubby 六足机器人上位机控制库
//!
//! 通过串口向 Stubby 发送运动指令，并按 请求 → ACK → COMPLETE 的协议等待设备确认。
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **协议层** (`protocol`): 请求码、消息、线上编码，无 IO
//! - **传输层** (`transport`): 帧写出、事件接收的契约，以及基于 `std::io` 的通用实现
//! - **驱动层** (`driver`): 发送/重传/等待完成的状态机、配置、指标
//! - **客户端层** (`client`): 用户单位（度、速度、距离）的指令 API
//!
//! # 快速开始
//!
//! ```rust
//! use stubby_sdk::prelude::*;
//! # use stubby_sdk::transport::MockTransport;
//!
//! stubby_sdk::init_logging();
//!
//! # let transport = MockTransport::default();
//! let stubby = Stubby::builder()
//!     .transport(transport)
//!     .config(ProtocolConfig::default())
//!     .build()?;
//!
//! stubby.turn_on();
//! stubby.move_forward(200);
//! stubby.turn_right();
//! stubby.dispose()?;
//! # Ok::<(), DriverError>(())
//! ```
//!
//! 串口本身（端口发现、波特率）由调用方打开，再交给
//! [`StreamTransport`](transport::StreamTransport) 并提供一个 [`FrameCodec`](transport::FrameCodec)。

pub use stubby_client as client;
pub use stubby_driver as driver;
pub use stubby_protocol as protocol;
pub use stubby_transport as transport;

pub mod logging;
pub mod prelude;

pub use logging::{init_logging, init_logging_with};

// --- 常用类型 ---

pub use stubby_client::{MoveCommand, Stubby, StubbyBuilder, TurnCommand};
pub use stubby_driver::{
    CompletionOutcome, DriverError, MetricsSnapshot, MotionOutcome, Protocol, ProtocolConfig,
    SendOutcome,
};
pub use stubby_protocol::{Message, ProtocolError, ProtocolEvent, RequestCode};
pub use stubby_transport::{EventSink, FrameCodec, StreamTransport, Transport, TransportError};
