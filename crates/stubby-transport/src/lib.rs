//! # Stubby Transport Layer
//!
//! 串口传输抽象层，定义协议核心与外部传输实现之间的契约：
//!
//! - 写出请求帧（`write`）
//! - 注册事件接收端，接收已解码的 ACK / COMPLETE 事件（`register`）
//! - 显式关闭（`close`）
//!
//! 端口发现、波特率配置以及具体的字节级封帧/校验都由外部实现提供，
//! 本 crate 只提供基于 `std::io` 的通用实现 [`StreamTransport`]（封帧可插拔）
//! 和测试用的 `MockTransport`。

use crossbeam_channel::Sender;
use stubby_protocol::{ProtocolError, ProtocolEvent};
use thiserror::Error;

pub mod stream;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use stream::{FrameCodec, StreamTransport};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockBehavior, MockTransport};

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Transport closed")]
    Closed,
    #[error("Event sink already registered")]
    AlreadyRegistered,
    #[error("Codec error: {0}")]
    Codec(String),
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// 事件接收端（注册点）
///
/// 由协议层创建并通过 [`Transport::register`] 交给传输层。
/// 传输层的读线程解码出事件后调用 [`EventSink::deliver`]。
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: Sender<ProtocolEvent>,
}

impl EventSink {
    pub fn new(sender: Sender<ProtocolEvent>) -> Self {
        Self { sender }
    }

    /// 投递事件
    ///
    /// 返回 `false` 表示协议层已经不存在（接收端已释放）。
    pub fn deliver(&self, event: ProtocolEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    /// 解码去封帧后的字节并投递
    pub fn deliver_frame(&self, frame: &[u8]) -> Result<bool, ProtocolError> {
        let event = ProtocolEvent::decode(frame)?;
        Ok(self.deliver(event))
    }
}

/// 传输层契约
///
/// 实现必须是线程安全的：`write` 在调用者线程上执行，
/// 事件由实现自己的读线程投递。
pub trait Transport: Send + Sync {
    /// 写出一个请求帧（`[code, payload...]`，封帧由实现负责）
    fn write(&self, frame: &[u8]) -> Result<(), TransportError>;

    /// 注册事件接收端
    fn register(&self, sink: EventSink) -> Result<(), TransportError>;

    /// 关闭传输（释放底层端口）
    fn close(&self) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn write(&self, frame: &[u8]) -> Result<(), TransportError> {
        (**self).write(frame)
    }

    fn register(&self, sink: EventSink) -> Result<(), TransportError> {
        (**self).register(sink)
    }

    fn close(&self) -> Result<(), TransportError> {
        (**self).close()
    }
}
