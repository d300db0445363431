//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use stubby_sdk::prelude::*;
//! ```

// 客户端层（推荐使用）
pub use crate::client::{MoveCommand, Stubby, StubbyBuilder, TurnCommand};

// 驱动层
pub use crate::driver::{Protocol, ProtocolConfig};

// 传输层（实现自定义串口时需要）
pub use crate::transport::{FrameCodec, StreamTransport, Transport};

// 角度字段编码
pub use crate::protocol::{AngleCodec, FixedQ16BigEndian, Float32BigEndian};

// 错误类型
pub use crate::driver::DriverError;
pub use crate::protocol::ProtocolError;
pub use crate::transport::TransportError;
