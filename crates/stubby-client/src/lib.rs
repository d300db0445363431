//! # Stubby Client
//!
//! 面向用户的指令 API：平移、旋转、上电/断电、调试开关。
//!
//! 每条指令都是阻塞调用，返回 `bool` 表示设备是否确认（运动指令还要求完成）。
//! 更细的失败原因可以通过 [`Stubby::protocol`] 直接调用协议引擎获取。
//!
//! ```
//! use stubby_client::Stubby;
//! use stubby_transport::MockTransport;
//!
//! let stubby = Stubby::builder().transport(MockTransport::default()).build().unwrap();
//! assert!(stubby.move_by(45, 0, 200, 0, 300));
//! assert!(stubby.turn_around());
//! ```

pub mod builder;
pub mod command;
pub mod stubby;

pub use builder::StubbyBuilder;
pub use command::{FULL_SPEED, MoveCommand, TurnCommand};
pub use stubby::Stubby;
