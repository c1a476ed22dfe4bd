//! 连接端点模块
//!
//! 两种角色（主动打开方 / 被动打开方）的连接状态机。端点只通过
//! [`crate::net::NetApi`] 发送报文段，不直接依赖网络实现。

pub mod config;
mod initiator;
mod responder;
mod state;

pub use config::{AckPolicy, EndpointConfig, PassiveClose};
pub use initiator::Initiator;
pub use responder::Responder;
pub use state::{InitiatorState, ResponderState, Role};
