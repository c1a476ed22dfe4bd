//! 错误类型
//!
//! 编解码、连接状态机与网络投递共用的错误定义。

use crate::wire::Port;

/// crate 内统一的 `Result` 别名
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// 解码输入不足 160 bit 的固定首部
    #[error("malformed segment: {len} bits, header needs 160")]
    MalformedSegment { len: usize },

    /// 文本形式的 bit 串里出现了非 `0`/`1` 字符
    #[error("invalid bit {found:?} at index {index}")]
    InvalidBit { index: usize, found: char },

    /// 连接尚未建立时发送数据（不修改任何状态）
    #[error("connection not established (state {state})")]
    NotEstablished { state: String },

    /// 目的端口为 0，编码前即被拒绝
    #[error("segment has no destination port")]
    UnaddressedSegment,

    /// 网络找不到目的端口的所有者；只在投递侧记录，不回传给发送方
    #[error("no endpoint registered on port {port}")]
    UnknownDestination { port: Port },

    /// 在不允许的状态下调用 open/close 等操作
    #[error("cannot {op} in state {state}")]
    InvalidTransition { op: &'static str, state: String },
}
