//! 投递轨迹记录（结构化 JSON）
//!
//! 设计目标：
//! - **结构化**：记录每条报文的入队、投递与丢弃，而不是解析文本日志
//! - **轻量**：只存内存，演示结束时一次性写出

mod types;

pub use types::{DropReason, TraceEvent, TraceEventKind, TraceLog};
