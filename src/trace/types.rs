use serde::{Deserialize, Serialize};

use crate::proto::Role;
use crate::wire::{Port, Segment};

/// 轨迹事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEventKind {
    /// 报文进入投递队列尾部
    Enqueue { bits: usize, queue_len: usize },
    /// 报文交给目的端点处理
    Deliver {
        role: Role,
        state_before: String,
        state_after: String,
        /// 解码后的报文段（畸形报文为空）
        #[serde(skip_serializing_if = "Option::is_none")]
        segment: Option<Segment>,
    },
    /// 报文被丢弃
    Drop { reason: DropReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    UnknownDestination,
    MalformedSegment,
    EndpointError,
}

/// 一条轨迹事件（JSON）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    /// 事件序号（从 0 开始）
    pub step: u64,
    pub record_id: u64,
    pub src: Port,
    pub dst: Port,
    #[serde(flatten)]
    pub kind: TraceEventKind,
}

/// 一个简单的事件收集器
#[derive(Debug, Default)]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn push(&mut self, ev: TraceEvent) {
        self.events.push(ev);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }
}
