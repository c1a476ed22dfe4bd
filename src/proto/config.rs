//! 端点配置

use serde::{Deserialize, Serialize};

/// 主动打开方的初始序列号
pub const INITIATOR_ISN: u32 = 1000;
/// 被动打开方的初始序列号
pub const RESPONDER_ISN: u32 = 5000;

/// 收到数据段后的确认策略（两种角色统一适用）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckPolicy {
    /// 收到 PSH 段后立即回复 ACK
    #[default]
    Immediate,
    /// 只记下欠一个 ACK，由调用方 `acknowledge()` 时发送
    Manual,
}

/// 被动关闭后本端 FIN 的发送时机（仅 responder 使用）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassiveClose {
    /// 回复对端 FIN 的 ACK 之后立即发送自己的 FIN
    #[default]
    Immediate,
    /// 等到下一个没有其他规则匹配的入站段，或调用 `close()` 时再发送
    Deferred,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// 初始序列号
    pub initial_seq: u32,
    /// 通告窗口（原样携带，不参与流控）
    pub window: u16,
    pub ack_policy: AckPolicy,
    pub passive_close: PassiveClose,
}

impl EndpointConfig {
    pub fn initiator() -> Self {
        Self {
            initial_seq: INITIATOR_ISN,
            ..Self::default()
        }
    }

    pub fn responder() -> Self {
        Self {
            initial_seq: RESPONDER_ISN,
            ..Self::default()
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            initial_seq: 0,
            window: 0,
            ack_policy: AckPolicy::Immediate,
            passive_close: PassiveClose::Immediate,
        }
    }
}
