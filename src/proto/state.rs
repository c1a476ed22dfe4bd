//! 连接状态
//!
//! 两种角色各自的状态枚举。`Display` 输出 TCP 风格的标签（如 `SYN-SENT`）。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 端点角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// 主动打开方（client）
    Initiator,
    /// 被动打开方（server）
    Responder,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Initiator => f.write_str("initiator"),
            Role::Responder => f.write_str("responder"),
        }
    }
}

/// 主动打开方状态
///
/// ```text
/// CLOSED -> SYN-SENT -> SYN-ACK-RECEIVED -> ESTABLISHED -> FIN-WAIT-1 -> FIN-WAIT-2 -> TIME-WAIT -> CLOSED
///                                                |  ^
///                                           PSH  v  |
///                                          DATA-RECEIVED
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitiatorState {
    #[default]
    Closed,
    SynSent,
    SynAckReceived,
    Established,
    DataReceived,
    FinWait1,
    FinWait2,
    TimeWait,
}

impl InitiatorState {
    /// 握手尚未完成
    pub fn is_pre_established(self) -> bool {
        matches!(
            self,
            InitiatorState::Closed | InitiatorState::SynSent | InitiatorState::SynAckReceived
        )
    }

    /// ESTABLISHED 或与之等价的 DATA-RECEIVED
    pub fn is_established(self) -> bool {
        matches!(self, InitiatorState::Established | InitiatorState::DataReceived)
    }

    pub fn label(self) -> &'static str {
        match self {
            InitiatorState::Closed => "CLOSED",
            InitiatorState::SynSent => "SYN-SENT",
            InitiatorState::SynAckReceived => "SYN-ACK-RECEIVED",
            InitiatorState::Established => "ESTABLISHED",
            InitiatorState::DataReceived => "DATA-RECEIVED",
            InitiatorState::FinWait1 => "FIN-WAIT-1",
            InitiatorState::FinWait2 => "FIN-WAIT-2",
            InitiatorState::TimeWait => "TIME-WAIT",
        }
    }
}

impl fmt::Display for InitiatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 被动打开方状态
///
/// ```text
/// LISTENING -> SYN-RECEIVED -> ESTABLISHED -> CLOSE-WAIT -> LAST-ACK -> CLOSED
///                                   |  ^
///                              PSH  v  | (自环)
///                             DATA-RECEIVED
/// ```
///
/// `Closed` 只作为终态出现。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponderState {
    #[default]
    Listening,
    SynReceived,
    Established,
    DataReceived,
    CloseWait,
    LastAck,
    Closed,
}

impl ResponderState {
    pub fn is_established(self) -> bool {
        matches!(self, ResponderState::Established | ResponderState::DataReceived)
    }

    pub fn label(self) -> &'static str {
        match self {
            ResponderState::Listening => "LISTENING",
            ResponderState::SynReceived => "SYN-RECEIVED",
            ResponderState::Established => "ESTABLISHED",
            ResponderState::DataReceived => "DATA-RECEIVED",
            ResponderState::CloseWait => "CLOSE-WAIT",
            ResponderState::LastAck => "LAST-ACK",
            ResponderState::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for ResponderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
