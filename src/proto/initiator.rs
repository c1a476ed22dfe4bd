//! 主动打开方（client）
//!
//! 负责发起握手、发送数据和主动关闭。入站段按以下优先级处理：
//! 1. SYN+ACK 且握手未完成：记录对端 seq+1，回 ACK，进入 ESTABLISHED
//! 2. ACK 且处于 SYN-ACK-RECEIVED：进入 ESTABLISHED
//! 3. PSH：记录 seq+载荷长度，进入 DATA-RECEIVED，按 [`AckPolicy`] 确认
//! 4. ACK 且处于 FIN-WAIT-1：进入 FIN-WAIT-2
//! 5. 其余 ACK：只更新确认记录
//!
//! FIN 的处理独立于上面的优先级链：任何状态收到 FIN 都记录 seq+1、回 ACK 并进入
//! TIME-WAIT，因此 FIN-WAIT-1 收到 FIN+ACK 时会连续经过 FIN-WAIT-2 到 TIME-WAIT。

use tracing::{debug, info, warn};

use super::config::{AckPolicy, EndpointConfig};
use super::state::InitiatorState;
use crate::error::{Error, Result};
use crate::net::NetApi;
use crate::wire::{self, Bits, Port, Segment, TcpFlags};

#[derive(Debug, Clone)]
pub struct Initiator {
    port: Port,
    cfg: EndpointConfig,
    /// 下一个要发送的字节序号
    seq: u32,
    /// 期望对端的下一个序号
    ack: u32,
    /// 对端最近确认到的序号
    peer_acked: u32,
    state: InitiatorState,
    peer: Option<Port>,
    /// `AckPolicy::Manual` 下欠下的 ACK（目的端口）
    ack_owed: Option<Port>,
    /// 已走完 TIME-WAIT；终态不再响应任何段
    terminated: bool,
}

impl Initiator {
    pub fn new(port: Port) -> Self {
        Self::with_config(port, EndpointConfig::initiator())
    }

    pub fn with_config(port: Port, cfg: EndpointConfig) -> Self {
        Self {
            port,
            seq: cfg.initial_seq,
            ack: 0,
            peer_acked: 0,
            state: InitiatorState::Closed,
            peer: None,
            ack_owed: None,
            terminated: false,
            cfg,
        }
    }

    pub fn port(&self) -> Port {
        self.port
    }

    pub fn seq(&self) -> u32 {
        self.seq
    }

    pub fn ack(&self) -> u32 {
        self.ack
    }

    pub fn peer_acked(&self) -> u32 {
        self.peer_acked
    }

    pub fn state(&self) -> InitiatorState {
        self.state
    }

    pub fn peer(&self) -> Option<Port> {
        self.peer
    }

    pub fn is_terminal(&self) -> bool {
        self.terminated
    }

    pub fn has_ack_owed(&self) -> bool {
        self.ack_owed.is_some()
    }

    /// 状态摘要，供演示输出
    pub fn summary(&self) -> String {
        format!(
            "initiator :{} state={} seq={} ack={}",
            self.port, self.state, self.seq, self.ack
        )
    }

    fn set_state(&mut self, next: InitiatorState) {
        if next != self.state {
            info!(port = self.port, from = %self.state, to = %next, "initiator 状态变化");
            self.state = next;
        }
    }

    fn segment(&self, dst: Port, flags: TcpFlags) -> Segment {
        self.segment_acking(dst, self.ack, flags)
    }

    fn segment_acking(&self, dst: Port, ack: u32, flags: TcpFlags) -> Segment {
        Segment::new(self.port, dst, self.seq, ack, flags).with_window(self.cfg.window)
    }

    fn note_peer_ack(&mut self, ack: u32) {
        self.peer_acked = self.peer_acked.max(ack);
    }

    /// 发送 SYN 发起握手；只能在初始 CLOSED 状态调用
    pub fn open(&mut self, dst: Port, net: &mut dyn NetApi) -> Result<()> {
        if self.state != InitiatorState::Closed || self.terminated {
            return Err(Error::InvalidTransition {
                op: "open",
                state: self.state.to_string(),
            });
        }
        net.send_segment(&self.segment(dst, TcpFlags::SYN))?;
        self.peer = Some(dst);
        self.set_state(InitiatorState::SynSent);
        Ok(())
    }

    /// 发送一个 PSH+ACK 数据段，成功后序号前进载荷长度
    pub fn send_data(&mut self, payload: &[u8], dst: Port, net: &mut dyn NetApi) -> Result<()> {
        if !self.state.is_established() {
            return Err(Error::NotEstablished {
                state: self.state.to_string(),
            });
        }
        let seg = self.segment(dst, TcpFlags::PSH_ACK).with_payload(payload);
        net.send_segment(&seg)?;
        self.seq = self.seq.wrapping_add(seg.payload_len());
        debug!(port = self.port, seq = self.seq, len = payload.len(), "数据已发送");
        Ok(())
    }

    /// 发送 FIN+ACK 主动关闭，进入 FIN-WAIT-1
    pub fn close(&mut self, dst: Port, net: &mut dyn NetApi) -> Result<()> {
        if !self.state.is_established() {
            return Err(Error::InvalidTransition {
                op: "close",
                state: self.state.to_string(),
            });
        }
        net.send_segment(&self.segment(dst, TcpFlags::FIN_ACK))?;
        self.set_state(InitiatorState::FinWait1);
        Ok(())
    }

    /// 发送欠下的 ACK（`AckPolicy::Manual`）；没有欠 ACK 时返回 `false`
    pub fn acknowledge(&mut self, net: &mut dyn NetApi) -> Result<bool> {
        let Some(dst) = self.ack_owed else {
            return Ok(false);
        };
        net.send_segment(&self.segment(dst, TcpFlags::ACK))?;
        self.ack_owed = None;
        Ok(true)
    }

    /// TIME-WAIT 结束（模型中没有时钟，由调用方决定何时视为 2MSL 已过）
    pub fn expire_time_wait(&mut self) -> Result<()> {
        if self.state != InitiatorState::TimeWait {
            return Err(Error::InvalidTransition {
                op: "expire TIME-WAIT",
                state: self.state.to_string(),
            });
        }
        self.set_state(InitiatorState::Closed);
        self.terminated = true;
        Ok(())
    }

    /// 解码并处理一个到达的报文段
    pub fn on_receive(&mut self, bits: &Bits, net: &mut dyn NetApi) -> Result<()> {
        let seg = wire::decode(bits)?;
        self.on_segment(&seg, net)
    }

    #[tracing::instrument(skip_all, fields(port = self.port, state = %self.state, seq = seg.seq, flags = ?seg.flags.names()))]
    pub fn on_segment(&mut self, seg: &Segment, net: &mut dyn NetApi) -> Result<()> {
        if self.terminated {
            debug!("终态，忽略入站段");
            return Ok(());
        }
        debug!(segment = %seg, "initiator 收到报文段");

        let f = seg.flags;
        let reply_to = seg.src_port;

        if f.syn && f.ack && self.state.is_pre_established() {
            // 回复发出之后才提交握手状态，发送失败时端点保持原样
            let ack = seg.seq.wrapping_add(1);
            net.send_segment(&self.segment_acking(reply_to, ack, TcpFlags::ACK))?;
            self.set_state(InitiatorState::SynAckReceived);
            self.ack = ack;
            self.note_peer_ack(seg.ack);
            self.peer = Some(reply_to);
            self.set_state(InitiatorState::Established);
        } else if f.ack && self.state == InitiatorState::SynAckReceived {
            self.note_peer_ack(seg.ack);
            self.set_state(InitiatorState::Established);
        } else if f.psh {
            let ack = seg.seq.wrapping_add(seg.payload_len());
            info!(len = seg.payload.len(), data = %String::from_utf8_lossy(&seg.payload), "initiator 收到数据");
            self.ack_data(reply_to, ack, net)?;
            self.ack = ack;
            self.set_state(InitiatorState::DataReceived);
        } else if f.ack && self.state == InitiatorState::FinWait1 {
            self.note_peer_ack(seg.ack);
            self.set_state(InitiatorState::FinWait2);
        } else if f.ack {
            self.note_peer_ack(seg.ack);
            debug!(peer_acked = self.peer_acked, "更新确认记录");
        }

        if f.fin {
            let ack = seg.seq.wrapping_add(1);
            net.send_segment(&self.segment_acking(reply_to, ack, TcpFlags::ACK))?;
            self.ack = ack;
            self.set_state(InitiatorState::TimeWait);
        }

        if f.rst {
            warn!("RST 不参与状态机，忽略");
        }
        Ok(())
    }

    fn ack_data(&mut self, dst: Port, ack: u32, net: &mut dyn NetApi) -> Result<()> {
        match self.cfg.ack_policy {
            AckPolicy::Immediate => net.send_segment(&self.segment_acking(dst, ack, TcpFlags::ACK)),
            AckPolicy::Manual => {
                self.ack_owed = Some(dst);
                Ok(())
            }
        }
    }
}
