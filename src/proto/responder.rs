//! 被动打开方（server）
//!
//! 在 LISTENING 状态等待 SYN，收到对端 FIN 后进入 CLOSE-WAIT 并欠下一个 FIN；
//! 这个 FIN 只发送一次，发送后进入 LAST-ACK，等待确认号等于 FIN 之后序号的 ACK
//! 进入终态 CLOSED。

use tracing::{debug, info};

use super::config::{AckPolicy, EndpointConfig, PassiveClose};
use super::state::ResponderState;
use crate::error::{Error, Result};
use crate::net::NetApi;
use crate::wire::{self, Bits, Port, Segment, TcpFlags};

#[derive(Debug, Clone)]
pub struct Responder {
    port: Port,
    cfg: EndpointConfig,
    seq: u32,
    ack: u32,
    peer_acked: u32,
    state: ResponderState,
    peer: Option<Port>,
    /// 已收到对端 FIN、本端 FIN 尚未发出
    fin_owed: bool,
    ack_owed: Option<Port>,
}

impl Responder {
    pub fn new(port: Port) -> Self {
        Self::with_config(port, EndpointConfig::responder())
    }

    pub fn with_config(port: Port, cfg: EndpointConfig) -> Self {
        Self {
            port,
            seq: cfg.initial_seq,
            ack: 0,
            peer_acked: 0,
            state: ResponderState::Listening,
            peer: None,
            fin_owed: false,
            ack_owed: None,
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

    pub fn state(&self) -> ResponderState {
        self.state
    }

    pub fn peer(&self) -> Option<Port> {
        self.peer
    }

    pub fn is_terminal(&self) -> bool {
        self.state == ResponderState::Closed
    }

    pub fn fin_owed(&self) -> bool {
        self.fin_owed
    }

    pub fn has_ack_owed(&self) -> bool {
        self.ack_owed.is_some()
    }

    pub fn summary(&self) -> String {
        format!(
            "responder :{} state={} seq={} ack={}",
            self.port, self.state, self.seq, self.ack
        )
    }

    fn set_state(&mut self, next: ResponderState) {
        if next != self.state {
            info!(port = self.port, from = %self.state, to = %next, "responder 状态变化");
            self.state = next;
        }
    }

    fn segment(&self, dst: Port, flags: TcpFlags) -> Segment {
        self.segment_acking(dst, self.ack, flags)
    }

    /// 以尚未提交的确认号构造回复；发送成功后再写回 `self.ack`
    fn segment_acking(&self, dst: Port, ack: u32, flags: TcpFlags) -> Segment {
        Segment::new(self.port, dst, self.seq, ack, flags).with_window(self.cfg.window)
    }

    /// 确认号只前进不后退
    fn note_peer_ack(&mut self, ack: u32) {
        self.peer_acked = self.peer_acked.max(ack);
    }

    /// 本端主动关闭：发出欠下的 FIN。只有在被动关闭之后（CLOSE-WAIT 且 FIN 未发）可用。
    pub fn close(&mut self, net: &mut dyn NetApi) -> Result<()> {
        if !self.fin_owed {
            return Err(Error::InvalidTransition {
                op: "close",
                state: self.state.to_string(),
            });
        }
        self.send_fin(net)
    }

    pub fn acknowledge(&mut self, net: &mut dyn NetApi) -> Result<bool> {
        let Some(dst) = self.ack_owed else {
            return Ok(false);
        };
        net.send_segment(&self.segment(dst, TcpFlags::ACK))?;
        self.ack_owed = None;
        Ok(true)
    }

    /// 解码并处理一个到达的报文段
    ///
    /// `initiator` 是网络层已知的发起方端口（若发起方已注册）。
    pub fn on_receive(
        &mut self,
        bits: &Bits,
        initiator: Option<Port>,
        net: &mut dyn NetApi,
    ) -> Result<()> {
        let seg = wire::decode(bits)?;
        if self.peer.is_none() {
            self.peer = initiator;
        }
        self.on_segment(&seg, net)
    }

    #[tracing::instrument(skip_all, fields(port = self.port, state = %self.state, seq = seg.seq, flags = ?seg.flags.names()))]
    pub fn on_segment(&mut self, seg: &Segment, net: &mut dyn NetApi) -> Result<()> {
        if self.is_terminal() {
            debug!("终态，忽略入站段");
            return Ok(());
        }
        debug!(segment = %seg, "responder 收到报文段");

        let f = seg.flags;
        let reply_to = seg.src_port;

        if self.state == ResponderState::Listening && f.syn {
            let ack = seg.seq.wrapping_add(1);
            net.send_segment(&self.segment_acking(reply_to, ack, TcpFlags::SYN_ACK))?;
            self.ack = ack;
            self.peer = Some(reply_to);
            self.set_state(ResponderState::SynReceived);
        } else if self.state == ResponderState::SynReceived && f.ack {
            self.set_state(ResponderState::Established);
        } else if self.state.is_established() && f.psh {
            let ack = seg.seq.wrapping_add(seg.payload_len());
            info!(len = seg.payload.len(), data = %String::from_utf8_lossy(&seg.payload), "responder 收到数据");
            self.ack_data(reply_to, ack, net)?;
            self.ack = ack;
            self.set_state(ResponderState::DataReceived);
        } else if self.state.is_established() && f.fin {
            let ack = seg.seq.wrapping_add(1);
            net.send_segment(&self.segment_acking(reply_to, ack, TcpFlags::ACK))?;
            self.ack = ack;
            self.set_state(ResponderState::CloseWait);
            self.fin_owed = true;
            if self.cfg.passive_close == PassiveClose::Immediate {
                self.send_fin(net)?;
            }
        } else if self.fin_owed {
            self.send_fin(net)?;
        } else if self.state == ResponderState::LastAck && f.ack && seg.ack == self.seq {
            self.set_state(ResponderState::Closed);
        } else {
            debug!("没有匹配的处理规则");
        }

        if f.ack && !f.syn {
            self.note_peer_ack(seg.ack);
        }
        Ok(())
    }

    fn send_fin(&mut self, net: &mut dyn NetApi) -> Result<()> {
        let Some(dst) = self.peer else {
            return Err(Error::UnaddressedSegment);
        };
        net.send_segment(&self.segment(dst, TcpFlags::FIN_ACK))?;
        self.seq = self.seq.wrapping_add(1);
        self.fin_owed = false;
        self.set_state(ResponderState::LastAck);
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
