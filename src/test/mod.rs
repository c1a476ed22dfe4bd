mod responder;
mod trace;

use crate::net::NetApi;
use crate::wire::{self, Bits, Port, Segment};

/// 只记录发送内容、不做投递的网络，用于单端点状态机测试
#[derive(Debug, Default)]
pub(crate) struct RecordingNet {
    pub sent: Vec<(Bits, Port, Port)>,
}

impl RecordingNet {
    pub fn segments(&self) -> Vec<Segment> {
        self.sent
            .iter()
            .map(|(bits, _, _)| wire::decode(bits).expect("recorded bits decode"))
            .collect()
    }
}

impl NetApi for RecordingNet {
    fn transmit(&mut self, bits: Bits, src: Port, dst: Port) {
        self.sent.push((bits, src, dst));
    }
}
