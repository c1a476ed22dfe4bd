//! Network-facing API used by connection endpoints.

use tracing::debug;

use crate::error::{Error, Result};
use crate::wire::{self, Bits, Port, Segment};

/// Minimal network API for endpoints: hand encoded bits to the medium.
pub trait NetApi {
    /// Queue `bits` for delivery from `src` to `dst`. Routing failures are
    /// handled on the delivery side and never reported back to the sender.
    fn transmit(&mut self, bits: Bits, src: Port, dst: Port);

    /// Encode and transmit a segment. A zero destination port is rejected
    /// before encoding.
    fn send_segment(&mut self, seg: &Segment) -> Result<()> {
        if seg.dst_port == 0 {
            return Err(Error::UnaddressedSegment);
        }
        debug!(segment = %seg, "发送报文段");
        let bits = wire::encode(seg);
        self.transmit(bits, seg.src_port, seg.dst_port);
        Ok(())
    }
}
