//! 报文段编解码
//!
//! 线上布局（高位在前，共 160 bit 首部）：
//!
//! ```text
//! | src 16 | dst 16 | seq 32 | ack 32 | off 4 | rsv 3 | flags 9 | win 16 | chk 16 | urg 16 | payload 8*N |
//! ```
//!
//! flags 字段前 6 bit 依次为 URG, ACK, PSH, RST, SYN, FIN，后 3 bit 为填充，解码时忽略。

use tracing::trace;

use super::bits::Bits;
use super::segment::{Segment, TcpFlags};
use crate::error::{Error, Result};

/// 固定首部长度（bit）
pub const HEADER_BITS: usize = 160;

const OFF_SRC: usize = 0;
const OFF_DST: usize = 16;
const OFF_SEQ: usize = 32;
const OFF_ACK: usize = 64;
const OFF_DATA_OFFSET: usize = 96;
const OFF_RESERVED: usize = 100;
const OFF_FLAGS: usize = 103;
const OFF_WINDOW: usize = 112;
const OFF_CHECKSUM: usize = 128;
const OFF_URGENT: usize = 144;

const FLAG_FIELD_BITS: u32 = 9;
const FLAG_PAD_BITS: u32 = FLAG_FIELD_BITS - 6;

/// 把报文段序列化为 bit 序列（全函数，不会失败）
pub fn encode(seg: &Segment) -> Bits {
    let mut bits = Bits::with_capacity(HEADER_BITS + seg.payload.len() * 8);
    bits.push_uint(u64::from(seg.src_port), 16);
    bits.push_uint(u64::from(seg.dst_port), 16);
    bits.push_uint(u64::from(seg.seq), 32);
    bits.push_uint(u64::from(seg.ack), 32);
    bits.push_uint(u64::from(seg.data_offset), 4);
    bits.push_uint(u64::from(seg.reserved), 3);
    for flag in seg.flags.to_array() {
        bits.push(flag);
    }
    bits.push_uint(0, FLAG_PAD_BITS);
    bits.push_uint(u64::from(seg.window), 16);
    bits.push_uint(u64::from(seg.checksum), 16);
    bits.push_uint(u64::from(seg.urgent_ptr), 16);
    debug_assert_eq!(bits.len(), HEADER_BITS);

    for &byte in &seg.payload {
        bits.push_uint(u64::from(byte), 8);
    }
    trace!(len = bits.len(), payload_bytes = seg.payload.len(), "编码报文段");
    bits
}

/// 从 bit 序列重建报文段
///
/// 输入不足 160 bit 时返回 [`Error::MalformedSegment`]。载荷按 8 bit 分组，
/// 末尾不足 8 bit 的分组被丢弃。
pub fn decode(bits: &Bits) -> Result<Segment> {
    if bits.len() < HEADER_BITS {
        return Err(Error::MalformedSegment { len: bits.len() });
    }

    let mut flags = [false; 6];
    for (i, f) in flags.iter_mut().enumerate() {
        *f = bits.get(OFF_FLAGS + i).unwrap_or(false);
    }

    let payload_bits = bits.len() - HEADER_BITS;
    let payload = (0..payload_bits / 8)
        .map(|i| bits.uint_at(HEADER_BITS + i * 8, 8) as u8)
        .collect::<Vec<_>>();
    if payload_bits % 8 != 0 {
        trace!(dropped_bits = payload_bits % 8, "丢弃末尾不完整的载荷 bit");
    }

    Ok(Segment {
        src_port: bits.uint_at(OFF_SRC, 16) as u16,
        dst_port: bits.uint_at(OFF_DST, 16) as u16,
        seq: bits.uint_at(OFF_SEQ, 32) as u32,
        ack: bits.uint_at(OFF_ACK, 32) as u32,
        data_offset: bits.uint_at(OFF_DATA_OFFSET, 4) as u8,
        reserved: bits.uint_at(OFF_RESERVED, 3) as u8,
        flags: TcpFlags::from_array(flags),
        window: bits.uint_at(OFF_WINDOW, 16) as u16,
        checksum: bits.uint_at(OFF_CHECKSUM, 16) as u16,
        urgent_ptr: bits.uint_at(OFF_URGENT, 16) as u16,
        payload,
    })
}
