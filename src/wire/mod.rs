//! 线上格式模块
//!
//! 报文段结构、bit 序列以及两者之间的编解码。纯数据变换，不涉及投递。

mod bits;
mod codec;
mod segment;

pub use bits::Bits;
pub use codec::{HEADER_BITS, decode, encode};
pub use segment::{DEFAULT_DATA_OFFSET, Port, Segment, TcpFlags};
