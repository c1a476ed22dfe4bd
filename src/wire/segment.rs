//! 报文段类型
//!
//! 定义协议报文段（首部 + 载荷）及其控制位。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 端口号（16 bit）
pub type Port = u16;

/// 首部长度（以 32 bit 字为单位），固定为 5
pub const DEFAULT_DATA_OFFSET: u8 = 5;

/// 六个控制位
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpFlags {
    pub urg: bool,
    pub ack: bool,
    pub psh: bool,
    pub rst: bool,
    pub syn: bool,
    pub fin: bool,
}

impl TcpFlags {
    pub const SYN: Self = Self { syn: true, ..Self::NONE };
    pub const ACK: Self = Self { ack: true, ..Self::NONE };
    pub const SYN_ACK: Self = Self { syn: true, ack: true, ..Self::NONE };
    pub const PSH_ACK: Self = Self { psh: true, ack: true, ..Self::NONE };
    pub const FIN_ACK: Self = Self { fin: true, ack: true, ..Self::NONE };
    pub const NONE: Self = Self {
        urg: false,
        ack: false,
        psh: false,
        rst: false,
        syn: false,
        fin: false,
    };

    /// 线上顺序：URG, ACK, PSH, RST, SYN, FIN
    pub fn to_array(self) -> [bool; 6] {
        [self.urg, self.ack, self.psh, self.rst, self.syn, self.fin]
    }

    pub fn from_array(a: [bool; 6]) -> Self {
        Self {
            urg: a[0],
            ack: a[1],
            psh: a[2],
            rst: a[3],
            syn: a[4],
            fin: a[5],
        }
    }

    /// 置位的控制位名称（线上顺序）
    pub fn names(self) -> Vec<&'static str> {
        const NAMES: [&str; 6] = ["URG", "ACK", "PSH", "RST", "SYN", "FIN"];
        self.to_array()
            .iter()
            .zip(NAMES)
            .filter_map(|(&set, name)| set.then_some(name))
            .collect()
    }
}

/// 协议报文段。每次发送都重新构造，编码后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub src_port: Port,
    pub dst_port: Port,
    pub seq: u32,
    pub ack: u32,
    /// 4 bit
    pub data_offset: u8,
    /// 3 bit，恒为 0
    pub reserved: u8,
    pub flags: TcpFlags,
    pub window: u16,
    /// 原样携带，不计算
    pub checksum: u16,
    pub urgent_ptr: u16,
    pub payload: Vec<u8>,
}

impl Segment {
    pub fn new(src_port: Port, dst_port: Port, seq: u32, ack: u32, flags: TcpFlags) -> Self {
        Self {
            src_port,
            dst_port,
            seq,
            ack,
            data_offset: DEFAULT_DATA_OFFSET,
            reserved: 0,
            flags,
            window: 0,
            checksum: 0,
            urgent_ptr: 0,
            payload: Vec::new(),
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn with_window(mut self, window: u16) -> Self {
        self.window = window;
        self
    }

    pub fn payload_len(&self) -> u32 {
        self.payload.len() as u32
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SRC={}, DST={}, SEQ={}, ACK={}, FLAGS={}, WIN={}, CHK={}, URG_PTR={}, DATA={}",
            self.src_port,
            self.dst_port,
            self.seq,
            self.ack,
            self.flags.names().join(","),
            self.window,
            self.checksum,
            self.urgent_ptr,
            String::from_utf8_lossy(&self.payload),
        )
    }
}
