//! bit 序列
//!
//! 报文在网络中以逐 bit 的形式传递（高位在前）。`Bits` 负责定宽无符号字段的
//! 写入/读取，以及与 `0`/`1` 文本、字节数组之间的转换。

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// 按顺序排列的 bit 序列，高位在前
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bits {
    bits: Vec<bool>,
}

impl Bits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            bits: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// 以 `width` 个 bit 追加 `value`（高位在前）；超出宽度的高位被截掉
    pub fn push_uint(&mut self, value: u64, width: u32) {
        debug_assert!(width <= 64);
        for i in (0..width).rev() {
            self.bits.push((value >> i) & 1 == 1);
        }
    }

    /// 读取 `[offset, offset + width)` 处的定宽无符号字段
    ///
    /// 仅供 codec 在校验过长度之后使用；越界会 panic。
    pub(crate) fn uint_at(&self, offset: usize, width: usize) -> u64 {
        self.bits[offset..offset + width]
            .iter()
            .fold(0u64, |acc, &b| (acc << 1) | u64::from(b))
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    /// 截掉末尾的 bit（用于构造畸形输入）
    pub fn truncate(&mut self, len: usize) {
        self.bits.truncate(len);
    }

    /// 打包为字节（高位在前），末尾不足 8 bit 的部分补 0
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, &b)| acc | (u8::from(b) << (7 - i)))
            })
            .collect()
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut out = Self::with_capacity(bytes.len() * 8);
        for &b in bytes {
            out.push_uint(u64::from(b), 8);
        }
        out
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.bits {
            f.write_str(if b { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for Bits {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut out = Self::with_capacity(s.len());
        for (index, c) in s.chars().enumerate() {
            match c {
                '0' => out.push(false),
                '1' => out.push(true),
                found => return Err(Error::InvalidBit { index, found }),
            }
        }
        Ok(out)
    }
}
