//! 投递记录
//!
//! 队列中等待投递的一条报文：编码后的 bit 序列与收发端口。

use crate::wire::{Bits, Port};

#[derive(Debug, Clone)]
pub struct DeliveryRecord {
    pub id: u64,
    pub bits: Bits,
    pub src: Port,
    pub dst: Port,
}
