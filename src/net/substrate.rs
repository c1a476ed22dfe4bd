//! 仿真网络
//!
//! 维护两张端口表（initiator / responder 各自独立命名空间）和一个 FIFO 投递队列。
//! 投递是一个显式循环：处理某条记录期间端点发出的新报文只会追加到队尾，
//! 不会嵌套投递，因此顺序始终与入队顺序一致。

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use super::api::NetApi;
use super::record::DeliveryRecord;
use super::stats::Stats;
use crate::error::{Error, Result};
use crate::proto::{Initiator, Responder, Role};
use crate::trace::{DropReason, TraceLog};
use crate::wire::{self, Bits, Port};

/// 投递时机
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// 只入队，由调用方 `deliver_next` / `drain_all` 驱动
    #[default]
    Deferred,
    /// 顶层 `transmit` 返回前把队列投递到空
    Immediate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubstrateConfig {
    pub dispatch: DispatchMode,
}

/// 单条记录的投递结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered { role: Role },
    Dropped(Error),
}

#[derive(Debug, Default)]
pub struct Substrate {
    cfg: SubstrateConfig,
    initiators: HashMap<Port, Initiator>,
    responders: HashMap<Port, Responder>,
    queue: VecDeque<DeliveryRecord>,
    next_record_id: u64,
    /// 正在投递或正在执行端点操作；此时 `transmit` 只入队
    busy: bool,
    pub stats: Stats,
    pub trace: Option<TraceLog>,
}

impl Substrate {
    pub fn new(cfg: SubstrateConfig) -> Self {
        Self {
            cfg,
            ..Self::default()
        }
    }

    /// 注册 initiator；同一端口重复注册时后者覆盖前者
    pub fn register_initiator(&mut self, port: Port, endpoint: Initiator) {
        if self.initiators.insert(port, endpoint).is_some() {
            debug!(port, "覆盖已注册的 initiator");
        }
    }

    /// 注册 responder；同一端口重复注册时后者覆盖前者
    pub fn register_responder(&mut self, port: Port, endpoint: Responder) {
        if self.responders.insert(port, endpoint).is_some() {
            debug!(port, "覆盖已注册的 responder");
        }
    }

    pub fn initiator(&self, port: Port) -> Option<&Initiator> {
        self.initiators.get(&port)
    }

    pub fn responder(&self, port: Port) -> Option<&Responder> {
        self.responders.get(&port)
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// 对某个 initiator 执行本地操作（open / send_data / close ...）
    ///
    /// 端点在操作期间被暂时取出，操作发出的报文先入队，放回端点后再按
    /// [`DispatchMode`] 决定是否投递。
    pub fn with_initiator<F, R>(&mut self, port: Port, f: F) -> Result<R>
    where
        F: FnOnce(&mut Initiator, &mut dyn NetApi) -> Result<R>,
    {
        let mut endpoint = self
            .initiators
            .remove(&port)
            .ok_or(Error::UnknownDestination { port })?;
        let was_busy = std::mem::replace(&mut self.busy, true);
        let result = f(&mut endpoint, self);
        self.initiators.insert(port, endpoint);
        self.busy = was_busy;
        self.auto_dispatch();
        result
    }

    /// 对某个 responder 执行本地操作
    pub fn with_responder<F, R>(&mut self, port: Port, f: F) -> Result<R>
    where
        F: FnOnce(&mut Responder, &mut dyn NetApi) -> Result<R>,
    {
        let mut endpoint = self
            .responders
            .remove(&port)
            .ok_or(Error::UnknownDestination { port })?;
        let was_busy = std::mem::replace(&mut self.busy, true);
        let result = f(&mut endpoint, self);
        self.responders.insert(port, endpoint);
        self.busy = was_busy;
        self.auto_dispatch();
        result
    }

    fn auto_dispatch(&mut self) {
        if self.cfg.dispatch == DispatchMode::Immediate && !self.busy {
            let n = self.drain_all();
            trace!(delivered = n, "立即投递完成");
        }
    }

    /// 投递队首的一条记录；队列为空时返回 `None`
    ///
    /// 找不到目的端口或报文畸形时记录日志并丢弃，错误不会传回发送方。
    #[tracing::instrument(skip(self), fields(queue_len = self.queue.len()))]
    pub fn deliver_next(&mut self) -> Option<Delivery> {
        let rec = self.queue.pop_front()?;
        let was_busy = std::mem::replace(&mut self.busy, true);
        let outcome = self.dispatch(rec);
        self.busy = was_busy;
        Some(outcome)
    }

    /// 重复投递直到队列为空，返回处理的记录数
    pub fn drain_all(&mut self) -> usize {
        let mut n = 0;
        while self.deliver_next().is_some() {
            n += 1;
        }
        n
    }

    fn dispatch(&mut self, rec: DeliveryRecord) -> Delivery {
        let segment = if self.trace.is_some() {
            wire::decode(&rec.bits).ok()
        } else {
            None
        };

        // 先查 responder 表，再查 initiator 表
        if let Some(mut endpoint) = self.responders.remove(&rec.dst) {
            info!(record_id = rec.id, src = rec.src, dst = rec.dst, "📨 投递给 responder");
            let initiator = self.initiators.contains_key(&rec.src).then_some(rec.src);
            let before = endpoint.state().to_string();
            let result = endpoint.on_receive(&rec.bits, initiator, self);
            let after = endpoint.state().to_string();
            self.responders.insert(rec.dst, endpoint);
            return self.finish(&rec, Role::Responder, before, after, segment, result);
        }

        if let Some(mut endpoint) = self.initiators.remove(&rec.dst) {
            info!(record_id = rec.id, src = rec.src, dst = rec.dst, "📨 投递给 initiator");
            let before = endpoint.state().to_string();
            let result = endpoint.on_receive(&rec.bits, self);
            let after = endpoint.state().to_string();
            self.initiators.insert(rec.dst, endpoint);
            return self.finish(&rec, Role::Initiator, before, after, segment, result);
        }

        warn!(record_id = rec.id, src = rec.src, dst = rec.dst, "没有端点注册在目的端口，丢弃");
        self.stats.dropped_unknown += 1;
        self.trace_drop(&rec, DropReason::UnknownDestination);
        Delivery::Dropped(Error::UnknownDestination { port: rec.dst })
    }

    fn finish(
        &mut self,
        rec: &DeliveryRecord,
        role: Role,
        state_before: String,
        state_after: String,
        segment: Option<wire::Segment>,
        result: Result<()>,
    ) -> Delivery {
        match result {
            Ok(()) => {
                self.stats.delivered += 1;
                debug!(%role, from = %state_before, to = %state_after, "投递完成");
                self.trace_deliver(rec, role, state_before, state_after, segment);
                Delivery::Delivered { role }
            }
            Err(err @ Error::MalformedSegment { .. }) => {
                warn!(record_id = rec.id, error = %err, "畸形报文，丢弃");
                self.stats.dropped_malformed += 1;
                self.trace_drop(rec, DropReason::MalformedSegment);
                Delivery::Dropped(err)
            }
            Err(err) => {
                warn!(record_id = rec.id, %role, error = %err, "端点处理报文失败");
                self.stats.endpoint_errors += 1;
                self.trace_drop(rec, DropReason::EndpointError);
                Delivery::Dropped(err)
            }
        }
    }
}

impl NetApi for Substrate {
    #[tracing::instrument(skip(self, bits), fields(bits = bits.len()))]
    fn transmit(&mut self, bits: Bits, src: Port, dst: Port) {
        let id = self.next_record_id;
        self.next_record_id = self.next_record_id.wrapping_add(1);
        let rec = DeliveryRecord { id, bits, src, dst };
        self.trace_enqueue(&rec, self.queue.len() + 1);
        self.queue.push_back(rec);
        self.stats.enqueued += 1;
        debug!(record_id = id, queue_len = self.queue.len(), "报文已入队");

        self.auto_dispatch();
    }
}
