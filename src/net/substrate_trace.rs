//! Trace hooks for the substrate.

use crate::proto::Role;
use crate::trace::{DropReason, TraceEvent, TraceEventKind};
use crate::wire::Segment;

use super::record::DeliveryRecord;
use super::substrate::Substrate;

impl Substrate {
    fn trace_push(&mut self, rec: &DeliveryRecord, kind: TraceEventKind) {
        if let Some(log) = &mut self.trace {
            let step = log.events.len() as u64;
            log.push(TraceEvent {
                step,
                record_id: rec.id,
                src: rec.src,
                dst: rec.dst,
                kind,
            });
        }
    }

    pub(crate) fn trace_enqueue(&mut self, rec: &DeliveryRecord, queue_len: usize) {
        self.trace_push(
            rec,
            TraceEventKind::Enqueue {
                bits: rec.bits.len(),
                queue_len,
            },
        );
    }

    pub(crate) fn trace_deliver(
        &mut self,
        rec: &DeliveryRecord,
        role: Role,
        state_before: String,
        state_after: String,
        segment: Option<Segment>,
    ) {
        self.trace_push(
            rec,
            TraceEventKind::Deliver {
                role,
                state_before,
                state_after,
                segment,
            },
        );
    }

    pub(crate) fn trace_drop(&mut self, rec: &DeliveryRecord, reason: DropReason) {
        self.trace_push(rec, TraceEventKind::Drop { reason });
    }
}
