use crate::demo::{ScenarioOpts, run_scenario};
use crate::net::Substrate;
use crate::proto::Role;
use crate::trace::{TraceEventKind, TraceLog};

#[test]
fn trace_records_enqueue_and_delivery_of_every_record() {
    let mut net = Substrate::default();
    net.trace = Some(TraceLog::default());
    run_scenario(&mut net, &ScenarioOpts::default()).expect("scenario");

    let events = &net.trace.as_ref().expect("trace enabled").events;
    assert_eq!(events.len(), 18);
    assert!(matches!(events[0].kind, TraceEventKind::Enqueue { bits: 160, queue_len: 1 }));
    for (i, ev) in events.iter().enumerate() {
        assert_eq!(ev.step, i as u64);
    }

    let first_delivery = events
        .iter()
        .find(|ev| matches!(ev.kind, TraceEventKind::Deliver { .. }))
        .expect("deliver event");
    assert_eq!(first_delivery.record_id, 0);
    match &first_delivery.kind {
        TraceEventKind::Deliver {
            role,
            state_before,
            state_after,
            segment,
        } => {
            assert_eq!(*role, Role::Responder);
            assert_eq!(state_before, "LISTENING");
            assert_eq!(state_after, "SYN-RECEIVED");
            let seg = segment.as_ref().expect("decoded segment");
            assert!(seg.flags.syn && !seg.flags.ack);
            assert_eq!(seg.seq, 1000);
        }
        _ => unreachable!(),
    }
}

#[test]
fn trace_serializes_as_tagged_json() {
    let mut net = Substrate::default();
    net.trace = Some(TraceLog::default());
    run_scenario(&mut net, &ScenarioOpts::default()).expect("scenario");

    let raw = net.trace.as_ref().expect("trace").to_json().expect("json");
    let v: serde_json::Value = serde_json::from_str(&raw).expect("parse json");
    let arr = v.as_array().expect("array");
    assert_eq!(arr[0]["kind"], "enqueue");
    assert_eq!(arr[0]["src"], 12345);
    assert_eq!(arr[0]["dst"], 80);

    let data = arr
        .iter()
        .find(|ev| ev["kind"] == "deliver" && ev["segment"]["flags"]["psh"] == true)
        .expect("data delivery");
    assert_eq!(data["role"], "responder");
    assert_eq!(data["state_after"], "DATA-RECEIVED");
    assert_eq!(data["segment"]["payload"].as_array().map(Vec::len), Some(13));
}

#[test]
fn trace_disabled_by_default() {
    let mut net = Substrate::default();
    run_scenario(&mut net, &ScenarioOpts::default()).expect("scenario");
    assert!(net.trace.is_none());
}
