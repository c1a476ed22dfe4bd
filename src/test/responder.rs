use super::RecordingNet;
use crate::error::Error;
use crate::proto::{EndpointConfig, PassiveClose, Responder, ResponderState};
use crate::wire::{self, Segment, TcpFlags};

const CLIENT: u16 = 12345;
const SERVER: u16 = 80;

fn deferred_close() -> EndpointConfig {
    EndpointConfig {
        passive_close: PassiveClose::Deferred,
        ..EndpointConfig::responder()
    }
}

fn established(cfg: EndpointConfig) -> (Responder, RecordingNet) {
    let mut net = RecordingNet::default();
    let mut s = Responder::with_config(SERVER, cfg);
    s.on_segment(&Segment::new(CLIENT, SERVER, 1000, 0, TcpFlags::SYN), &mut net)
        .expect("syn");
    s.on_segment(&Segment::new(CLIENT, SERVER, 1000, 5001, TcpFlags::ACK), &mut net)
        .expect("ack");
    assert_eq!(s.state(), ResponderState::Established);
    net.sent.clear();
    (s, net)
}

fn client_fin() -> Segment {
    Segment::new(CLIENT, SERVER, 1013, 5001, TcpFlags::FIN_ACK)
}

#[test]
fn syn_in_listening_replies_syn_ack() {
    let mut net = RecordingNet::default();
    let mut s = Responder::new(SERVER);
    s.on_segment(&Segment::new(CLIENT, SERVER, 1000, 0, TcpFlags::SYN), &mut net)
        .expect("syn");

    assert_eq!(s.state(), ResponderState::SynReceived);
    assert_eq!(s.ack(), 1001);
    assert_eq!(s.peer(), Some(CLIENT));
    let segs = net.segments();
    assert_eq!(segs.len(), 1);
    assert_eq!(segs[0].flags, TcpFlags::SYN_ACK);
    assert_eq!((segs[0].seq, segs[0].ack), (5000, 1001));
    assert_eq!(net.sent[0].2, CLIENT);
}

#[test]
fn handshake_ack_establishes() {
    let (s, net) = established(EndpointConfig::responder());
    assert_eq!(s.seq(), 5000);
    assert_eq!(s.peer_acked(), 5001);
    assert!(net.sent.is_empty());
}

#[test]
fn stale_ack_does_not_lower_peer_acked() {
    let (mut s, mut net) = established(EndpointConfig::responder());
    s.on_segment(&Segment::new(CLIENT, SERVER, 1000, 4000, TcpFlags::ACK), &mut net)
        .expect("stale ack");

    assert_eq!(s.peer_acked(), 5001);
    assert_eq!(s.state(), ResponderState::Established);
    assert!(net.sent.is_empty());
}

#[test]
fn syn_from_port_zero_keeps_listening() {
    let mut net = RecordingNet::default();
    let mut s = Responder::new(SERVER);
    let unaddressed = Segment::new(0, SERVER, 1000, 0, TcpFlags::SYN);

    assert_eq!(s.on_segment(&unaddressed, &mut net), Err(Error::UnaddressedSegment));
    assert_eq!(s.state(), ResponderState::Listening);
    assert_eq!(s.ack(), 0);
    assert_eq!(s.peer(), None);
    assert!(net.sent.is_empty());
}

#[test]
fn fin_from_port_zero_stays_established() {
    let (mut s, mut net) = established(EndpointConfig::responder());
    let unaddressed = Segment::new(0, SERVER, 1013, 5001, TcpFlags::FIN_ACK);

    assert_eq!(s.on_segment(&unaddressed, &mut net), Err(Error::UnaddressedSegment));
    assert_eq!(s.state(), ResponderState::Established);
    assert_eq!(s.ack(), 1001);
    assert!(!s.fin_owed());
    assert!(net.sent.is_empty());

    // 正常的 FIN 仍按被动关闭处理
    s.on_segment(&client_fin(), &mut net).expect("fin");
    assert_eq!(s.state(), ResponderState::LastAck);
    assert_eq!(s.ack(), 1014);
}

#[test]
fn data_is_acknowledged_and_stays_in_data_received() {
    let (mut s, mut net) = established(EndpointConfig::responder());
    let data = Segment::new(CLIENT, SERVER, 1000, 5001, TcpFlags::PSH_ACK)
        .with_payload(b"Hello Server!".to_vec());
    s.on_segment(&data, &mut net).expect("data");

    assert_eq!(s.state(), ResponderState::DataReceived);
    assert_eq!(s.ack(), 1013);
    let segs = net.segments();
    assert_eq!(segs.len(), 1);
    assert_eq!(segs[0].flags, TcpFlags::ACK);
    assert_eq!(segs[0].ack, 1013);

    let more = Segment::new(CLIENT, SERVER, 1013, 5001, TcpFlags::PSH_ACK).with_payload(b"!!".to_vec());
    s.on_segment(&more, &mut net).expect("more data");
    assert_eq!(s.state(), ResponderState::DataReceived);
    assert_eq!(s.ack(), 1015);
    assert_eq!(net.sent.len(), 2);
}

#[test]
fn data_before_handshake_is_ignored() {
    let mut net = RecordingNet::default();
    let mut s = Responder::new(SERVER);
    let data = Segment::new(CLIENT, SERVER, 1000, 0, TcpFlags::PSH_ACK).with_payload(b"early".to_vec());
    s.on_segment(&data, &mut net).expect("data");

    assert_eq!(s.state(), ResponderState::Listening);
    assert_eq!(s.ack(), 0);
    assert!(net.sent.is_empty());
}

#[test]
fn peer_fin_acks_then_sends_own_fin_immediately() {
    let (mut s, mut net) = established(EndpointConfig::responder());
    s.on_segment(&client_fin(), &mut net).expect("fin");

    assert_eq!(s.state(), ResponderState::LastAck);
    assert!(!s.fin_owed());
    assert_eq!(s.ack(), 1014);
    assert_eq!(s.seq(), 5001);

    let segs = net.segments();
    assert_eq!(segs.len(), 2);
    assert_eq!(segs[0].flags, TcpFlags::ACK);
    assert_eq!(segs[0].ack, 1014);
    assert_eq!(segs[1].flags, TcpFlags::FIN_ACK);
    assert_eq!(segs[1].seq, 5000);
}

#[test]
fn deferred_fin_fires_once_on_next_unmatched_segment() {
    let (mut s, mut net) = established(deferred_close());
    s.on_segment(&client_fin(), &mut net).expect("fin");

    assert_eq!(s.state(), ResponderState::CloseWait);
    assert!(s.fin_owed());
    assert_eq!(net.sent.len(), 1);

    s.on_segment(&Segment::new(CLIENT, SERVER, 1014, 5001, TcpFlags::ACK), &mut net)
        .expect("unrelated ack");
    assert_eq!(s.state(), ResponderState::LastAck);
    assert!(!s.fin_owed());
    assert_eq!(net.sent.len(), 2);
    assert_eq!(net.segments()[1].flags, TcpFlags::FIN_ACK);

    // 不匹配 LAST-ACK 的确认号：不再重发 FIN，也不关闭
    s.on_segment(&Segment::new(CLIENT, SERVER, 1014, 5000, TcpFlags::ACK), &mut net)
        .expect("stale ack");
    assert_eq!(s.state(), ResponderState::LastAck);
    assert_eq!(net.sent.len(), 2);
}

#[test]
fn explicit_close_consumes_owed_fin() {
    let (mut s, mut net) = established(deferred_close());
    assert!(matches!(
        s.close(&mut net),
        Err(Error::InvalidTransition { op: "close", .. })
    ));

    s.on_segment(&client_fin(), &mut net).expect("fin");
    s.close(&mut net).expect("close");
    assert_eq!(s.state(), ResponderState::LastAck);
    assert!(s.close(&mut net).is_err());
    assert_eq!(net.sent.len(), 2);
}

#[test]
fn matching_final_ack_closes() {
    let (mut s, mut net) = established(EndpointConfig::responder());
    s.on_segment(&client_fin(), &mut net).expect("fin");
    s.on_segment(&Segment::new(CLIENT, SERVER, 1014, 5001, TcpFlags::ACK), &mut net)
        .expect("final ack");

    assert_eq!(s.state(), ResponderState::Closed);
    assert!(s.is_terminal());
}

#[test]
fn closed_responder_ignores_everything() {
    let (mut s, mut net) = established(EndpointConfig::responder());
    s.on_segment(&client_fin(), &mut net).expect("fin");
    s.on_segment(&Segment::new(CLIENT, SERVER, 1014, 5001, TcpFlags::ACK), &mut net)
        .expect("final ack");
    net.sent.clear();

    let (seq, ack, acked) = (s.seq(), s.ack(), s.peer_acked());
    for mask in 0u8..64 {
        let flags = TcpFlags::from_array(std::array::from_fn(|i| mask & (1 << i) != 0));
        let seg = Segment::new(CLIENT, SERVER, 42, 42, flags).with_payload(b"late".to_vec());
        s.on_segment(&seg, &mut net).expect("ignored");
    }
    assert_eq!((s.seq(), s.ack(), s.peer_acked()), (seq, ack, acked));
    assert_eq!(s.state(), ResponderState::Closed);
    assert!(net.sent.is_empty());
}

#[test]
fn on_receive_records_known_initiator() {
    let mut net = RecordingNet::default();
    let mut s = Responder::new(SERVER);
    let bits = wire::encode(&Segment::new(CLIENT, SERVER, 1000, 0, TcpFlags::ACK));
    s.on_receive(&bits, Some(CLIENT), &mut net).expect("receive");

    assert_eq!(s.peer(), Some(CLIENT));
    assert_eq!(s.state(), ResponderState::Listening);
}

#[test]
fn malformed_input_is_rejected_before_any_change() {
    let mut net = RecordingNet::default();
    let mut s = Responder::new(SERVER);
    let mut bits = wire::encode(&Segment::new(CLIENT, SERVER, 1000, 0, TcpFlags::SYN));
    bits.truncate(120);

    assert_eq!(
        s.on_receive(&bits, Some(CLIENT), &mut net),
        Err(Error::MalformedSegment { len: 120 })
    );
    assert_eq!(s.state(), ResponderState::Listening);
    assert_eq!(s.peer(), None);
    assert!(net.sent.is_empty());
}
