use std::thread;
use std::time::Duration;

use packlink_frame::{LinkConfig, Packet, Payload, ACK_OK, SENTINEL};
use packlink_peer::{
    Idle, NeverAbort, ReceiveOutcome, Receiver, ResetSignal, SendOutcome, Sender,
};
use packlink_transport::{ByteTransport, MemoryLink};

fn patient() -> LinkConfig {
    LinkConfig {
        ack_timeout: None,
        ..LinkConfig::default()
    }
}

#[test]
fn dispense_command_end_to_end() {
    let (router_link, dispenser_link) = MemoryLink::pair();

    let dispenser = thread::spawn(move || {
        let mut receiver = Receiver::new(dispenser_link);
        receiver.receive_packet(&NeverAbort::default()).unwrap()
    });

    let mut sender = Sender::with_config(router_link, patient());
    let packet = Packet::new(0x01, 0x05, [0x10, 0x00, 0x00, 0x00]);
    let outcome = sender.send_packet(&NeverAbort::default(), packet).unwrap();

    assert_eq!(outcome, SendOutcome::Acknowledged { attempts: 1 });
    let delivered = dispenser.join().unwrap();
    assert_eq!(delivered, ReceiveOutcome::Delivered(packet.sealed()));
}

#[test]
fn receiver_ignores_line_noise() {
    let (router_link, dispenser_link) = MemoryLink::pair();
    dispenser_link.inject(&[0x13, SENTINEL, 0x37, 0x00, SENTINEL, 0x42]);

    let dispenser = thread::spawn(move || {
        let mut receiver = Receiver::new(dispenser_link);
        let outcome = receiver.receive_packet(&NeverAbort::default()).unwrap();
        (outcome, *receiver.stats())
    });

    let mut sender = Sender::with_config(router_link, patient());
    let outcome = sender
        .send_packet(&NeverAbort::default(), Packet::new(0x02, 0x08, Payload::from_i32(-1200)))
        .unwrap();
    assert!(outcome.is_acknowledged());

    let (delivered, stats) = dispenser.join().unwrap();
    let packet = delivered.packet().copied().unwrap();
    assert_eq!(packet.payload.i32(), -1200);
    assert_eq!(stats.delivered, 1);
}

#[test]
fn stream_of_packets_in_order() {
    let (router_link, dispenser_link) = MemoryLink::pair();

    let dispenser = thread::spawn(move || {
        let mut receiver = Receiver::new(dispenser_link);
        let mut seen = Vec::new();
        while seen.len() < 32 {
            if let ReceiveOutcome::Delivered(packet) =
                receiver.receive_packet(&NeverAbort::default()).unwrap()
            {
                seen.push(packet.payload.u32());
            }
        }
        seen
    });

    let mut sender = Sender::with_config(router_link, patient());
    for value in 0..32u32 {
        let packet = Packet::new(1, 0x20, Payload::from_u32(value * 0x0101_0101));
        let outcome = sender.send_packet(&NeverAbort::default(), packet).unwrap();
        assert!(outcome.is_acknowledged(), "packet {value}: {outcome:?}");
    }

    let seen = dispenser.join().unwrap();
    assert_eq!(seen, (0..32u32).map(|v| v * 0x0101_0101).collect::<Vec<_>>());
}

#[test]
fn unanswered_sender_fails_after_budget() {
    let (router_link, dispenser_link) = MemoryLink::pair();
    let config = LinkConfig {
        ack_timeout: Some(Duration::from_millis(5)),
        ..LinkConfig::default()
    };

    let mut sender = Sender::with_config(router_link, config);
    let outcome = sender
        .send_single_byte(&NeverAbort::default(), 0x01, 0x00)
        .unwrap();

    assert_eq!(outcome, SendOutcome::SendFailed { attempts: 3 });
    assert_eq!(sender.stats().attempts, 3);
    // Three complete frames reached the silent peer.
    assert_eq!(dispenser_link.pending(), 3 * 13);
}

#[test]
fn reset_from_another_thread_stops_receiver() {
    let (_router_link, dispenser_link) = MemoryLink::pair();
    let signal = ResetSignal::with_idle(Idle::Sleep(Duration::from_millis(1)));

    let waiter = {
        let signal = signal.clone();
        thread::spawn(move || {
            let mut receiver = Receiver::new(dispenser_link);
            receiver.receive_packet(&signal).unwrap()
        })
    };

    thread::sleep(Duration::from_millis(20));
    signal.trigger();
    assert_eq!(waiter.join().unwrap(), ReceiveOutcome::Reset);
}

#[test]
fn reset_stops_sender_waiting_forever() {
    let (router_link, _dispenser_link) = MemoryLink::pair();
    let signal = ResetSignal::new();

    let waiter = {
        let signal = signal.clone();
        thread::spawn(move || {
            let mut sender = Sender::with_config(router_link, patient());
            sender.send_single_byte(&signal, 0x01, 0x00).unwrap()
        })
    };

    thread::sleep(Duration::from_millis(20));
    signal.trigger();
    assert_eq!(waiter.join().unwrap(), SendOutcome::Reset);
}

#[test]
fn corrupted_frame_is_retried_and_delivered() {
    let (router_link, mut dispenser_link) = MemoryLink::pair();

    // Corrupt the first frame in flight: flip a body bit before the dispenser reads it.
    let dispenser = thread::spawn(move || {
        let mut first = Vec::new();
        while first.len() < 13 {
            if let Some(byte) = dispenser_link.try_recv().unwrap() {
                first.push(byte);
            }
        }
        first[5] ^= 0x02;
        dispenser_link.inject(&first);

        let mut receiver = Receiver::new(dispenser_link);
        let ctx = NeverAbort::default();
        let first = receiver.receive_packet(&ctx).unwrap();
        let second = receiver.receive_packet(&ctx).unwrap();
        (first, second)
    });

    let mut sender = Sender::with_config(router_link, patient());
    let packet = Packet::new(0x03, 0x0A, [0xDE, 0xAD, 0xBE, 0xEF]);
    let outcome = sender.send_packet(&NeverAbort::default(), packet).unwrap();

    assert_eq!(outcome, SendOutcome::Acknowledged { attempts: 2 });
    let (first, second) = dispenser.join().unwrap();
    assert_eq!(first, ReceiveOutcome::ChecksumFailed);
    assert_eq!(second, ReceiveOutcome::Delivered(packet.sealed()));
    assert_eq!(sender.stats().nacks, 1);
}

#[cfg(unix)]
#[test]
fn exchange_over_socket_pair() {
    use packlink_transport::LinkStream;

    let (router_link, dispenser_link) = LinkStream::pair().unwrap();

    let dispenser = thread::spawn(move || {
        let mut receiver = Receiver::new(dispenser_link);
        receiver.receive_packet(&NeverAbort::default()).unwrap()
    });

    let mut sender = Sender::with_config(router_link, patient());
    let packet = Packet::single_byte(0x0C, 0xFF);
    let outcome = sender.send_packet(&NeverAbort::default(), packet).unwrap();

    assert!(outcome.is_acknowledged());
    assert_eq!(
        dispenser.join().unwrap(),
        ReceiveOutcome::Delivered(packet.sealed())
    );
}

#[test]
fn acknowledgement_byte_is_ok_code() {
    let (mut router_link, dispenser_link) = MemoryLink::pair();
    let mut wire = bytes::BytesMut::new();
    packlink_frame::encode_frame(&Packet::single_byte(1, 1).sealed(), &mut wire);
    dispenser_link.inject(&wire);

    let mut receiver = Receiver::new(dispenser_link);
    let outcome = receiver.receive_packet(&NeverAbort::default()).unwrap();
    assert!(outcome.packet().is_some());
    assert_eq!(router_link.try_recv().unwrap(), Some(ACK_OK));
}
