//! A router and a dispenser sharing one simulated serial line.
//!
//! The router asks for a dose; the dispenser acknowledges the command and
//! answers with the dispensed amount. Run with:
//!
//! ```text
//! cargo run -p packlink --example dispenser-loop
//! ```

use std::thread;
use std::time::Duration;

use packlink::frame::{LinkConfig, Packet, Payload};
use packlink::peer::{Idle, Node, ReceiveOutcome, ResetSignal};
use packlink::transport::MemoryLink;

const DISPENSER: u8 = 0x01;
const ROUTER: u8 = 0x00;
const DISPENSE: u8 = 0x05;
const DISPENSED: u8 = 0x06;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (router_end, dispenser_end) = MemoryLink::pair();
    let reset = ResetSignal::with_idle(Idle::Sleep(Duration::from_micros(100)));
    let config = LinkConfig {
        ack_timeout: Some(Duration::from_millis(250)),
        ..LinkConfig::default()
    };

    let dispenser = {
        let reset = reset.clone();
        let config = config.clone();
        thread::spawn(move || -> packlink::peer::Result<u32> {
            let mut node = Node::with_config(dispenser_end, config);
            let mut total = 0u32;
            loop {
                match node.receive_packet(&reset)? {
                    ReceiveOutcome::Delivered(cmd) if cmd.packet_type == DISPENSE => {
                        let amount = cmd.payload.u32();
                        total += amount;
                        let reply = Packet::new(ROUTER, DISPENSED, Payload::from_u32(amount));
                        node.send_packet(&reset, reply)?;
                    }
                    ReceiveOutcome::Delivered(other) => {
                        println!("dispenser: ignoring type {}", other.packet_type);
                    }
                    ReceiveOutcome::ChecksumFailed => {}
                    ReceiveOutcome::Reset => return Ok(total),
                }
            }
        })
    };

    let mut router = Node::with_config(router_end, config);
    for amount in [10u32, 25, 40] {
        let outcome = router.send_packet(
            &reset,
            Packet::new(DISPENSER, DISPENSE, Payload::from_u32(amount)),
        )?;
        println!("router: dispense {amount} -> {outcome:?}");

        if let ReceiveOutcome::Delivered(reply) = router.receive_packet(&reset)? {
            println!("router: dispenser reports {}", reply.payload.u32());
        }
    }

    reset.trigger();
    let total = dispenser
        .join()
        .map_err(|_| "dispenser thread panicked")??;
    println!("dispenser: {total} units total, router stats {:?}", router.stats());
    Ok(())
}
