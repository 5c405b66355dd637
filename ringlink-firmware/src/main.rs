//! Ringlink - message ring node firmware
//!
//! Each board is one node of a unidirectional ring. Messages typed on the
//! keypad travel hop by hop over bit-banged clock/data/ack lines until
//! they reach the node they are addressed to.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_time::Delay;
use {defmt_rtt as _, panic_probe as _};

use ringlink_core::config::{parse_config, NodeConfig};
use ringlink_core::message::MessageLink;
use ringlink_core::node::Node;
use ringlink_core::traits::TextBuffer;
use ringlink_hal_rp2040::PinBank;
use ringlink_protocol::{PollBudget, Receiver, Transmitter};

mod events;

/// Embedded node configuration (compiled into firmware)
/// Edit node.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../node.toml");

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Ringlink node starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();
    let link = config.link;
    info!(
        "Node {}: bit {}us, settle {}us, start hold {}us, {} attempts, oversize {}, resync {}",
        link.node_id.as_char(),
        link.timing.bit_delay_us,
        link.timing.settle_delay_us,
        link.timing.start_hold_us,
        link.retry_limit,
        link.oversize,
        link.resync.enabled
    );

    let mut bank = PinBank::new(p);
    let (tx_pins, rx_pins) = unwrap!(bank.ring(&config.pins));
    let mut keypad = unwrap!(bank.keypad(&config.keypad));

    let tx = Transmitter::new(tx_pins, Delay, PollBudget::new(link.ack_polls), link.timing);
    let rx = Receiver::new(rx_pins, Delay, PollBudget::new(link.edge_polls), link.timing);
    let mut node = Node::new(MessageLink::new(tx, rx, link), TextBuffer::<16, 2>::new());

    info!("Ring link idle, waiting for traffic");
    node.run(&mut keypad, events::log_event)
}

/// Parse the embedded configuration
///
/// A bad file halts the node; the defaults would give it node id '1'.
fn load_config() -> NodeConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Loaded node.toml");
            config
        }
        Err(e) => panic!("node.toml rejected: {}", e),
    }
}
