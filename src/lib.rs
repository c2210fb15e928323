//! # Packet Radio Link
//!
//! Half-duplex, single-channel packet radio link on top of an interrupt-driven
//! transceiver. The crate turns raw receive/transmit primitives into:
//!
//! - a request/acknowledge exchange with timeout-based recovery ([`RadioLink`]),
//! - a bounded, interrupt-safe delivery queue between completion context and the
//!   polled application loop ([`DeliveryQueue`]),
//! - the text based arithmetic "contest" challenge/response protocol ([`contest`]).
//!
//! ## Architecture
//!
//! ```text
//! transceiver driver -> data_indication -> rx_handler (classify)
//!                                            |-> DeliveryQueue  -> poll() -> MessageOutcome
//!                                            '-> EventQueue     -> event_dispatcher -> LinkState
//! RadioLink::step() -> Transceiver (rx enable/disable, transmit, reinitialize)
//! ```
//!
//! The completion side only ever enqueues; link state and configuration are owned
//! by the polled side through [`LinkContext`].
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(all(feature = "std", feature = "embedded"))]
compile_error!("Features `std` and `embedded` are mutually exclusive");

pub mod contest;
mod delivery_queue;
mod event_dispatcher;
mod link;
pub mod messages;
pub mod radio_devices;
mod rx_handler;
pub mod shell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

pub use contest::{ContestChallenge, ContestMessage, ContestOperation, ContestParseError, Operator};
pub use delivery_queue::DeliveryQueue;
pub use event_dispatcher::{LinkEvent, notification_for};
pub use link::{CONTEST_CHALLENGE_INTERVAL, LinkContext, LinkState, MessageOutcome, RadioLink, run_link};
pub use messages::{Frame, FrameStatus, QueueMessageKind, QueuedMessage, ReceivedFrame};
pub use radio_devices::{Indication, RxTimeout, Transceiver, TransceiverError};
pub use shell::{CommandError, RadioCommand, parse_command};

/// Prefix carried by every application frame
pub const RADIO_PREFIX: &str = "EST";
/// Acknowledge token, sent right after [`RADIO_PREFIX`]
pub const RADIO_ACK: &str = "ack";

//Transceiver dependent constants
/// Size of the transceiver TX/RX data buffers
pub const RADIO_PACKET_SIZE: usize = 125;
/// Longest reception the receiver accepts, longer frames complete with `Overflow`
pub const RADIO_RX_MAX_DATA_LENGTH: usize = 24;
/// Receive timeout armed while waiting for an acknowledge
pub const RADIO_RX_TIMEOUT_COUNT: u32 = 0xB000;

//Queue constants: kind(8bit) dataSize(8bit) data
pub const DELIVERY_QUEUE_SIZE: usize = 8;
pub const QUEUE_ITEM_SIZE: usize = 32;
pub const QUEUE_PAYLOAD_SIZE: usize = QUEUE_ITEM_SIZE - 2;

const EVENT_QUEUE_SIZE: usize = 8;
type EventQueue = Channel<CriticalSectionRawMutex, LinkEvent, EVENT_QUEUE_SIZE>;

pub const DEFAULT_CHANNEL: u8 = 5;
pub const DEFAULT_OUTPUT_POWER: u8 = 15;

/// Link settings owned by the command surface
///
/// Channel and output power are kept in range 0..15 by the link setters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkConfiguration {
    pub channel: u8,
    pub output_power: u8,
    pub is_enabled: bool,
    pub is_sniffing: bool,
    pub is_contest_mode: bool,
    /// Selects the contest challenge set (single digit)
    pub contest_number: u8,
}

impl LinkConfiguration {
    pub const fn new() -> Self {
        Self {
            channel: DEFAULT_CHANNEL,
            output_power: DEFAULT_OUTPUT_POWER,
            is_enabled: true,
            is_sniffing: false,
            is_contest_mode: false,
            contest_number: 0,
        }
    }
}

impl Default for LinkConfiguration {
    fn default() -> Self {
        Self::new()
    }
}
