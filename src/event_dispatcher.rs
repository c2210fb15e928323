//! # Event Dispatcher
//!
//! Maps events raised on the receive completion side onto link state
//! transitions. Every event has exactly one target state and one console
//! notification:
//!
//! | Event | Next state | Notification |
//! |---|---|---|
//! | Reset | Resetting | `RADIO reset` |
//! | Timeout | ReceiveAlwaysOn | `RADIO timeout` |
//! | AckReceived | ReceiveAlwaysOn | `RADIO rx ack` |
//! | Overflow | ReceiveAlwaysOn | `RADIO overflow` |
//! | DataReceived | TransmittingAck | `RADIO rx data, going to tx ACK` |
//! | Unknown | ReceiveAlwaysOn | `RADIO unknown` |

use log::{Level, log};

use crate::link::LinkState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    /// Transceiver reset itself
    Reset,
    /// Timed receive expired without a frame
    Timeout,
    /// Acknowledge received while waiting for it
    AckReceived,
    /// Received frame was longer than the receiver accepts
    Overflow,
    /// Prefixed or contest frame received, an acknowledge is owed
    DataReceived,
    Unknown,
}

pub(crate) fn next_state(event: LinkEvent) -> LinkState {
    match event {
        LinkEvent::Reset => LinkState::Resetting,
        LinkEvent::Timeout => LinkState::ReceiveAlwaysOn,
        LinkEvent::AckReceived => LinkState::ReceiveAlwaysOn,
        LinkEvent::Overflow => LinkState::ReceiveAlwaysOn,
        LinkEvent::DataReceived => LinkState::TransmittingAck,
        LinkEvent::Unknown => LinkState::ReceiveAlwaysOn,
    }
}

pub fn notification_for(event: LinkEvent) -> &'static str {
    match event {
        LinkEvent::Reset => "RADIO reset",
        LinkEvent::Timeout => "RADIO timeout",
        LinkEvent::AckReceived => "RADIO rx ack",
        LinkEvent::Overflow => "RADIO overflow",
        LinkEvent::DataReceived => "RADIO rx data, going to tx ACK",
        LinkEvent::Unknown => "RADIO unknown",
    }
}

/// Applies `event` to `state` and emits its notification
pub(crate) fn dispatch(state: &mut LinkState, event: LinkEvent) {
    log!(Level::Info, "{}", notification_for(event));
    *state = next_state(event);
}
