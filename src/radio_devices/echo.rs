//! # Echo Transceiver - Loopback Device for Testing
//!
//! Minimal [`Transceiver`] that loops transmitted frames back to its own
//! receiver. No radio hardware is involved.
//!
//! ## Behavior
//!
//! - Transmitted frames are recorded and, in loopback mode, put "on the air"
//! - A frame on the air is delivered once the receiver is armed; frames longer
//!   than `RADIO_RX_MAX_DATA_LENGTH` complete with `Overflow`
//! - A timed receive with nothing on the air completes with `Timeout` on the
//!   next poll
//! - Receiver disable and transmit failures can be forced for a number of calls
//! - Frames, status completions and resets can be injected from tests
//!
//! Deliveries and resets go through [`Transceiver::poll_indication`], which the
//! link drains from its polled loop.

use heapless::Deque;
use log::{Level, log};

use super::{Indication, RxTimeout, Transceiver, TransceiverError};
use crate::RADIO_RX_MAX_DATA_LENGTH;
use crate::messages::{Frame, FrameStatus, ReceivedFrame};

const ECHO_AIR_QUEUE_SIZE: usize = 8;
const ECHO_HISTORY_SIZE: usize = 16;

#[cfg_attr(feature = "std", derive(Debug))]
pub struct EchoTransceiver {
    loopback: bool,
    rx_armed: Option<RxTimeout>,
    air: Deque<Indication, ECHO_AIR_QUEUE_SIZE>,
    history: Deque<Frame, ECHO_HISTORY_SIZE>,
    transmit_count: usize,
    rx_enable_count: usize,
    last_rx_timeout: Option<RxTimeout>,
    reinitialize_count: usize,
    rx_disable_failures: usize,
    transmit_failures: usize,
    channel: u8,
    output_power: u8,
    link_quality: u8,
}

impl Default for EchoTransceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl EchoTransceiver {
    /// Loopback device: every transmitted frame is received back
    pub const fn new() -> Self {
        EchoTransceiver {
            loopback: true,
            rx_armed: None,
            air: Deque::new(),
            history: Deque::new(),
            transmit_count: 0,
            rx_enable_count: 0,
            last_rx_timeout: None,
            reinitialize_count: 0,
            rx_disable_failures: 0,
            transmit_failures: 0,
            channel: 0,
            output_power: 0,
            link_quality: 0,
        }
    }

    /// Device that records transmissions without echoing them
    pub const fn silent() -> Self {
        let mut device = Self::new();
        device.loopback = false;
        device
    }

    /// Puts a received frame on the air, delivered once the receiver is armed
    pub fn inject_frame(&mut self, text: &[u8]) {
        let frame = Frame::from_parts(&[], text);
        self.push_air(Indication::Data(receive_status(frame)));
    }

    /// Queues a status-only completion (`Timeout` or `Overflow`)
    pub fn inject_status(&mut self, status: FrameStatus) {
        self.push_air(Indication::Data(ReceivedFrame::with_status(status)));
    }

    /// Queues a transceiver reset, delivered on the next poll even when not receiving
    pub fn inject_reset(&mut self) {
        self.push_air(Indication::Reset);
    }

    /// Makes the next `count` receiver disable requests fail
    pub fn fail_rx_disable(&mut self, count: usize) {
        self.rx_disable_failures = count;
    }

    /// Makes the next `count` transmit requests fail
    pub fn fail_transmit(&mut self, count: usize) {
        self.transmit_failures = count;
    }

    /// Raw LQI reported by [`Transceiver::link_quality`]
    pub fn set_link_quality(&mut self, link_quality: u8) {
        self.link_quality = link_quality;
    }

    /// Frames accepted for transmission, oldest first (last `ECHO_HISTORY_SIZE`)
    pub fn transmitted(&self) -> impl Iterator<Item = &Frame> {
        self.history.iter()
    }

    /// Most recently transmitted frame
    pub fn last_transmitted(&self) -> Option<&Frame> {
        self.history.back()
    }

    /// Number of successful transmissions, acks included
    pub fn transmit_count(&self) -> usize {
        self.transmit_count
    }

    /// Number of receiver arm requests
    pub fn rx_enable_count(&self) -> usize {
        self.rx_enable_count
    }

    /// Timeout of the most recent receiver arm request
    pub fn last_rx_timeout(&self) -> Option<RxTimeout> {
        self.last_rx_timeout
    }

    /// `true` while the receiver is armed and nothing was delivered yet
    pub fn is_receiving(&self) -> bool {
        self.rx_armed.is_some()
    }

    /// Number of re-initializations after resets
    pub fn reinitialize_count(&self) -> usize {
        self.reinitialize_count
    }

    /// Channel last applied by the link
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Output power last applied by the link
    pub fn output_power(&self) -> u8 {
        self.output_power
    }

    /// Total number of transceiver interactions, useful to prove a no-op
    pub fn interaction_count(&self) -> usize {
        self.transmit_count + self.rx_enable_count + self.reinitialize_count
    }

    fn push_air(&mut self, indication: Indication) {
        if self.air.push_back(indication).is_err() {
            log!(Level::Warn, "Echo air queue full, dropping injected completion");
        }
    }
}

fn receive_status(frame: Frame) -> ReceivedFrame {
    if frame.length > RADIO_RX_MAX_DATA_LENGTH {
        ReceivedFrame::with_status(FrameStatus::Overflow)
    } else {
        ReceivedFrame::success(frame)
    }
}

impl Transceiver for EchoTransceiver {
    fn rx_enable(&mut self, timeout: RxTimeout) -> Result<(), TransceiverError> {
        self.rx_armed = Some(timeout);
        self.rx_enable_count += 1;
        self.last_rx_timeout = Some(timeout);
        Ok(())
    }

    fn rx_disable(&mut self) -> Result<(), TransceiverError> {
        if self.rx_disable_failures > 0 {
            self.rx_disable_failures -= 1;
            return Err(TransceiverError::RxDisableFailed);
        }
        self.rx_armed = None;
        Ok(())
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<(), TransceiverError> {
        if self.transmit_failures > 0 {
            self.transmit_failures -= 1;
            return Err(TransceiverError::TransmissionFailed);
        }
        let frame = Frame::from_parts(&[], frame);
        log::trace!("Echo transceiver transmitting {} bytes", frame.length);
        if self.history.is_full() {
            self.history.pop_front();
        }
        // history has room after the pop above
        let _ = self.history.push_back(frame.clone());
        self.transmit_count += 1;
        if self.loopback {
            self.push_air(Indication::Data(receive_status(frame)));
        }
        Ok(())
    }

    fn reinitialize(&mut self) {
        self.rx_armed = None;
        self.reinitialize_count += 1;
    }

    fn set_channel(&mut self, channel: u8) -> Result<(), TransceiverError> {
        self.channel = channel;
        Ok(())
    }

    fn set_output_power(&mut self, power: u8) -> Result<(), TransceiverError> {
        self.output_power = power;
        Ok(())
    }

    fn link_quality(&self) -> u8 {
        self.link_quality
    }

    fn poll_indication(&mut self) -> Option<Indication> {
        if matches!(self.air.front(), Some(Indication::Reset)) {
            return self.air.pop_front();
        }
        let armed = self.rx_armed?;
        match self.air.pop_front() {
            Some(indication) => {
                // a completed reception switches the receiver off
                self.rx_armed = None;
                Some(indication)
            }
            None => match armed {
                RxTimeout::Ticks(_) => {
                    self.rx_armed = None;
                    Some(Indication::Data(ReceivedFrame::with_status(FrameStatus::Timeout)))
                }
                RxTimeout::Forever => None,
            },
        }
    }
}
