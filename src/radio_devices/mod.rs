//! Transceiver interface and radio device implementations
//!
//! [`Transceiver`] is the seam between the link and the MAC/PHY driver. The link
//! state machine is the only caller of its receive/transmit primitives.
//!
//! - `echo`: loopback device for tests and the std demo
//! - `link_quality_calculations`: LQI to dBm conversion used by the status report

pub mod link_quality_calculations;

#[cfg(feature = "radio-device-echo")]
pub mod echo;

#[cfg(feature = "radio-device-echo")]
pub use echo::EchoTransceiver;

pub use link_quality_calculations::link_quality_dbm;

use core::fmt;

use crate::messages::ReceivedFrame;

/// How long the receiver stays armed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RxTimeout {
    /// Receive until a frame arrives or the receiver is disabled
    Forever,
    /// Complete with `FrameStatus::Timeout` after this many transceiver ticks
    Ticks(u32),
}

/// Transceiver operation errors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransceiverError {
    /// Receiver could not be switched off (transient)
    RxDisableFailed,
    RxEnableFailed,
    TransmissionFailed,
    ConfigurationFailed,
}

impl fmt::Display for TransceiverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransceiverError::RxDisableFailed => f.write_str("receiver disable failed"),
            TransceiverError::RxEnableFailed => f.write_str("receiver enable failed"),
            TransceiverError::TransmissionFailed => f.write_str("transmission failed"),
            TransceiverError::ConfigurationFailed => f.write_str("configuration failed"),
        }
    }
}

/// Completion raised by the driver
#[derive(Clone)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum Indication {
    /// Receive completed (successfully, by timeout or by overflow)
    Data(ReceivedFrame),
    /// The transceiver reset itself and must be reinitialized
    Reset,
}

/// Driver primitives used by the link
///
/// Calls are non-blocking: each primitive starts the operation and reports
/// whether the driver accepted it. Receive completions are delivered either by
/// the driver calling the link's indication entry points from its interrupt
/// handler, or by returning them from [`Transceiver::poll_indication`].
pub trait Transceiver {
    fn rx_enable(&mut self, timeout: RxTimeout) -> Result<(), TransceiverError>;

    fn rx_disable(&mut self) -> Result<(), TransceiverError>;

    /// Transmits `frame` (including its terminating NUL)
    fn transmit(&mut self, frame: &[u8]) -> Result<(), TransceiverError>;

    /// Full re-initialization after a transceiver reset
    fn reinitialize(&mut self);

    fn set_channel(&mut self, channel: u8) -> Result<(), TransceiverError>;

    fn set_output_power(&mut self, power: u8) -> Result<(), TransceiverError>;

    /// Raw link quality indicator of the last received frame
    fn link_quality(&self) -> u8;

    /// Next pending completion, if the driver queues them instead of calling back
    fn poll_indication(&mut self) -> Option<Indication> {
        None
    }
}
