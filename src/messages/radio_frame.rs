//! # Radio Frame Module
//!
//! Wire format of the link. Every frame is NUL terminated text:
//! - Application frames: `RADIO_PREFIX` followed by the payload
//! - Acknowledge frames: `RADIO_PREFIX` + `RADIO_ACK`
//! - Contest frames: the contest text without prefix
//!
//! The transmitted length always includes the terminating NUL, the same way the
//! transceiver reports received lengths.

use crate::RADIO_PACKET_SIZE;

/// Completion status reported by the transceiver for a reception
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    Success,
    /// Timed receive expired without a frame
    Timeout,
    /// Frame was longer than the receiver accepts
    Overflow,
}

/// Fixed-size transceiver buffer
///
/// The `data` and `length` fields are public so drivers can fill the buffer in place.
#[derive(Clone)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct Frame {
    /// Raw frame data buffer of fixed size
    pub data: [u8; RADIO_PACKET_SIZE],

    /// Number of valid bytes in `data`, including the terminating NUL
    pub length: usize,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Frame {
    pub const fn new() -> Self {
        Frame {
            data: [0u8; RADIO_PACKET_SIZE],
            length: 0,
        }
    }

    /// Builds a frame holding `prefix` followed by `payload` and a terminating NUL
    ///
    /// Text that does not fit is cut at the buffer boundary; the NUL is always kept.
    pub fn from_parts(prefix: &[u8], payload: &[u8]) -> Self {
        let mut frame = Frame::new();
        frame.set_text(prefix, payload);
        frame
    }

    /// Replaces the content with `prefix` + `payload` + NUL
    pub fn set_text(&mut self, prefix: &[u8], payload: &[u8]) {
        let capacity = RADIO_PACKET_SIZE - 1;
        let mut length = 0;
        for &byte in prefix.iter().chain(payload.iter()) {
            // embedded NULs end the text, like a C string copy
            if byte == 0 || length == capacity {
                break;
            }
            self.data[length] = byte;
            length += 1;
        }
        self.data[length] = 0;
        self.length = length + 1;
    }

    /// Valid bytes of the frame, including the terminating NUL
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.length.min(RADIO_PACKET_SIZE)]
    }

    /// Text content of the frame, up to (not including) the first NUL
    pub fn text(&self) -> &[u8] {
        let bytes = self.as_bytes();
        match bytes.iter().position(|&b| b == 0) {
            Some(end) => &bytes[..end],
            None => bytes,
        }
    }

    /// Case sensitive byte prefix comparison on the frame text
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.text().starts_with(prefix)
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// A completed reception as reported by the transceiver
#[derive(Clone)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct ReceivedFrame {
    pub frame: Frame,
    pub status: FrameStatus,
}

impl ReceivedFrame {
    pub fn success(frame: Frame) -> Self {
        ReceivedFrame {
            frame,
            status: FrameStatus::Success,
        }
    }

    /// Status-only completion (timeout or overflow) with an empty frame
    pub fn with_status(status: FrameStatus) -> Self {
        ReceivedFrame { frame: Frame::new(), status }
    }
}
