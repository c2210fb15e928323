//! # Messages Module
//!
//! Data structures moved between the transceiver, the classifier and the
//! application loop.
//!
//! - **Frame**: fixed-size transceiver buffer holding one NUL terminated text frame
//! - **ReceivedFrame**: a completed reception (frame plus completion status)
//! - **QueuedMessage**: a classified inbound message, sized for one delivery queue slot

pub mod queued_message;
pub mod radio_frame;

pub use queued_message::{QueueMessageKind, QueuedMessage};
pub use radio_frame::{Frame, FrameStatus, ReceivedFrame};
