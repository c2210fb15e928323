//! Classified inbound message, sized for one delivery queue slot.
//!
//! A slot is `QUEUE_ITEM_SIZE` bytes on the wire of the original queue:
//! kind (1 byte), size (1 byte) and up to `QUEUE_PAYLOAD_SIZE` payload bytes.
//! Payloads longer than a slot are truncated; `frame_length` keeps the size the
//! transceiver reported.

use crate::{QUEUE_PAYLOAD_SIZE, RADIO_PREFIX};

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueMessageKind {
    /// Raw copy of any successfully received frame
    Sniff = 0,
    ContestQuestion = 1,
    ContestAnswer = 2,
    /// Prefixed frame accepted by the application sub-prefix filter
    ApplicationData = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueuedMessage {
    kind: QueueMessageKind,
    data: [u8; QUEUE_PAYLOAD_SIZE],
    length: u8,
    frame_length: u8,
}

impl QueuedMessage {
    /// Copies `payload` into a new message, truncating it to the slot capacity
    pub fn new(kind: QueueMessageKind, payload: &[u8]) -> Self {
        let length = payload.len().min(QUEUE_PAYLOAD_SIZE);
        let mut data = [0u8; QUEUE_PAYLOAD_SIZE];
        data[..length].copy_from_slice(&payload[..length]);
        QueuedMessage {
            kind,
            data,
            length: length as u8,
            frame_length: payload.len().min(u8::MAX as usize) as u8,
        }
    }

    pub fn kind(&self) -> QueueMessageKind {
        self.kind
    }

    /// Stored payload bytes (possibly truncated, may contain the frame NUL)
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.length as usize]
    }

    /// Size of the frame this message was copied from
    pub fn frame_length(&self) -> u8 {
        self.frame_length
    }

    /// Payload text up to the first NUL
    pub fn text(&self) -> &[u8] {
        let payload = self.payload();
        match payload.iter().position(|&b| b == 0) {
            Some(end) => &payload[..end],
            None => payload,
        }
    }

    /// Payload text with the link prefix stripped, for application data
    pub fn application_payload(&self) -> &[u8] {
        let text = self.text();
        text.strip_prefix(RADIO_PREFIX.as_bytes()).unwrap_or(text)
    }
}
