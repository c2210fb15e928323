//! # RX Handler - Inbound Frame Classification
//!
//! Runs in receive completion (interrupt) context. It never changes link state:
//! it copies what it needs out of the single receive buffer into the delivery
//! queue and raises one event for the polled loop to dispatch.
//!
//! Classification, first match wins:
//! 1. `Timeout` status raises `Timeout`, `Overflow` status raises `Overflow`
//! 2. Success:
//!    - sniffing on: a raw copy is always queued as `Sniff`
//!    - waiting for an ack and the text starts with prefix + ack token: `AckReceived`
//!    - contest mode and the text parses as a contest frame: queued as
//!      question or answer, `DataReceived`
//!    - text starts with the link prefix: queued as `ApplicationData` when the
//!      application sub-prefix matches, `DataReceived`
//!    - anything else: `Unknown`
//!
//! All checks are case sensitive byte prefix comparisons. An ack shaped frame
//! outside `WaitingForAck` is classified by the later rules.

use crate::contest;
use crate::event_dispatcher::LinkEvent;
use crate::link::{LinkContext, LinkState};
use crate::messages::{FrameStatus, QueueMessageKind, ReceivedFrame};
use crate::{RADIO_ACK, RADIO_PREFIX};

pub(crate) fn classify(context: &LinkContext, received: &ReceivedFrame) -> LinkEvent {
    let event = match received.status {
        FrameStatus::Timeout => LinkEvent::Timeout,
        FrameStatus::Overflow => LinkEvent::Overflow,
        FrameStatus::Success => classify_frame(context, received),
    };
    log::trace!("Classified {:?} frame of {} bytes as {:?}", received.status, received.frame.length, event);
    context.raise_event(event);
    event
}

fn classify_frame(context: &LinkContext, received: &ReceivedFrame) -> LinkEvent {
    let config = context.configuration();
    let raw = received.frame.as_bytes();
    let text = received.frame.text();

    if config.is_sniffing {
        context.delivery_queue().enqueue(QueueMessageKind::Sniff, raw);
    }

    if context.state() == LinkState::WaitingForAck && is_ack(text) {
        return LinkEvent::AckReceived;
    }

    if config.is_contest_mode {
        if let Ok(message) = contest::parse(text) {
            let kind = if message.is_question {
                QueueMessageKind::ContestQuestion
            } else {
                QueueMessageKind::ContestAnswer
            };
            context.delivery_queue().enqueue(kind, raw);
            return LinkEvent::DataReceived;
        }
    }

    if let Some(body) = text.strip_prefix(RADIO_PREFIX.as_bytes()) {
        if let Some(sub_prefix) = context.application_sub_prefix() {
            if body.starts_with(sub_prefix.as_bytes()) {
                context.delivery_queue().enqueue(QueueMessageKind::ApplicationData, raw);
            }
        }
        return LinkEvent::DataReceived;
    }

    LinkEvent::Unknown
}

/// `true` for prefix + ack token, trailing bytes are not checked
pub(crate) fn is_ack(text: &[u8]) -> bool {
    text.strip_prefix(RADIO_PREFIX.as_bytes())
        .is_some_and(|rest| rest.starts_with(RADIO_ACK.as_bytes()))
}
