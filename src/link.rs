//! # Radio Link - Half-Duplex Link State Machine
//!
//! [`RadioLink`] drives a [`Transceiver`] through the send/receive cycle one step
//! per call. It is the only component that invokes the transceiver's receive
//! and transmit primitives.
//!
//! ## States
//!
//! | State | Step action | Next |
//! |---|---|---|
//! | Initial | none | ReceiveAlwaysOn |
//! | ReceiveAlwaysOn | arm receiver without timeout | ReadyForTraffic |
//! | ReadyForTraffic | none | until a send sets Transmitting |
//! | Transmitting | disable receiver (retried next step on failure), transmit | contest: ReceiveAlwaysOn, otherwise WaitingForAck with a timed receive; failure: ReceiveAlwaysOn |
//! | WaitingForAck | none | left only by ack, timeout or reset events |
//! | TransmittingAck | transmit prefix + ack token | ReceiveAlwaysOn |
//! | Resetting | reinitialize transceiver | Initial |
//!
//! ## Sending
//!
//! `send` and `send_raw` busy-wait: they keep servicing completions, dispatching
//! events and stepping until the link is `ReadyForTraffic`, then load the
//! outbound frame and step once. The wait has no bound. If the receiver never
//! disables, or no ack/timeout/reset completion ever arrives while waiting for
//! an ack, the call does not return.
//!
//! Timeouts never retransmit; the link just goes back to receiving.

use embassy_time::{Duration, Instant, Ticker};
use log::{Level, log};
use rand_core::{RngCore, SeedableRng};
use rand_wyrand::WyRand;

use crate::contest::{self, ContestChallenge, Operator, QuestionText, ResultText};
use crate::event_dispatcher::{self, LinkEvent};
use crate::messages::{Frame, QueueMessageKind, QueuedMessage, ReceivedFrame};
use crate::radio_devices::{Indication, RxTimeout, Transceiver, link_quality_dbm};
use crate::rx_handler;
use crate::{DeliveryQueue, EventQueue, LinkConfiguration, RADIO_ACK, RADIO_PREFIX, RADIO_RX_TIMEOUT_COUNT};

/// Minimum time between two challenges of the contest sender
pub const CONTEST_CHALLENGE_INTERVAL: Duration = Duration::from_millis(250);
/// Upper bound of the random delay added to the challenge interval
const CONTEST_CHALLENGE_JITTER_MAX_MS: u64 = 50;

/// States of the link state machine, see the module documentation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    Initial,
    Resetting,
    ReceiveAlwaysOn,
    ReadyForTraffic,
    Transmitting,
    WaitingForAck,
    TransmittingAck,
}

/// Result of handling one message taken from the delivery queue
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Sniffed frame, reported while sniffing is still enabled
    Sniffed { channel: u8, message: QueuedMessage },
    /// A contest question was received and answered over the link
    ContestAnswered { question: QueuedMessage, answer: ResultText },
    /// A contest answer was checked against the live challenge
    ContestAnswer { message: QueuedMessage, winner: bool },
    /// Prefixed frame accepted by the application sub-prefix
    ApplicationData(QueuedMessage),
}

struct ContestSender {
    enabled: bool,
    next_index: usize,
    next_due: Option<Instant>,
    rng: WyRand,
}

/// All link state, owned by the polled context
///
/// The completion side only borrows it shared: it reads state and
/// configuration, pushes into the delivery queue and raises events.
pub struct LinkContext {
    pub(crate) state: LinkState,
    config: LinkConfiguration,
    application_sub_prefix: Option<&'static str>,
    tx_frame: Frame,
    delivery_queue: DeliveryQueue,
    events: EventQueue,
    live_challenge: Option<ContestChallenge>,
    contest_sender: ContestSender,
}

impl LinkContext {
    /// Fresh context in `Initial` with empty queues and no live challenge
    pub fn new(config: LinkConfiguration) -> Self {
        LinkContext {
            state: LinkState::Initial,
            config,
            application_sub_prefix: None,
            tx_frame: Frame::new(),
            delivery_queue: DeliveryQueue::new(),
            events: EventQueue::new(),
            live_challenge: None,
            contest_sender: ContestSender {
                enabled: false,
                next_index: 0,
                next_due: None,
                rng: WyRand::seed_from_u64(0),
            },
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn configuration(&self) -> &LinkConfiguration {
        &self.config
    }

    /// Queue of classified messages waiting for the polled loop
    pub fn delivery_queue(&self) -> &DeliveryQueue {
        &self.delivery_queue
    }

    /// Last challenge this node issued, answers are checked against it
    pub fn live_challenge(&self) -> Option<&ContestChallenge> {
        self.live_challenge.as_ref()
    }

    pub fn application_sub_prefix(&self) -> Option<&'static str> {
        self.application_sub_prefix
    }

    /// Frames whose text after the link prefix starts with `sub_prefix` are
    /// delivered to the application
    pub fn set_application_sub_prefix(&mut self, sub_prefix: Option<&'static str>) {
        self.application_sub_prefix = sub_prefix;
    }

    /// Receive completion entry point, callable from interrupt context
    pub fn data_indication(&self, received: &ReceivedFrame) -> LinkEvent {
        rx_handler::classify(self, received)
    }

    /// Transceiver reset entry point, callable from interrupt context
    pub fn reset_indication(&self) {
        self.raise_event(LinkEvent::Reset);
    }

    pub(crate) fn raise_event(&self, event: LinkEvent) {
        if self.events.try_send(event).is_err() {
            log!(Level::Warn, "Event queue full, dropping event {:?}", event);
        }
    }

    pub(crate) fn take_event(&self) -> Option<LinkEvent> {
        self.events.try_receive().ok()
    }
}

/// Half-duplex link over one transceiver
///
/// Owns the [`LinkContext`] and the transceiver. Everything except the
/// indication entry points runs in the polled context.
pub struct RadioLink<T: Transceiver> {
    context: LinkContext,
    transceiver: T,
}

impl<T: Transceiver> RadioLink<T> {
    /// Creates the link in `Initial` and applies channel and output power
    pub fn new(transceiver: T, config: LinkConfiguration) -> Self {
        let mut link = RadioLink {
            context: LinkContext::new(config),
            transceiver,
        };
        link.set_channel(config.channel);
        link.set_output_power(config.output_power);
        log!(
            Level::Debug,
            "Radio link initialized, channel: {}, output power: {}",
            link.context.config.channel,
            link.context.config.output_power
        );
        link
    }

    /// Shared view of the link state, as seen by the completion side
    ///
    /// Drivers that call back from their interrupt handler use
    /// [`LinkContext::data_indication`] and [`LinkContext::reset_indication`] on it.
    pub fn context(&self) -> &LinkContext {
        &self.context
    }

    /// Mutable context, for settings that live on the context
    pub fn context_mut(&mut self) -> &mut LinkContext {
        &mut self.context
    }

    /// Current state of the link state machine
    pub fn state(&self) -> LinkState {
        self.context.state
    }

    /// Configuration as last set through the setters
    pub fn configuration(&self) -> &LinkConfiguration {
        &self.context.config
    }

    /// The driven transceiver
    pub fn transceiver(&self) -> &T {
        &self.transceiver
    }

    /// Mutable access to the transceiver, e.g. for test injection
    pub fn transceiver_mut(&mut self) -> &mut T {
        &mut self.transceiver
    }

    /// Advances the state machine by one step
    pub fn step(&mut self) {
        match self.context.state {
            LinkState::Initial => {
                self.context.state = LinkState::ReceiveAlwaysOn;
            }
            LinkState::ReceiveAlwaysOn => {
                self.context.state = LinkState::ReadyForTraffic;
                if let Err(error) = self.transceiver.rx_enable(RxTimeout::Forever) {
                    log!(Level::Warn, "Failed to arm receiver: {}", error);
                }
            }
            LinkState::ReadyForTraffic | LinkState::WaitingForAck => {}
            LinkState::Transmitting => {
                if let Err(error) = self.transceiver.rx_disable() {
                    // stay in Transmitting, retried on the next step
                    log!(Level::Debug, "{}, retrying transmit", error);
                    return;
                }
                match self.transceiver.transmit(self.context.tx_frame.as_bytes()) {
                    Ok(()) => {
                        if self.context.config.is_contest_mode {
                            self.context.state = LinkState::ReceiveAlwaysOn;
                        } else {
                            self.context.state = LinkState::WaitingForAck;
                            if let Err(error) = self.transceiver.rx_enable(RxTimeout::Ticks(RADIO_RX_TIMEOUT_COUNT)) {
                                log!(Level::Warn, "Failed to arm receiver for ack: {}", error);
                            }
                        }
                    }
                    Err(error) => {
                        log!(Level::Warn, "Transmit failed: {}", error);
                        self.context.state = LinkState::ReceiveAlwaysOn;
                    }
                }
            }
            LinkState::TransmittingAck => {
                let ack = Frame::from_parts(RADIO_PREFIX.as_bytes(), RADIO_ACK.as_bytes());
                if let Err(error) = self.transceiver.transmit(ack.as_bytes()) {
                    log!(Level::Warn, "Ack transmit failed: {}", error);
                }
                self.context.state = LinkState::ReceiveAlwaysOn;
            }
            LinkState::Resetting => {
                self.transceiver.reinitialize();
                self.context.state = LinkState::Initial;
            }
        }
    }

    /// Sends `data` behind the link prefix
    ///
    /// No-op while the link is disabled. Otherwise blocks until the link is
    /// ready, see the module documentation for the unbounded wait.
    pub fn send(&mut self, data: &[u8]) {
        self.transmit_frame(RADIO_PREFIX.as_bytes(), data);
    }

    /// Sends `data` verbatim, for frames that carry their own framing
    pub fn send_raw(&mut self, data: &[u8]) {
        self.transmit_frame(&[], data);
    }

    fn transmit_frame(&mut self, prefix: &[u8], data: &[u8]) {
        if !self.context.config.is_enabled {
            return;
        }
        self.wait_until_ready();
        self.context.tx_frame.set_text(prefix, data);
        self.context.state = LinkState::Transmitting;
        self.step();
    }

    fn wait_until_ready(&mut self) {
        loop {
            self.service_indications();
            self.dispatch_events();
            if self.context.state == LinkState::ReadyForTraffic {
                return;
            }
            self.step();
        }
    }

    /// Feeds completions queued by the transceiver to the classifier
    pub fn service_indications(&mut self) {
        while let Some(indication) = self.transceiver.poll_indication() {
            match indication {
                Indication::Data(received) => {
                    self.context.data_indication(&received);
                }
                Indication::Reset => self.context.reset_indication(),
            }
        }
    }

    /// Applies every pending event in the order raised, returns how many
    pub fn dispatch_events(&mut self) -> usize {
        let mut count = 0;
        while let Some(event) = self.context.take_event() {
            event_dispatcher::dispatch(&mut self.context.state, event);
            count += 1;
        }
        count
    }

    /// One iteration of the application loop
    ///
    /// Services completions, dispatches events, steps the state machine while
    /// enabled and handles at most one queued message.
    pub fn poll(&mut self) -> Option<MessageOutcome> {
        self.service_indications();
        self.dispatch_events();
        if self.context.config.is_enabled {
            self.step();
        }
        let message = self.context.delivery_queue.try_dequeue()?;
        self.handle_message(message)
    }

    /// Handles one message taken from the delivery queue
    ///
    /// # Arguments
    /// * `message` - dequeued message of any kind
    ///
    /// # Returns
    /// The outcome to report, `None` for sniffed frames after sniffing was
    /// switched off and for questions that could not be answered.
    pub fn handle_message(&mut self, message: QueuedMessage) -> Option<MessageOutcome> {
        match message.kind() {
            QueueMessageKind::Sniff => {
                if !self.context.config.is_sniffing {
                    return None;
                }
                Some(MessageOutcome::Sniffed {
                    channel: self.context.config.channel,
                    message,
                })
            }
            QueueMessageKind::ContestQuestion => {
                log!(Level::Info, "Contest question: {}", AsText(message.text()));
                let answer = self.respond_to_question(message.text())?;
                Some(MessageOutcome::ContestAnswered { question: message, answer })
            }
            QueueMessageKind::ContestAnswer => {
                let winner = self.check_answer(message.text());
                if winner {
                    log!(Level::Info, "Found a winner: {}", AsText(message.text()));
                }
                Some(MessageOutcome::ContestAnswer { message, winner })
            }
            QueueMessageKind::ApplicationData => Some(MessageOutcome::ApplicationData(message)),
        }
    }

    /// Sends the question `"a op b = ?"` and makes it the live challenge
    pub fn issue_challenge(&mut self, a: i8, b: i8, operator: Operator) -> QuestionText {
        let challenge = ContestChallenge::new(a, b, operator);
        let question = challenge.question();
        self.send_raw(question.as_bytes());
        log!(Level::Debug, "Challenge issued: {}", question.as_str());
        self.context.live_challenge = Some(challenge);
        question
    }

    /// Parses `text` as a contest expression and issues it as a challenge
    ///
    /// Malformed text is ignored and `None` returned.
    pub fn issue_challenge_text(&mut self, text: &[u8]) -> Option<QuestionText> {
        let message = contest::parse(text).ok()?;
        Some(self.issue_challenge(message.operand_a, message.operand_b, message.operator))
    }

    /// Answers a contest question with the full equation, sent verbatim
    ///
    /// # Arguments
    /// * `text` - received question, `"a op b = ?"`
    ///
    /// # Returns
    /// The answer that was sent, or `None` when `text` is not a question or the
    /// link is disabled and nothing went out.
    pub fn respond_to_question(&mut self, text: &[u8]) -> Option<ResultText> {
        if !self.context.config.is_enabled {
            return None;
        }
        let message = contest::parse(text).ok().filter(|m| m.is_question)?;
        let answer = contest::format_result(message.operand_a, message.operand_b, message.operator);
        log!(Level::Info, "Contest answer: {}", answer.as_str());
        self.send_raw(answer.as_bytes());
        Some(answer)
    }

    /// `true` when `text` starts with the live challenge's expected result
    pub fn check_answer(&self, text: &[u8]) -> bool {
        self.context
            .live_challenge
            .as_ref()
            .is_some_and(|challenge| challenge.is_answered_by(text))
    }

    /// Turns this node into a contest sender cycling through the selected set
    pub fn set_contest_sender(&mut self, enabled: bool, rng_seed: u64) {
        let sender = &mut self.context.contest_sender;
        sender.enabled = enabled;
        sender.next_index = 0;
        sender.next_due = None;
        sender.rng = WyRand::seed_from_u64(rng_seed);
    }

    /// Issues the next challenge of the selected contest set when one is due
    pub fn poll_contest_sender(&mut self, now: Instant) -> Option<QuestionText> {
        let sender = &self.context.contest_sender;
        if !sender.enabled || !self.context.config.is_contest_mode {
            return None;
        }
        if sender.next_due.is_some_and(|due| now < due) {
            return None;
        }
        let set = contest::contest_set(self.context.config.contest_number)?;
        let operation = set[sender.next_index % set.len()];

        let question = self.issue_challenge(operation.a, operation.b, operation.operator);

        let sender = &mut self.context.contest_sender;
        sender.next_index = (sender.next_index + 1) % set.len();
        let jitter = Duration::from_millis(sender.rng.next_u64() % CONTEST_CHALLENGE_JITTER_MAX_MS);
        sender.next_due = Some(now + CONTEST_CHALLENGE_INTERVAL + jitter);
        Some(question)
    }

    /// Enables or disables the link
    ///
    /// A disabled link neither steps nor sends; completions are still classified.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.context.config.is_enabled = enabled;
    }

    /// Queues a raw copy of every good frame while on
    pub fn set_sniffing(&mut self, sniffing: bool) {
        self.context.config.is_sniffing = sniffing;
    }

    /// Contest mode classifies contest frames and skips the ack wait after sends
    pub fn set_contest_mode(&mut self, contest_mode: bool) {
        self.context.config.is_contest_mode = contest_mode;
    }

    /// See [`LinkContext::set_application_sub_prefix`]
    pub fn set_application_sub_prefix(&mut self, sub_prefix: Option<&'static str>) {
        self.context.set_application_sub_prefix(sub_prefix);
    }

    /// Selects the challenge set, the contest sender restarts at its first entry
    pub fn set_contest_number(&mut self, contest_number: u8) {
        self.context.config.contest_number = contest_number;
        self.context.contest_sender.next_index = 0;
    }

    /// Stores `channel & 0xF` and applies it to the transceiver
    pub fn set_channel(&mut self, channel: u8) {
        let channel = channel & 0x0F;
        self.context.config.channel = channel;
        if let Err(error) = self.transceiver.set_channel(channel) {
            log!(Level::Warn, "Failed to set channel {}: {}", channel, error);
        }
    }

    /// Stores `power & 0xF` and applies it to the transceiver
    pub fn set_output_power(&mut self, power: u8) {
        let power = power & 0x0F;
        self.context.config.output_power = power;
        if let Err(error) = self.transceiver.set_output_power(power) {
            log!(Level::Warn, "Failed to set output power {}: {}", power, error);
        }
    }

    /// Received power of the last frame in dBm
    pub fn link_quality_dbm(&self) -> i16 {
        link_quality_dbm(self.transceiver.link_quality())
    }
}

/// Drives `link` forever from an async executor
///
/// Polls the link and the contest sender every `period` and hands each message
/// outcome to `on_outcome`.
pub async fn run_link<T: Transceiver>(link: &mut RadioLink<T>, period: Duration, mut on_outcome: impl FnMut(MessageOutcome)) -> ! {
    let mut ticker = Ticker::every(period);
    log!(Level::Info, "Radio link task started");
    loop {
        if let Some(outcome) = link.poll() {
            on_outcome(outcome);
        }
        link.poll_contest_sender(Instant::now());
        ticker.next().await;
    }
}

/// Lossy text view of frame bytes for log output
pub(crate) struct AsText<'a>(pub(crate) &'a [u8]);

impl core::fmt::Display for AsText<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for &byte in self.0 {
            let c = if byte.is_ascii_graphic() || byte == b' ' { byte as char } else { '.' };
            core::fmt::Write::write_char(f, c)?;
        }
        Ok(())
    }
}
