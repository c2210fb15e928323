#![cfg(all(feature = "std", feature = "radio-device-echo"))]

use embassy_time::Duration;
use futures::FutureExt;
use packet_radio_link::radio_devices::EchoTransceiver;
use packet_radio_link::shell::format_outcome;
use packet_radio_link::{LinkConfiguration, LinkState, MessageOutcome, Operator, RadioLink, RxTimeout, parse_command, run_link};

fn ready_link(config: LinkConfiguration) -> RadioLink<EchoTransceiver> {
    let mut link = RadioLink::new(EchoTransceiver::silent(), config);
    while link.state() != LinkState::ReadyForTraffic {
        link.poll();
    }
    link
}

fn contest_config() -> LinkConfiguration {
    let mut config = LinkConfiguration::new();
    config.is_contest_mode = true;
    config
}

/// Polls until a message outcome shows up or `limit` polls passed
fn poll_for_outcome(link: &mut RadioLink<EchoTransceiver>, limit: usize) -> Option<MessageOutcome> {
    (0..limit).find_map(|_| link.poll())
}

fn run_line(link: &mut RadioLink<EchoTransceiver>, line: &str) -> String {
    let mut out = String::new();
    let command = parse_command(line).unwrap().unwrap();
    link.execute(command, &mut out).unwrap();
    out
}

#[test]
fn radio_off_makes_send_touch_nothing() {
    let mut link = ready_link(LinkConfiguration::new());
    let before = link.transceiver().interaction_count();
    run_line(&mut link, "radio off");
    run_line(&mut link, "radio send x");
    assert_eq!(link.transceiver().interaction_count(), before);
    assert_eq!(link.state(), LinkState::ReadyForTraffic);
}

#[test]
fn disabled_link_does_not_step() {
    let mut link = RadioLink::new(EchoTransceiver::silent(), LinkConfiguration::new());
    link.set_enabled(false);
    for _ in 0..5 {
        assert!(link.poll().is_none());
    }
    assert_eq!(link.state(), LinkState::Initial);
}

#[test]
fn ack_timeout_recovers_without_resend() {
    let mut link = ready_link(LinkConfiguration::new());
    run_line(&mut link, "radio send ping");
    assert_eq!(link.state(), LinkState::WaitingForAck);
    assert_eq!(link.transceiver().last_rx_timeout(), Some(RxTimeout::Ticks(0xB000)));

    for _ in 0..5 {
        link.poll();
    }
    assert_eq!(link.state(), LinkState::ReadyForTraffic);
    assert_eq!(link.transceiver().transmit_count(), 1);
}

#[test]
fn second_send_only_goes_out_after_the_first_resolves() {
    let mut link = ready_link(LinkConfiguration::new());
    link.send(b"one");
    assert_eq!(link.transceiver().transmit_count(), 1);
    link.send(b"two");
    assert_eq!(link.transceiver().transmit_count(), 2);
    assert_eq!(link.transceiver().last_transmitted().unwrap().text(), b"ESTtwo");
}

#[test]
fn acknowledged_send_returns_to_ready() {
    let mut link = ready_link(LinkConfiguration::new());
    link.send(b"ping");
    link.transceiver_mut().inject_frame(b"ESTack");
    link.poll();
    assert_eq!(link.state(), LinkState::ReadyForTraffic);
    assert_eq!(link.transceiver().last_rx_timeout(), Some(RxTimeout::Forever));
}

#[test]
fn incoming_data_is_acknowledged_once() {
    let mut link = ready_link(LinkConfiguration::new());
    link.transceiver_mut().inject_frame(b"ESThi");
    for _ in 0..4 {
        link.poll();
    }
    assert_eq!(link.transceiver().transmit_count(), 1);
    assert_eq!(link.transceiver().last_transmitted().unwrap().as_bytes(), b"ESTack\0");
    assert_eq!(link.state(), LinkState::ReadyForTraffic);
}

#[test]
fn channel_command_masks_and_reports() {
    let mut link = ready_link(LinkConfiguration::new());
    link.set_channel(20);
    assert_eq!(link.configuration().channel, 4);
    assert!(parse_command("radio channel 20").is_err());

    run_line(&mut link, "radio channel 11");
    assert_eq!(link.transceiver().channel(), 11);
    let status = run_line(&mut link, "radio status");
    assert!(status.contains("channel       : 11"));
}

#[test]
fn challenge_and_winning_answer() {
    let mut link = ready_link(contest_config());
    run_line(&mut link, "radio challenge 3 + 4 = ?");
    assert_eq!(link.transceiver().last_transmitted().unwrap().text(), b"3 + 4 = ?");

    link.transceiver_mut().inject_frame(b"3 + 4 = 7 Joe TheBest!");
    let outcome = poll_for_outcome(&mut link, 5);
    assert!(matches!(outcome, Some(MessageOutcome::ContestAnswer { winner: true, .. })));

    let mut out = String::new();
    format_outcome(&outcome.unwrap(), &mut out).unwrap();
    assert!(out.starts_with("****FOUND A WINNER!!!!!!"));
}

#[test]
fn wrong_answer_is_not_a_winner() {
    let mut link = ready_link(contest_config());
    link.issue_challenge(3, 4, Operator::Add);
    link.transceiver_mut().inject_frame(b"3 + 4 = 8 Joe TheBest!");
    let outcome = poll_for_outcome(&mut link, 5);
    assert!(matches!(outcome, Some(MessageOutcome::ContestAnswer { winner: false, .. })));
}

#[test]
fn question_is_answered_with_full_equation() {
    let mut link = ready_link(contest_config());
    link.transceiver_mut().inject_frame(b"3 / 2 = ?");
    let outcome = poll_for_outcome(&mut link, 5);
    match outcome {
        Some(MessageOutcome::ContestAnswered { answer, .. }) => assert_eq!(answer.as_str(), "3 / 2 = 1 Joe TheBest!"),
        other => panic!("expected an answered question, got {:?}", other),
    }
    assert_eq!(link.transceiver().last_transmitted().unwrap().text(), b"3 / 2 = 1 Joe TheBest!");
}

#[test]
fn contest_frames_are_unknown_outside_contest_mode() {
    let mut link = ready_link(LinkConfiguration::new());
    link.transceiver_mut().inject_frame(b"3 + 4 = ?");
    assert!(poll_for_outcome(&mut link, 4).is_none());
    assert_eq!(link.transceiver().transmit_count(), 0);
}

#[test]
fn transceiver_reset_reinitializes_and_recovers() {
    let mut link = ready_link(LinkConfiguration::new());
    link.transceiver_mut().inject_reset();
    link.poll();
    assert_eq!(link.transceiver().reinitialize_count(), 1);
    link.poll();
    link.poll();
    assert_eq!(link.state(), LinkState::ReadyForTraffic);
}

#[test]
fn failing_rx_disable_delays_transmit() {
    let mut link = ready_link(LinkConfiguration::new());
    link.transceiver_mut().fail_rx_disable(3);
    link.send(b"x");
    assert_eq!(link.state(), LinkState::Transmitting);
    for _ in 0..3 {
        link.step();
    }
    assert_eq!(link.transceiver().transmit_count(), 1);
    assert_eq!(link.state(), LinkState::WaitingForAck);
}

#[test]
fn overflowing_frame_is_dropped() {
    let mut link = ready_link(LinkConfiguration::new());
    link.set_sniffing(true);
    link.transceiver_mut().inject_frame(b"ESTthis frame is far too long for the receiver");
    assert!(poll_for_outcome(&mut link, 4).is_none());
    assert_eq!(link.transceiver().transmit_count(), 0);
    assert_eq!(link.state(), LinkState::ReadyForTraffic);
}

#[test]
fn sniff_dump_shows_raw_frame() {
    let mut link = ready_link(LinkConfiguration::new());
    run_line(&mut link, "radio sniff on");
    link.transceiver_mut().inject_frame(b"ESTack");
    let outcome = poll_for_outcome(&mut link, 4).unwrap();
    let mut out = String::new();
    format_outcome(&outcome, &mut out).unwrap();
    assert_eq!(out, "ch #:5 size:7 ASCII: ESTack hex: 45 53 54 61 63 6B 00\n");
}

#[test]
fn loopback_device_echoes_own_frames() {
    let mut link = RadioLink::new(EchoTransceiver::new(), LinkConfiguration::new());
    link.set_sniffing(true);
    link.send(b"hi");
    let outcome = poll_for_outcome(&mut link, 4);
    match outcome {
        Some(MessageOutcome::Sniffed { message, .. }) => assert_eq!(message.text(), b"ESThi"),
        other => panic!("expected own frame sniffed, got {:?}", other),
    }
}

#[test]
fn run_link_polls_before_first_tick() {
    let mut link = ready_link(LinkConfiguration::new());
    link.set_sniffing(true);
    link.transceiver_mut().inject_frame(b"hey");

    let mut outcomes = Vec::new();
    let pending = run_link(&mut link, Duration::from_millis(10), |outcome| outcomes.push(outcome)).now_or_never();
    assert!(pending.is_none());
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0], MessageOutcome::Sniffed { .. }));
}
