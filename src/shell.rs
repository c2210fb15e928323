//! # Radio Shell Commands
//!
//! Line oriented command surface of the link. Keywords are case sensitive and
//! every command except the plain `help` / `status` aliases starts with `radio`.
//!
//! | Command | Effect |
//! |---|---|
//! | `radio help`, `radio status` | print help / status |
//! | `radio on`, `radio off` | enable / disable the link |
//! | `radio sniff on`, `radio sniff off` | toggle promiscuous capture |
//! | `radio contest on`, `radio contest off`, `radio contest <digit>` | contest mode / set selection |
//! | `radio challenge <a op b = ?>` | issue a challenge, malformed text is ignored |
//! | `radio channel <0..15>`, `radio power <0..15>` | transceiver settings |
//! | `radio send <text>` | send with the link prefix |
//!
//! Output goes to any [`core::fmt::Write`] sink so the same code serves a UART
//! console and a hosted terminal.

use core::fmt::{self, Write};

use crate::link::{AsText, MessageOutcome, RadioLink};
use crate::radio_devices::Transceiver;
use crate::{RADIO_ACK, RADIO_PREFIX};

const MAX_SETTING_VALUE: i32 = 15;

/// A parsed command line, text arguments borrow from the line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RadioCommand<'a> {
    Help,
    Status,
    On,
    Off,
    SniffOn,
    SniffOff,
    ContestOn,
    ContestOff,
    ContestNumber(u8),
    /// Contest expression, parsed when executed
    Challenge(&'a str),
    Channel(u8),
    Power(u8),
    Send(&'a str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandError {
    /// Channel or power argument missing, not a number or outside 0..15
    InvalidArgument,
    /// Contest number is not a single digit
    InvalidContestNumber,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::InvalidArgument => f.write_str("Wrong argument, must be in the range 0..15"),
            CommandError::InvalidContestNumber => f.write_str("Wrong argument, contest number must be a single digit"),
        }
    }
}

/// Parses one command line
///
/// Returns `Ok(None)` for lines that are not radio commands, so the caller can
/// offer them to other command groups.
pub fn parse_command(line: &str) -> Result<Option<RadioCommand<'_>>, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let command = match line {
        "help" | "radio help" => RadioCommand::Help,
        "status" | "radio status" => RadioCommand::Status,
        "radio on" => RadioCommand::On,
        "radio off" => RadioCommand::Off,
        "radio sniff on" => RadioCommand::SniffOn,
        "radio sniff off" => RadioCommand::SniffOff,
        "radio contest on" => RadioCommand::ContestOn,
        "radio contest off" => RadioCommand::ContestOff,
        _ => return parse_with_argument(line),
    };
    Ok(Some(command))
}

fn parse_with_argument(line: &str) -> Result<Option<RadioCommand<'_>>, CommandError> {
    if let Some(number) = line.strip_prefix("radio contest ") {
        return match number.as_bytes() {
            [digit] if digit.is_ascii_digit() => Ok(Some(RadioCommand::ContestNumber(digit - b'0'))),
            _ => Err(CommandError::InvalidContestNumber),
        };
    }
    if let Some(expression) = line.strip_prefix("radio challenge") {
        return Ok(Some(RadioCommand::Challenge(expression.trim_start())));
    }
    if let Some(argument) = line.strip_prefix("radio channel") {
        return parse_setting(argument).map(|channel| Some(RadioCommand::Channel(channel)));
    }
    if let Some(argument) = line.strip_prefix("radio power") {
        return parse_setting(argument).map(|power| Some(RadioCommand::Power(power)));
    }
    if let Some(text) = line.strip_prefix("radio send") {
        // one separator, the rest is sent as typed
        return Ok(Some(RadioCommand::Send(text.strip_prefix(' ').unwrap_or(text))));
    }
    Ok(None)
}

fn parse_setting(argument: &str) -> Result<u8, CommandError> {
    match argument.trim().parse::<i32>() {
        Ok(value) if (0..=MAX_SETTING_VALUE).contains(&value) => Ok(value as u8),
        _ => Err(CommandError::InvalidArgument),
    }
}

impl<T: Transceiver> RadioLink<T> {
    /// Applies a parsed command, printing help and status to `out`
    pub fn execute(&mut self, command: RadioCommand<'_>, out: &mut impl Write) -> fmt::Result {
        match command {
            RadioCommand::Help => print_help(out)?,
            RadioCommand::Status => self.print_status(out)?,
            RadioCommand::On => self.set_enabled(true),
            RadioCommand::Off => self.set_enabled(false),
            RadioCommand::SniffOn => self.set_sniffing(true),
            RadioCommand::SniffOff => self.set_sniffing(false),
            RadioCommand::ContestOn => self.set_contest_mode(true),
            RadioCommand::ContestOff => self.set_contest_mode(false),
            RadioCommand::ContestNumber(number) => self.set_contest_number(number),
            RadioCommand::Challenge(expression) => {
                if self.issue_challenge_text(expression.as_bytes()).is_none() {
                    log::debug!("Ignoring malformed challenge '{}'", expression);
                }
            }
            RadioCommand::Channel(channel) => self.set_channel(channel),
            RadioCommand::Power(power) => self.set_output_power(power),
            RadioCommand::Send(text) => self.send(text.as_bytes()),
        }
        Ok(())
    }

    /// Prints transceiver state, link quality, channel, power, framing tokens
    /// and contest settings
    pub fn print_status(&self, out: &mut impl Write) -> fmt::Result {
        let config = self.configuration();
        writeln!(out, "Radio")?;
        writeln!(out, "  transceiver   : {}", on_off(config.is_enabled))?;
        writeln!(out, "  sniffing      : {}", on_off(config.is_sniffing))?;
        writeln!(out, "  LQ            : {} dBm", self.link_quality_dbm())?;
        writeln!(out, "  channel       : {}", config.channel)?;
        writeln!(out, "  outputPower   : {}", config.output_power)?;
        writeln!(out, "  prefix        : {}", RADIO_PREFIX)?;
        writeln!(out, "  ACK           : {}", RADIO_ACK)?;
        writeln!(
            out,
            "  contest       : {}, #:{}",
            if config.is_contest_mode { "yes" } else { "no" },
            config.contest_number
        )
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

/// Prints one line per command group entry
pub fn print_help(out: &mut impl Write) -> fmt::Result {
    const HELP: [(&str, &str); 9] = [
        ("radio", "Group of radio commands"),
        ("  help|status", "Shows radio help or status"),
        ("  on|off", "Turns the radio on or off"),
        ("  sniff on|off", "Turns packet sniffing on or off"),
        ("  channel <number>", "Switches to the given channel. Channel must be in the range 0..15"),
        ("  power <number>", "Changes the output power. Power must be in the range 0..15"),
        ("  send <string>", "Send a string using the wireless transceiver"),
        ("  challenge a op b = ?", "Send a contest using the wireless transceiver"),
        ("  contest on|off|<nr>", "Turns the radio contest on or off or specifies contest number"),
    ];
    for (command, description) in HELP {
        writeln!(out, "{:<24}; {}", command, description)?;
    }
    Ok(())
}

/// Renders a message outcome the way the console shows it
///
/// Sniffed frames are dumped as ASCII and hex, a matching contest answer is
/// announced as a winner. Losing answers print nothing.
pub fn format_outcome(outcome: &MessageOutcome, out: &mut impl Write) -> fmt::Result {
    match outcome {
        MessageOutcome::Sniffed { channel, message } => {
            let payload = message.payload();
            write!(out, "ch #:{} size:{} ASCII: {} hex:", channel, message.frame_length(), AsText(message.text()))?;
            for byte in payload {
                write!(out, " {:02X}", byte)?;
            }
            writeln!(out)
        }
        MessageOutcome::ContestAnswered { question, answer } => {
            writeln!(out, "Contest question: {}", AsText(question.text()))?;
            writeln!(out, "Contest answer: {}", answer.as_str())
        }
        MessageOutcome::ContestAnswer { message, winner: true } => {
            writeln!(out, "****FOUND A WINNER!!!!!!")?;
            writeln!(out, "{}", AsText(message.text()))
        }
        MessageOutcome::ContestAnswer { winner: false, .. } => Ok(()),
        MessageOutcome::ApplicationData(message) => {
            writeln!(out, "Data: {}", AsText(message.application_payload()))
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::messages::{QueueMessageKind, QueuedMessage};
    use crate::radio_devices::EchoTransceiver;
    use crate::{LinkConfiguration, LinkState};

    fn link() -> RadioLink<EchoTransceiver> {
        RadioLink::new(EchoTransceiver::silent(), LinkConfiguration::new())
    }

    #[test]
    fn fixed_commands_parse() {
        assert_eq!(parse_command("radio on"), Ok(Some(RadioCommand::On)));
        assert_eq!(parse_command("radio off\r\n"), Ok(Some(RadioCommand::Off)));
        assert_eq!(parse_command("radio sniff on"), Ok(Some(RadioCommand::SniffOn)));
        assert_eq!(parse_command("radio contest off"), Ok(Some(RadioCommand::ContestOff)));
        assert_eq!(parse_command("help"), Ok(Some(RadioCommand::Help)));
        assert_eq!(parse_command("radio status"), Ok(Some(RadioCommand::Status)));
    }

    #[test]
    fn keywords_are_case_sensitive_and_foreign_lines_pass_through() {
        assert_eq!(parse_command("Radio on"), Ok(None));
        assert_eq!(parse_command("led on"), Ok(None));
        assert_eq!(parse_command(""), Ok(None));
    }

    #[test]
    fn channel_and_power_arguments_are_range_checked() {
        assert_eq!(parse_command("radio channel 0"), Ok(Some(RadioCommand::Channel(0))));
        assert_eq!(parse_command("radio channel 15"), Ok(Some(RadioCommand::Channel(15))));
        assert_eq!(parse_command("radio power 7"), Ok(Some(RadioCommand::Power(7))));
        assert_eq!(parse_command("radio channel 16"), Err(CommandError::InvalidArgument));
        assert_eq!(parse_command("radio channel -1"), Err(CommandError::InvalidArgument));
        assert_eq!(parse_command("radio power abc"), Err(CommandError::InvalidArgument));
        assert_eq!(parse_command("radio power"), Err(CommandError::InvalidArgument));
        assert_eq!(
            CommandError::InvalidArgument.to_string(),
            "Wrong argument, must be in the range 0..15"
        );
    }

    #[test]
    fn contest_number_is_a_single_digit() {
        assert_eq!(parse_command("radio contest 1"), Ok(Some(RadioCommand::ContestNumber(1))));
        assert_eq!(parse_command("radio contest 12"), Err(CommandError::InvalidContestNumber));
        assert_eq!(parse_command("radio contest x"), Err(CommandError::InvalidContestNumber));
    }

    #[test]
    fn text_arguments_are_borrowed_from_the_line() {
        assert_eq!(parse_command("radio send hello world"), Ok(Some(RadioCommand::Send("hello world"))));
        assert_eq!(parse_command("radio challenge 3 + 4 = ?"), Ok(Some(RadioCommand::Challenge("3 + 4 = ?"))));
    }

    #[test]
    fn off_command_turns_send_into_a_no_op() {
        let mut link = link();
        let mut out = String::new();
        link.execute(RadioCommand::Off, &mut out).unwrap();
        link.execute(RadioCommand::Send("hello"), &mut out).unwrap();
        assert_eq!(link.transceiver().interaction_count(), 0);
        assert_eq!(link.state(), LinkState::Initial);
        assert!(out.is_empty());
    }

    #[test]
    fn send_command_transmits_with_prefix() {
        let mut link = link();
        link.execute(RadioCommand::Send("hello"), &mut String::new()).unwrap();
        assert_eq!(link.transceiver().last_transmitted().unwrap().text(), b"ESThello");
    }

    #[test]
    fn malformed_challenge_is_silently_ignored() {
        let mut link = link();
        let mut out = String::new();
        link.execute(RadioCommand::Challenge("three plus four"), &mut out).unwrap();
        assert_eq!(link.transceiver().transmit_count(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn status_reports_configuration() {
        let mut link = link();
        link.transceiver_mut().set_link_quality(100);
        link.execute(RadioCommand::Channel(3), &mut String::new()).unwrap();
        link.execute(RadioCommand::ContestNumber(1), &mut String::new()).unwrap();

        let mut out = String::new();
        link.execute(RadioCommand::Status, &mut out).unwrap();
        assert!(out.contains("transceiver   : on"));
        assert!(out.contains("LQ            : -50 dBm"));
        assert!(out.contains("channel       : 3"));
        assert!(out.contains("outputPower   : 15"));
        assert!(out.contains("prefix        : EST"));
        assert!(out.contains("contest       : no, #:1"));
    }

    #[test]
    fn help_lists_every_command() {
        let mut out = String::new();
        print_help(&mut out).unwrap();
        for keyword in ["on|off", "sniff", "channel", "power", "send", "challenge", "contest"] {
            assert!(out.contains(keyword), "help misses {}", keyword);
        }
    }

    #[test]
    fn sniffed_frame_is_dumped_as_ascii_and_hex() {
        let outcome = MessageOutcome::Sniffed {
            channel: 5,
            message: QueuedMessage::new(QueueMessageKind::Sniff, b"hi\0"),
        };
        let mut out = String::new();
        format_outcome(&outcome, &mut out).unwrap();
        assert_eq!(out, "ch #:5 size:3 ASCII: hi hex: 68 69 00\n");
    }

    #[test]
    fn sniff_dump_reports_received_size_of_truncated_frame() {
        let outcome = MessageOutcome::Sniffed {
            channel: 2,
            message: QueuedMessage::new(QueueMessageKind::Sniff, &[b'a'; 40]),
        };
        let mut out = String::new();
        format_outcome(&outcome, &mut out).unwrap();
        assert!(out.starts_with("ch #:2 size:40 ASCII: "));
        assert_eq!(out.matches(" 61").count(), 30);
    }

    #[test]
    fn only_winning_answers_are_announced() {
        let message = QueuedMessage::new(QueueMessageKind::ContestAnswer, b"3 + 4 = 7 Joe TheBest!\0");
        let mut out = String::new();
        format_outcome(&MessageOutcome::ContestAnswer { message, winner: false }, &mut out).unwrap();
        assert!(out.is_empty());
        format_outcome(&MessageOutcome::ContestAnswer { message, winner: true }, &mut out).unwrap();
        assert_eq!(out, "****FOUND A WINNER!!!!!!\n3 + 4 = 7 Joe TheBest!\n");
    }
}
