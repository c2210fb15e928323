//! # Contest Protocol
//!
//! Text based arithmetic challenge/response carried in unprefixed frames:
//!
//! ```text
//! question: "<a> <op> <b> = ?"
//! answer:   "<a> <op> <b> = <r>"   (free text may follow the result)
//! ```
//!
//! Operands are signed 8-bit integers and `<op>` is one of `+ - * /`. Results are
//! computed with wrapping 8-bit arithmetic, which is what the deployed nodes
//! render. A division by zero renders `ERROR` instead of a number.
//!
//! Only one challenge is live at a time; issuing a new one overwrites the old.

use core::fmt::{self, Write};

use heapless::String;

use crate::QUEUE_PAYLOAD_SIZE;

/// Decorative signature appended to every computed result
pub const CONTEST_RESULT_SUFFIX: &str = " Joe TheBest!";
/// Capacity of a rendered result (`"A op B = R"` plus suffix)
pub const CONTEST_RESULT_TEXT_SIZE: usize = 36;
/// Capacity of a rendered question (`"A op B = ?"`)
pub const CONTEST_QUESTION_TEXT_SIZE: usize = 16;

/// Leading bytes of the expected result an answer is compared on
///
/// Answers reach the check through a delivery queue slot, which keeps at most
/// `QUEUE_PAYLOAD_SIZE` bytes of the frame.
pub const CONTEST_ANSWER_COMPARE_SIZE: usize = QUEUE_PAYLOAD_SIZE;

pub type ResultText = String<CONTEST_RESULT_TEXT_SIZE>;
pub type QuestionText = String<CONTEST_QUESTION_TEXT_SIZE>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'+' => Some(Operator::Add),
            b'-' => Some(Operator::Subtract),
            b'*' => Some(Operator::Multiply),
            b'/' => Some(Operator::Divide),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(self.as_char())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContestParseError {
    /// Expected a decimal number
    NotANumber,
    /// Operand does not fit a signed 8-bit integer
    OperandOutOfRange,
    /// Operator is not one of `+ - * /`
    UnsupportedOperator,
    MissingEquals,
}

impl fmt::Display for ContestParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContestParseError::NotANumber => f.write_str("not a number"),
            ContestParseError::OperandOutOfRange => f.write_str("operand out of range -128..127"),
            ContestParseError::UnsupportedOperator => f.write_str("operator must be one of + - * /"),
            ContestParseError::MissingEquals => f.write_str("missing '='"),
        }
    }
}

/// A successfully parsed contest frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContestMessage {
    pub operand_a: i8,
    pub operand_b: i8,
    pub operator: Operator,
    /// `true` for `= ?`, `false` when a literal result follows the `=`
    pub is_question: bool,
}

/// Outcome of evaluating an operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Evaluation {
    Value(i8),
    /// Division by zero, rendered as `ERROR`
    Error,
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Value(value) => write!(f, "{}", value),
            Evaluation::Error => f.write_str("ERROR"),
        }
    }
}

/// Left-to-right cursor over contest text
struct Cursor<'a> {
    text: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a [u8]) -> Self {
        Cursor { text, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.text.get(self.pos).copied().filter(|&b| b != 0)
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    /// Parses an optionally negative decimal number, skipping leading spaces
    fn number(&mut self) -> Result<i32, ContestParseError> {
        self.skip_spaces();
        let negative = self.peek() == Some(b'-');
        if negative {
            self.pos += 1;
        }
        let start = self.pos;
        let mut value: i32 = 0;
        while let Some(digit) = self.peek().filter(u8::is_ascii_digit) {
            value = value.saturating_mul(10).saturating_add((digit - b'0') as i32);
            self.pos += 1;
        }
        if self.pos == start {
            return Err(ContestParseError::NotANumber);
        }
        Ok(if negative { -value } else { value })
    }

    fn operand(&mut self) -> Result<i8, ContestParseError> {
        let value = self.number()?;
        i8::try_from(value).map_err(|_| ContestParseError::OperandOutOfRange)
    }
}

/// Parses a contest question or answer
///
/// Strict left to right: operand A, operator, operand B, `=`, then either `?` or
/// a literal result. Anything after the `?` or the result is ignored.
pub fn parse(text: &[u8]) -> Result<ContestMessage, ContestParseError> {
    let mut cursor = Cursor::new(text);
    let operand_a = cursor.operand()?;
    cursor.skip_spaces();
    let operator = cursor.peek().and_then(Operator::from_byte).ok_or(ContestParseError::UnsupportedOperator)?;
    cursor.pos += 1;
    let operand_b = cursor.operand()?;
    cursor.skip_spaces();
    if cursor.peek() != Some(b'=') {
        return Err(ContestParseError::MissingEquals);
    }
    cursor.pos += 1;
    cursor.skip_spaces();
    let is_question = cursor.peek() == Some(b'?');
    if !is_question {
        // literal result, any 32-bit value is accepted
        cursor.number()?;
    }
    Ok(ContestMessage {
        operand_a,
        operand_b,
        operator,
        is_question,
    })
}

pub fn evaluate(a: i8, b: i8, operator: Operator) -> Evaluation {
    match operator {
        Operator::Add => Evaluation::Value(a.wrapping_add(b)),
        Operator::Subtract => Evaluation::Value(a.wrapping_sub(b)),
        Operator::Multiply => Evaluation::Value(a.wrapping_mul(b)),
        Operator::Divide if b == 0 => Evaluation::Error,
        Operator::Divide => Evaluation::Value(a.wrapping_div(b)),
    }
}

/// Renders `"A op B = R"` followed by [`CONTEST_RESULT_SUFFIX`]
pub fn format_result(a: i8, b: i8, operator: Operator) -> ResultText {
    let mut text = ResultText::new();
    // worst case is 31 characters, capacity is never exceeded
    let _ = write!(text, "{} {} {} = {}{}", a, operator, b, evaluate(a, b, operator), CONTEST_RESULT_SUFFIX);
    text
}

/// Renders the question `"A op B = ?"`
pub fn format_question(a: i8, b: i8, operator: Operator) -> QuestionText {
    let mut text = QuestionText::new();
    let _ = write!(text, "{} {} {} = ?", a, operator, b);
    text
}

/// The live challenge: the last question this node issued
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContestChallenge {
    pub operand_a: i8,
    pub operand_b: i8,
    pub operator: Operator,
    pub expected_result_text: ResultText,
}

impl ContestChallenge {
    pub fn new(operand_a: i8, operand_b: i8, operator: Operator) -> Self {
        ContestChallenge {
            operand_a,
            operand_b,
            operator,
            expected_result_text: format_result(operand_a, operand_b, operator),
        }
    }

    pub fn question(&self) -> QuestionText {
        format_question(self.operand_a, self.operand_b, self.operator)
    }

    /// `true` if `answer` starts with the expected result text
    ///
    /// Only the prefix is compared, the operands of the answer are not checked
    /// against this challenge separately. Expected results longer than
    /// [`CONTEST_ANSWER_COMPARE_SIZE`] are compared on that many bytes, the rest
    /// of the suffix never survives the delivery queue.
    pub fn is_answered_by(&self, answer: &[u8]) -> bool {
        let expected = self.expected_result_text.as_bytes();
        answer.starts_with(&expected[..expected.len().min(CONTEST_ANSWER_COMPARE_SIZE)])
    }
}

/// One entry of a predefined challenge set
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContestOperation {
    pub a: i8,
    pub b: i8,
    pub operator: Operator,
}

impl ContestOperation {
    pub const fn new(a: i8, b: i8, operator: Operator) -> Self {
        ContestOperation { a, b, operator }
    }
}

const CONTEST_SET_0: [ContestOperation; 3] = [
    ContestOperation::new(2, 7, Operator::Add),
    ContestOperation::new(3, 10, Operator::Add),
    ContestOperation::new(17, 5, Operator::Add),
];

const CONTEST_SET_1: [ContestOperation; 6] = [
    ContestOperation::new(2, 7, Operator::Add),
    ContestOperation::new(3, 10, Operator::Add),
    ContestOperation::new(17, 5, Operator::Add),
    ContestOperation::new(3, 2, Operator::Divide),
    ContestOperation::new(5, 6, Operator::Multiply),
    ContestOperation::new(10, 3, Operator::Subtract),
];

/// Challenge set selected by the contest number, `None` for unknown numbers
pub fn contest_set(contest_number: u8) -> Option<&'static [ContestOperation]> {
    match contest_number {
        0 => Some(&CONTEST_SET_0),
        1 => Some(&CONTEST_SET_1),
        _ => None,
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    const OPERATORS: [Operator; 4] = [Operator::Add, Operator::Subtract, Operator::Multiply, Operator::Divide];

    #[test]
    fn questions_parse_for_all_operators_and_operand_extremes() {
        for &op in &OPERATORS {
            for &(a, b) in &[(3i8, 4i8), (-128, 127), (0, -1), (127, -128)] {
                let text = format_question(a, b, op);
                let msg = parse(text.as_bytes()).unwrap();
                assert_eq!(msg, ContestMessage { operand_a: a, operand_b: b, operator: op, is_question: true }, "{}", text);
            }
        }
    }

    #[test]
    fn answer_parses_with_question_flag_cleared() {
        let msg = parse(b"3 + 4 = 7").unwrap();
        assert!(!msg.is_question);
        assert_eq!((msg.operand_a, msg.operand_b, msg.operator), (3, 4, Operator::Add));

        let msg = parse(b"3 + 4 = 7 Joe TheBest!\0").unwrap();
        assert!(!msg.is_question);
    }

    #[test]
    fn whitespace_between_tokens_is_optional() {
        assert!(parse(b"3+4=?").unwrap().is_question);
        assert_eq!(parse(b"  -5   -   -3 =   2").unwrap().operator, Operator::Subtract);
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert_eq!(parse(b"3 + 4 ?"), Err(ContestParseError::MissingEquals));
        assert_eq!(parse(b"3 + 4"), Err(ContestParseError::MissingEquals));
        assert_eq!(parse(b"3 % 4 = ?"), Err(ContestParseError::UnsupportedOperator));
        assert_eq!(parse(b"x + 4 = ?"), Err(ContestParseError::NotANumber));
        assert_eq!(parse(b"3 + 4 = abc"), Err(ContestParseError::NotANumber));
        assert_eq!(parse(b"ESThello"), Err(ContestParseError::NotANumber));
        assert_eq!(parse(b""), Err(ContestParseError::NotANumber));
        assert_eq!(parse(b"300 + 4 = ?"), Err(ContestParseError::OperandOutOfRange));
    }

    #[test]
    fn nul_terminates_the_text() {
        assert_eq!(parse(b"3 + 4\0= ?"), Err(ContestParseError::MissingEquals));
    }

    #[test]
    fn division_by_zero_yields_error_text() {
        assert_eq!(evaluate(5, 0, Operator::Divide), Evaluation::Error);
        assert_eq!(format_result(5, 0, Operator::Divide).as_str(), "5 / 0 = ERROR Joe TheBest!");
    }

    #[test]
    fn evaluation_uses_wrapping_eight_bit_arithmetic() {
        assert_eq!(evaluate(3, 2, Operator::Divide), Evaluation::Value(1));
        assert_eq!(evaluate(-7, 2, Operator::Divide), Evaluation::Value(-3));
        assert_eq!(evaluate(100, 2, Operator::Multiply), Evaluation::Value(-56));
        assert_eq!(evaluate(-128, -1, Operator::Divide), Evaluation::Value(-128));
        assert_eq!(evaluate(10, 3, Operator::Subtract), Evaluation::Value(7));
    }

    #[test]
    fn longest_result_fits_the_buffer() {
        let text = format_result(-128, -128, Operator::Subtract);
        assert_eq!(text.as_str(), "-128 - -128 = 0 Joe TheBest!");
        let text = format_result(-128, -1, Operator::Divide);
        assert_eq!(text.as_str(), "-128 / -1 = -128 Joe TheBest!");
    }

    #[test]
    fn challenge_matches_answer_prefix_only() {
        let challenge = ContestChallenge::new(3, 4, Operator::Add);
        assert_eq!(challenge.question().as_str(), "3 + 4 = ?");
        assert!(challenge.is_answered_by(b"3 + 4 = 7 Joe TheBest! and more"));
        assert!(!challenge.is_answered_by(b"3 + 4 = 8 Joe TheBest!"));
        assert!(!challenge.is_answered_by(b"3 + 4 = 7"));
    }

    #[test]
    fn longest_result_is_matched_on_a_queue_slot_prefix() {
        let challenge = ContestChallenge::new(-128, -127, Operator::Multiply);
        assert_eq!(challenge.expected_result_text.as_str(), "-128 * -127 = -128 Joe TheBest!");
        assert_eq!(challenge.expected_result_text.len(), 31);

        let queued = &challenge.expected_result_text.as_bytes()[..QUEUE_PAYLOAD_SIZE];
        assert!(challenge.is_answered_by(queued));
        assert!(!challenge.is_answered_by(b"-128 * -127 = -127 Joe TheBest"));
    }

    #[test]
    fn contest_sets_are_selected_by_number() {
        assert_eq!(contest_set(0).map(|s| s.len()), Some(3));
        assert_eq!(contest_set(1).map(|s| s.len()), Some(6));
        assert!(contest_set(2).is_none());
    }
}
