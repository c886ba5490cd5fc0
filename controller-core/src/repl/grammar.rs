#![allow(clippy::module_name_repetitions)]

//! Lexer and parser for the controller console.
//!
//! A line is either a bare gesture in short notation (`3H`, `10C`) or one of
//! the catalog commands. `regal` splits the line into a bounded token buffer;
//! the command shapes are `winnow` parsers over that buffer.

use super::catalog::{self, CommandTag, Node, ValueSpec};
use core::fmt;
use core::ops::Range;
use core::time::Duration;

use heapless::Vec as HeaplessVec;
use regal::TokenCache;
use regal_macros::RegalLexer;
#[allow(deprecated)]
use winnow::error::ErrorKind;
use winnow::error::{ErrMode, ParserError};
use winnow::prelude::*;
use winnow::stream::Stream;

use crate::gesture::Gesture;

/// Maximum number of tokens produced per console line.
pub const MAX_TOKENS: usize = 16;
// Skipped whitespace also occupies cache records.
const MAX_CACHE_RECORDS: usize = MAX_TOKENS * 2;

#[derive(RegalLexer, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TokenKind {
    /// Click count followed by `C` (release) or `H` (hold).
    #[regex(r"[0-9]+[CcHh]", priority = 2)]
    Gesture,
    /// Whole milliseconds (`250ms`) or seconds (`3s`).
    #[regex(r"[0-9]+(?:ms|s)", priority = 2)]
    Duration,
    #[regex(r"[0-9]+")]
    Integer,
    /// Command keyword or help topic, matched case-insensitively.
    #[regex(r"[A-Za-z][A-Za-z0-9-]*")]
    Ident,
    #[regex(r"[ \t]+", skip)]
    Whitespace,
    #[token("\r\n")]
    #[token("\n")]
    #[token("\r")]
    Eol,
    /// Any byte no other rule accepts.
    #[default]
    #[regex(r".", priority = 1024)]
    Error,
}

/// Token with its byte span in the source line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub span: Range<usize>,
}

pub type TokenBuffer<'a> = HeaplessVec<Token<'a>, MAX_TOKENS>;

/// The line holds more tokens than one command can use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineTooLong;

impl fmt::Display for LineTooLong {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line has more than {MAX_TOKENS} tokens")
    }
}

/// Why a tokenized line is not a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GrammarError<'a> {
    /// `expected` was wanted; `found` is `None` at the end of the line.
    Expected {
        expected: &'static str,
        found: Option<Token<'a>>,
    },
    /// Click count outside 1-255.
    InvalidCount(Token<'a>),
    /// Duration too large for its unit.
    InvalidDuration(Token<'a>),
    Unsupported(Token<'a>),
}

impl<'a> GrammarError<'a> {
    fn expected(expected: &'static str, found: Option<&Token<'a>>) -> Self {
        GrammarError::Expected {
            expected,
            found: found.cloned(),
        }
    }
}

impl fmt::Display for GrammarError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::Expected {
                expected,
                found: Some(token),
            } => write!(
                f,
                "expected {expected}, found `{}` at column {}",
                token.lexeme, token.span.start
            ),
            GrammarError::Expected {
                expected,
                found: None,
            } => write!(f, "expected {expected} at end of line"),
            GrammarError::InvalidCount(token) => write!(
                f,
                "click count `{}` at column {} must be 1-255",
                token.lexeme, token.span.start
            ),
            GrammarError::InvalidDuration(token) => write!(
                f,
                "duration `{}` at column {} is out of range",
                token.lexeme, token.span.start
            ),
            GrammarError::Unsupported(token) => write!(
                f,
                "unsupported input `{}` at column {}",
                token.lexeme, token.span.start
            ),
        }
    }
}

type Input<'src, 'slice> = &'slice [Token<'src>];

#[allow(deprecated)]
impl<'src, 'slice> ParserError<Input<'src, 'slice>> for GrammarError<'src>
where
    'src: 'slice,
{
    fn from_error_kind(input: &Input<'src, 'slice>, _kind: ErrorKind) -> Self {
        GrammarError::expected("token", input.first())
    }

    fn append(
        self,
        _input: &Input<'src, 'slice>,
        _token_start: &<Input<'src, 'slice> as Stream>::Checkpoint,
        _kind: ErrorKind,
    ) -> Self {
        self
    }

    fn or(self, other: Self) -> Self {
        other
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError<'a> {
    Lex(LineTooLong),
    Grammar(GrammarError<'a>),
}

impl fmt::Display for ParseError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Lex(err) => err.fmt(f),
            ParseError::Grammar(err) => err.fmt(f),
        }
    }
}

/// Structured commands produced by the parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// Deliver one gesture to the controller.
    Gesture(Gesture),
    /// Advance the clock.
    Wait(Duration),
    Status,
    /// Show recent events, optionally limited to the newest `n`.
    History(Option<u8>),
    Help(HelpCommand<'a>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HelpCommand<'a> {
    pub topic: Option<&'a str>,
}

/// Tokenize the provided line. Whitespace is dropped; bytes no rule accepts
/// come back as [`TokenKind::Error`] tokens.
///
/// # Errors
///
/// Returns [`LineTooLong`] when the line does not fit the token buffer.
pub fn lex(line: &str) -> Result<TokenBuffer<'_>, LineTooLong> {
    let mut cache: TokenCache<TokenKind, MAX_CACHE_RECORDS> = TokenCache::new();
    // Every byte matches some rule, so the cache only fails when it is full.
    let partial = cache
        .rebuild(TokenKind::lexer(), line)
        .map_err(|_| LineTooLong)?;

    let mut buffer = TokenBuffer::new();
    for record in cache.tokens() {
        if record.skipped {
            continue;
        }
        let span = record.start..record.end;
        let token = Token {
            kind: record.token,
            lexeme: &line[span.clone()],
            span,
        };
        buffer.push(token).map_err(|_| LineTooLong)?;
    }

    if let Some(partial) = partial.filter(|partial| !partial.fragment.is_empty()) {
        let span = partial.start..partial.start + partial.fragment.len();
        let token = Token {
            kind: TokenKind::Error,
            lexeme: partial.fragment,
            span,
        };
        buffer.push(token).map_err(|_| LineTooLong)?;
    }
    Ok(buffer)
}

/// Parse a console command from the provided line.
///
/// # Errors
///
/// Returns [`ParseError`] for over-long lines, unsupported characters, unknown
/// commands and malformed arguments.
pub fn parse(line: &str) -> Result<Command<'_>, ParseError<'_>> {
    let tokens = lex(line).map_err(ParseError::Lex)?;

    if let Some(token) = tokens.iter().find(|token| token.kind == TokenKind::Error) {
        return Err(ParseError::Grammar(GrammarError::Unsupported(token.clone())));
    }

    let mut input = tokens.as_slice();
    let command = match command().parse_next(&mut input) {
        Ok(command) => command,
        Err(ErrMode::Backtrack(err) | ErrMode::Cut(err)) => return Err(ParseError::Grammar(err)),
        Err(ErrMode::Incomplete(_)) => {
            return Err(ParseError::Grammar(GrammarError::expected(
                "token",
                input.first(),
            )));
        }
    };

    match input.iter().find(|token| token.kind != TokenKind::Eol) {
        Some(token) => Err(ParseError::Grammar(GrammarError::expected(
            "end of command",
            Some(token),
        ))),
        None => Ok(command),
    }
}

fn command<'src, 'slice>() -> impl Parser<Input<'src, 'slice>, Command<'src>, GrammarError<'src>>
where
    'src: 'slice,
{
    move |input: &mut Input<'src, 'slice>| {
        if let Some((token, rest)) = input.split_first() {
            if token.kind == TokenKind::Gesture {
                let gesture = parse_gesture(token).map_err(ErrMode::Cut)?;
                *input = rest;
                return Ok(Command::Gesture(gesture));
            }
        }

        let snapshot = *input;
        let command_token =
            expect_kind(TokenKind::Ident, "gesture or command").parse_next(input)?;

        if let Some(spec) = catalog::find(command_token.lexeme) {
            let mut state = CommandState::new(spec.tag);
            parse_node(spec.grammar, input, &mut state)?;
            state.finish()
        } else {
            *input = snapshot;
            Err(ErrMode::Backtrack(GrammarError::expected(
                "gesture or command",
                Some(&command_token),
            )))
        }
    }
}

fn parse_node<'src, 'slice>(
    node: &'static Node,
    input: &mut Input<'src, 'slice>,
    state: &mut CommandState<'src>,
) -> Result<(), ErrMode<GrammarError<'src>>>
where
    'src: 'slice,
{
    match node {
        Node::End => Ok(()),
        Node::Required { value, next } => {
            state.value = Some(parse_value(input, *value)?);
            parse_node(next, input, state)
        }
        Node::Optional { value, next } => {
            if at_end(input) {
                return Ok(());
            }
            state.value = Some(parse_value(input, *value)?);
            parse_node(next, input, state)
        }
        Node::Topic { next } => {
            match input.split_first() {
                Some((token, rest)) if token.kind == TokenKind::Ident => {
                    state.topic = Some(token.lexeme);
                    *input = rest;
                }
                Some((token, _)) if token.kind != TokenKind::Eol => {
                    return Err(ErrMode::Backtrack(GrammarError::expected(
                        "command name",
                        Some(token),
                    )));
                }
                _ => {}
            }
            parse_node(next, input, state)
        }
    }
}

fn at_end(input: &Input<'_, '_>) -> bool {
    input.first().is_none_or(|token| token.kind == TokenKind::Eol)
}

fn parse_value<'src, 'slice>(
    input: &mut Input<'src, 'slice>,
    spec: ValueSpec,
) -> Result<ArgValue, ErrMode<GrammarError<'src>>>
where
    'src: 'slice,
{
    match spec {
        ValueSpec::Duration => {
            let duration_token = expect_kind(TokenKind::Duration, "duration").parse_next(input)?;
            let duration = parse_duration(&duration_token).map_err(ErrMode::Cut)?;
            Ok(ArgValue::Duration(duration))
        }
        ValueSpec::Count => {
            let integer_token = expect_kind(TokenKind::Integer, "count").parse_next(input)?;
            let value = parse_count(&integer_token).map_err(ErrMode::Cut)?;
            Ok(ArgValue::Count(value))
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArgValue {
    Duration(Duration),
    Count(u8),
}

struct CommandState<'a> {
    tag: CommandTag,
    value: Option<ArgValue>,
    topic: Option<&'a str>,
}

impl<'a> CommandState<'a> {
    fn new(tag: CommandTag) -> Self {
        Self {
            tag,
            value: None,
            topic: None,
        }
    }

    fn count(&self) -> Option<u8> {
        match self.value {
            Some(ArgValue::Count(count)) => Some(count),
            _ => None,
        }
    }

    fn finish(self) -> Result<Command<'a>, ErrMode<GrammarError<'a>>> {
        match self.tag {
            CommandTag::Click => Ok(Command::Gesture(Gesture::click(self.count().unwrap_or(1)))),
            CommandTag::Hold => Ok(Command::Gesture(Gesture::hold(self.count().unwrap_or(1)))),
            CommandTag::Wait => match self.value {
                Some(ArgValue::Duration(duration)) => Ok(Command::Wait(duration)),
                _ => Err(ErrMode::Backtrack(GrammarError::expected("duration", None))),
            },
            CommandTag::Status => Ok(Command::Status),
            CommandTag::History => Ok(Command::History(self.count())),
            CommandTag::Help => Ok(Command::Help(HelpCommand { topic: self.topic })),
        }
    }
}

fn expect_kind<'src, 'slice>(
    kind: TokenKind,
    label: &'static str,
) -> impl Parser<Input<'src, 'slice>, Token<'src>, GrammarError<'src>>
where
    'src: 'slice,
{
    move |input: &mut Input<'src, 'slice>| match input.split_first() {
        Some((token, rest)) if token.kind == kind => {
            *input = rest;
            Ok(token.clone())
        }
        Some((token, _)) => Err(ErrMode::Backtrack(GrammarError::expected(
            label,
            Some(token),
        ))),
        None => Err(ErrMode::Backtrack(GrammarError::expected(label, None))),
    }
}

fn parse_gesture<'a>(token: &Token<'a>) -> Result<Gesture, GrammarError<'a>> {
    token
        .lexeme
        .parse::<Gesture>()
        .map_err(|_| GrammarError::InvalidCount(token.clone()))
}

fn parse_count<'a>(token: &Token<'a>) -> Result<u8, GrammarError<'a>> {
    match token.lexeme.parse::<u8>() {
        Ok(0) | Err(_) => Err(GrammarError::InvalidCount(token.clone())),
        Ok(value) => Ok(value),
    }
}

fn parse_duration<'a>(token: &Token<'a>) -> Result<Duration, GrammarError<'a>> {
    let text = token.lexeme;
    if let Some(rest) = text.strip_suffix("ms") {
        let millis = rest
            .parse::<u32>()
            .map_err(|_| GrammarError::InvalidDuration(token.clone()))?;
        Ok(Duration::from_millis(millis.into()))
    } else if let Some(rest) = text.strip_suffix('s') {
        let seconds = rest
            .parse::<u32>()
            .map_err(|_| GrammarError::InvalidDuration(token.clone()))?;
        Ok(Duration::from_secs(seconds.into()))
    } else {
        Err(GrammarError::InvalidDuration(token.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write as _;

    fn parse_ok(input: &str) -> Command<'_> {
        parse(input).expect("command should parse")
    }

    #[test]
    fn parses_short_gesture_notation() {
        assert_eq!(parse_ok("3H"), Command::Gesture(Gesture::hold(3)));
        assert_eq!(parse_ok("10c\n"), Command::Gesture(Gesture::click(10)));
    }

    #[test]
    fn click_and_hold_default_to_one_press() {
        assert_eq!(parse_ok("click"), Command::Gesture(Gesture::click(1)));
        assert_eq!(parse_ok("hold 13"), Command::Gesture(Gesture::hold(13)));
    }

    #[test]
    fn parses_wait_durations() {
        assert_eq!(
            parse_ok("wait 250ms"),
            Command::Wait(Duration::from_millis(250))
        );
        assert_eq!(parse_ok("WAIT 3s"), Command::Wait(Duration::from_secs(3)));
    }

    #[test]
    fn wait_requires_a_duration() {
        match parse("wait") {
            Err(ParseError::Grammar(GrammarError::Expected { expected, found })) => {
                assert_eq!(expected, "duration");
                assert_eq!(found, None);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn parses_history_and_status() {
        assert_eq!(parse_ok("status"), Command::Status);
        assert_eq!(parse_ok("history"), Command::History(None));
        assert_eq!(parse_ok("history 5"), Command::History(Some(5)));
    }

    #[test]
    fn parses_help_topic() {
        assert_eq!(
            parse_ok("help wait"),
            Command::Help(HelpCommand {
                topic: Some("wait"),
            })
        );
        assert_eq!(parse_ok("help"), Command::Help(HelpCommand { topic: None }));
    }

    #[test]
    fn rejects_zero_clicks() {
        for line in ["0C", "click 0", "hold 256"] {
            assert!(
                matches!(
                    parse(line),
                    Err(ParseError::Grammar(GrammarError::InvalidCount(_)))
                ),
                "{line} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_trailing_arguments() {
        assert!(matches!(parse("status now"), Err(ParseError::Grammar(_))));
        assert!(matches!(parse("2C 3C"), Err(ParseError::Grammar(_))));
    }

    #[test]
    fn rejects_invalid_token() {
        match parse("3H$") {
            Err(ParseError::Grammar(GrammarError::Unsupported(token))) => {
                assert_eq!(token.lexeme, "$");
                assert_eq!(token.span, 2..3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn overlong_line_is_rejected_before_parsing() {
        let line = "1C 1C 1C 1C 1C 1C 1C 1C 1C 1C 1C 1C 1C 1C 1C 1C 1C";
        assert_eq!(parse(line), Err(ParseError::Lex(LineTooLong)));
    }

    #[test]
    fn errors_point_at_the_offending_column() {
        let err = parse("status now").expect_err("trailing word");
        let mut text: heapless::String<64> = heapless::String::new();
        write!(text, "{err}").expect("message fits");
        assert_eq!(
            text.as_str(),
            "expected end of command, found `now` at column 7"
        );
    }

    #[test]
    fn lexer_separates_gestures_from_durations() {
        let tokens = lex("3h 3s 3").expect("lexing should succeed");
        let kinds: HeaplessVec<TokenKind, 3> = tokens.iter().map(|token| token.kind).collect();
        assert_eq!(
            kinds.as_slice(),
            &[TokenKind::Gesture, TokenKind::Duration, TokenKind::Integer]
        );
    }
}
