// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::convert::TryFrom;
use std::fmt::Formatter;

use log::trace;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_until, take_while, take_while1};
use nom::character::complete::{anychar, char, digit0, digit1, one_of, satisfy};
use nom::combinator::{map, map_opt, not, opt, peek, recognize, value};
use nom::error::{context, ErrorKind};
use nom::multi::many0;
use nom::sequence::{pair, preceded, terminated, tuple};
use nom::Slice;
use nom_locate::LocatedSpan;

use crate::rules::errors::{Error, LexicalErrorKind};
use crate::rules::exprs::{DurationUnit, FileLocation};

pub(crate) type Span<'a> = LocatedSpan<&'a str, &'a str>;

#[derive(Clone, PartialEq, Debug)]
pub(crate) struct ParserError<'a> {
    pub(crate) context: String,
    pub(crate) span: Span<'a>,
    pub(crate) kind: ErrorKind,
    pub(crate) reason: Option<LexicalErrorKind>,
}

pub(crate) type IResult<'a, I, O> = nom::IResult<I, O, ParserError<'a>>;

impl<'a> nom::error::ParseError<Span<'a>> for ParserError<'a> {
    fn from_error_kind(input: Span<'a>, kind: ErrorKind) -> Self {
        ParserError {
            context: "".to_string(),
            span: input,
            kind,
            reason: None,
        }
    }

    fn append(_input: Span<'a>, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<'a> nom::error::ContextError<Span<'a>> for ParserError<'a> {
    fn add_context(input: Span<'a>, ctx: &'static str, other: Self) -> Self {
        let context = if other.context.is_empty() {
            ctx.to_string()
        } else {
            format!("{}/{}", ctx, other.context)
        };

        ParserError {
            context,
            span: if other.reason.is_some() { other.span } else { input },
            kind: other.kind,
            reason: other.reason,
        }
    }
}

impl<'a> std::fmt::Display for ParserError<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Error lexing file {} at line {} at column {}, when handling {}, fragment {}",
            self.span.extra,
            self.span.location_line(),
            self.span.get_utf8_column(),
            self.context,
            *self.span.fragment()
        )
    }
}

impl<'a> From<Span<'a>> for FileLocation {
    fn from(span: Span<'a>) -> Self {
        FileLocation {
            line: span.location_line(),
            column: span.get_utf8_column() as u32,
            offset: span.location_offset(),
        }
    }
}

fn lexical_failure<'a, O>(span: Span<'a>, reason: LexicalErrorKind) -> IResult<'a, Span<'a>, O> {
    Err(nom::Err::Failure(ParserError {
        context: "".to_string(),
        span,
        kind: ErrorKind::Verify,
        reason: Some(reason),
    }))
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub(crate) enum Punctuation {
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    Dot,
    Percent,
    Dollar,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Star,
    Slash,
    Plus,
    Minus,
}

impl Punctuation {
    fn from_char(ch: char) -> Option<Self> {
        Some(match ch {
            '{' => Punctuation::LeftBrace,
            '}' => Punctuation::RightBrace,
            '(' => Punctuation::LeftParen,
            ')' => Punctuation::RightParen,
            '[' => Punctuation::LeftBracket,
            ']' => Punctuation::RightBracket,
            ',' => Punctuation::Comma,
            ':' => Punctuation::Colon,
            '.' => Punctuation::Dot,
            '%' => Punctuation::Percent,
            '$' => Punctuation::Dollar,
            '=' => Punctuation::Eq,
            '<' => Punctuation::Lt,
            '>' => Punctuation::Gt,
            '*' => Punctuation::Star,
            '/' => Punctuation::Slash,
            '+' => Punctuation::Plus,
            '-' => Punctuation::Minus,
            _ => return None,
        })
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) struct EscapeSpan<'a> {
    pub(crate) offset: usize,
    pub(crate) text: &'a str,
}

#[derive(Clone, PartialEq, Debug)]
pub(crate) enum TokenKind<'a> {
    Identifier(&'a str),
    Variable {
        name: &'a str,
        attribute: Option<&'a str>,
    },
    Integer(&'a str),
    Float(&'a str),
    Duration {
        amount: &'a str,
        unit: DurationUnit,
    },
    RawString(&'a str),
    InterpretedString {
        content: &'a str,
        escapes: Vec<EscapeSpan<'a>>,
    },
    Regex(&'a str),
    Punctuation(Punctuation),
}

#[derive(Clone, PartialEq, Debug)]
pub(crate) struct Token<'a> {
    pub(crate) kind: TokenKind<'a>,
    pub(crate) span: Span<'a>,
}

impl<'a> Token<'a> {
    pub(crate) fn location(&self) -> FileLocation {
        FileLocation::from(self.span)
    }

    pub(crate) fn is_punctuation(&self, punctuation: Punctuation) -> bool {
        self.kind == TokenKind::Punctuation(punctuation)
    }

    pub(crate) fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.kind, TokenKind::Identifier(name) if name == keyword)
    }

    pub(crate) fn describe(&self) -> String {
        match &self.kind {
            TokenKind::RawString(_) | TokenKind::InterpretedString { .. } => {
                "string literal".to_string()
            }
            TokenKind::Regex(_) => "regular expression".to_string(),
            _ => format!("`{}`", self.span.fragment()),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                                                                                //
//                                                                                                //
//                          Trivia                                                                //
//                                                                                                //
//                                                                                                //
////////////////////////////////////////////////////////////////////////////////////////////////////

//
//  line-comment = "//" *( 1*"\" (any-char / CRLF) / (%x00-5B / %x5D-10FFFF except LF) )
//
// A run of backslashes escapes the character after it, so a backslash right
// before the line end continues the comment on the next line
//
fn line_comment(input: Span) -> IResult<Span, ()> {
    let (rest, _) = tag("//")(input)?;
    let text = *rest.fragment();
    let mut chars = text.char_indices().peekable();
    let mut end = text.len();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => {
                while let Some((_, '\\')) = chars.peek() {
                    chars.next();
                }
                if let Some((_, '\r')) = chars.next() {
                    if let Some((_, '\n')) = chars.peek() {
                        chars.next();
                    }
                }
            }
            '\n' => {
                end = idx;
                break;
            }
            _ => {}
        }
    }
    Ok((rest.slice(end..), ()))
}

//
//  block-comment = "/*" *any-char "*/"     ; first "*/" closes, no nesting
//
fn block_comment(input: Span) -> IResult<Span, ()> {
    let (rest, _) = tag("/*")(input)?;
    match take_until::<_, _, ParserError>("*/")(rest) {
        Ok((rest, _)) => Ok((rest.slice(2..), ())),
        Err(_) => lexical_failure(input, LexicalErrorKind::UnterminatedComment),
    }
}

//
// This function extracts either a whitespace run or a comment and discards
// them
//
pub(crate) fn white_space_or_comment(input: Span) -> IResult<Span, ()> {
    alt((
        value((), take_while1(char::is_whitespace)),
        line_comment,
        block_comment,
    ))(input)
}

//
// *(whitespace / comment), never errors out unless a block comment is left
// open
//
pub(crate) fn zero_or_more_ws_or_comment(input: Span) -> IResult<Span, ()> {
    value((), many0(white_space_or_comment))(input)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                                                                                //
//                                                                                                //
//                          Tokens                                                                //
//                                                                                                //
//                                                                                                //
////////////////////////////////////////////////////////////////////////////////////////////////////

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

//
//  identifier = (ALPHA / "_") *(ALPHA / DIGIT / "_")
//
pub(crate) fn identifier(input: Span) -> IResult<Span, Span> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(is_identifier_char),
    ))(input)
}

//
//  attribute = "." ALPHA *(ALPHA / DIGIT / "_" / ".")
//
fn attribute(input: Span) -> IResult<Span, Span> {
    recognize(tuple((
        char('.'),
        satisfy(|c| c.is_ascii_alphabetic()),
        take_while(|c: char| is_identifier_char(c) || c == '.'),
    )))(input)
}

//
//  variable = "$" identifier [attribute]
//
// No trivia is allowed between the parts. A "$" not followed by an identifier
// is left for the punctuation rule.
//
fn variable(input: Span) -> IResult<Span, TokenKind> {
    let (rest, name) = preceded(char('$'), identifier)(input)?;
    let (rest, attribute) = opt(attribute)(rest)?;
    Ok((
        rest,
        TokenKind::Variable {
            name: *name.fragment(),
            attribute: attribute.map(|a| *a.fragment()),
        },
    ))
}

//
//  duration = 1*DIGIT ("m" / "h" / "d")    ; unit not followed by an identifier char
//
fn duration(input: Span) -> IResult<Span, TokenKind> {
    let (rest, (amount, unit)) = pair(
        digit1,
        terminated(one_of("mhd"), not(peek(satisfy(is_identifier_char)))),
    )(input)?;
    let unit = DurationUnit::try_from(unit).map_err(|_| {
        nom::Err::Error(ParserError {
            context: "duration unit".to_string(),
            span: input,
            kind: ErrorKind::OneOf,
            reason: None,
        })
    })?;
    Ok((
        rest,
        TokenKind::Duration {
            amount: *amount.fragment(),
            unit,
        },
    ))
}

//
//  float = 1*DIGIT "." *DIGIT / "." 1*DIGIT
//
fn float(input: Span) -> IResult<Span, TokenKind> {
    map(
        alt((
            recognize(tuple((digit1, char('.'), digit0))),
            recognize(pair(char('.'), digit1)),
        )),
        |s: Span| TokenKind::Float(*s.fragment()),
    )(input)
}

fn number(input: Span) -> IResult<Span, TokenKind> {
    //
    // IMP: order does matter, a float or duration starts with an integer
    //
    alt((
        duration,
        float,
        map(digit1, |s: Span| TokenKind::Integer(*s.fragment())),
    ))(input)
}

//
//  raw-string = "`" *(any-char except "`") "`"
//
fn raw_string(input: Span) -> IResult<Span, TokenKind> {
    let (rest, _) = char('`')(input)?;
    let (rest, content) = take_while(|c| c != '`')(rest)?;
    if rest.fragment().is_empty() {
        return lexical_failure(input, LexicalErrorKind::UnterminatedRawString);
    }
    Ok((rest.slice(1..), TokenKind::RawString(*content.fragment())))
}

//
// Length of the escape sequence following a backslash, or the offending text
// when it is malformed.
//
//  escape = "\" ( (any-char except "x" / "u" / "U")
//               / 2*3DIGIT
//               / "x" 2*HEXDIG
//               / "u" 4HEXDIG
//               / "U" 8HEXDIG )
//
fn escape_length(after: &str) -> std::result::Result<usize, String> {
    let mut chars = after.chars();
    let first = match chars.next() {
        Some(ch) => ch,
        None => return Err("\\".to_string()),
    };
    let (min, max) = match first {
        'x' => (2, usize::MAX),
        'u' => (4, 4),
        'U' => (8, 8),
        '0'..='9' => {
            let digits = 1 + after[1..]
                .chars()
                .take(2)
                .take_while(|c| c.is_ascii_digit())
                .count();
            return Ok(digits);
        }
        other => return Ok(other.len_utf8()),
    };
    let hex = chars.take(max).take_while(|c| c.is_ascii_hexdigit()).count();
    if hex < min {
        return Err(format!("\\{}", &after[..1 + hex]));
    }
    Ok(1 + hex)
}

//
//  interpreted-string = DQUOTE *( 1*(any-char except DQUOTE / LF / "\") / escape ) DQUOTE
//
fn interpreted_string(input: Span) -> IResult<Span, TokenKind> {
    let (body, _) = char('"')(input)?;
    let text = *body.fragment();
    let mut escapes = Vec::new();
    let mut idx = 0;
    loop {
        let rest = &text[idx..];
        match rest.chars().next() {
            None | Some('\n') => {
                return lexical_failure(input, LexicalErrorKind::UnterminatedString);
            }
            Some('"') => {
                return Ok((
                    body.slice(idx + 1..),
                    TokenKind::InterpretedString {
                        content: &text[..idx],
                        escapes,
                    },
                ));
            }
            Some('\\') => match escape_length(&rest[1..]) {
                Ok(len) => {
                    escapes.push(EscapeSpan {
                        offset: body.location_offset() + idx,
                        text: &rest[..1 + len],
                    });
                    idx += 1 + len;
                }
                Err(_) if rest.len() == 1 => {
                    return lexical_failure(input, LexicalErrorKind::UnterminatedString);
                }
                Err(escape) => {
                    return lexical_failure(
                        body.slice(idx..),
                        LexicalErrorKind::InvalidEscape(escape),
                    );
                }
            },
            Some(ch) => idx += ch.len_utf8(),
        }
    }
}

//
//  regex = "/" (any-char except "/" / "\" / "*") *( (any-char except "/" / "\") / "\" any-char ) "/"
//
// Only ever attempted where the parser expects an operand, everywhere else
// "/" is division.
//
fn regex(input: Span) -> IResult<Span, TokenKind> {
    let (body, _) = char('/')(input)?;
    let (mut rest, _) = satisfy(|c| c != '/' && c != '\\' && c != '*')(body)?;
    loop {
        let (after, _) = take_while(|c| c != '/' && c != '\\')(rest)?;
        let mut chars = after.fragment().chars();
        match chars.next() {
            Some('/') => {
                let len = after.location_offset() - body.location_offset();
                let pattern = *body.slice(..len).fragment();
                return Ok((after.slice(1..), TokenKind::Regex(pattern)));
            }
            Some(_) => match chars.next() {
                Some(escaped) => rest = after.slice(1 + escaped.len_utf8()..),
                None => return lexical_failure(input, LexicalErrorKind::UnterminatedRegex),
            },
            None => return lexical_failure(input, LexicalErrorKind::UnterminatedRegex),
        }
    }
}

fn punctuation(input: Span) -> IResult<Span, Punctuation> {
    alt((
        value(Punctuation::NotEq, tag("!=")),
        value(Punctuation::Le, tag("<=")),
        value(Punctuation::Ge, tag(">=")),
        map_opt(anychar, Punctuation::from_char),
    ))(input)
}

fn token(input: Span) -> IResult<Span, TokenKind> {
    alt((
        map(identifier, |s: Span| TokenKind::Identifier(*s.fragment())),
        variable,
        context("number", number),
        context("raw string", raw_string),
        context("interpreted string", interpreted_string),
        map(punctuation, TokenKind::Punctuation),
    ))(input)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                                                                                //
//                                                                                                //
//                          Token stream                                                          //
//                                                                                                //
//                                                                                                //
////////////////////////////////////////////////////////////////////////////////////////////////////

///
/// Produces tokens on demand, skipping trivia before each one. A lexical error
/// is returned once and the lexer moves past the offending input, so callers
/// may keep pulling tokens after an error.
///
#[derive(Clone, Debug)]
pub(crate) struct Lexer<'a> {
    source: Span<'a>,
    remaining: Span<'a>,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(source: &'a str, file_name: &'a str) -> Self {
        let source = Span::new_extra(source, file_name);
        Lexer {
            source,
            remaining: source,
        }
    }

    #[cfg(test)]
    pub(crate) fn location(&self) -> FileLocation {
        FileLocation::from(self.remaining)
    }

    ///
    /// Location just past the last token, after skipping trailing trivia.
    /// Used to report an unexpected end of input.
    ///
    pub(crate) fn end_location(&self) -> FileLocation {
        match zero_or_more_ws_or_comment(self.remaining) {
            Ok((rest, _)) => FileLocation::from(rest),
            Err(_) => FileLocation::from(self.source.slice(self.source.fragment().len()..)),
        }
    }

    pub(crate) fn next_token(&mut self) -> Result<Option<Token<'a>>, Error> {
        let start = match zero_or_more_ws_or_comment(self.remaining) {
            Ok((rest, _)) => rest,
            Err(err) => return Err(self.recover(self.remaining, err)),
        };
        self.remaining = start;
        if start.fragment().is_empty() {
            return Ok(None);
        }

        match token(start) {
            Ok((rest, kind)) => Ok(Some(self.accept(start, rest, kind))),
            Err(err) => Err(self.recover(start, err)),
        }
    }

    ///
    /// Re-lexes the input at `offset` as a regular expression literal. Returns
    /// `Ok(None)` and leaves the lexer untouched when the text there cannot
    /// start one.
    ///
    pub(crate) fn regex_at(&mut self, offset: usize) -> Result<Option<Token<'a>>, Error> {
        if offset > self.source.fragment().len() {
            return Ok(None);
        }
        let start = self.source.slice(offset..);
        match regex(start) {
            Ok((rest, kind)) => Ok(Some(self.accept(start, rest, kind))),
            Err(nom::Err::Error(_)) => Ok(None),
            Err(err) => Err(self.recover(start, err)),
        }
    }

    fn accept(&mut self, start: Span<'a>, rest: Span<'a>, kind: TokenKind<'a>) -> Token<'a> {
        let len = rest.location_offset() - start.location_offset();
        let span = start.slice(..len);
        trace!(
            "Token {:?} at line {} column {}",
            kind,
            span.location_line(),
            span.get_utf8_column()
        );
        self.remaining = rest;
        Token { kind, span }
    }

    //
    // Converts a failed token into a lexical error and moves past the bad
    // input. Unexpected characters skip one character. A bad escape skips past
    // the closing quote of its string, an unterminated string skips to the end
    // of the line, and anything left open runs to the end of input.
    //
    fn recover(&mut self, start: Span<'a>, err: nom::Err<ParserError<'a>>) -> Error {
        let failure = match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => Some(e),
            nom::Err::Incomplete(_) => None,
        };
        let end_of_input = start.slice(start.fragment().len()..);
        let failure = failure.and_then(|e| {
            let span = e.span;
            e.reason.map(|reason| (reason, span))
        });
        let (kind, at, resume) = match failure {
            Some((kind @ LexicalErrorKind::InvalidEscape(_), at)) => {
                let resume = past_closing_quote(at.fragment());
                (kind, at, at.slice(resume..))
            }
            Some((kind @ LexicalErrorKind::UnterminatedString, at)) => {
                let eol = at.fragment().find('\n').unwrap_or(at.fragment().len());
                (kind, at, at.slice(eol..))
            }
            Some((kind, at)) => (kind, at, end_of_input),
            None => match start.fragment().chars().next() {
                Some(ch) => (
                    LexicalErrorKind::UnexpectedCharacter(ch),
                    start,
                    start.slice(ch.len_utf8()..),
                ),
                None => (
                    LexicalErrorKind::UnexpectedCharacter('\0'),
                    start,
                    end_of_input,
                ),
            },
        };
        self.remaining = resume;
        Error::LexicalError {
            kind,
            location: FileLocation::from(at),
        }
    }
}

//
// Byte offset just past the unescaped `"` that closes the string containing
// `text`, or the offset of the end of the line when the string never closes.
//
fn past_closing_quote(text: &str) -> usize {
    let mut chars = text.char_indices();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '"' => return idx + 1,
            '\n' => return idx,
            '\\' => {
                if let Some((next, '\n')) = chars.next() {
                    return next;
                }
            }
            _ => {}
        }
    }
    text.len()
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

#[cfg(test)]
#[path = "lexer_tests.rs"]
mod lexer_tests;
