//! Query Lexer
//!
//! Splits AWQL text into classified tokens. Every call to [`Lexer::scan`]
//! consumes exactly one token, whitespace runs included, so the parser can
//! decide where whitespace is significant.
//!
//! Token classes:
//!
//! ```text
//! whitespace   [ \t\r\n]+
//! identifier   [a-zA-Z][a-zA-Z0-9_]*       (keywords matched case-insensitively)
//! value        [a-zA-Z][a-zA-Z0-9_.]*      (contains at least one '.')
//! number       [0-9][0-9.]*                (integer first, then decimal)
//! string       '...' or "..."              (backslash protects the next char)
//! operators    != >= <= > < = \G \g
//! punctuation  * , ; ( ) [ ]
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while, take_while1},
    character::complete::satisfy,
    combinator::{consumed, map, recognize, value},
    sequence::pair,
    IResult,
};

use crate::query::token::{is_literal_char, is_quote, is_whitespace, Token, TokenKind};

/// Single-pass scanner over a query string
pub struct Lexer<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, offset: 0 }
    }

    /// Byte offset of the next unread character
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Scan the next token. Returns an `End` token once the input is exhausted.
    pub fn scan(&mut self) -> Token {
        let rest = &self.input[self.offset..];
        let (token, consumed) = scan_token(rest);
        self.offset += consumed;
        token
    }
}

/// Scan one token at the head of `input`, returning it with the number of bytes consumed
fn scan_token(input: &str) -> (Token, usize) {
    let Some(first) = input.chars().next() else {
        return (Token::end(), 0);
    };

    if is_quote(first) {
        return scan_quoted_string(input, first);
    }

    match alt((whitespace, identifier, number, symbol))(input) {
        Ok((rest, token)) => (token, input.len() - rest.len()),
        Err(_) => (
            Token::new(TokenKind::Illegal, first.to_string()),
            first.len_utf8(),
        ),
    }
}

fn whitespace(input: &str) -> IResult<&str, Token> {
    map(take_while1(is_whitespace), |s: &str| {
        Token::new(TokenKind::Whitespace, s)
    })(input)
}

/// Identifiers, keywords and dotted value literals all start with a letter
fn identifier(input: &str) -> IResult<&str, Token> {
    map(
        recognize(pair(
            satisfy(|c: char| c.is_ascii_alphabetic()),
            take_while(is_literal_char),
        )),
        |s: &str| {
            let kind = if s.contains('.') {
                TokenKind::ValueLiteral
            } else {
                TokenKind::keyword(s).unwrap_or(TokenKind::Identifier)
            };
            Token::new(kind, s)
        },
    )(input)
}

fn number(input: &str) -> IResult<&str, Token> {
    map(
        recognize(pair(
            satisfy(|c: char| c.is_ascii_digit()),
            take_while(|c: char| c.is_ascii_digit() || c == '.'),
        )),
        |s: &str| {
            let kind = if s.parse::<i64>().is_ok() {
                TokenKind::Digit
            } else if s.parse::<f64>().is_ok() {
                TokenKind::Decimal
            } else {
                TokenKind::Illegal
            };
            Token::new(kind, s)
        },
    )(input)
}

/// Operators and punctuation, longest match first
fn symbol(input: &str) -> IResult<&str, Token> {
    map(
        consumed(alt((
            value(TokenKind::Different, tag("!=")),
            value(TokenKind::GreaterOrEqual, tag(">=")),
            value(TokenKind::LessOrEqual, tag("<=")),
            value(TokenKind::Vertical, tag_no_case("\\g")),
            value(TokenKind::Greater, tag(">")),
            value(TokenKind::Less, tag("<")),
            value(TokenKind::Equal, tag("=")),
            value(TokenKind::Asterisk, tag("*")),
            value(TokenKind::Comma, tag(",")),
            value(TokenKind::Semicolon, tag(";")),
            value(TokenKind::LeftParenthesis, tag("(")),
            value(TokenKind::RightParenthesis, tag(")")),
            value(TokenKind::LeftSquareBracket, tag("[")),
            value(TokenKind::RightSquareBracket, tag("]")),
        ))),
        |(literal, kind): (&str, TokenKind)| Token::new(kind, literal),
    )(input)
}

/// Consume a quoted string up to the next unprotected matching quote.
///
/// The returned literal has its quotes stripped and escapes decoded. An
/// unterminated string yields an `Illegal` token carrying what was read.
fn scan_quoted_string(input: &str, quote: char) -> (Token, usize) {
    let mut content = String::new();
    let mut chars = input.char_indices().skip(1);

    while let Some((idx, c)) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some((_, escaped)) => content.push(escaped),
                None => return (Token::new(TokenKind::Illegal, content), input.len()),
            }
        } else if c == quote {
            return (Token::new(TokenKind::String, content), idx + c.len_utf8());
        } else {
            content.push(c);
        }
    }

    (Token::new(TokenKind::Illegal, content), input.len())
}
