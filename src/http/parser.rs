use std::fmt;

use crate::buffer::{ByteBuffer, Token};
use crate::error::Error;
use crate::table::FieldTable;

/// Position of the header state machine within the request head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Method,
    AfterMethod,
    Uri,
    AfterUri,
    Proto,
    /// After a line terminator: either more terminators or a new header name.
    Return,
    Key,
    /// Between `:` and the first byte of the value.
    Whitespace,
    Value,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected byte {byte:#04x} in state {state:?} at offset {offset}")]
    Unexpected { byte: u8, state: State, offset: usize },

    #[error("request head ended in state {state:?}")]
    Truncated { state: State },

    #[error("request head exceeds {limit} bytes")]
    HeadTooLarge { limit: usize },

    #[error("read failed: {0}")]
    Read(std::io::ErrorKind),
}

/// Request line and header fields of a fully parsed head.
#[derive(Debug)]
pub struct ParsedHead {
    pub method: Token,
    pub uri: Token,
    pub protocol: Token,
    pub headers: FieldTable,
}

fn is_whitespace(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

fn is_line_end(b: u8) -> bool {
    b == b'\r' || b == b'\n'
}

/// Byte-at-a-time parser for the request line and header block.
///
/// Input may be fed in arbitrary pieces; the result does not depend on where
/// the pieces are split. The first unexpected byte moves the parser into
/// [`State::Error`] for good.
pub struct HeaderParser {
    state: State,
    offset: usize,
    token: ByteBuffer,
    key: Option<Token>,
    method: Option<Token>,
    uri: Option<Token>,
    protocol: Option<Token>,
    headers: FieldTable,
}

impl HeaderParser {
    pub fn new() -> Result<Self, Error> {
        Self::with_table(FieldTable::new()?)
    }

    /// Parser that inserts header fields into `headers`.
    pub fn with_table(headers: FieldTable) -> Result<Self, Error> {
        Ok(Self {
            state: State::Method,
            offset: 0,
            token: ByteBuffer::new()?,
            key: None,
            method: None,
            uri: None,
            protocol: None,
            headers,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn feed(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for &b in bytes {
            if let Err(err) = self.advance(b) {
                self.state = State::Error;
                return Err(err);
            }
            self.offset += 1;
        }
        Ok(())
    }

    /// Hands out the current token and starts a new one.
    fn take_token(&mut self) -> Result<Token, Error> {
        std::mem::replace(&mut self.token, ByteBuffer::new()?).finalize()
    }

    fn unexpected(&self, byte: u8) -> Error {
        ParseError::Unexpected {
            byte,
            state: self.state,
            offset: self.offset,
        }
        .into()
    }

    fn advance(&mut self, b: u8) -> Result<(), Error> {
        match self.state {
            State::Method | State::Uri => {
                if is_line_end(b) {
                    return Err(self.unexpected(b));
                }
                if !is_whitespace(b) {
                    return self.token.append(b);
                }
                let token = self.take_token()?;
                if self.state == State::Method {
                    self.method = Some(token);
                    self.state = State::AfterMethod;
                } else {
                    self.uri = Some(token);
                    self.state = State::AfterUri;
                }
            }
            State::AfterMethod | State::AfterUri => {
                if is_line_end(b) {
                    return Err(self.unexpected(b));
                }
                if !is_whitespace(b) {
                    self.state = if self.state == State::AfterMethod {
                        State::Uri
                    } else {
                        State::Proto
                    };
                    self.token.append(b)?;
                }
            }
            State::Proto => {
                if is_line_end(b) {
                    self.protocol = Some(self.take_token()?);
                    self.state = State::Return;
                } else if is_whitespace(b) {
                    return Err(self.unexpected(b));
                } else {
                    self.token.append(b)?;
                }
            }
            State::Return => {
                if is_whitespace(b) || b == b':' {
                    return Err(self.unexpected(b));
                }
                if !is_line_end(b) {
                    self.state = State::Key;
                    self.token.append(b)?;
                }
            }
            State::Key => {
                if b == b':' {
                    self.key = Some(self.take_token()?);
                    self.state = State::Whitespace;
                } else if is_whitespace(b) || is_line_end(b) {
                    return Err(self.unexpected(b));
                } else {
                    self.token.append(b)?;
                }
            }
            State::Whitespace => {
                if is_line_end(b) {
                    self.insert_field()?;
                } else if !is_whitespace(b) {
                    self.state = State::Value;
                    self.token.append(b)?;
                }
            }
            State::Value => {
                if is_line_end(b) {
                    self.insert_field()?;
                } else {
                    self.token.append(b)?;
                }
            }
            State::Error => return Err(self.unexpected(b)),
        }
        Ok(())
    }

    fn insert_field(&mut self) -> Result<(), Error> {
        let trimmed = self
            .token
            .as_bytes()
            .iter()
            .rposition(|&b| !is_whitespace(b))
            .map_or(0, |last| last + 1);
        self.token.truncate(trimmed);

        let value = self.take_token()?;
        if let Some(key) = self.key.take() {
            self.headers.add(key, value);
        }
        self.state = State::Return;
        Ok(())
    }

    /// Completes the parse. The input must have ended on a line boundary.
    pub fn finish(self) -> Result<ParsedHead, Error> {
        match (self.state, self.method, self.uri, self.protocol) {
            (State::Return, Some(method), Some(uri), Some(protocol)) => Ok(ParsedHead {
                method,
                uri,
                protocol,
                headers: self.headers,
            }),
            (state, ..) => Err(ParseError::Truncated { state }.into()),
        }
    }
}

impl fmt::Debug for HeaderParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderParser")
            .field("state", &self.state)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

/// Parses a complete head in one call.
pub fn parse_head(bytes: &[u8]) -> Result<ParsedHead, Error> {
    let mut parser = HeaderParser::new()?;
    parser.feed(bytes)?;
    parser.finish()
}
