use std::io::{self, Read};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::buffer::{ByteBuffer, Token};
use crate::error::{Error, FailureKind};
use crate::http::boundary;
use crate::http::parser::{HeaderParser, ParseError, ParsedHead};
use crate::http::uri;
use crate::server::{Admission, Counters};
use crate::table::FieldTable;

/// Bytes requested from the connection per read.
pub const CHUNK_SIZE: usize = 512;

/// Consecutive not-ready reads tolerated before a request is abandoned.
pub const MAX_READ_RETRIES: u32 = 8;

/// HTTP request methods.
///
/// The head parser accepts any token as a method; this is only a convenience
/// view of the common ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
}

impl Method {
    /// Parses a method token (case-sensitive).
    ///
    /// ```
    /// # use forkhttp::http::request::Method;
    /// assert_eq!(Method::from_bytes(b"GET"), Some(Method::GET));
    /// assert_eq!(Method::from_bytes(b"get"), None);
    /// ```
    pub fn from_bytes(s: &[u8]) -> Option<Self> {
        match s {
            b"GET" => Some(Method::GET),
            b"POST" => Some(Method::POST),
            b"PUT" => Some(Method::PUT),
            b"DELETE" => Some(Method::DELETE),
            b"HEAD" => Some(Method::HEAD),
            b"OPTIONS" => Some(Method::OPTIONS),
            b"PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }
}

/// Read-side limits applied to every connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReadLimits {
    pub chunk_size: usize,
    pub max_read_retries: u32,
    /// How long one read may wait before it counts as "not ready".
    #[serde(with = "millis")]
    pub read_timeout: Duration,
    pub max_head_size: usize,
    pub max_body_size: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            max_read_retries: MAX_READ_RETRIES,
            read_timeout: Duration::from_millis(1000),
            max_head_size: 64 * 1024,
            max_body_size: 1024 * 1024,
        }
    }
}

pub(crate) mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// Still reading or parsing.
    Pending,
    Ok,
    Failed(FailureKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Head,
    Body,
}

/// One request read from one connection.
///
/// The request is sans-IO at its core: [`Request::ingest`],
/// [`Request::not_ready`] and [`Request::parse_head`] hold all of the
/// lifecycle logic, while [`Request::read_head`] and
/// [`Request::read_head_async`] only pump bytes into them.
#[derive(Debug)]
pub struct Request {
    id: u64,
    status: RequestStatus,
    body_offset: Option<usize>,
    raw: ByteBuffer,
    method: Option<Token>,
    uri: Option<Token>,
    path: Option<String>,
    protocol: Option<Token>,
    content_size: usize,
    headers: FieldTable,
    retries: u32,
    _admission: Admission,
}

impl Request {
    /// Allocates a request and registers it with `counters`.
    pub fn new(counters: &Arc<Counters>) -> Result<Self, Error> {
        let raw = ByteBuffer::new()?;
        let headers = FieldTable::new()?;
        let admission = counters.admit();

        tracing::debug!(request_id = admission.id(), "request allocated");

        Ok(Self {
            id: admission.id(),
            status: RequestStatus::Pending,
            body_offset: None,
            raw,
            method: None,
            uri: None,
            path: None,
            protocol: None,
            content_size: 0,
            headers,
            retries: 0,
            _admission: admission,
        })
    }

    fn fail(&mut self, err: Error) -> Error {
        self.status = RequestStatus::Failed(err.kind());
        err
    }

    /// Appends one chunk read from the connection.
    ///
    /// Returns `true` once the header/body boundary has been seen.
    pub fn ingest(&mut self, chunk: &[u8], limits: &ReadLimits) -> Result<bool, Error> {
        self.retries = 0;
        let read_offset = self.raw.len();
        if let Err(err) = self.raw.append_slice(chunk) {
            return Err(self.fail(err));
        }

        if self.body_offset.is_some() {
            return Ok(true);
        }

        self.body_offset = boundary::scan(self.raw.as_bytes(), read_offset);
        match self.body_offset {
            Some(offset) => {
                tracing::debug!(request_id = self.id, body_offset = offset, "header boundary found");
                Ok(true)
            }
            None if self.raw.len() > limits.max_head_size => {
                let err = ParseError::HeadTooLarge {
                    limit: limits.max_head_size,
                };
                Err(self.fail(err.into()))
            }
            None => Ok(false),
        }
    }

    /// Records a read that had nothing to offer yet.
    pub fn not_ready(&mut self, limits: &ReadLimits) -> Result<(), Error> {
        self.retries += 1;
        if self.retries > limits.max_read_retries {
            return Err(self.fail(Error::RetryExceeded {
                attempts: self.retries,
            }));
        }
        tracing::debug!(request_id = self.id, retries = self.retries, "read not ready, retrying");
        Ok(())
    }

    fn read_failed(&mut self, err: io::Error) -> Error {
        tracing::error!(request_id = self.id, error = %err, "error during read from connection");
        self.fail(ParseError::Read(err.kind()).into())
    }

    fn is_complete(&self, phase: Phase) -> bool {
        match phase {
            Phase::Head => self.body_offset.is_some(),
            Phase::Body => self.buffered_body_len() >= self.content_size,
        }
    }

    fn accept_chunk(&mut self, chunk: &[u8], limits: &ReadLimits, phase: Phase) -> Result<bool, Error> {
        match phase {
            Phase::Head => self.ingest(chunk, limits),
            Phase::Body => {
                self.retries = 0;
                if let Err(err) = self.raw.append_slice(chunk) {
                    return Err(self.fail(err));
                }
                Ok(self.is_complete(phase))
            }
        }
    }

    fn fill<R: Read>(&mut self, reader: &mut R, limits: &ReadLimits, phase: Phase) -> Result<(), Error> {
        self.retries = 0;
        let mut chunk = vec![0u8; limits.chunk_size.max(1)];

        while !self.is_complete(phase) {
            match reader.read(&mut chunk) {
                Ok(0) => {
                    tracing::debug!(request_id = self.id, ?phase, "connection reached end of input");
                    break;
                }
                Ok(n) => {
                    tracing::trace!(request_id = self.id, bytes = n, "read chunk");
                    if self.accept_chunk(&chunk[..n], limits, phase)? {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if is_not_ready(&e) => self.not_ready(limits)?,
                Err(e) => return Err(self.read_failed(e)),
            }
        }
        Ok(())
    }

    async fn fill_async<R>(&mut self, reader: &mut R, limits: &ReadLimits, phase: Phase) -> Result<(), Error>
    where
        R: AsyncRead + Unpin,
    {
        self.retries = 0;
        let mut chunk = vec![0u8; limits.chunk_size.max(1)];

        while !self.is_complete(phase) {
            match tokio::time::timeout(limits.read_timeout, reader.read(&mut chunk)).await {
                Err(_elapsed) => self.not_ready(limits)?,
                Ok(Ok(0)) => {
                    tracing::debug!(request_id = self.id, ?phase, "connection reached end of input");
                    break;
                }
                Ok(Ok(n)) => {
                    tracing::trace!(request_id = self.id, bytes = n, "read chunk");
                    if self.accept_chunk(&chunk[..n], limits, phase)? {
                        break;
                    }
                }
                Ok(Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Ok(Err(e)) if is_not_ready(&e) => self.not_ready(limits)?,
                Ok(Err(e)) => return Err(self.read_failed(e)),
            }
        }
        Ok(())
    }

    /// Reads until the header boundary is found or the peer stops sending.
    pub fn read_head<R: Read>(&mut self, reader: &mut R, limits: &ReadLimits) -> Result<(), Error> {
        self.fill(reader, limits, Phase::Head)
    }

    pub async fn read_head_async<R>(&mut self, reader: &mut R, limits: &ReadLimits) -> Result<(), Error>
    where
        R: AsyncRead + Unpin,
    {
        self.fill_async(reader, limits, Phase::Head).await
    }

    fn check_body_limit(&mut self, limits: &ReadLimits) -> Result<bool, Error> {
        if self.body_offset.is_none() || self.content_size == 0 {
            return Ok(false);
        }
        if self.content_size > limits.max_body_size {
            return Err(self.fail(Error::BodyTooLarge {
                declared: self.content_size,
                limit: limits.max_body_size,
            }));
        }
        Ok(true)
    }

    /// Reads the rest of a `Content-Length` body after a successful parse.
    ///
    /// The peer closing early just leaves the body short.
    pub fn read_body<R: Read>(&mut self, reader: &mut R, limits: &ReadLimits) -> Result<(), Error> {
        if self.check_body_limit(limits)? {
            self.fill(reader, limits, Phase::Body)?;
        }
        Ok(())
    }

    pub async fn read_body_async<R>(&mut self, reader: &mut R, limits: &ReadLimits) -> Result<(), Error>
    where
        R: AsyncRead + Unpin,
    {
        if self.check_body_limit(limits)? {
            self.fill_async(reader, limits, Phase::Body).await?;
        }
        Ok(())
    }

    /// Runs the header state machine over the head and derives the content size.
    ///
    /// Without a boundary (the peer closed early) the whole buffer is parsed.
    pub fn parse_head(&mut self) -> Result<(), Error> {
        let end = self.body_offset.unwrap_or(self.raw.len());

        let head = match self.run_parser(end) {
            Ok(head) => head,
            Err(err) => {
                tracing::error!(request_id = self.id, error = %err, "header parse failed");
                return Err(self.fail(err));
            }
        };

        self.path = uri::percent_decode(uri::split(head.uri.as_bytes()).0)
            .and_then(|path| String::from_utf8(path).ok());
        self.method = Some(head.method);
        self.uri = Some(head.uri);
        self.protocol = Some(head.protocol);
        self.headers = head.headers;

        self.content_size = match self.headers.get("Content-Length") {
            None => 0,
            Some(value) => match value.to_str().ok().and_then(parse_content_length) {
                Some(size) => size,
                None => {
                    let err = Error::MalformedHeaderValue {
                        name: "Content-Length",
                        value: value.to_string(),
                    };
                    tracing::error!(request_id = self.id, error = %err, "invalid content length");
                    return Err(self.fail(err));
                }
            },
        };

        self.status = RequestStatus::Ok;
        Ok(())
    }

    fn run_parser(&mut self, end: usize) -> Result<ParsedHead, Error> {
        let table = std::mem::replace(&mut self.headers, FieldTable::with_capacity(1)?);
        let mut parser = HeaderParser::with_table(table)?;
        parser.feed(&self.raw.as_bytes()[..end])?;
        parser.finish()
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    /// Offset of the first body byte in [`Request::raw`], once the boundary was seen.
    pub fn body_offset(&self) -> Option<usize> {
        self.body_offset
    }

    /// Every byte read from the connection so far.
    pub fn raw(&self) -> &[u8] {
        self.raw.as_bytes()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_ref().and_then(|t| t.to_str().ok())
    }

    pub fn method_kind(&self) -> Option<Method> {
        self.method.as_ref().and_then(|t| Method::from_bytes(t.as_bytes()))
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_ref().and_then(|t| t.to_str().ok())
    }

    /// Percent-decoded path portion of the URI.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_ref().and_then(|t| t.to_str().ok())
    }

    /// Looks up a header through the field table's bucket lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|t| t.to_str().ok())
    }

    pub fn headers(&self) -> &FieldTable {
        &self.headers
    }

    pub fn content_size(&self) -> usize {
        self.content_size
    }

    fn buffered_body_len(&self) -> usize {
        self.body_offset
            .map_or(0, |offset| self.raw.len().saturating_sub(offset))
    }

    /// Body bytes received so far, capped at the declared content size.
    pub fn body(&self) -> &[u8] {
        match self.body_offset {
            Some(offset) => {
                let end = (offset + self.content_size).min(self.raw.len());
                &self.raw.as_bytes()[offset..end]
            }
            None => &[],
        }
    }

    /// Decoded query string parameters.
    pub fn query(&self) -> Result<FieldTable, Error> {
        let query = self
            .uri
            .as_ref()
            .and_then(|t| uri::split(t.as_bytes()).1)
            .unwrap_or_default();
        uri::query_params(query)
    }
}

/// `Content-Length` is 1*DIGIT; `usize::from_str` would also take a leading `+`.
fn parse_content_length(value: &str) -> Option<usize> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn is_not_ready(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}
