use std::io::Write;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::Error;
use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";
const DEFAULT_CONTENT_TYPE: &str = "text/plain";

fn push_header(buf: &mut Vec<u8>, name: &[u8], value: &[u8]) {
    buf.extend_from_slice(name);
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(value);
    buf.extend_from_slice(b"\r\n");
}

/// Headers the writer always emits itself; handler-set copies are dropped.
const FIXED_HEADERS: [&[u8]; 4] = [b"Connection", b"Keep-Alive", b"Content-Length", b"Content-Type"];

fn is_fixed_header(name: &[u8]) -> bool {
    FIXED_HEADERS.iter().any(|fixed| fixed.eq_ignore_ascii_case(name))
}

pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let body = resp.body.as_bytes();
    let mut buf = Vec::with_capacity(160 + body.len());

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    push_header(&mut buf, b"Connection", b"Keep-Alive");
    push_header(&mut buf, b"Keep-Alive", b"timeout=5, max=999");
    push_header(&mut buf, b"Content-Length", body.len().to_string().as_bytes());

    let content_type = resp
        .headers
        .get_exact("Content-Type")
        .map_or(DEFAULT_CONTENT_TYPE.as_bytes(), |v| v.as_bytes());
    push_header(&mut buf, b"Content-Type", content_type);

    for (k, v) in resp.headers.iter() {
        if is_fixed_header(k.as_bytes()) {
            continue;
        }
        push_header(&mut buf, k.as_bytes(), v.as_bytes());
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");
    buf.extend_from_slice(body);

    buf
}

/// Serialized response plus write progress.
pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn write_to<W: Write>(&mut self, stream: &mut W) -> Result<(), Error> {
        while self.written < self.buffer.len() {
            let n = stream
                .write(&self.buffer[self.written..])
                .map_err(Error::Write)?;

            if n == 0 {
                return Err(Error::Write(std::io::ErrorKind::WriteZero.into()));
            }

            self.written += n;
        }

        stream.flush().map_err(Error::Write)
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> Result<(), Error>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream
                .write(&self.buffer[self.written..])
                .await
                .map_err(Error::Write)?;

            if n == 0 {
                return Err(Error::Write(std::io::ErrorKind::WriteZero.into()));
            }

            self.written += n;
        }

        stream.flush().await.map_err(Error::Write)
    }
}
