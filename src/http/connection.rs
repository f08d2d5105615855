use std::io::{Read, Write};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Error;
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::server::Worker;

/// One accepted connection and the single request it carries.
pub struct Connection<S> {
    stream: S,
    worker: Arc<Worker>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    /// The request stays alive until its response is out.
    Writing(ResponseWriter, Request),
    Closed,
}

impl<S> Connection<S> {
    pub fn new(stream: S, worker: Arc<Worker>) -> Self {
        Self {
            stream,
            worker,
            state: ConnectionState::Reading,
        }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    fn respond(&self, req: &Request) -> Result<ResponseWriter, Error> {
        tracing::info!(
            request_id = req.id(),
            method = req.method().unwrap_or("-"),
            uri = req.uri().unwrap_or("-"),
            content_size = req.content_size(),
            "request parsed"
        );

        let mut response = Response::new(StatusCode::Ok)?;
        if let Err(err) = self.worker.handler.handle(req, &mut response) {
            tracing::error!(request_id = req.id(), error = %err, "handler failed");
            response = Response::internal_error()?;
        }
        Ok(ResponseWriter::new(&response))
    }
}

impl<S: Read + Write> Connection<S> {
    /// Drives the connection from the first read to the final write.
    ///
    /// A request that fails to read or parse gets no response.
    pub fn run(&mut self) -> Result<(), Error> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    let req = self.read_request()?;
                    self.state = ConnectionState::Processing(req);
                }

                ConnectionState::Processing(req) => {
                    let writer = self.respond(&req)?;
                    self.state = ConnectionState::Writing(writer, req);
                }

                ConnectionState::Writing(mut writer, req) => {
                    writer.write_to(&mut self.stream)?;
                    tracing::debug!(request_id = req.id(), "response written");
                }

                ConnectionState::Closed => break,
            }
        }

        Ok(())
    }

    pub fn read_request(&mut self) -> Result<Request, Error> {
        let limits = &self.worker.limits;
        let mut req = Request::new(&self.worker.counters)?;
        req.read_head(&mut self.stream, limits)?;
        req.parse_head()?;
        req.read_body(&mut self.stream, limits)?;
        Ok(req)
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    pub async fn run_async(&mut self) -> Result<(), Error> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    let req = self.read_request_async().await?;
                    self.state = ConnectionState::Processing(req);
                }

                ConnectionState::Processing(req) => {
                    let writer = self.respond(&req)?;
                    self.state = ConnectionState::Writing(writer, req);
                }

                ConnectionState::Writing(mut writer, req) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    tracing::debug!(request_id = req.id(), "response written");
                }

                ConnectionState::Closed => break,
            }
        }

        Ok(())
    }

    pub async fn read_request_async(&mut self) -> Result<Request, Error> {
        let limits = &self.worker.limits;
        let mut req = Request::new(&self.worker.counters)?;
        req.read_head_async(&mut self.stream, limits).await?;
        req.parse_head()?;
        req.read_body_async(&mut self.stream, limits).await?;
        Ok(req)
    }
}
