//! Listening, accepting and handing connections to workers.
//!
//! [`Server`] owns the dispatch strategy and the request counters. The
//! counters are atomics shared by thread and event workers; a forked worker
//! gets its own private copy, so there they only describe that one process.

pub mod dispatch;
pub mod listener;
pub mod shutdown;

use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::config::Config;
use crate::error::Error;
use crate::http::connection::Connection;
use crate::http::handler::{Handler, HelloWorld};
use crate::http::request::ReadLimits;

pub use dispatch::{Dispatch, DispatchStrategy, Outcome};
pub use listener::Listener;
pub use shutdown::Shutdown;

/// Diagnostic request counters.
#[derive(Debug, Default)]
pub struct Counters {
    active: AtomicUsize,
    next_id: AtomicU64,
}

impl Counters {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Issues the next request id and counts the request as active until the
    /// returned guard is dropped.
    pub fn admit(self: &Arc<Self>) -> Admission {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::Relaxed);
        Admission {
            id,
            counters: Arc::clone(self),
        }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Number of request ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
pub struct Admission {
    id: u64,
    counters: Arc<Counters>,
}

impl Admission {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Admission {
    fn drop(&mut self) {
        self.counters.active.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Everything a worker needs to serve one connection.
pub struct Worker {
    pub(crate) limits: ReadLimits,
    pub(crate) counters: Arc<Counters>,
    pub(crate) handler: Arc<dyn Handler>,
}

impl Worker {
    pub fn new(limits: ReadLimits, handler: impl Handler) -> Self {
        Self::with_counters(limits, handler, Counters::shared())
    }

    pub fn with_counters(limits: ReadLimits, handler: impl Handler, counters: Arc<Counters>) -> Self {
        Self {
            limits,
            counters,
            handler: Arc::new(handler),
        }
    }

    pub fn counters(&self) -> &Arc<Counters> {
        &self.counters
    }
}

/// Serves one connection on the current thread with blocking reads.
///
/// The accepted socket is put in blocking mode with a read timeout; a read
/// that times out counts as "not ready" against the retry bound.
pub fn serve_blocking(stream: TcpStream, peer: SocketAddr, worker: Arc<Worker>) -> Result<(), Error> {
    stream.set_nonblocking(false).map_err(Error::Accept)?;
    let timeout = Some(worker.limits.read_timeout).filter(|t| !t.is_zero());
    stream.set_read_timeout(timeout).map_err(Error::Accept)?;

    let mut conn = Connection::new(stream, worker);
    let result = conn.run();
    if let Err(e) = &result {
        tracing::error!(%peer, error = %e, "request failed");
    }
    result
}

/// Serves one connection as a task on the current tokio runtime.
pub async fn serve_async(stream: TcpStream, peer: SocketAddr, worker: Arc<Worker>) -> Result<(), Error> {
    stream.set_nonblocking(true).map_err(Error::Accept)?;
    let stream = tokio::net::TcpStream::from_std(stream).map_err(Error::Accept)?;

    let mut conn = Connection::new(stream, worker);
    let result = conn.run_async().await;
    if let Err(e) = &result {
        tracing::error!(%peer, error = %e, "request failed");
    }
    result
}

pub struct Server {
    config: Config,
    worker: Arc<Worker>,
    dispatcher: Box<dyn Dispatch>,
}

impl Server {
    /// Server answering every request with `Hello, world!`.
    pub fn new(config: Config) -> Result<Self, Error> {
        Self::with_handler(config, HelloWorld)
    }

    pub fn with_handler(config: Config, handler: impl Handler) -> Result<Self, Error> {
        let worker = Arc::new(Worker::new(config.limits.clone(), handler));
        let dispatcher = dispatch::build(config.dispatch, Arc::clone(&worker))?;
        Ok(Self {
            config,
            worker,
            dispatcher,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn counters(&self) -> &Counters {
        &self.worker.counters
    }

    /// Opens the listening socket on the configured address.
    pub fn bind(&self) -> Result<Listener, Error> {
        Listener::bind(self.config.listen_addr())
    }

    /// Accepts and dispatches connections until `shutdown` is triggered.
    pub fn serve(&self, listener: &Listener, shutdown: &Shutdown) {
        listener::run(listener, self.dispatcher.as_ref(), shutdown, self.config.poll_interval);
    }

    pub fn run(&self, shutdown: &Shutdown) -> Result<(), Error> {
        let listener = self.bind()?;
        self.serve(&listener, shutdown);
        Ok(())
    }
}
