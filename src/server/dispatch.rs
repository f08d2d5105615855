//! Strategies for handing an accepted connection to a worker.

use std::fmt;
use std::net::{SocketAddr, TcpStream};
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use tokio::runtime::Runtime;

use crate::error::Error;
use crate::server::{Worker, serve_async, serve_blocking};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStrategy {
    /// One process per connection.
    #[default]
    Fork,
    /// One OS thread per connection.
    Thread,
    /// Tasks on a shared tokio runtime.
    Event,
}

impl FromStr for DispatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fork" => Ok(DispatchStrategy::Fork),
            "thread" => Ok(DispatchStrategy::Thread),
            "event" => Ok(DispatchStrategy::Event),
            other => Err(format!("unknown dispatch strategy {other:?}")),
        }
    }
}

impl fmt::Display for DispatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DispatchStrategy::Fork => "fork",
            DispatchStrategy::Thread => "thread",
            DispatchStrategy::Event => "event",
        })
    }
}

/// What became of a dispatched connection, from the listener's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Forked { pid: i32 },
    Spawned,
    Scheduled,
    /// The worker could not be started; the connection was closed.
    Dropped,
}

pub trait Dispatch: Send + Sync {
    /// Hands `stream` over to a worker. Must not block on the request itself.
    fn dispatch(&self, stream: TcpStream, peer: SocketAddr) -> Outcome;
}

pub fn build(strategy: DispatchStrategy, worker: Arc<Worker>) -> Result<Box<dyn Dispatch>, Error> {
    tracing::info!(%strategy, "dispatch strategy selected");
    Ok(match strategy {
        DispatchStrategy::Fork => Box::new(ForkDispatch::new(worker)),
        DispatchStrategy::Thread => Box::new(ThreadDispatch::new(worker)),
        DispatchStrategy::Event => Box::new(EventDispatch::new(worker)?),
    })
}

pub struct ForkDispatch {
    worker: Arc<Worker>,
}

impl ForkDispatch {
    pub fn new(worker: Arc<Worker>) -> Self {
        Self { worker }
    }
}

impl Dispatch for ForkDispatch {
    fn dispatch(&self, stream: TcpStream, peer: SocketAddr) -> Outcome {
        // Terminated children are reaped by the kernel, so the listener never
        // waits on them and no zombies pile up.
        unsafe {
            libc::signal(libc::SIGCHLD, libc::SIG_IGN);
        }

        match unsafe { libc::fork() } {
            -1 => {
                tracing::error!(%peer, error = %std::io::Error::last_os_error(), "fork failed");
                Outcome::Dropped
            }
            0 => {
                // === Child process ===
                let code = match serve_blocking(stream, peer, Arc::clone(&self.worker)) {
                    Ok(()) => 0,
                    Err(_) => 1,
                };
                tracing::info!(pid = std::process::id(), "ending forked process");
                unsafe { libc::_exit(code) }
            }
            pid => {
                tracing::info!(%peer, pid, "forked worker");
                Outcome::Forked { pid }
            }
        }
    }
}

pub struct ThreadDispatch {
    worker: Arc<Worker>,
}

impl ThreadDispatch {
    pub fn new(worker: Arc<Worker>) -> Self {
        Self { worker }
    }
}

impl Dispatch for ThreadDispatch {
    fn dispatch(&self, stream: TcpStream, peer: SocketAddr) -> Outcome {
        let worker = Arc::clone(&self.worker);
        let spawned = std::thread::Builder::new()
            .name(format!("conn-{peer}"))
            .spawn(move || serve_blocking(stream, peer, worker));

        match spawned {
            Ok(_) => Outcome::Spawned,
            Err(e) => {
                tracing::error!(%peer, error = %e, "failed to spawn connection thread");
                Outcome::Dropped
            }
        }
    }
}

pub struct EventDispatch {
    worker: Arc<Worker>,
    runtime: Runtime,
}

impl EventDispatch {
    pub fn new(worker: Arc<Worker>) -> Result<Self, Error> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("forkhttp-event")
            .build()
            .map_err(Error::Runtime)?;
        Ok(Self { worker, runtime })
    }
}

impl Dispatch for EventDispatch {
    fn dispatch(&self, stream: TcpStream, peer: SocketAddr) -> Outcome {
        let worker = Arc::clone(&self.worker);
        self.runtime.spawn(async move {
            let _ = serve_async(stream, peer, worker).await;
        });
        Outcome::Scheduled
    }
}
