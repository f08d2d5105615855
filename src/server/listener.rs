use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::os::fd::AsRawFd;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::info;

use crate::error::Error;
use crate::server::dispatch::Dispatch;
use crate::server::shutdown::Shutdown;

pub const LISTEN_BACKLOG: i32 = 20;

/// Non-blocking listening socket.
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    pub fn bind(addr: SocketAddr) -> Result<Self, Error> {
        let bind_err = |source| Error::Bind { addr, source };

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
            .map_err(bind_err)?;
        socket.set_nonblocking(true).map_err(bind_err)?;
        socket.set_reuse_address(true).map_err(bind_err)?;
        socket.bind(&addr.into()).map_err(bind_err)?;
        socket.listen(LISTEN_BACKLOG).map_err(Error::Listen)?;

        let inner: TcpListener = socket.into();
        let local_addr = inner.local_addr().map_err(Error::Listen)?;
        info!("Listening on {}", local_addr);

        Ok(Self { inner, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits up to `timeout` for a pending connection.
    pub fn poll(&self, timeout: Duration) -> io::Result<bool> {
        let mut pfd = libc::pollfd {
            fd: self.inner.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout_ms = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

        match unsafe { libc::poll(&mut pfd, 1, timeout_ms) } {
            -1 => Err(io::Error::last_os_error()),
            0 => Ok(false),
            _ => Ok(true),
        }
    }

    /// Accepts one pending connection; `None` if it was gone by the time we asked.
    pub fn accept(&self) -> Result<Option<(TcpStream, SocketAddr)>, Error> {
        match self.inner.accept() {
            Ok(conn) => Ok(Some(conn)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(Error::Accept(e)),
        }
    }
}

/// Poll/accept/dispatch loop. Returns once `shutdown` is triggered.
pub fn run(listener: &Listener, dispatcher: &dyn Dispatch, shutdown: &Shutdown, poll_interval: Duration) {
    while !shutdown.is_triggered() {
        match listener.poll(poll_interval) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                tracing::error!(error = %e, "poll failed");
                continue;
            }
        }

        match listener.accept() {
            Ok(Some((socket, peer))) => {
                info!("Accepted connection from {}", peer);
                let outcome = dispatcher.dispatch(socket, peer);
                tracing::debug!(%peer, ?outcome, "connection dispatched");
            }
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "accept failed"),
        }
    }

    info!("Listener on {} shutting down", listener.local_addr);
}
