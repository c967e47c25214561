// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server (slave) side: one request per accepted connection.

use std::{
    io::{self, Read, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    thread,
    time::Duration,
};

use super::{DEFAULT_PORT, DEFAULT_TIMEOUT, Result, SessionError, read_frame};
use crate::{
    Exception, TransactionId,
    dispatch::Dispatcher,
    error::Error,
    store::WriteRegisters,
    tcp::{self, MAX_FRAME_LEN},
};

const MIN_ACCEPT_DELAY: Duration = Duration::from_millis(10);
const MAX_ACCEPT_DELAY: Duration = Duration::from_secs(1);

/// Pause after `failures` consecutive accept errors.
fn accept_delay(failures: u32) -> Duration {
    let factor = 1_u32
        .checked_shl(failures.saturating_sub(1))
        .unwrap_or(u32::MAX);
    MIN_ACCEPT_DELAY.saturating_mul(factor).min(MAX_ACCEPT_DELAY)
}

/// Listening socket and per-connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Read and write timeout of accepted connections. `None` blocks
    /// indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Progress of a [`ServerSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Accepted,
    Reading,
    Dispatching,
    Responding,
    Rejected,
    Closed,
}

/// How a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A response was written.
    Responded {
        transaction_id: TransactionId,
        exception: Option<Exception>,
    },
    /// The request could not be decoded; nothing was written.
    Rejected(Error),
}

/// Serves exactly one request on an accepted connection.
#[derive(Debug)]
pub struct ServerSession<T> {
    transport: T,
    state: ConnectionState,
}

impl<T: Read + Write> ServerSession<T> {
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            state: ConnectionState::Accepted,
        }
    }

    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Give back the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Read one request, dispatch it and write the response.
    ///
    /// Malformed requests are answered with silence. Afterwards the
    /// session is [`ConnectionState::Closed`] whatever the result, and the
    /// connection should be dropped.
    pub fn serve<S>(&mut self, dispatcher: &Dispatcher<'_>, store: &mut S) -> Result<Outcome>
    where
        S: WriteRegisters,
    {
        if self.state != ConnectionState::Accepted {
            return Err(SessionError::Finished);
        }
        let result = self.handle(dispatcher, store);
        self.transition(ConnectionState::Closed);
        result
    }

    fn transition(&mut self, state: ConnectionState) {
        log::trace!("Server session: {:?} -> {state:?}", self.state);
        self.state = state;
    }

    fn reject(&mut self, err: Error) -> Result<Outcome> {
        log::warn!("Dropping malformed request: {err}");
        self.transition(ConnectionState::Rejected);
        Ok(Outcome::Rejected(err))
    }

    fn handle<S>(&mut self, dispatcher: &Dispatcher<'_>, store: &mut S) -> Result<Outcome>
    where
        S: WriteRegisters,
    {
        self.transition(ConnectionState::Reading);
        let buf = &mut [0; MAX_FRAME_LEN];
        let len = match read_frame(&mut self.transport, buf) {
            Ok(len) => len,
            Err(SessionError::Frame(err)) => return self.reject(err),
            Err(SessionError::ConnectionClosed { received }) if received > 0 => {
                return self.reject(Error::FrameTooShort(received));
            }
            Err(err) => return Err(err),
        };
        let adu = match tcp::server::decode_request(&buf[..len]) {
            Ok(adu) => adu,
            Err(err) => return self.reject(err),
        };
        log::debug!(
            "Received request {} from unit {}: {:?}",
            adu.hdr.transaction_id,
            adu.hdr.unit_id,
            adu.pdu.0
        );

        self.transition(ConnectionState::Dispatching);
        let scratch = &mut [0; MAX_FRAME_LEN];
        let rsp = dispatcher.dispatch(adu, store, scratch);

        self.transition(ConnectionState::Responding);
        let out = &mut [0; MAX_FRAME_LEN];
        let len = tcp::server::encode_response(rsp, out)?;
        self.transport.write_all(&out[..len])?;
        self.transport.flush()?;
        log::debug!("Sent response: {:02X?}", &out[..len]);

        Ok(Outcome::Responded {
            transaction_id: rsp.hdr.transaction_id,
            exception: rsp.pdu.0.err().map(|ex| ex.exception),
        })
    }
}

/// Sequential Modbus TCP server.
///
/// Connections are served one after another in accept order; the register
/// store is only ever touched by the single active dispatch.
#[derive(Debug)]
pub struct Server<S> {
    listener: TcpListener,
    timeout: Option<Duration>,
    dispatcher: Dispatcher<'static>,
    store: S,
}

impl<S: WriteRegisters> Server<S> {
    /// Bind the listening socket.
    pub fn bind(config: &ServerConfig, store: S) -> Result<Self> {
        let listener = TcpListener::bind(config.bind)?;
        log::info!("Modbus TCP server listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            timeout: config.timeout,
            dispatcher: Dispatcher::default(),
            store,
        })
    }

    /// Replace the default handler table.
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher<'static>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Accept one connection, serve its request and close it.
    pub fn serve_next(&mut self) -> Result<Outcome> {
        let (stream, peer) = self.listener.accept()?;
        self.serve_connection(stream, peer)
    }

    fn serve_connection(&mut self, stream: TcpStream, peer: SocketAddr) -> Result<Outcome> {
        log::info!("Client {peer} connected");
        let result = self.serve_stream(stream);
        log::debug!("Connection to {peer} closed");
        result
    }

    fn serve_stream(&mut self, stream: TcpStream) -> Result<Outcome> {
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;
        let mut session = ServerSession::new(stream);
        session.serve(&self.dispatcher, &mut self.store)
    }

    /// Serve connections forever.
    ///
    /// Failures only end the affected connection. Repeated accept errors
    /// (e.g. no file descriptors left) back off up to one second.
    pub fn run(&mut self) -> ! {
        let mut failures = 0_u32;
        loop {
            let (stream, peer) = match self.listener.accept() {
                Ok(conn) => {
                    failures = 0;
                    conn
                }
                Err(err) => {
                    failures = failures.saturating_add(1);
                    let delay = accept_delay(failures);
                    log::warn!("Accept failed: {err}, retrying in {delay:?}");
                    thread::sleep(delay);
                    continue;
                }
            };
            match self.serve_connection(stream, peer) {
                Ok(outcome) => log::debug!("{outcome:?}"),
                Err(err) => log::warn!("Connection failed: {err}"),
            }
        }
    }
}
