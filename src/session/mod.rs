// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blocking request/response exchanges over a connected byte stream.
//!
//! Sessions are generic over any transport implementing [`Read`] and
//! [`Write`]; [`TcpStream`](std::net::TcpStream) is used in production and
//! in-memory streams in tests. A session never assumes that one `read`
//! returns one frame: bytes are accumulated until the length announced in
//! the MBAP header has arrived.

use std::{
    io::{self, Read},
    time::Duration,
};

use thiserror::Error;

use crate::{
    ExceptionResponse, FunctionCode, TransactionId,
    error::Error as FrameError,
    tcp::{HEADER_LEN, MAX_FRAME_LEN, adu_len},
};

mod client;
mod server;

#[cfg(test)]
mod mock;

pub use self::{client::*, server::*};

/// Default Modbus TCP port.
pub const DEFAULT_PORT: u16 = 502;

/// Default read/write timeout of a connection.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Result type alias for session operations.
pub type Result<T> = core::result::Result<T, SessionError>;

/// Errors that end a client exchange or a server connection.
#[derive(Debug, Error)]
pub enum SessionError {
    /// I/O error during communication.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    /// The peer did not send or accept data in time.
    #[error("Communication timeout")]
    Timeout,

    /// The peer closed the connection before a complete frame arrived.
    #[error("Connection closed after {received} byte(s)")]
    ConnectionClosed {
        /// Number of bytes received so far.
        received: usize,
    },

    /// The peer sent a frame that could not be decoded.
    #[error("Invalid frame: {0}")]
    Frame(#[from] FrameError),

    /// The server answered with an exception response.
    #[error("Modbus exception: {0}")]
    Exception(ExceptionResponse),

    /// Transaction id mismatch between request and response.
    #[error("Transaction id mismatch: expected {expected}, received {received}")]
    TransactionMismatch {
        expected: TransactionId,
        received: TransactionId,
    },

    /// The response belongs to another function.
    #[error("Function code mismatch: expected {expected}, received {received}")]
    FunctionMismatch {
        expected: FunctionCode,
        received: FunctionCode,
    },

    /// The response carries a different number of registers than requested.
    #[error("Register count mismatch: expected {expected}, received {received}")]
    QuantityMismatch { expected: usize, received: usize },

    /// The session already performed its single exchange.
    #[error("Session already finished")]
    Finished,
}

impl From<io::Error> for SessionError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::Timeout,
            _ => Self::Io(err),
        }
    }
}

/// Read one complete ADU from `transport` into `buf` and return its length.
///
/// Never reads past the end of the frame, so a following frame stays in
/// the transport.
pub fn read_frame<T: Read>(transport: &mut T, buf: &mut [u8]) -> Result<usize> {
    if buf.len() < HEADER_LEN {
        return Err(FrameError::BufferSize.into());
    }
    let mut received = 0;
    loop {
        let want = match adu_len(&buf[..received]) {
            Some(len) => {
                let length_field = (len - (HEADER_LEN - 1)) as u16;
                if len > MAX_FRAME_LEN || len <= HEADER_LEN {
                    return Err(FrameError::LengthField(length_field).into());
                }
                if len > buf.len() {
                    return Err(FrameError::BufferSize.into());
                }
                len
            }
            // everything up to and including the length field
            None => HEADER_LEN - 1,
        };
        if received == want {
            log::trace!("Received frame: {:02X?}", &buf[..received]);
            return Ok(received);
        }
        let cnt = match transport.read(&mut buf[received..want]) {
            Ok(cnt) => cnt,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if cnt == 0 {
            return Err(SessionError::ConnectionClosed { received });
        }
        received += cnt;
    }
}
