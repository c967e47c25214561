// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-shot client (master) exchange.

use std::{
    io::{Read, Write},
    net::{SocketAddr, TcpStream},
    time::Duration,
    vec::Vec,
};

use super::{DEFAULT_PORT, DEFAULT_TIMEOUT, Result, SessionError, read_frame};
use crate::{
    Address, FunctionCode, Header, Quantity, Request, RequestAdu, RequestPdu, Response,
    ResponseAdu, ResponsePdu, TransactionId, UnitId, Word,
    tcp::{self, MAX_FRAME_LEN},
};

/// Where to connect and what to ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub address: SocketAddr,
    pub unit_id: UnitId,
    pub transaction_id: TransactionId,
    pub start_address: Address,
    pub quantity: Quantity,
    /// Connect, read and write timeout. `None` blocks indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([192, 168, 4, 1], DEFAULT_PORT)),
            unit_id: 1,
            transaction_id: 1,
            start_address: 4,
            quantity: 2,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn with_address(mut self, address: SocketAddr) -> Self {
        self.address = address;
        self
    }

    #[must_use]
    pub fn with_unit_id(mut self, unit_id: UnitId) -> Self {
        self.unit_id = unit_id;
        self
    }

    #[must_use]
    pub fn with_transaction_id(mut self, transaction_id: TransactionId) -> Self {
        self.transaction_id = transaction_id;
        self
    }

    /// Registers to read.
    #[must_use]
    pub fn with_registers(mut self, start_address: Address, quantity: Quantity) -> Self {
        self.start_address = start_address;
        self.quantity = quantity;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Progress of a [`ClientSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Idle,
    RequestBuilt,
    Sent,
    AwaitingResponse,
    Completed,
    Failed,
}

/// Sends one request and waits for its response.
///
/// The session does not retry or reconnect. Once the exchange completed
/// or failed every further call returns [`SessionError::Finished`].
#[derive(Debug)]
pub struct ClientSession<T> {
    transport: T,
    hdr: Header,
    state: ClientState,
}

impl ClientSession<TcpStream> {
    /// Connect to the server named in `config`.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let stream = match config.timeout {
            Some(timeout) => TcpStream::connect_timeout(&config.address, timeout)?,
            None => TcpStream::connect(config.address)?,
        };
        stream.set_read_timeout(config.timeout)?;
        stream.set_write_timeout(config.timeout)?;
        stream.set_nodelay(true)?;
        log::info!("Connected to Modbus server at {}", config.address);
        Ok(Self::new(
            stream,
            Header {
                transaction_id: config.transaction_id,
                unit_id: config.unit_id,
            },
        ))
    }
}

impl<T: Read + Write> ClientSession<T> {
    /// Create a session on an already connected transport.
    pub const fn new(transport: T, hdr: Header) -> Self {
        Self {
            transport,
            hdr,
            state: ClientState::Idle,
        }
    }

    #[must_use]
    pub const fn state(&self) -> ClientState {
        self.state
    }

    /// Give back the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Read `quantity` holding registers starting at `address`.
    ///
    /// An exception response from the server is returned as
    /// [`SessionError::Exception`].
    pub fn read_holding_registers(
        &mut self,
        address: Address,
        quantity: Quantity,
    ) -> Result<Vec<Word>> {
        if self.state != ClientState::Idle {
            return Err(SessionError::Finished);
        }
        let result = self.exchange(address, quantity);
        match &result {
            Ok(words) => {
                log::info!("Register values: {words:04X?}");
                self.transition(ClientState::Completed);
            }
            Err(err) => {
                log::warn!("Exchange {} failed: {err}", self.hdr.transaction_id);
                self.transition(ClientState::Failed);
            }
        }
        result
    }

    fn transition(&mut self, state: ClientState) {
        log::trace!("Client session: {:?} -> {state:?}", self.state);
        self.state = state;
    }

    fn exchange(&mut self, address: Address, quantity: Quantity) -> Result<Vec<Word>> {
        let buf = &mut [0; MAX_FRAME_LEN];
        let req = RequestAdu {
            hdr: self.hdr,
            pdu: RequestPdu(Request::ReadHoldingRegisters(address, quantity)),
        };
        let len = tcp::client::encode_request(req, buf)?;
        self.transition(ClientState::RequestBuilt);

        self.transport.write_all(&buf[..len])?;
        self.transport.flush()?;
        self.transition(ClientState::Sent);
        log::debug!("Sent request: {:02X?}", &buf[..len]);

        self.transition(ClientState::AwaitingResponse);
        let len = read_frame(&mut self.transport, buf)?;
        let ResponseAdu { hdr, pdu } = tcp::client::decode_response(&buf[..len])?;
        if hdr.transaction_id != self.hdr.transaction_id {
            return Err(SessionError::TransactionMismatch {
                expected: self.hdr.transaction_id,
                received: hdr.transaction_id,
            });
        }
        let ResponsePdu(rsp) = pdu;
        match rsp {
            Ok(Response::ReadHoldingRegisters(data)) => {
                if data.len() != usize::from(quantity) {
                    return Err(SessionError::QuantityMismatch {
                        expected: usize::from(quantity),
                        received: data.len(),
                    });
                }
                Ok(data.into_iter().collect())
            }
            Ok(rsp) => Err(SessionError::FunctionMismatch {
                expected: FunctionCode::ReadHoldingRegisters,
                received: FunctionCode::from(rsp),
            }),
            Err(ex) if ex.function != FunctionCode::ReadHoldingRegisters => {
                Err(SessionError::FunctionMismatch {
                    expected: FunctionCode::ReadHoldingRegisters,
                    received: ex.function,
                })
            }
            Err(ex) => Err(SessionError::Exception(ex)),
        }
    }
}

/// Connect as configured, read the configured registers and disconnect.
pub fn fetch_registers(config: &ClientConfig) -> Result<Vec<Word>> {
    let mut session = ClientSession::connect(config)?;
    session.read_holding_registers(config.start_address, config.quantity)
}

#[cfg(test)]
mod tests {
    use super::{super::mock::MockTransport, *};
    use crate::{Exception, ExceptionResponse, error::Error};
    use std::vec;

    const REQUEST: &[u8] = &[
        0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x04, 0x00, 0x02,
    ];

    fn session(response: &[u8]) -> ClientSession<MockTransport> {
        ClientSession::new(
            MockTransport::new(response),
            Header {
                transaction_id: 1,
                unit_id: 1,
            },
        )
    }

    #[test]
    fn read_registers() {
        let rsp = hex::decode("00010000000701030411112222").unwrap();
        let mut client = session(&rsp);
        assert_eq!(client.state(), ClientState::Idle);
        let words = client.read_holding_registers(4, 2).unwrap();
        assert_eq!(words, vec![0x1111, 0x2222]);
        assert_eq!(client.state(), ClientState::Completed);
        assert_eq!(client.into_inner().output, REQUEST);
    }

    #[test]
    fn read_registers_from_fragmented_response() {
        let rsp = hex::decode("00010000000701030411112222").unwrap();
        let mut client = ClientSession::new(
            MockTransport::new(&rsp).with_chunk_size(3),
            Header {
                transaction_id: 1,
                unit_id: 1,
            },
        );
        assert_eq!(
            client.read_holding_registers(4, 2).unwrap(),
            vec![0x1111, 0x2222]
        );
    }

    #[test]
    fn exception_response() {
        let mut client = session(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x01, 0x83, 0x02]);
        let err = client.read_holding_registers(9, 2).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Exception(ExceptionResponse {
                function: FunctionCode::ReadHoldingRegisters,
                exception: Exception::IllegalDataAddress,
            })
        ));
        assert_eq!(client.state(), ClientState::Failed);
    }

    #[test]
    fn single_shot() {
        let rsp = hex::decode("00010000000701030411112222").unwrap();
        let mut client = session(&rsp);
        client.read_holding_registers(4, 2).unwrap();
        assert!(matches!(
            client.read_holding_registers(4, 2),
            Err(SessionError::Finished)
        ));
        assert_eq!(client.state(), ClientState::Completed);
    }

    #[test]
    fn failure_is_terminal() {
        let mut client = session(&[]);
        assert!(matches!(
            client.read_holding_registers(4, 2),
            Err(SessionError::ConnectionClosed { received: 0 })
        ));
        assert!(matches!(
            client.read_holding_registers(4, 2),
            Err(SessionError::Finished)
        ));
        assert_eq!(client.state(), ClientState::Failed);
    }

    #[test]
    fn transaction_mismatch() {
        let rsp = hex::decode("00020000000701030411112222").unwrap();
        let mut client = session(&rsp);
        assert!(matches!(
            client.read_holding_registers(4, 2),
            Err(SessionError::TransactionMismatch {
                expected: 1,
                received: 2
            })
        ));
    }

    #[test]
    fn quantity_mismatch() {
        let rsp = hex::decode("0001000000050103021111").unwrap();
        let mut client = session(&rsp);
        assert!(matches!(
            client.read_holding_registers(4, 2),
            Err(SessionError::QuantityMismatch {
                expected: 2,
                received: 1
            })
        ));
    }

    #[test]
    fn function_mismatch() {
        let rsp = hex::decode("000100000006010600011111").unwrap();
        let mut client = session(&rsp);
        assert!(matches!(
            client.read_holding_registers(4, 2),
            Err(SessionError::FunctionMismatch {
                expected: FunctionCode::ReadHoldingRegisters,
                received: FunctionCode::Custom(0x06),
            })
        ));

        let mut client = session(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x01, 0x86, 0x02]);
        assert!(matches!(
            client.read_holding_registers(4, 2),
            Err(SessionError::FunctionMismatch {
                received: FunctionCode::Custom(0x06),
                ..
            })
        ));
    }

    #[test]
    fn malformed_response() {
        // byte count is odd
        let rsp = hex::decode("000100000006010303111122").unwrap();
        let mut client = session(&rsp);
        assert!(matches!(
            client.read_holding_registers(4, 2),
            Err(SessionError::Frame(Error::ByteCount(3)))
        ));
    }

    #[test]
    fn write_failure() {
        let mut transport = MockTransport::new(&[]);
        transport.fail_writes = true;
        let mut client = ClientSession::new(
            transport,
            Header {
                transaction_id: 1,
                unit_id: 1,
            },
        );
        assert!(matches!(
            client.read_holding_registers(4, 2),
            Err(SessionError::Io(_))
        ));
        assert_eq!(client.state(), ClientState::Failed);
    }

    #[test]
    fn config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.address, "192.168.4.1:502".parse().unwrap());
        assert_eq!((config.start_address, config.quantity), (4, 2));
        let config = config.with_registers(9, 2).with_timeout(None);
        assert_eq!((config.start_address, config.quantity), (9, 2));
        assert_eq!(config.timeout, None);
    }
}
