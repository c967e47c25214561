// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turning decoded requests into responses.
//!
//! A [`Dispatcher`] maps function codes to [`Handler`]s. A handler either
//! only reads the register store or is allowed to write it; the capability
//! is fixed by the handler's signature. Function codes without a handler
//! are answered with [`Exception::IllegalFunction`].

use crate::{
    frame::*,
    store::{ReadRegisters, WriteRegisters},
};

/// Maximum number of registers a single Read Holding Registers request may ask for.
pub const MAX_READ_QUANTITY: Quantity = 125;

/// A handler that only reads registers.
///
/// The response data is written into the provided scratch buffer.
pub type ReadFn = for<'r, 'b> fn(
    Request<'r>,
    &dyn ReadRegisters,
    &'b mut [u8],
) -> Result<Response<'b>, Exception>;

/// A handler that may modify registers.
pub type WriteFn = for<'r, 'b> fn(
    Request<'r>,
    &mut dyn WriteRegisters,
    &'b mut [u8],
) -> Result<Response<'b>, Exception>;

#[derive(Debug, Clone, Copy)]
pub enum Handler {
    Read(ReadFn),
    Write(WriteFn),
}

const DEFAULT_HANDLERS: &[(FunctionCode, Handler)] = &[(
    FunctionCode::ReadHoldingRegisters,
    Handler::Read(read_holding_registers),
)];

/// Function code to handler table.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'t> {
    handlers: &'t [(FunctionCode, Handler)],
}

impl Default for Dispatcher<'static> {
    fn default() -> Self {
        Self::new(DEFAULT_HANDLERS)
    }
}

impl<'t> Dispatcher<'t> {
    /// Create a dispatcher from a handler table.
    ///
    /// If a function code occurs more than once the first entry wins.
    #[must_use]
    pub const fn new(handlers: &'t [(FunctionCode, Handler)]) -> Self {
        Self { handlers }
    }

    /// Look up the handler of a function code.
    #[must_use]
    pub fn handler(&self, function: FunctionCode) -> Option<Handler> {
        self.handlers
            .iter()
            .find(|(code, _)| *code == function)
            .map(|(_, handler)| *handler)
    }

    /// Produce the response to `adu`.
    ///
    /// Never fails: every problem with the request becomes an exception
    /// response. The header is carried over unchanged. `buf` is scratch
    /// space for the response data and should hold [`MAX_FRAME_LEN`] bytes.
    ///
    /// [`MAX_FRAME_LEN`]: crate::tcp::MAX_FRAME_LEN
    pub fn dispatch<'b, S>(
        &self,
        adu: RequestAdu<'_>,
        store: &mut S,
        buf: &'b mut [u8],
    ) -> ResponseAdu<'b>
    where
        S: WriteRegisters,
    {
        let RequestAdu {
            hdr,
            pdu: RequestPdu(req),
        } = adu;
        let function = FunctionCode::from(req);
        let result = match self.handler(function) {
            // no valid response exists for these, see `ResponsePdu::encode`
            _ if function.value() >= EXCEPTION_FLAG => {
                log::warn!(
                    "Request {} carries exception function code {function}",
                    hdr.transaction_id
                );
                Err(Exception::IllegalFunction)
            }
            Some(Handler::Read(f)) => f(req, &*store, buf),
            Some(Handler::Write(f)) => f(req, store, buf),
            None => Err(Exception::IllegalFunction),
        };
        let pdu = ResponsePdu(result.map_err(|exception| {
            log::debug!(
                "Request {} for function {function} failed: {exception}",
                hdr.transaction_id
            );
            ExceptionResponse {
                function,
                exception,
            }
        }));
        ResponseAdu { hdr, pdu }
    }
}

/// Dispatch `adu` with the default handler table.
pub fn dispatch<'b, S>(adu: RequestAdu<'_>, store: &mut S, buf: &'b mut [u8]) -> ResponseAdu<'b>
where
    S: WriteRegisters,
{
    Dispatcher::default().dispatch(adu, store, buf)
}

fn read_holding_registers<'b>(
    req: Request<'_>,
    store: &dyn ReadRegisters,
    buf: &'b mut [u8],
) -> Result<Response<'b>, Exception> {
    let Request::ReadHoldingRegisters(address, quantity) = req else {
        return Err(Exception::IllegalFunction);
    };
    if quantity == 0 {
        return Err(Exception::IllegalDataValue);
    }
    let words = store.read(address, quantity)?;
    if quantity > MAX_READ_QUANTITY {
        return Err(Exception::IllegalDataValue);
    }
    Data::from_words(words, buf)
        .map(Response::ReadHoldingRegisters)
        .map_err(|err| {
            log::error!("Failed to pack {} register(s): {err}", words.len());
            Exception::ServerDeviceFailure
        })
}
