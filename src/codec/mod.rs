// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{error::*, frame::*};
use byteorder::{BigEndian, ByteOrder};
use core::convert::TryFrom;

pub mod tcp;

type Result<T> = core::result::Result<T, Error>;

impl TryFrom<u8> for Exception {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        Exception::ALL
            .into_iter()
            .find(|ex| ex.code() == code)
            .ok_or(Error::ExceptionCode(code))
    }
}

/// The function code must be below [`EXCEPTION_FLAG`];
/// [`ResponsePdu::encode`] checks this before converting.
impl From<ExceptionResponse> for [u8; 2] {
    fn from(ex: ExceptionResponse) -> [u8; 2] {
        let fn_code = ex.function.value();
        debug_assert!(fn_code < EXCEPTION_FLAG);
        [fn_code | EXCEPTION_FLAG, ex.exception.code()]
    }
}

impl TryFrom<&[u8]> for ExceptionResponse {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 2 {
            return Err(Error::BufferSize);
        }
        let fn_err_code = bytes[0];
        if fn_err_code < EXCEPTION_FLAG {
            return Err(Error::ExceptionFnCode(fn_err_code));
        }
        let function = (fn_err_code & !EXCEPTION_FLAG).into();
        let exception = Exception::try_from(bytes[1])?;
        Ok(ExceptionResponse {
            function,
            exception,
        })
    }
}

impl<'r> TryFrom<&'r [u8]> for Request<'r> {
    type Error = Error;

    fn try_from(bytes: &'r [u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::BufferSize);
        }

        let fn_code = bytes[0];

        // A request never carries the exception flag.
        if fn_code >= EXCEPTION_FLAG {
            return Err(Error::FnCode(fn_code));
        }

        if bytes.len() < min_request_pdu_len(fn_code.into()) {
            return Err(Error::BufferSize);
        }

        let req = match FunctionCode::new(fn_code) {
            FunctionCode::ReadHoldingRegisters => {
                let addr = BigEndian::read_u16(&bytes[1..3]);
                let quantity = BigEndian::read_u16(&bytes[3..5]);
                Request::ReadHoldingRegisters(addr, quantity)
            }
            code @ FunctionCode::Custom(_) => Request::Custom(code, &bytes[1..]),
        };
        Ok(req)
    }
}

impl<'r> TryFrom<&'r [u8]> for Response<'r> {
    type Error = Error;

    fn try_from(bytes: &'r [u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::BufferSize);
        }
        let fn_code = bytes[0];
        if bytes.len() < min_response_pdu_len(fn_code.into()) {
            return Err(Error::BufferSize);
        }
        let rsp = match FunctionCode::new(fn_code) {
            FunctionCode::ReadHoldingRegisters => {
                let byte_count = bytes[1];
                if byte_count % 2 != 0 || byte_count as usize + 2 != bytes.len() {
                    return Err(Error::ByteCount(byte_count));
                }
                Response::ReadHoldingRegisters(Data::from_bytes(&bytes[2..])?)
            }
            code @ FunctionCode::Custom(_) => Response::Custom(code, &bytes[1..]),
        };
        Ok(rsp)
    }
}

impl RequestPdu<'_> {
    /// Encode the PDU into `buf` and return the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let len = self.0.pdu_len();
        if buf.len() < len {
            return Err(Error::BufferSize);
        }
        match self.0 {
            Request::ReadHoldingRegisters(address, quantity) => {
                buf[0] = FunctionCode::ReadHoldingRegisters.value();
                BigEndian::write_u16(&mut buf[1..3], address);
                BigEndian::write_u16(&mut buf[3..5], quantity);
            }
            Request::Custom(code, data) => {
                buf[0] = code.value();
                buf[1..len].copy_from_slice(data);
            }
        }
        Ok(len)
    }
}

impl ResponsePdu<'_> {
    /// Encode the PDU into `buf` and return the number of bytes written.
    ///
    /// Function codes with the exception flag set cannot be answered and
    /// fail with [`Error::FnCode`].
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let fn_code = match self.0 {
            Ok(rsp) => FunctionCode::from(rsp),
            Err(ex) => ex.function,
        }
        .value();
        if fn_code >= EXCEPTION_FLAG {
            return Err(Error::FnCode(fn_code));
        }
        let len = self.pdu_len();
        if buf.len() < len {
            return Err(Error::BufferSize);
        }
        match self.0 {
            Ok(Response::ReadHoldingRegisters(words)) => {
                let byte_count = u8::try_from(words.len() * 2).map_err(|_| Error::BufferSize)?;
                buf[0] = FunctionCode::ReadHoldingRegisters.value();
                buf[1] = byte_count;
                words.copy_to(&mut buf[2..]);
            }
            Ok(Response::Custom(code, data)) => {
                buf[0] = code.value();
                buf[1..len].copy_from_slice(data);
            }
            Err(ex) => {
                let bytes: [u8; 2] = ex.into();
                buf[..2].copy_from_slice(&bytes);
            }
        }
        Ok(len)
    }
}

/// Number of PDU bytes a request with this function code carries, if fixed.
pub(crate) const fn request_pdu_len(fn_code: FunctionCode) -> Option<usize> {
    match fn_code {
        FunctionCode::ReadHoldingRegisters => Some(5),
        FunctionCode::Custom(_) => None,
    }
}

fn min_request_pdu_len(fn_code: FunctionCode) -> usize {
    match fn_code {
        FunctionCode::ReadHoldingRegisters => 5,
        FunctionCode::Custom(_) => 1,
    }
}

fn min_response_pdu_len(fn_code: FunctionCode) -> usize {
    match fn_code {
        FunctionCode::ReadHoldingRegisters => 2,
        FunctionCode::Custom(_) => 1,
    }
}
