// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;

mod data;
pub(crate) mod tcp;

pub use self::{data::*, tcp::*};
use byteorder::{BigEndian, ByteOrder};

/// Bit set on the function code of an exception response.
pub const EXCEPTION_FLAG: u8 = 0x80;

/// A Modbus function code.
///
/// It is represented by an unsigned 8 bit integer.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCode {
    /// Modbus Function Code: `03` (`0x03`).
    ReadHoldingRegisters,

    /// Any other function code.
    ///
    /// Decoding keeps it so the server can answer with an
    /// [`Exception::IllegalFunction`] or a registered custom handler.
    Custom(u8),
}

impl FunctionCode {
    /// Create a new [`FunctionCode`] with `value`.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        match value {
            0x03 => Self::ReadHoldingRegisters,
            code => Self::Custom(code),
        }
    }

    /// Get the [`u8`] value of the current [`FunctionCode`].
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::ReadHoldingRegisters => 0x03,
            Self::Custom(code) => code,
        }
    }

    /// The function code of an exception response to this function.
    #[must_use]
    pub const fn exception_code(self) -> u8 {
        self.value() | EXCEPTION_FLAG
    }
}

impl From<u8> for FunctionCode {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for FunctionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:0>2X}", self.value())
    }
}

/// A Modbus address is represented by 16 bit (from `0` to `65535`).
pub type Address = u16;

/// Modbus uses 16 bit for its data items (big-endian representation).
pub type Word = u16;

/// Number of items to process (`0` - `65535`).
pub type Quantity = u16;

/// Raw PDU data
type RawData<'r> = &'r [u8];

/// A request represents a message from the client (master) to the server (slave).
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'r> {
    ReadHoldingRegisters(Address, Quantity),
    Custom(FunctionCode, &'r [u8]),
}

/// A server (slave) exception response.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionResponse {
    pub function: FunctionCode,
    pub exception: Exception,
}

impl fmt::Display for ExceptionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (code 0x{:0>2X}) for function {}",
            self.exception,
            self.exception.code(),
            self.function
        )
    }
}

/// Represents a message from the client (slave) to the server (master).
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestPdu<'r>(pub Request<'r>);

/// Represents a message from the server (slave) to the client (master).
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponsePdu<'r>(pub Result<Response<'r>, ExceptionResponse>);

/// The response data of a successful request.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response<'r> {
    ReadHoldingRegisters(Data<'r>),
    Custom(FunctionCode, &'r [u8]),
}

impl<'r> From<Request<'r>> for FunctionCode {
    fn from(r: Request<'r>) -> Self {
        match r {
            Request::ReadHoldingRegisters(_, _) => Self::ReadHoldingRegisters,
            Request::Custom(code, _) => code,
        }
    }
}

impl<'r> From<Response<'r>> for FunctionCode {
    fn from(r: Response<'r>) -> Self {
        match r {
            Response::ReadHoldingRegisters(_) => Self::ReadHoldingRegisters,
            Response::Custom(code, _) => code,
        }
    }
}

/// A server (slave) exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    IllegalFunction = 0x01,
    IllegalDataAddress = 0x02,
    IllegalDataValue = 0x03,
    ServerDeviceFailure = 0x04,
    Acknowledge = 0x05,
    ServerDeviceBusy = 0x06,
    MemoryParityError = 0x08,
    GatewayPathUnavailable = 0x0A,
    GatewayTargetDevice = 0x0B,
}

impl Exception {
    /// Every exception code defined by the protocol.
    pub const ALL: [Self; 9] = [
        Self::IllegalFunction,
        Self::IllegalDataAddress,
        Self::IllegalDataValue,
        Self::ServerDeviceFailure,
        Self::Acknowledge,
        Self::ServerDeviceBusy,
        Self::MemoryParityError,
        Self::GatewayPathUnavailable,
        Self::GatewayTargetDevice,
    ];

    /// The code sent on the wire.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    const fn get_name(self) -> &'static str {
        match self {
            Self::IllegalFunction => "Illegal function",
            Self::IllegalDataAddress => "Illegal data address",
            Self::IllegalDataValue => "Illegal data value",
            Self::ServerDeviceFailure => "Server device failure",
            Self::Acknowledge => "Acknowledge",
            Self::ServerDeviceBusy => "Server device busy",
            Self::MemoryParityError => "Memory parity error",
            Self::GatewayPathUnavailable => "Gateway path unavailable",
            Self::GatewayTargetDevice => "Gateway target device failed to respond",
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.get_name())
    }
}

#[cfg(all(feature = "defmt", target_os = "none"))]
impl defmt::Format for Exception {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.get_name())
    }
}

impl Request<'_> {
    /// Number of bytes required for a serialized PDU frame.
    #[must_use]
    pub const fn pdu_len(&self) -> usize {
        match *self {
            Self::ReadHoldingRegisters(_, _) => 5,
            Self::Custom(_, data) => 1 + data.len(),
        }
    }
}

impl Response<'_> {
    /// Number of bytes required for a serialized PDU frame.
    #[must_use]
    pub const fn pdu_len(&self) -> usize {
        match *self {
            Self::ReadHoldingRegisters(words) => 2 + words.len() * 2,
            Self::Custom(_, data) => 1 + data.len(),
        }
    }
}

impl ResponsePdu<'_> {
    /// Number of bytes required for a serialized PDU frame.
    #[must_use]
    pub const fn pdu_len(&self) -> usize {
        match self.0 {
            Ok(ref rsp) => rsp.pdu_len(),
            Err(_) => 2,
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn function_code_into_u8() {
        let x: u8 = FunctionCode::ReadHoldingRegisters.value();
        assert_eq!(x, 3);
        let x: u8 = FunctionCode::Custom(0xBB).value();
        assert_eq!(x, 0xBB);
    }

    #[test]
    fn function_code_from_u8() {
        assert_eq!(FunctionCode::new(3), FunctionCode::ReadHoldingRegisters);
        assert_eq!(FunctionCode::new(0x06), FunctionCode::Custom(0x06));
        assert_eq!(FunctionCode::from(0xBB), FunctionCode::Custom(0xBB));
    }

    #[test]
    fn exception_function_code_sets_high_bit() {
        for code in [0x01, 0x03, 0x06, 0x10, 0x2B] {
            assert_eq!(FunctionCode::new(code).exception_code(), code | 0x80);
        }
    }

    #[test]
    fn function_code_from_request() {
        assert_eq!(
            FunctionCode::from(Request::ReadHoldingRegisters(0, 1)).value(),
            0x03
        );
        assert_eq!(
            FunctionCode::from(Request::Custom(FunctionCode::Custom(88), &[])).value(),
            88
        );
    }

    #[test]
    fn function_code_from_response() {
        let rsp = Response::ReadHoldingRegisters(Data::from_bytes(&[]).unwrap());
        assert_eq!(FunctionCode::from(rsp).value(), 0x03);
        let rsp = Response::Custom(FunctionCode::Custom(99), &[]);
        assert_eq!(FunctionCode::from(rsp).value(), 99);
    }

    #[test]
    fn test_request_pdu_len() {
        assert_eq!(Request::ReadHoldingRegisters(0x12, 5).pdu_len(), 5);
        assert_eq!(
            Request::Custom(FunctionCode::Custom(0x06), &[0, 1, 2, 3]).pdu_len(),
            5
        );
    }

    #[test]
    fn test_response_pdu_len() {
        let buf = &mut [0; 4];
        let data = Data::from_words(&[0x1111, 0x2222], buf).unwrap();
        assert_eq!(Response::ReadHoldingRegisters(data).pdu_len(), 6);
        let ex = ExceptionResponse {
            function: FunctionCode::ReadHoldingRegisters,
            exception: Exception::IllegalDataAddress,
        };
        assert_eq!(ResponsePdu(Err(ex)).pdu_len(), 2);
    }

    #[cfg(feature = "std")]
    #[test]
    fn exception_response_display() {
        use std::string::ToString;

        let ex = ExceptionResponse {
            function: FunctionCode::ReadHoldingRegisters,
            exception: Exception::IllegalDataAddress,
        };
        assert_eq!(
            ex.to_string(),
            "Illegal data address (code 0x02) for function 0x03"
        );
    }
}
