// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;

/// Codec error.
///
/// All variants describe a frame the peer should never have sent (or a
/// buffer too small to encode into). They are local faults and are never
/// turned into a Modbus exception response.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The received frame is shorter than the minimum (or declared) size
    FrameTooShort(usize),
    /// Invalid buffer size
    BufferSize,
    /// Invalid MBAP length field
    LengthField(u16),
    /// Invalid function code
    FnCode(u8),
    /// Invalid exception code
    ExceptionCode(u8),
    /// Invalid exception function code
    ExceptionFnCode(u8),
    /// Invalid byte count
    ByteCount(u8),
    /// Length Mismatch
    LengthMismatch(usize, usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;

        match self {
            FrameTooShort(len) => write!(f, "Frame too short: {len} byte(s)"),
            BufferSize => write!(f, "Invalid buffer size"),
            LengthField(len) => write!(f, "Invalid length field: {len}"),
            FnCode(fn_code) => write!(f, "Invalid function code: 0x{fn_code:0>2X}"),
            ExceptionCode(code) => write!(f, "Invalid exception code: 0x{code:0>2X}"),
            ExceptionFnCode(code) => write!(f, "Invalid exception function code: 0x{code:0>2X}"),
            ByteCount(cnt) => write!(f, "Invalid byte count: {cnt}"),
            LengthMismatch(length_field, pdu_len) => write!(
                f,
                "Length Mismatch: Length Field: {length_field}, PDU Len + 1: {pdu_len}"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "std")]
    #[test]
    fn display_messages() {
        use std::string::ToString;

        assert_eq!(
            Error::FrameTooShort(11).to_string(),
            "Frame too short: 11 byte(s)"
        );
        assert_eq!(Error::FnCode(0x83).to_string(), "Invalid function code: 0x83");
        assert_eq!(
            Error::LengthMismatch(6, 3).to_string(),
            "Length Mismatch: Length Field: 6, PDU Len + 1: 3"
        );
    }
}
