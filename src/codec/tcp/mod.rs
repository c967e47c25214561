// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus TCP

use super::*;

pub mod client;
pub mod server;
pub use crate::frame::tcp::*;

/// Size of the MBAP header (transaction id, protocol id, length, unit id).
pub const HEADER_LEN: usize = 7;

// The length field counts every byte after itself.
const LENGTH_FIELD_END: usize = 6;

// [MODBUS MESSAGING ON TCP/IP IMPLEMENTATION GUIDE V1.0b](http://modbus.org/docs/Modbus_Messaging_Implementation_Guide_V1_0b.pdf), page 5
// "MODBUS PDU max size (253) + MBAP header size (7 bytes)"
pub const MAX_FRAME_LEN: usize = 260;

/// Smallest request the server interprets:
/// header + function code + start address + register count.
pub const MIN_REQUEST_LEN: usize = 12;

/// Smallest response the client interprets:
/// header + function code + byte count (or exception code).
pub const MIN_RESPONSE_LEN: usize = 9;

const MODBUS_PROTOCOL_ID: u16 = 0;

/// An extracted TCP PDU frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame<'a> {
    pub transaction_id: TransactionId,
    pub unit_id: UnitId,
    pub pdu: &'a [u8],
}

/// Total number of bytes of the ADU at the start of `buf`.
///
/// Returns `None` until the length field has been received.
#[must_use]
pub fn adu_len(buf: &[u8]) -> Option<usize> {
    if buf.len() < LENGTH_FIELD_END {
        return None;
    }
    Some(LENGTH_FIELD_END + BigEndian::read_u16(&buf[4..LENGTH_FIELD_END]) as usize)
}

/// Extract the ADU at the start of `buf`.
///
/// `buf` must hold at least `min_len` bytes and the complete frame
/// announced by the length field. Bytes following the frame are ignored.
pub fn extract_frame(buf: &[u8], min_len: usize) -> Result<DecodedFrame<'_>> {
    debug_assert!(min_len > HEADER_LEN);
    if buf.len() < min_len {
        return Err(Error::FrameTooShort(buf.len()));
    }
    let (transaction_buf, rest) = buf.split_at(2);
    let (protocol_buf, rest) = rest.split_at(2);
    let (length_buf, rest) = rest.split_at(2);
    let m_length = BigEndian::read_u16(length_buf);
    // unit id + function code at minimum
    if m_length < 2 || m_length as usize > MAX_FRAME_LEN - LENGTH_FIELD_END {
        return Err(Error::LengthField(m_length));
    }
    if rest.len() < m_length as usize {
        return Err(Error::FrameTooShort(buf.len()));
    }
    if rest.len() > m_length as usize {
        log::trace!(
            "Ignoring {} byte(s) after the frame",
            rest.len() - m_length as usize
        );
    }
    let protocol_id = BigEndian::read_u16(protocol_buf);
    if protocol_id != MODBUS_PROTOCOL_ID {
        log::debug!("Frame with non-Modbus protocol id {protocol_id}");
    }
    let (unit_buf, pdu) = rest[..m_length as usize].split_at(1);
    Ok(DecodedFrame {
        transaction_id: BigEndian::read_u16(transaction_buf),
        unit_id: unit_buf[0],
        pdu,
    })
}

/// Write the MBAP header for a PDU of `pdu_len` bytes.
fn write_header(hdr: Header, pdu_len: usize, buf: &mut [u8]) -> Result<()> {
    if buf.len() < HEADER_LEN {
        return Err(Error::BufferSize);
    }
    let length = u16::try_from(pdu_len + 1).map_err(|_| Error::BufferSize)?;
    BigEndian::write_u16(&mut buf[0..2], hdr.transaction_id);
    BigEndian::write_u16(&mut buf[2..4], MODBUS_PROTOCOL_ID);
    BigEndian::write_u16(&mut buf[4..6], length);
    buf[6] = hdr.unit_id;
    Ok(())
}
