// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus TCP client (master) specific functions.
use super::*;

/// Encode a TCP request.
pub fn encode_request(adu: RequestAdu, buf: &mut [u8]) -> Result<usize> {
    let RequestAdu { hdr, pdu } = adu;
    let len = pdu.0.pdu_len();
    if buf.len() < len + HEADER_LEN {
        return Err(Error::BufferSize);
    }
    write_header(hdr, len, buf)?;
    let len = pdu.encode(&mut buf[HEADER_LEN..])?;
    Ok(len + HEADER_LEN)
}

/// Decode a TCP response.
///
/// A function code with the exception flag set yields
/// `ResponsePdu(Err(_))`.
pub fn decode_response(buf: &[u8]) -> Result<ResponseAdu<'_>> {
    let DecodedFrame {
        transaction_id,
        unit_id,
        pdu,
    } = extract_frame(buf, MIN_RESPONSE_LEN).inspect_err(|err| {
        log::warn!("Failed to decode response frame: {err}");
    })?;
    let hdr = Header {
        transaction_id,
        unit_id,
    };
    let pdu = if pdu[0] & EXCEPTION_FLAG != 0 {
        if pdu.len() != 2 {
            return Err(Error::LengthMismatch(pdu.len() + 1, 3));
        }
        ExceptionResponse::try_from(pdu).map(|er| ResponsePdu(Err(er)))
    } else {
        Response::try_from(pdu).map(|r| ResponsePdu(Ok(r)))
    }
    .inspect_err(|&err| {
        // Unrecoverable error
        log::error!("Failed to decode response PDU: {err}");
    })?;
    Ok(ResponseAdu { hdr, pdu })
}
