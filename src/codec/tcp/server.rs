// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus TCP server (slave) specific functions.
use super::*;

/// Decode a TCP request.
///
/// Frames shorter than [`MIN_REQUEST_LEN`] or than their length field
/// announces fail with [`Error::FrameTooShort`].
pub fn decode_request(buf: &[u8]) -> Result<RequestAdu<'_>> {
    let DecodedFrame {
        transaction_id,
        unit_id,
        pdu,
    } = extract_frame(buf, MIN_REQUEST_LEN).inspect_err(|err| {
        log::warn!("Failed to decode request frame: {err}");
    })?;
    let hdr = Header {
        transaction_id,
        unit_id,
    };
    let req = Request::try_from(pdu).inspect_err(|err| {
        // Unrecoverable error
        log::error!("Failed to decode request PDU: {err}");
    })?;
    if let Some(expected) = request_pdu_len(req.into()) {
        if pdu.len() != expected {
            log::error!(
                "Request PDU of function {} has {} byte(s), expected {expected}",
                FunctionCode::from(req),
                pdu.len()
            );
            return Err(Error::LengthMismatch(pdu.len() + 1, expected + 1));
        }
    }
    Ok(RequestAdu {
        hdr,
        pdu: RequestPdu(req),
    })
}

/// Encode a TCP response.
pub fn encode_response(adu: ResponseAdu, buf: &mut [u8]) -> Result<usize> {
    let ResponseAdu { hdr, pdu } = adu;
    let len = pdu.pdu_len();
    if buf.len() < len + HEADER_LEN {
        return Err(Error::BufferSize);
    }
    write_header(hdr, len, buf)?;
    let len = pdu.encode(&mut buf[HEADER_LEN..])?;
    Ok(len + HEADER_LEN)
}
