//! MBAP framing for Modbus over TCP.

use crate::encoding::{ByteReader, ByteWriter};
use crate::pdu::{request::REQUEST_PDU_LEN, Request};
use crate::{DecodeError, EncodeError};

pub const MBAP_HEADER_LEN: usize = 7;
/// Largest PDU a TCP frame may carry.
pub const MAX_PDU_LEN: usize = 253;
/// Every request ADU is header + fixed five-byte PDU.
pub const REQUEST_FRAME_LEN: usize = MBAP_HEADER_LEN + REQUEST_PDU_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MbapHeader {
    pub transaction_id: u16,
    pub protocol_id: u16,
    /// Length includes unit-id byte + PDU length.
    pub length: u16,
    pub unit_id: u8,
}

impl MbapHeader {
    pub fn encode(&self, w: &mut ByteWriter<'_>) -> Result<(), EncodeError> {
        w.write_u16(self.transaction_id)?;
        w.write_u16(self.protocol_id)?;
        w.write_u16(self.length)?;
        w.write_u8(self.unit_id)?;
        Ok(())
    }

    pub fn decode(r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let transaction_id = r.read_u16()?;
        let protocol_id = r.read_u16()?;
        let length = r.read_u16()?;
        let unit_id = r.read_u8()?;

        if protocol_id != 0 {
            return Err(DecodeError::InvalidValue);
        }
        if length < 1 {
            return Err(DecodeError::InvalidLength);
        }

        Ok(Self {
            transaction_id,
            protocol_id,
            length,
            unit_id,
        })
    }

    /// Byte count of the PDU that follows the header on the wire.
    pub fn pdu_len(&self) -> usize {
        usize::from(self.length) - 1
    }
}

/// Encode a complete request ADU: MBAP header followed by the request PDU.
pub fn encode_request(
    w: &mut ByteWriter<'_>,
    transaction_id: u16,
    unit_id: u8,
    request: &Request,
) -> Result<(), EncodeError> {
    let header = MbapHeader {
        transaction_id,
        protocol_id: 0,
        length: (REQUEST_PDU_LEN as u16) + 1,
        unit_id,
    };
    header.encode(w)?;
    request.encode(w)?;
    Ok(())
}

pub fn decode_frame<'a>(r: &mut ByteReader<'a>) -> Result<(MbapHeader, &'a [u8]), DecodeError> {
    let header = MbapHeader::decode(r)?;
    let pdu = r.read_slice(header.pdu_len())?;
    Ok((header, pdu))
}
